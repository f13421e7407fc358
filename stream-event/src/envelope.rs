//! Envelope (session_id, event_id). `EnvelopeState` assigns a monotonically
//! increasing `event_id` to every event of one stream and injects it
//! alongside the session id.

use crate::event::ProtocolEvent;
use serde_json::Value;

/// Envelope fields merged into every event of a stream.
#[derive(Clone, Debug, Default)]
pub struct Envelope {
    /// Session ID; constant within a stream.
    pub session_id: Option<String>,
    /// Per-event sequence number; monotonically increasing within a stream.
    pub event_id: Option<u64>,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_event_id(mut self, id: u64) -> Self {
        self.event_id = Some(id);
        self
    }

    /// Merges envelope fields into the given JSON object (top-level only).
    /// Does not overwrite existing keys.
    pub fn inject_into(&self, obj: &mut Value) {
        let Some(obj) = obj.as_object_mut() else {
            return;
        };
        if let Some(ref id) = self.session_id {
            obj.entry("session_id")
                .or_insert_with(|| Value::String(id.clone()));
        }
        if let Some(id) = self.event_id {
            obj.entry("event_id")
                .or_insert_with(|| Value::Number(serde_json::Number::from(id)));
        }
    }
}

/// Envelope state for one stream: session_id plus the next event_id to assign.
pub struct EnvelopeState {
    pub session_id: String,
    pub next_event_id: u64,
}

impl EnvelopeState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            next_event_id: 1,
        }
    }

    /// Injects envelope into the event value and advances the sequence.
    pub fn inject_into(&mut self, value: &mut Value) {
        let env = Envelope::new()
            .with_session_id(&self.session_id)
            .with_event_id(self.next_event_id);
        self.next_event_id += 1;
        env.inject_into(value);
    }
}

/// Converts a protocol event to JSON and injects the envelope using the given state.
/// Returns the final value (type + payload + session_id + event_id).
pub fn to_json(event: &ProtocolEvent, state: &mut EnvelopeState) -> Result<Value, serde_json::Error> {
    let mut value = event.to_value()?;
    state.inject_into(&mut value);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ProtocolEvent;

    #[test]
    fn envelope_inject() {
        let mut obj = serde_json::json!({"type":"thinking","agent":"a"});
        let env = Envelope::new().with_session_id("sess-1").with_event_id(1);
        env.inject_into(&mut obj);
        assert_eq!(obj["session_id"], "sess-1");
        assert_eq!(obj["event_id"], 1);
        assert_eq!(obj["type"], "thinking");
    }

    #[test]
    fn to_json_injects_envelope_and_advances_sequence() {
        let ev = ProtocolEvent::Thinking {
            agent: "translator".to_string(),
            timestamp: "2026-07-28T00:00:00Z".to_string(),
        };
        let mut state = EnvelopeState::new("sess-123".to_string());
        let first = to_json(&ev, &mut state).unwrap();
        assert_eq!(first["session_id"], "sess-123");
        assert_eq!(first["event_id"], 1);
        let second = to_json(&ev, &mut state).unwrap();
        assert_eq!(second["event_id"], 2);
    }
}
