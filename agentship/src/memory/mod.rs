//! C6 — Session Store's storage layer: the `Checkpointer` trait and its
//! implementations. AgentShip persists exactly one thing per
//! thread — the linear message history of a native-engine conversation — so
//! this module is deliberately narrower than a generic, multi-channel
//! graph-checkpoint design (see DESIGN.md "C7 — Engines" for the matching
//! non-adoption of a compiled state graph).
//!
//! The per-engine wrapper that decides *when* to call into a `Checkpointer`
//! (native engine) versus a framework session service (orchestrated engine)
//! lives one level up, in [`crate::session`].

mod checkpoint;
mod checkpointer;
mod memory_saver;
mod postgres_saver;
mod sqlite_saver;

pub use checkpoint::{Checkpoint, CheckpointListItem};
pub use checkpointer::{thread_id, Checkpointer};
pub use memory_saver::MemorySaver;
#[cfg(feature = "postgres")]
pub use postgres_saver::PostgresSaver;
pub use sqlite_saver::SqliteSaver;
