//! Real `LlmClient` backed by the OpenAI Chat Completions API: the same
//! `async-openai` dependency and streaming-accumulator shape as
//! `ChatOpenAI`, reshaped around this crate's `LlmRequest`/`StreamDelta`
//! contract and the native engine's message roles (including a `Tool` role
//! a plain chat client never needed).

use std::collections::HashMap;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionMessageToolCalls, ChatCompletionRequestAssistantMessage,
        ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessage,
        ChatCompletionRequestUserMessage, ChatCompletionTool, ChatCompletionToolChoiceOption,
        ChatCompletionTools, CreateChatCompletionRequestArgs, FunctionObject, ToolChoiceOptions,
    },
    error::OpenAIError,
    Client,
};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, trace};

use crate::message::Message;

use super::{FinishReason, LlmClient, LlmError, LlmRequest, LlmTurnResult, ParsedToolCall, StreamDelta};

/// OpenAI Chat Completions client. Uses `OPENAI_API_KEY` from the
/// environment by default ; pass an explicit [`OpenAIConfig`]
/// for a different base URL or key source.
pub struct OpenAiLlm {
    client: Client<OpenAIConfig>,
}

impl OpenAiLlm {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    pub fn with_config(config: OpenAIConfig) -> Self {
        Self {
            client: Client::with_config(config),
        }
    }

    fn messages_to_request(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System(s) => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(s.as_str()))
                }
                Message::User(s) => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(s.as_str()))
                }
                Message::Assistant { content, tool_calls } => {
                    let mut msg = ChatCompletionRequestAssistantMessage::default();
                    if !content.is_empty() {
                        msg.content = Some(ChatCompletionRequestAssistantMessageContent::Text(content.clone()));
                    }
                    if !tool_calls.is_empty() {
                        msg.tool_calls = Some(
                            tool_calls
                                .iter()
                                .map(|tc| async_openai::types::chat::ChatCompletionMessageToolCall::Function(
                                    async_openai::types::chat::ChatCompletionMessageFunctionToolCall {
                                        id: tc.id.clone(),
                                        function: async_openai::types::chat::FunctionCall {
                                            name: tc.name.clone(),
                                            arguments: tc.arguments.to_string(),
                                        },
                                    },
                                ))
                                .collect(),
                        );
                    }
                    ChatCompletionRequestMessage::Assistant(msg)
                }
                Message::Tool { tool_call_id, content, .. } => {
                    ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
                        tool_call_id: tool_call_id.clone(),
                        content: content.as_str().into(),
                    })
                }
            })
            .collect()
    }

    fn build_request(&self, request: &LlmRequest, stream: bool) -> Result<async_openai::types::chat::CreateChatCompletionRequest, LlmError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(request.model.clone());
        args.messages(Self::messages_to_request(&request.messages));
        args.temperature(request.temperature);
        if stream {
            args.stream(true);
        }
        if !request.tools.is_empty() {
            let chat_tools: Vec<ChatCompletionTools> = request
                .tools
                .iter()
                .map(|t| {
                    ChatCompletionTools::Function(ChatCompletionTool {
                        function: FunctionObject {
                            name: t.name.clone(),
                            description: Some(t.description.clone()),
                            parameters: Some(t.input_schema.clone()),
                            ..Default::default()
                        },
                    })
                })
                .collect();
            args.tools(chat_tools);
            args.tool_choice(ChatCompletionToolChoiceOption::Mode(ToolChoiceOptions::Auto));
        }
        args.build()
            .map_err(|e| LlmError::Provider(format!("request build failed: {e}")))
    }
}

impl Default for OpenAiLlm {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps an `async-openai` transport error to our recoverability taxonomy
/// : a 429 status is the only retryable case.
fn classify_error(err: OpenAIError) -> LlmError {
    if let OpenAIError::ApiError(ref api_err) = err {
        if api_err.code.as_deref() == Some("rate_limit_exceeded") || err.to_string().contains("429") {
            return LlmError::RateLimited;
        }
    }
    if err.to_string().contains("429") {
        return LlmError::RateLimited;
    }
    LlmError::Provider(err.to_string())
}

#[async_trait]
impl LlmClient for OpenAiLlm {
    async fn invoke(&self, request: &LlmRequest) -> Result<LlmTurnResult, LlmError> {
        let req = self.build_request(request, false)?;
        debug!(model = %request.model, message_count = request.messages.len(), "openai chat create");
        let response = self.client.chat().create(req).await.map_err(classify_error)?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Provider("openai returned no choices".into()))?;
        let msg = choice.message;
        let content = msg.content.unwrap_or_default();
        let tool_calls = msg
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tc| match tc {
                ChatCompletionMessageToolCalls::Function(f) => Some(ParsedToolCall {
                    id: f.id,
                    name: f.function.name,
                    arguments: super::parse_tool_arguments(&f.function.arguments),
                }),
            })
            .collect();
        let finish_reason = match choice.finish_reason {
            Some(async_openai::types::chat::FinishReason::ToolCalls) => FinishReason::ToolCalls,
            Some(async_openai::types::chat::FinishReason::Length) => FinishReason::Length,
            Some(async_openai::types::chat::FinishReason::Stop) => FinishReason::Stop,
            _ => FinishReason::Other,
        };
        Ok(LlmTurnResult { content, tool_calls, finish_reason })
    }

    async fn invoke_stream(
        &self,
        request: &LlmRequest,
        delta_tx: Option<mpsc::Sender<StreamDelta>>,
    ) -> Result<LlmTurnResult, LlmError> {
        let Some(delta_tx) = delta_tx else {
            return self.invoke(request).await;
        };

        let req = self.build_request(request, true)?;
        debug!(model = %request.model, stream = true, "openai chat create_stream");
        let mut stream = self.client.chat().create_stream(req).await.map_err(classify_error)?;

        let mut full_content = String::new();
        let mut tool_call_map: HashMap<u32, (String, String, String)> = HashMap::new();
        let mut finish_reason = FinishReason::Stop;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(classify_error)?;
            for choice in chunk.choices {
                if let Some(ref content) = choice.delta.content {
                    if !content.is_empty() {
                        full_content.push_str(content);
                        let _ = delta_tx.send(StreamDelta::Content(content.clone())).await;
                    }
                }
                if let Some(ref tool_calls) = choice.delta.tool_calls {
                    for tc in tool_calls {
                        let entry = tool_call_map
                            .entry(tc.index)
                            .or_insert_with(|| (tc.id.clone().unwrap_or_default(), String::new(), String::new()));
                        if let Some(ref id) = tc.id {
                            if !id.is_empty() {
                                entry.0 = id.clone();
                            }
                        }
                        if let Some(ref func) = tc.function {
                            if let Some(ref name) = func.name {
                                entry.1.push_str(name);
                            }
                            if let Some(ref args) = func.arguments {
                                entry.2.push_str(args);
                            }
                        }
                        let _ = delta_tx
                            .send(StreamDelta::ToolCallDelta {
                                index: tc.index as usize,
                                id: tc.id.clone(),
                                name: tc.function.as_ref().and_then(|f| f.name.clone()),
                                arguments_delta: tc
                                    .function
                                    .as_ref()
                                    .and_then(|f| f.arguments.clone())
                                    .unwrap_or_default(),
                            })
                            .await;
                    }
                }
                if let Some(reason) = choice.finish_reason {
                    finish_reason = match reason {
                        async_openai::types::chat::FinishReason::ToolCalls => FinishReason::ToolCalls,
                        async_openai::types::chat::FinishReason::Length => FinishReason::Length,
                        async_openai::types::chat::FinishReason::Stop => FinishReason::Stop,
                        _ => FinishReason::Other,
                    };
                }
            }
        }

        let mut tool_calls: Vec<ParsedToolCall> = tool_call_map
            .into_iter()
            .map(|(_, (id, name, arguments))| ParsedToolCall {
                id,
                name,
                arguments: super::parse_tool_arguments(&arguments),
            })
            .collect();
        tool_calls.sort_by(|a, b| a.id.cmp(&b.id));
        if !tool_calls.is_empty() && finish_reason == FinishReason::Stop {
            finish_reason = FinishReason::ToolCalls;
        }

        trace!(content_len = full_content.len(), tool_call_count = tool_calls.len(), "openai stream finished");
        Ok(LlmTurnResult { content: full_content, tool_calls, finish_reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> OpenAiLlm {
        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base("https://127.0.0.1:1");
        OpenAiLlm::with_config(config)
    }

    fn request() -> LlmRequest {
        LlmRequest {
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.2,
            messages: vec![Message::user("hello")],
            tools: vec![],
            prefer_json: false,
        }
    }

    #[tokio::test]
    async fn invoke_against_unreachable_base_returns_error() {
        let client = unreachable_client();
        assert!(client.invoke(&request()).await.is_err());
    }

    #[tokio::test]
    async fn invoke_stream_with_no_channel_delegates_to_invoke() {
        let client = unreachable_client();
        let res = client.invoke_stream(&request(), None).await;
        assert!(res.is_err());
    }
}
