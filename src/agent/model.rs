use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionTool, ChatCompletionToolArgs, ChatCompletionToolType,
        CreateChatCompletionRequestArgs, FunctionCall, FunctionObjectArgs,
    },
};
use async_trait::async_trait;
use serde_json::Value;

use super::messages::{ConversationMessage, Role, ToolCallRecord};
use crate::config::OpenAiConfig;
use crate::error::{ExternalApi, Result, TravelAgentError};
use crate::tools::ToolSpec;

/// One model turn: optional text plus the tool calls it requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRecord>,
}

#[async_trait]
pub trait ChatModel: Send + Sync + 'static {
    async fn complete(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolSpec],
    ) -> Result<ModelReply>;

    fn model_name(&self) -> &str;
}

fn openai_error(e: OpenAIError) -> TravelAgentError {
    TravelAgentError::ExternalApi {
        api: ExternalApi::OpenAi,
        message: e.to_string(),
        status: None,
    }
}

/// Chat completions with function tools.
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChatModel {
    pub fn from_config(cfg: &OpenAiConfig) -> Self {
        let config = OpenAIConfig::new().with_api_key(cfg.api_key.clone());
        Self {
            client: Client::with_config(config),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        }
    }

    fn convert_message(msg: &ConversationMessage) -> Result<ChatCompletionRequestMessage> {
        let converted = match msg.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(msg.content.clone())
                .build()
                .map_err(openai_error)?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(msg.content.clone())
                .build()
                .map_err(openai_error)?
                .into(),
            Role::Assistant => {
                let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                if !msg.content.is_empty() {
                    builder.content(msg.content.clone());
                }
                if !msg.tool_calls.is_empty() {
                    builder.tool_calls(
                        msg.tool_calls
                            .iter()
                            .map(|call| ChatCompletionMessageToolCall {
                                id: call.id.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: FunctionCall {
                                    name: call.name.clone(),
                                    arguments: match &call.args {
                                        Value::String(raw) => raw.clone(),
                                        other => other.to_string(),
                                    },
                                },
                            })
                            .collect::<Vec<_>>(),
                    );
                }
                builder.build().map_err(openai_error)?.into()
            }
            Role::Tool => ChatCompletionRequestToolMessageArgs::default()
                .content(msg.content.clone())
                .tool_call_id(msg.tool_call_id.clone().unwrap_or_default())
                .build()
                .map_err(openai_error)?
                .into(),
        };
        Ok(converted)
    }

    fn convert_tools(tools: &[ToolSpec]) -> Result<Vec<ChatCompletionTool>> {
        tools
            .iter()
            .map(|tool| {
                let function = FunctionObjectArgs::default()
                    .name(tool.name)
                    .description(tool.description)
                    .parameters(tool.parameters.clone())
                    .build()
                    .map_err(openai_error)?;
                ChatCompletionToolArgs::default()
                    .r#type(ChatCompletionToolType::Function)
                    .function(function)
                    .build()
                    .map_err(openai_error)
            })
            .collect()
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolSpec],
    ) -> Result<ModelReply> {
        let messages = messages
            .iter()
            .map(Self::convert_message)
            .collect::<Result<Vec<_>>>()?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_tokens);
        if !tools.is_empty() {
            request.tools(Self::convert_tools(tools)?);
        }
        let request = request.build().map_err(openai_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(openai_error)?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TravelAgentError::Agent("No choices in model response".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRecord {
                args: serde_json::from_str(&call.function.arguments)
                    .unwrap_or(Value::String(call.function.arguments)),
                id: call.id,
                name: call.function.name,
            })
            .collect();

        Ok(ModelReply {
            content: choice.message.content,
            tool_calls,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{SEARCH_FLIGHTS, ToolSet};

    #[test]
    fn converts_every_role() {
        let call = ToolCallRecord {
            id: "call_1".into(),
            name: SEARCH_FLIGHTS.into(),
            args: serde_json::json!({"departure_location": "JFK"}),
        };
        let history = vec![
            ConversationMessage::system("be helpful"),
            ConversationMessage::user("fly me"),
            ConversationMessage::assistant_with_tools("", vec![call.clone()]),
            ConversationMessage::tool(&call, "{}"),
            ConversationMessage::assistant("done"),
        ];
        for msg in &history {
            OpenAiChatModel::convert_message(msg).expect("message converts");
        }
    }

    #[test]
    fn converts_tool_specs() {
        let names = ToolSet::Travel.tool_names();
        let specs: Vec<ToolSpec> = crate::tools::specs_for(ToolSet::Travel);
        let tools = OpenAiChatModel::convert_tools(&specs).expect("tools convert");
        assert_eq!(tools.len(), names.len());
        assert_eq!(tools[0].function.name, SEARCH_FLIGHTS);
    }
}
