use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use tracing::{debug, info};

use crate::error::AnalysisError;

/// OpenAI-compatible chat client. Works against OpenAI proper or a local
/// Ollama server (`http://localhost:11434/v1`).
#[derive(Clone)]
pub struct LLMClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
    json_output: bool,
}

impl LLMClient {
    pub fn new(api_key: String, base_url: Option<String>, model: String) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url {
            config = config.with_api_base(url);
        }
        Self {
            client: Client::with_config(config),
            model,
            temperature: None,
            json_output: false,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.json_output = enabled;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Takes effect on the next request.
    pub fn set_model(&mut self, model: String) {
        if model != self.model {
            info!("🤖 LLM model switched: {} -> {}", self.model, model);
            self.model = model;
        }
    }

    pub fn build_request(
        &self,
        system_prompt: &str,
        user_input: &str,
    ) -> Result<CreateChatCompletionRequest, AnalysisError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages([
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_input)
                    .build()?,
            ),
        ]);
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        if self.json_output {
            args.response_format(ResponseFormat::JsonObject);
        }
        Ok(args.build()?)
    }

    pub async fn chat(&self, system_prompt: &str, user_input: &str) -> Result<String, AnalysisError> {
        info!("🤖 Sending request to LLM (Model: {})...", self.model);

        let request = self.build_request(system_prompt, user_input)?;
        let response = self.client.chat().create(request).await?;

        let choice = response.choices.first().ok_or(AnalysisError::EmptyResponse)?;
        let content = choice.message.content.clone().unwrap_or_default();
        debug!("🤖 LLM Response received ({} chars)", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> LLMClient {
        LLMClient::new("ollama".into(), Some("http://localhost:11434/v1".into()), "llama3.1".into())
    }

    #[test]
    fn test_request_carries_model_and_messages() {
        let request = client().build_request("sys", "user").unwrap();
        assert_eq!(request.model, "llama3.1");
        assert_eq!(request.messages.len(), 2);
        assert!(request.temperature.is_none());
        assert!(request.response_format.is_none());
    }

    #[test]
    fn test_options_are_applied() {
        let request = client()
            .with_temperature(Some(0.2))
            .with_json_output(true)
            .build_request("sys", "user")
            .unwrap();
        assert_eq!(request.temperature, Some(0.2));
        assert!(matches!(request.response_format, Some(ResponseFormat::JsonObject)));
    }

    #[test]
    fn test_set_model_applies_to_next_request() {
        let mut llm = client();
        llm.set_model("mistral".into());
        assert_eq!(llm.model(), "mistral");
        assert_eq!(llm.build_request("s", "u").unwrap().model, "mistral");
    }
}
