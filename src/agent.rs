use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SYSTEM_PERSONA: &str = "You are Nurse Joy, an AI assistant specialised EXCLUSIVELY in Pokémon. \
Your answers must ALWAYS be brief, direct and focused on the Pokémon universe. \
Ignore questions that are not about Pokémon. \
You can build Pokémon sets (with 4 moves), recommend moves and suggest teams of 6 Pokémon. \
Prefer official Pokémon information (games, TCG, lore).";

pub const BLOCKED_REPLY: &str = "Sorry, I can't answer that question.";
pub const APOLOGY_REPLY: &str =
    "Sorry, Nurse Joy is busy at the Pokémon Center. Please try again later.";
pub const EMPTY_PROMPT_REPLY: &str = "No prompt provided.";

const TEMPERATURE: f64 = 0.7;
const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Gemini,
    Ollama,
}

#[derive(thiserror::Error, Debug)]
pub enum AgentError {
    #[error("missing Gemini API key")]
    MissingApiKey,
    #[error("empty prompt")]
    EmptyPrompt,
    #[error("response blocked by safety filter")]
    Blocked,
    #[error("request failed: {0}")]
    Request(String),
    #[error("response parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait Agent: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError>;
}

/// Ask the assistant and always come back with something printable.
pub async fn ask_agent(agent: &dyn Agent, prompt: &str) -> String {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return EMPTY_PROMPT_REPLY.to_string();
    }
    match agent.complete(prompt).await {
        Ok(text) => text.trim().to_string(),
        Err(AgentError::Blocked) => BLOCKED_REPLY.to_string(),
        Err(err) => {
            log::warn!("assistant call failed: {err}");
            APOLOGY_REPLY.to_string()
        }
    }
}

pub fn agent_for(
    provider: Provider,
    model: String,
    api_key: Option<String>,
    base_url: Option<String>,
    max_output_tokens: u32,
) -> Result<Box<dyn Agent>, AgentError> {
    match provider {
        Provider::Gemini => {
            let key = api_key.ok_or(AgentError::MissingApiKey)?;
            Ok(Box::new(GeminiAgent::new(key, model, max_output_tokens)))
        }
        Provider::Ollama => {
            let base = base_url.unwrap_or_else(|| "http://localhost:11434".to_string());
            Ok(Box::new(OllamaAgent::new(base, model, max_output_tokens)))
        }
    }
}

pub struct GeminiAgent {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_output_tokens: u32,
}

impl GeminiAgent {
    pub fn new(api_key: String, model: String, max_output_tokens: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            max_output_tokens,
        }
    }

    fn payload(&self, prompt: &str) -> Value {
        serde_json::json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_PERSONA }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": self.max_output_tokens,
            },
        })
    }
}

#[async_trait]
impl Agent for GeminiAgent {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
        if prompt.trim().is_empty() {
            return Err(AgentError::EmptyPrompt);
        }
        let url = format!("{GEMINI_BASE}/models/{}:generateContent", self.model);
        let value: Value = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.payload(prompt))
            .send()
            .await
            .map_err(|e| AgentError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| AgentError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;
        gemini_text(&value)
    }
}

fn gemini_text(value: &Value) -> Result<String, AgentError> {
    let candidate = value
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or_else(|| AgentError::Parse("missing candidates".to_string()))?;
    if candidate.get("finishReason").and_then(|r| r.as_str()) == Some("SAFETY") {
        return Err(AgentError::Blocked);
    }
    let parts = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| AgentError::Parse("missing content".to_string()))?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();
    Ok(text.trim().to_string())
}

pub struct OllamaAgent {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_output_tokens: u32,
}

impl OllamaAgent {
    pub fn new(base_url: String, model: String, max_output_tokens: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            model,
            max_output_tokens,
        }
    }
}

#[async_trait]
impl Agent for OllamaAgent {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
        if prompt.trim().is_empty() {
            return Err(AgentError::EmptyPrompt);
        }
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PERSONA },
                { "role": "user", "content": prompt },
            ],
            "stream": false,
            "options": {
                "temperature": TEMPERATURE,
                "num_predict": self.max_output_tokens,
            },
        });

        let value: Value = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| AgentError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;
        value
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|c| c.trim().to_string())
            .ok_or_else(|| AgentError::Parse("missing content".to_string()))
    }
}
