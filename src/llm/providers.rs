//! Built-in AI provider registry.
//!
//! Every vendor differs along four axes: where the request goes, how the
//! credential is sent, what the request body looks like and where the
//! generated text sits in the response. A [`ProviderDescriptor`] captures all
//! four so the invocation step never branches on the vendor itself.

use std::collections::BTreeMap;

use reqwest::Url;
use serde_json::{json, Value};

use super::invoke::InvocationError;
use super::{ChatMessage, GenerationParams, Role};

pub const OPENAI_CHAT_API: &str = "https://api.openai.com/v1/chat/completions";
pub const DEEPSEEK_CHAT_API: &str = "https://api.deepseek.com/chat/completions";
pub const GROQ_CHAT_API: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const OPENROUTER_CHAT_API: &str = "https://openrouter.ai/api/v1/chat/completions";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Where a provider's requests are sent.
#[derive(Clone, Copy)]
pub enum Endpoint {
    Fixed(&'static str),
    /// Computed from `(model, credential)`; used when the key travels in the URL.
    PerRequest(fn(&str, &str) -> String),
}

/// How the credential is attached to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// Key is part of the endpoint URL; no auth header.
    InUrl,
}

/// Request/response dialect spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadStyle {
    /// OpenAI chat-completions shape with role-tagged messages.
    ChatCompletions,
    /// Single combined prompt under `contents[].parts[].text` (Gemini).
    Contents,
}

/// Static description of one supported provider.
#[derive(Clone)]
pub struct ProviderDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub default_model: &'static str,
    /// Environment variable conventionally holding this provider's key.
    pub key_env: &'static str,
    endpoint: Endpoint,
    auth: Auth,
    extra_headers: &'static [(&'static str, &'static str)],
    style: PayloadStyle,
}

impl ProviderDescriptor {
    /// Whether the resolved endpoint embeds the credential and must not be logged.
    pub fn url_carries_secret(&self) -> bool {
        self.auth == Auth::InUrl
    }

    pub fn resolve_endpoint(&self, model: &str, credential: &str) -> String {
        match self.endpoint {
            Endpoint::Fixed(url) => url.to_string(),
            Endpoint::PerRequest(build) => build(model, credential),
        }
    }

    pub fn build_headers(&self, credential: &str) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        if self.auth == Auth::Bearer {
            headers.insert("Authorization".to_string(), format!("Bearer {credential}"));
        }

        for (name, value) in self.extra_headers {
            headers.insert((*name).to_string(), (*value).to_string());
        }

        headers
    }

    pub fn build_payload(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Value {
        match self.style {
            PayloadStyle::ChatCompletions => json!({
                "model": model,
                "messages": messages,
                "temperature": params.temperature,
                "max_tokens": params.max_tokens,
                "stream": false,
            }),
            PayloadStyle::Contents => {
                let system = first_content(messages, Role::System);
                let user = first_content(messages, Role::User);
                json!({
                    "contents": [
                        { "parts": [ { "text": format!("{system}\n\n{user}") } ] }
                    ],
                    "generationConfig": {
                        "temperature": params.temperature,
                        "maxOutputTokens": params.max_tokens,
                    },
                })
            }
        }
    }

    pub fn extract_content(&self, response: &Value) -> Result<String, InvocationError> {
        let (pointer, path) = match self.style {
            PayloadStyle::ChatCompletions => ("/choices/0/message/content", "choices[0].message.content"),
            PayloadStyle::Contents => ("/candidates/0/content/parts/0/text", "candidates[0].content.parts[0].text"),
        };

        match response.pointer(pointer).and_then(Value::as_str) {
            Some(text) => Ok(text.to_string()),
            None => {
                let mut detail = format!("missing `{path}` in response");
                if let Some(err) = response.get("error") {
                    detail.push_str(&format!(" (error: {err})"));
                }
                Err(InvocationError::MalformedResponse {
                    provider: self.id.to_string(),
                    detail,
                })
            }
        }
    }
}

fn first_content(messages: &[ChatMessage], role: Role) -> &str {
    messages
        .iter()
        .find(|m| m.role == role)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

/// Model and key are percent-encoded so neither can reshape the URL.
fn gemini_endpoint(model: &str, credential: &str) -> String {
    let action = format!("{model}:generateContent");
    match Url::parse(GEMINI_API_BASE) {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.push(&action);
            }
            url.query_pairs_mut().append_pair("key", credential);
            url.to_string()
        }
        Err(_) => format!("{GEMINI_API_BASE}/{action}?key={credential}"),
    }
}

/// Immutable lookup table of supported providers, in display order.
pub struct Registry {
    providers: Vec<ProviderDescriptor>,
}

impl Registry {
    pub fn builtin() -> Self {
        let providers = vec![
            ProviderDescriptor {
                id: "openai",
                name: "OpenAI",
                description: "OpenAI chat completions (GPT models)",
                default_model: "gpt-4o-mini",
                key_env: "OPENAI_API_KEY",
                endpoint: Endpoint::Fixed(OPENAI_CHAT_API),
                auth: Auth::Bearer,
                extra_headers: &[],
                style: PayloadStyle::ChatCompletions,
            },
            ProviderDescriptor {
                id: "deepseek",
                name: "DeepSeek",
                description: "DeepSeek chat API (OpenAI compatible)",
                default_model: "deepseek-chat",
                key_env: "DEEPSEEK_API_KEY",
                endpoint: Endpoint::Fixed(DEEPSEEK_CHAT_API),
                auth: Auth::Bearer,
                extra_headers: &[],
                style: PayloadStyle::ChatCompletions,
            },
            ProviderDescriptor {
                id: "groq",
                name: "Groq",
                description: "Groq hosted open models (OpenAI compatible)",
                default_model: "llama-3.3-70b-versatile",
                key_env: "GROQ_API_KEY",
                endpoint: Endpoint::Fixed(GROQ_CHAT_API),
                auth: Auth::Bearer,
                extra_headers: &[],
                style: PayloadStyle::ChatCompletions,
            },
            ProviderDescriptor {
                id: "openrouter",
                name: "OpenRouter",
                description: "OpenRouter model gateway",
                default_model: "openai/gpt-4o-mini",
                key_env: "OPENROUTER_API_KEY",
                endpoint: Endpoint::Fixed(OPENROUTER_CHAT_API),
                auth: Auth::Bearer,
                extra_headers: &[
                    ("HTTP-Referer", "https://github.com/prbot/prbot"),
                    ("X-Title", "prbot"),
                ],
                style: PayloadStyle::ChatCompletions,
            },
            ProviderDescriptor {
                id: "gemini",
                name: "Google Gemini",
                description: "Google Generative Language API (key in URL)",
                default_model: "gemini-2.0-flash",
                key_env: "GEMINI_API_KEY",
                endpoint: Endpoint::PerRequest(gemini_endpoint),
                auth: Auth::InUrl,
                extra_headers: &[],
                style: PayloadStyle::Contents,
            },
        ];

        Registry { providers }
    }

    pub fn lookup(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn list(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id).collect()
    }

    pub fn is_valid(&self, id: &str) -> bool {
        self.lookup(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.providers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::system("S"), ChatMessage::user("U")]
    }

    #[test]
    fn list_keeps_insertion_order() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.list(),
            vec!["openai", "deepseek", "groq", "openrouter", "gemini"]
        );
    }

    #[test]
    fn every_provider_has_callable_rules() {
        let registry = Registry::builtin();
        for id in registry.list() {
            let provider = registry.lookup(id).unwrap();
            let url = provider.resolve_endpoint(provider.default_model, "k");
            assert!(url.starts_with("https://"), "{id}: {url}");

            let headers = provider.build_headers("k");
            assert_eq!(headers["Content-Type"], "application/json");

            let payload = provider.build_payload(
                provider.default_model,
                &messages(),
                GenerationParams::default(),
            );
            assert!(payload.is_object());

            assert!(provider.extract_content(&json!({})).is_err());
        }
    }

    #[test]
    fn unknown_ids_are_invalid() {
        let registry = Registry::builtin();
        assert!(!registry.is_valid("nonexistent"));
        assert!(!registry.is_valid(""));
        assert!(!registry.is_valid("OpenAI"));
        assert!(registry.lookup("nonexistent").is_none());
        assert!(registry.is_valid("gemini"));
    }

    #[test]
    fn chat_payload_shape() {
        let registry = Registry::builtin();
        let provider = registry.lookup("deepseek").unwrap();
        let payload =
            provider.build_payload("deepseek-chat", &messages(), GenerationParams::default());

        assert_eq!(payload["model"], "deepseek-chat");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][0]["content"], "S");
        assert_eq!(payload["messages"][1]["role"], "user");
        assert_eq!(payload["messages"][1]["content"], "U");
        assert_eq!(payload["max_tokens"], 2048);
        assert_eq!(payload["stream"], false);
        let temperature = payload["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6);
    }

    #[test]
    fn contents_payload_concatenates_system_and_user() {
        let registry = Registry::builtin();
        let provider = registry.lookup("gemini").unwrap();
        let payload =
            provider.build_payload("gemini-2.0-flash", &messages(), GenerationParams::default());

        assert_eq!(payload["contents"][0]["parts"][0]["text"], "S\n\nU");
        assert_eq!(payload["generationConfig"]["maxOutputTokens"], 2048);
        assert!(payload.get("messages").is_none());
        assert!(payload.get("max_tokens").is_none());
    }

    #[test]
    fn contents_payload_uses_first_match_and_tolerates_missing_roles() {
        let registry = Registry::builtin();
        let provider = registry.lookup("gemini").unwrap();

        let msgs = vec![
            ChatMessage::user("U1"),
            ChatMessage::system("S1"),
            ChatMessage::user("U2"),
        ];
        let payload = provider.build_payload("m", &msgs, GenerationParams::default());
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "S1\n\nU1");

        let only_user = vec![ChatMessage::user("U")];
        let payload = provider.build_payload("m", &only_user, GenerationParams::default());
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "\n\nU");
    }

    #[test]
    fn gemini_puts_key_in_url_and_skips_auth_header() {
        let registry = Registry::builtin();
        let provider = registry.lookup("gemini").unwrap();

        let url = provider.resolve_endpoint("gemini-2.0-flash", "secret");
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent?key=secret"
        );
        assert!(provider.url_carries_secret());
        assert!(!provider.build_headers("secret").contains_key("Authorization"));
    }

    #[test]
    fn gemini_url_encodes_key_and_model() {
        let registry = Registry::builtin();
        let provider = registry.lookup("gemini").unwrap();

        let url = provider.resolve_endpoint("gemini-2.0-flash", "a&b#c?d");
        assert!(url.ends_with("gemini-2.0-flash:generateContent?key=a%26b%23c%3Fd"), "{url}");

        let url = provider.resolve_endpoint("odd/model?x", "k");
        assert!(
            url.starts_with("https://generativelanguage.googleapis.com/v1beta/models/odd%2Fmodel%3Fx:generateContent?"),
            "{url}"
        );
        assert!(url.ends_with("?key=k"), "{url}");
    }

    #[test]
    fn openrouter_adds_identification_headers() {
        let registry = Registry::builtin();
        let provider = registry.lookup("openrouter").unwrap();
        let headers = provider.build_headers("k");

        assert_eq!(headers["Authorization"], "Bearer k");
        assert!(headers.contains_key("HTTP-Referer"));
        assert_eq!(headers["X-Title"], "prbot");
    }

    #[test]
    fn extracts_from_each_dialect() {
        let registry = Registry::builtin();

        let openai = registry.lookup("openai").unwrap();
        let resp = json!({"choices": [{"message": {"content": "hello"}}]});
        assert_eq!(openai.extract_content(&resp).unwrap(), "hello");

        let gemini = registry.lookup("gemini").unwrap();
        let resp = json!({"candidates": [{"content": {"parts": [{"text": "hi"}]}}]});
        assert_eq!(gemini.extract_content(&resp).unwrap(), "hi");
    }

    #[test]
    fn missing_path_is_malformed_response() {
        let registry = Registry::builtin();
        let openai = registry.lookup("openai").unwrap();

        let err = openai.extract_content(&json!({"choices": []})).unwrap_err();
        match err {
            InvocationError::MalformedResponse { provider, detail } => {
                assert_eq!(provider, "openai");
                assert!(detail.contains("choices[0].message.content"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let gemini = registry.lookup("gemini").unwrap();
        let err = gemini
            .extract_content(&json!({"error": {"message": "quota"}}))
            .unwrap_err();
        assert!(matches!(err, InvocationError::MalformedResponse { .. }));
        assert!(err.to_string().contains("quota"));
    }
}
