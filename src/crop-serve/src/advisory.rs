//! Generative advisory text for farmers, backed by the Gemini API.

use log::{debug, error, info};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Preferred models, best first, exactly as the API reports their names.
const PREFERRED_MODELS: &[&str] = &[
    "models/gemini-2.5-flash",
    "models/gemini-2.5-pro",
    "models/gemini-1.5-flash",
    "models/gemini-1.5-pro",
    "models/gemini-pro",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
];

/// Served when Gemini is unreachable or returns nothing.
pub const DISEASE_FALLBACK: &str = "ಕ್ಷಮಿಸಿ (Sorry), advisory unavailable right now.";
pub const ASSISTANT_FALLBACK: &str = "ಕ್ಷಮಿಸಿ (Sorry), I cannot answer right now.";

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("Gemini request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No available model supports generateContent")]
    NoUsableModel,

    #[error("Gemini response contained no text")]
    EmptyResponse,
}

#[derive(Debug, Deserialize)]
struct ModelCatalog {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,

    #[serde(default, rename = "supportedGenerationMethods")]
    supported_generation_methods: Vec<String>,
}

/// Client bound to one Gemini model, selected at startup.
pub struct AdvisoryClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AdvisoryClient {
    /// List the models this API key can use and bind to the best one.
    pub async fn discover(api_key: String) -> Result<Self, AdvisoryError> {
        let http = reqwest::Client::new();

        let url = format!("{API_BASE}/models?key={api_key}");
        let catalog: ModelCatalog = http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let model = pick_model(&catalog.models).ok_or(AdvisoryError::NoUsableModel)?;
        let model = if model.starts_with("models/") {
            model
        } else {
            format!("models/{model}")
        };

        info!("Using Gemini model {}", model);

        Ok(AdvisoryClient {
            http,
            api_key,
            model,
        })
    }

    /// Advisory for a detected disease, in simple Kannada.
    ///
    /// Never fails: when Gemini is unreachable or silent the caller gets a
    /// fixed apology instead.
    pub async fn disease_advisory(&self, disease_name: &str) -> String {
        let prompt = format!(
            "You are 'Krishi Mitra', an agricultural expert for Karnataka.\n\
             A crop disease has been detected: {disease_name}.\n\
             \n\
             Please provide the following details in simple KANNADA:\n\
             1. ವಿವರಣೆ: ಈ ರೋಗ ಏನು?\n\
             2. ಚಿಕಿತ್ಸೆ: ನೈಸರ್ಗಿಕ ಹಾಗು ರಸಾಯನಿಕ ಪರಿಹಾರಗಳು (ಪ್ರಯೋಗಿಸಲು ಸುಲಭವಾಗಿರಲಿ).\n\
             3. ತಡೆಗಟ್ಟುವಿಕೆ: ಮುಂದೆ ಈ ರೋಗ ಮತ್ತೆ ಬರದಂತೆ ಹೇಗೆ ನೋಡಿಕೊಳ್ಳಬೇಕು?\n\
             \n\
             Tone: Extremely simple, friendly and encouraging for small farmers."
        );

        match self.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!("Gemini error: {}", e);
                DISEASE_FALLBACK.to_owned()
            }
        }
    }

    /// Answer a general farming question, in simple Kannada.
    pub async fn assistant_answer(&self, question: &str) -> String {
        let prompt = format!(
            "You are 'Krishi Mitra', a helpful agricultural assistant for farmers in Karnataka.\n\
             Answer the following question in VERY SIMPLE KANNADA, using short sentences and \
             practical examples.\n\
             \n\
             Farmer's question: {question}"
        );

        match self.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!("Gemini error: {}", e);
                ASSISTANT_FALLBACK.to_owned()
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, AdvisoryError> {
        let url = format!(
            "{API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let payload = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        debug!("Sending prompt to Gemini ({} chars)", prompt.len());

        let response: Value = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = extract_text(&response).ok_or(AdvisoryError::EmptyResponse)?;
        debug!("Gemini replied ({} chars)", text.len());

        Ok(text)
    }
}

/// Choose the best model that supports generateContent, preferring the
/// known Gemini names and falling back to the first capable one.
fn pick_model(models: &[ModelEntry]) -> Option<String> {
    let capable: Vec<&ModelEntry> = models
        .iter()
        .filter(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == "generateContent")
        })
        .collect();

    for preferred in PREFERRED_MODELS {
        if let Some(found) = capable.iter().find(|m| m.name == *preferred) {
            return Some(found.name.clone());
        }
    }

    capable.first().map(|m| m.name.clone())
}

/// Join the text parts of every candidate, as the response carries them.
fn extract_text(response: &Value) -> Option<String> {
    let candidates = response.get("candidates")?.as_array()?;

    let mut collected = Vec::new();
    for candidate in candidates {
        let Some(parts) = candidate.pointer("/content/parts").and_then(Value::as_array) else {
            continue;
        };
        for part in parts {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                collected.push(text);
            }
        }
    }

    let text = collected.join("\n");
    let text = text.trim();

    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, methods: &[&str]) -> ModelEntry {
        ModelEntry {
            name: name.to_owned(),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn preferred_model_wins_over_catalog_order() {
        let models = vec![
            entry("models/gemini-1.5-pro", &["generateContent"]),
            entry("models/gemini-2.5-flash", &["generateContent"]),
        ];

        assert_eq!(
            pick_model(&models).as_deref(),
            Some("models/gemini-2.5-flash")
        );
    }

    #[test]
    fn models_without_generate_content_are_ignored() {
        let models = vec![
            entry("models/gemini-2.5-flash", &["embedContent"]),
            entry("models/gemini-1.5-pro", &["generateContent"]),
        ];

        assert_eq!(
            pick_model(&models).as_deref(),
            Some("models/gemini-1.5-pro")
        );
    }

    #[test]
    fn unknown_capable_model_is_still_usable() {
        let models = vec![entry("models/experimental-123", &["generateContent"])];

        assert_eq!(
            pick_model(&models).as_deref(),
            Some("models/experimental-123")
        );
    }

    #[test]
    fn no_capable_model_means_no_pick() {
        let models = vec![entry("models/chat-bison-001", &["generateMessage"])];

        assert_eq!(pick_model(&models), None);
    }

    #[test]
    fn catalog_parses_rest_casing() {
        let catalog: ModelCatalog = serde_json::from_value(json!({
            "models": [
                {
                    "name": "models/gemini-2.5-flash",
                    "supportedGenerationMethods": ["generateContent", "countTokens"],
                }
            ]
        }))
        .unwrap();

        assert_eq!(catalog.models.len(), 1);
        assert_eq!(
            catalog.models[0].supported_generation_methods,
            vec!["generateContent", "countTokens"]
        );
    }

    #[test]
    fn text_is_joined_across_parts() {
        let response = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "ನಮಸ್ಕಾರ" }, { "text": "ರೈತರೇ" }] } }
            ]
        });

        assert_eq!(extract_text(&response).as_deref(), Some("ನಮಸ್ಕಾರ\nರೈತರೇ"));
    }

    #[test]
    fn blank_response_yields_nothing() {
        assert_eq!(extract_text(&json!({ "candidates": [] })), None);
        assert_eq!(
            extract_text(&json!({
                "candidates": [{ "content": { "parts": [{ "text": "  \n " }] } }]
            })),
            None
        );
    }
}
