//! OpenAI-compatible embedding and chat client

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use vidflow_common::config::AnalysisConfig;
use vidflow_common::titulin::vector::round_confidence;
use vidflow_common::titulin::Classification;
use vidflow_common::{Error, Result};

use super::{EmbeddingProvider, TitleClassifier};

const SYSTEM_PROMPT: &str = "Eres un asistente especializado en análisis de contenido de YouTube. \
Tu tarea es determinar si un título es 'evergreen' (contenido atemporal) o no.";

pub struct OpenAiAnalysis {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    chat_model: String,
}

impl OpenAiAnalysis {
    pub fn new(config: &AnalysisConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
        }
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, endpoint))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::External(format!("Analysis request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::External(format!("Analysis API error {}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| Error::External(format!("Invalid analysis response: {}", e)))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiAnalysis {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({
            "model": self.embedding_model,
            "input": text,
        });
        let result = self.post("embeddings", &body).await?;

        let embedding: Vec<f32> = result["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| Error::External("Invalid embedding response format".into()))?
            .iter()
            .filter_map(|v| v.as_f64())
            .map(|v| v as f32)
            .collect();

        if embedding.is_empty() {
            return Err(Error::External("Empty embedding returned".into()));
        }
        debug!("Embedded {} chars into {} dimensions", text.len(), embedding.len());
        Ok(embedding)
    }
}

#[async_trait]
impl TitleClassifier for OpenAiAnalysis {
    async fn classify(&self, prompt: &str) -> Result<Classification> {
        let body = json!({
            "model": self.chat_model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "temperature": 0.1,
            "response_format": {"type": "json_object"},
        });
        let result = self.post("chat/completions", &body).await?;

        let content = result["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| Error::External("Classifier returned no content".into()))?;
        parse_classification(content)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClassification {
    #[serde(default)]
    is_evergreen: bool,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reason: Option<String>,
}

/// Parse the classifier's JSON answer, rounding confidence to two decimals
pub fn parse_classification(content: &str) -> Result<Classification> {
    let raw: RawClassification = serde_json::from_str(content.trim())
        .map_err(|e| Error::External(format!("Unparseable classifier answer: {}", e)))?;

    Ok(Classification {
        is_evergreen: raw.is_evergreen,
        confidence: round_confidence(raw.confidence),
        reason: raw
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "Error al analizar el título".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classification_rounds_confidence() {
        let c = parse_classification(
            r#"{"isEvergreen": true, "confidence": 0.8765, "reason": "Tutorial atemporal"}"#,
        )
        .unwrap();
        assert!(c.is_evergreen);
        assert_eq!(c.confidence, 0.88);
        assert_eq!(c.reason, "Tutorial atemporal");
    }

    #[test]
    fn test_parse_classification_defaults() {
        let c = parse_classification(r#"{"confidence": 1.7}"#).unwrap();
        assert!(!c.is_evergreen);
        assert_eq!(c.confidence, 1.0);
        assert_eq!(c.reason, "Error al analizar el título");
    }

    #[test]
    fn test_parse_classification_rejects_prose() {
        assert!(parse_classification("Es evergreen").is_err());
    }
}
