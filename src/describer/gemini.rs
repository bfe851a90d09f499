use super::upload::{self, Upload};
use super::{split_response, Describer, Description};
use crate::config::AiConfig;
use crate::detector::ImageDetector;
use crate::error::AnalysisError;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Google Gemini `generateContent` client.
pub struct GeminiDescriber {
    client: reqwest::Client,
    config: AiConfig,
    fallback_stem: String,
    api_key: ArcSwapOption<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiDescriber {
    pub fn new(config: AiConfig, fallback_stem: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            fallback_stem,
            api_key: ArcSwapOption::empty(),
        })
    }

    /// Replaces the credential used by every analysis started after this call.
    pub fn set_api_key(&self, key: Option<String>) {
        let key = key.filter(|k| !k.trim().is_empty());
        log::info!(
            "Gemini API key {}",
            if key.is_some() { "updated" } else { "cleared" }
        );
        self.api_key.store(key.map(Arc::new));
    }

    fn current_key(&self) -> Result<Arc<String>, AnalysisError> {
        self.api_key
            .load_full()
            .ok_or(AnalysisError::MissingCredential)
    }

    fn request_body(&self, mime_type: &str, image: &[u8]) -> Value {
        json!({
            "contents": [{
                "parts": [
                    { "text": self.config.prompt },
                    {
                        "inline_data": {
                            "mime_type": mime_type,
                            "data": general_purpose::STANDARD.encode(image),
                        }
                    }
                ]
            }],
            "generation_config": {
                "temperature": self.config.temperature,
                "max_output_tokens": self.config.max_output_tokens,
            }
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

/// Pulls the first candidate's first text part out of a response body.
fn extract_text(body: &str) -> Result<String, AnalysisError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| AnalysisError::Parse(e.to_string()))?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| AnalysisError::Parse("response contains no text candidate".to_string()))
}

#[async_trait]
impl Describer for GeminiDescriber {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn describe(&self, path: &Path) -> Result<Description, AnalysisError> {
        let api_key = self.current_key()?;

        let image = tokio::fs::read(path)
            .await
            .map_err(|e| AnalysisError::InvalidInput {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mime_type =
            ImageDetector::detect_mime(path, &image).ok_or_else(|| AnalysisError::InvalidInput {
                path: path.to_path_buf(),
                reason: "not a recognised image format".to_string(),
            })?;

        let owned_path = path.to_path_buf();
        let Upload { mime_type, bytes } =
            tokio::task::spawn_blocking(move || upload::prepare(&owned_path, mime_type, image))
                .await
                .map_err(|e| AnalysisError::Aborted(e.to_string()))??;

        log::debug!(
            "Sending {:?} ({} bytes, {}) to {}",
            path,
            bytes.len(),
            mime_type,
            self.config.model
        );

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key.as_str())
            .json(&self.request_body(mime_type, &bytes))
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AnalysisError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let text = extract_text(&body)?;
        Ok(split_response(
            &text,
            &self.config.description_marker,
            &self.config.name_marker,
            &self.fallback_stem,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn describer() -> GeminiDescriber {
        GeminiDescriber::new(AiConfig::default(), "new_photo".to_string()).unwrap()
    }

    #[test]
    fn test_extract_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"DESCRIPTION: hi"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "DESCRIPTION: hi");
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let err = extract_text(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));

        let err = extract_text("not json").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }

    #[test]
    fn test_request_body_shape() {
        let body = describer().request_body("image/png", b"abc");
        assert_eq!(body["contents"][0]["parts"][1]["inline_data"]["data"], "YWJj");
        assert_eq!(body["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(body["generation_config"]["max_output_tokens"], 800);
    }

    #[test]
    fn test_url() {
        assert_eq!(
            describer().url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let describer = describer();
        let err = describer.describe(Path::new("/nowhere.jpg")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingCredential));

        describer.set_api_key(Some("   ".to_string()));
        let err = describer.describe(Path::new("/nowhere.jpg")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingCredential));
    }

    #[tokio::test]
    async fn test_invalid_input() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let describer = describer();
        describer.set_api_key(Some("key".to_string()));

        let err = describer
            .describe(&temp_dir.path().join("missing.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));

        let text = temp_dir.path().join("notes.txt");
        std::fs::write(&text, "plain text")?;
        let err = describer.describe(&text).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));

        // Recognised as GIF by name, but the bytes cannot be converted for upload
        let gif = temp_dir.path().join("broken.gif");
        std::fs::write(&gif, "GIF89a truncated")?;
        let err = describer.describe(&gif).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));

        Ok(())
    }
}
