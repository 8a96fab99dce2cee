//! Imagen provider for poster generation.

use super::gemini::GEMINI_API_BASE;
use super::{GeneratedImage, ImageProvider, ProviderError};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Aspect ratios the image model accepts.
pub const SUPPORTED_ASPECT_RATIOS: [&str; 5] = ["1:1", "3:4", "4:3", "9:16", "16:9"];

pub struct ImagenProvider {
    api_key: String,
    model: String,
    client: Client,
}

impl ImagenProvider {
    pub fn new(api_key: String, model: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            model,
            client,
        })
    }
}

#[async_trait]
impl ImageProvider for ImagenProvider {
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<GeneratedImage, ProviderError> {
        if !SUPPORTED_ASPECT_RATIOS.contains(&aspect_ratio) {
            return Err(ProviderError::InvalidRequest(format!(
                "Unsupported aspect ratio: {}",
                aspect_ratio
            )));
        }

        let url = format!(
            "{}/models/{}:predict?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        );
        let body = PredictRequest {
            instances: vec![Instance {
                prompt: prompt.to_string(),
            }],
            parameters: Parameters {
                sample_count: 1,
                aspect_ratio: aspect_ratio.to_string(),
            },
        };

        tracing::debug!(model = %self.model, aspect_ratio, "Sending request to Imagen API");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => ProviderError::RateLimited,
                400 => ProviderError::InvalidRequest(error_text),
                _ => ProviderError::ApiError(format!("Imagen API error {}: {}", status, error_text)),
            });
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        decode_prediction(parsed)
    }
}

/// Imagen silently drops filtered images, so an empty prediction list means
/// the prompt was blocked.
fn decode_prediction(parsed: PredictResponse) -> Result<GeneratedImage, ProviderError> {
    let prediction = parsed
        .predictions
        .into_iter()
        .find(|p| p.bytes_base64_encoded.is_some())
        .ok_or(ProviderError::ContentFiltered)?;

    let encoded = prediction.bytes_base64_encoded.unwrap_or_default();
    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| ProviderError::ApiError(format!("Invalid image payload: {}", e)))?;

    Ok(GeneratedImage {
        mime_type: prediction
            .mime_type
            .unwrap_or_else(|| "image/png".to_string()),
        bytes,
    })
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    sample_count: u32,
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_predictions_are_filtered() {
        let parsed: PredictResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            decode_prediction(parsed),
            Err(ProviderError::ContentFiltered)
        ));
    }

    #[test]
    fn prediction_is_decoded() {
        let raw = r#"{"predictions":[{"bytesBase64Encoded":"iVBORw==","mimeType":"image/png"}]}"#;
        let parsed: PredictResponse = serde_json::from_str(raw).unwrap();
        let image = decode_prediction(parsed).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, vec![0x89, b'P', b'N', b'G']);
    }
}
