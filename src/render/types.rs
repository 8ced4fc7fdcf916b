//! Render service wire types.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::constants::service;
use crate::error::RenderError;
use crate::models::{Job, RenderOptions, Scenario};

/// Base URL of one worker's render service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    base_url: String,
}

impl ServiceEndpoint {
    pub fn for_address(address: &str, port: u16) -> Self {
        Self {
            base_url: format!("http://{address}:{port}"),
        }
    }

    pub fn from_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Where an artifact can be fetched once rendered
    pub fn download_locator(&self, artifact_id: &str) -> String {
        format!("{}{}/{}", self.base_url, service::DOWNLOAD_PATH, artifact_id)
    }
}

/// Body of `POST /create_video_onestep`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub input_image: String,
    pub input_audio: String,
    pub language: String,
    pub background_box: bool,
    pub background_opacity: f64,
    pub output_filename: String,
    pub is_portrait: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,
}

impl RenderRequest {
    /// Build the request for `job`, reading and encoding its inputs.
    ///
    /// Image, audio and (when subtitles are enabled) caption are mandatory once referenced; a
    /// read failure fails the job. A missing or unreadable watermark is only logged.
    pub async fn for_job(job: &Job, options: &RenderOptions) -> Result<Self, RenderError> {
        let input_image = encode_file(job.image()).await?;
        let input_audio = encode_file(job.audio()).await?;

        let subtitle = match job.caption() {
            Some(caption) if options.effects.subtitles => Some(encode_file(caption).await?),
            _ => None,
        };

        let watermark = match &options.watermark {
            Some(path) => match encode_file(path).await {
                Ok(encoded) => Some(encoded),
                Err(e) => {
                    warn!(job = job.name(), error = %e, "🎬 RENDER: Skipping watermark");
                    None
                }
            },
            None => None,
        };

        let effects = options.effects.zoom.then(|| {
            service::ZOOM_EFFECTS
                .iter()
                .map(|effect| effect.to_string())
                .collect()
        });

        Ok(Self {
            input_image,
            input_audio,
            language: options.language.to_string(),
            background_box: true,
            background_opacity: service::BACKGROUND_OPACITY,
            output_filename: format!(
                "{}_{}.{}",
                job.name(),
                chrono::Local::now().format("%H%M%S"),
                service::ARTIFACT_EXTENSION
            ),
            is_portrait: options.is_portrait,
            effects,
            subtitle,
            watermark,
        })
    }

    pub fn has_effects(&self) -> bool {
        self.effects.as_ref().is_some_and(|e| !e.is_empty())
    }

    pub fn has_subtitle(&self) -> bool {
        self.subtitle.is_some()
    }

    /// Scenario the service should detect for this request
    pub fn expected_scenario(&self) -> Scenario {
        Scenario::expected(self.has_effects(), self.has_subtitle())
    }

    /// JSON copy with encoded payloads replaced by their lengths
    pub fn redacted(&self) -> serde_json::Value {
        let mut value = serde_json::json!({
            "language": self.language,
            "background_box": self.background_box,
            "background_opacity": self.background_opacity,
            "output_filename": self.output_filename,
            "is_portrait": self.is_portrait,
            "input_image": placeholder(&self.input_image),
            "input_audio": placeholder(&self.input_audio),
        });
        if let Some(map) = value.as_object_mut() {
            if let Some(effects) = &self.effects {
                map.insert("effects".into(), serde_json::json!(effects));
            }
            if let Some(subtitle) = &self.subtitle {
                map.insert("subtitle".into(), placeholder(subtitle).into());
            }
            if let Some(watermark) = &self.watermark {
                map.insert("watermark".into(), placeholder(watermark).into());
            }
        }
        value
    }
}

fn placeholder(encoded: &str) -> String {
    format!("[BASE64: {} chars]", encoded.len())
}

async fn encode_file(path: &Path) -> Result<String, RenderError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| RenderError::InputRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    Ok(STANDARD.encode(bytes))
}

/// Successful render response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub file_id: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default = "unreported_scenario")]
    pub scenario: Scenario,
}

fn unreported_scenario() -> Scenario {
    Scenario::Unknown
}

/// Body of `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HealthResponse {
    #[serde(default)]
    pub status: String,
}
