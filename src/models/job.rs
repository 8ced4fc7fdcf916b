//! Jobs and the batch-wide rendering options they inherit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CloudburstError, Result};
use crate::models::Scenario;

/// One unit of rendering work: image + audio (+ optional caption track) → video artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    name: String,
    image: PathBuf,
    audio: PathBuf,
    caption: Option<PathBuf>,
}

impl Job {
    /// Create a job. The name must be non-empty since it keys the output artifact.
    pub fn new(
        name: impl Into<String>,
        image: impl Into<PathBuf>,
        audio: impl Into<PathBuf>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CloudburstError::InvalidJob(
                "job name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name,
            image: image.into(),
            audio: audio.into(),
            caption: None,
        })
    }

    /// Attach a caption (subtitle) track
    pub fn with_caption(mut self, caption: impl Into<PathBuf>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &Path {
        &self.image
    }

    pub fn audio(&self) -> &Path {
        &self.audio
    }

    pub fn caption(&self) -> Option<&Path> {
        self.caption.as_deref()
    }
}

/// Narration/subtitle language understood by the render service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Chinese,
    English,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Chinese => write!(f, "chinese"),
            Language::English => write!(f, "english"),
        }
    }
}

/// Optional feature toggles applied to every job of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectFlags {
    /// Zoom in/out effects
    pub zoom: bool,
    /// Burn in the job's caption track when it has one
    pub subtitles: bool,
}

impl Default for EffectFlags {
    fn default() -> Self {
        Self {
            zoom: true,
            subtitles: true,
        }
    }
}

impl EffectFlags {
    /// Scenario the service should detect for a job under these flags
    pub fn expected_scenario(&self, job_has_caption: bool) -> Scenario {
        Scenario::expected(self.zoom, self.subtitles && job_has_caption)
    }
}

/// Batch-wide rendering options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub language: Language,
    pub effects: EffectFlags,
    pub is_portrait: bool,
    pub watermark: Option<PathBuf>,
}

impl RenderOptions {
    pub fn new(language: Language, effects: EffectFlags) -> Self {
        Self {
            language,
            effects,
            ..Self::default()
        }
    }
}
