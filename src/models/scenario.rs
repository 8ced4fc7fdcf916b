use serde::{Deserialize, Serialize};
use std::fmt;

/// Feature combination applied to a rendered job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Baseline,
    EffectsOnly,
    SubtitlesOnly,
    FullFeatured,
    /// Label not recognised from the service response
    #[serde(other)]
    Unknown,
}

impl Scenario {
    /// Scenario implied by the requested features
    pub fn expected(effects: bool, subtitles: bool) -> Self {
        match (effects, subtitles) {
            (false, false) => Scenario::Baseline,
            (true, false) => Scenario::EffectsOnly,
            (false, true) => Scenario::SubtitlesOnly,
            (true, true) => Scenario::FullFeatured,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Baseline => "baseline",
            Scenario::EffectsOnly => "effects_only",
            Scenario::SubtitlesOnly => "subtitles_only",
            Scenario::FullFeatured => "full_featured",
            Scenario::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_scenario_table() {
        assert_eq!(Scenario::expected(false, false), Scenario::Baseline);
        assert_eq!(Scenario::expected(true, false), Scenario::EffectsOnly);
        assert_eq!(Scenario::expected(false, true), Scenario::SubtitlesOnly);
        assert_eq!(Scenario::expected(true, true), Scenario::FullFeatured);
    }

    #[test]
    fn test_unknown_labels() {
        let parsed: Scenario = serde_json::from_str("\"cinematic\"").unwrap();
        assert_eq!(parsed, Scenario::Unknown);
        let known: Scenario = serde_json::from_str("\"subtitles_only\"").unwrap();
        assert_eq!(known, Scenario::SubtitlesOnly);
    }
}
