//! # Hardware Profiles
//!
//! Ranked instance configurations and the fallback list used when a primary profile is
//! unavailable in the region or fails to provision for capacity reasons.
//!
//! Substitution never mutates a shared profile: [`ResolvedProfile::substitute`] returns a new
//! value carrying the record of what was replaced and why.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad hardware category of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileCategory {
    CpuOptimized,
    MemoryOptimized,
    GpuOptimized,
    Fallback,
}

impl fmt::Display for ProfileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileCategory::CpuOptimized => write!(f, "CPU-Optimized"),
            ProfileCategory::MemoryOptimized => write!(f, "Memory-Optimized"),
            ProfileCategory::GpuOptimized => write!(f, "GPU-Optimized"),
            ProfileCategory::Fallback => write!(f, "Fallback"),
        }
    }
}

/// A named hardware/cost configuration for a worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareProfile {
    /// Rank within its list (1-based); fallbacks are ranked by list order
    pub priority: u8,
    /// Provider instance class, e.g. `c5.2xlarge`
    pub instance_class: String,
    pub name: String,
    pub description: String,
    pub category: ProfileCategory,
    pub cost_efficiency: String,
}

impl HardwareProfile {
    pub fn new(
        priority: u8,
        instance_class: &str,
        name: &str,
        description: &str,
        category: ProfileCategory,
        cost_efficiency: &str,
    ) -> Self {
        Self {
            priority,
            instance_class: instance_class.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category,
            cost_efficiency: cost_efficiency.to_string(),
        }
    }
}

/// Ordered primary profiles plus ordered fallbacks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileCatalog {
    primary: Vec<HardwareProfile>,
    fallbacks: Vec<HardwareProfile>,
}

impl Default for ProfileCatalog {
    fn default() -> Self {
        Self {
            primary: vec![
                HardwareProfile::new(
                    1,
                    "c5.2xlarge",
                    "CPU_HIGH_PERFORMANCE",
                    "Compute optimized - 8 vCPU, 16GB RAM",
                    ProfileCategory::CpuOptimized,
                    "Medium",
                ),
                HardwareProfile::new(
                    2,
                    "m5.xlarge",
                    "MEMORY_OPTIMIZED",
                    "Memory optimized - 4 vCPU, 16GB RAM",
                    ProfileCategory::MemoryOptimized,
                    "Best",
                ),
                HardwareProfile::new(
                    3,
                    "g4dn.xlarge",
                    "GPU_NVIDIA_T4",
                    "NVIDIA T4 - 4 vCPU, 16GB RAM, 16GB GPU",
                    ProfileCategory::GpuOptimized,
                    "High",
                ),
            ],
            fallbacks: vec![
                HardwareProfile::new(
                    1,
                    "t3.xlarge",
                    "FALLBACK_GENERAL",
                    "General purpose - 4 vCPU, 16GB RAM",
                    ProfileCategory::Fallback,
                    "Medium",
                ),
                HardwareProfile::new(
                    2,
                    "t3.large",
                    "FALLBACK_SMALL",
                    "General purpose - 2 vCPU, 8GB RAM",
                    ProfileCategory::Fallback,
                    "High",
                ),
                HardwareProfile::new(
                    3,
                    "m5.large",
                    "FALLBACK_MEMORY",
                    "Memory optimized - 2 vCPU, 8GB RAM",
                    ProfileCategory::Fallback,
                    "Medium",
                ),
            ],
        }
    }
}

impl ProfileCatalog {
    /// Build a catalog from explicit lists. Returns `None` when `primary` is empty.
    pub fn new(primary: Vec<HardwareProfile>, fallbacks: Vec<HardwareProfile>) -> Option<Self> {
        if primary.is_empty() {
            return None;
        }
        Some(Self { primary, fallbacks })
    }

    /// Profile at the requested 1-based priority. Out-of-range priorities silently
    /// select the default (first) profile.
    pub fn select(&self, priority: u8) -> &HardwareProfile {
        let index = usize::from(priority).wrapping_sub(1);
        self.primary.get(index).unwrap_or(&self.primary[0])
    }

    pub fn fallbacks(&self) -> &[HardwareProfile] {
        &self.fallbacks
    }

    /// First fallback whose instance class is not in `tried`
    pub fn next_untried_fallback(&self, tried: &[String]) -> Option<&HardwareProfile> {
        self.fallbacks
            .iter()
            .find(|fallback| !tried.iter().any(|t| t == &fallback.instance_class))
    }
}

/// The profile a worker actually runs on, with its substitution history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedProfile {
    pub profile: HardwareProfile,
    /// Instance class originally requested, when a fallback was substituted
    pub substituted_from: Option<String>,
    pub substitution_reason: Option<String>,
}

impl ResolvedProfile {
    pub fn requested(profile: HardwareProfile) -> Self {
        Self {
            profile,
            substituted_from: None,
            substitution_reason: None,
        }
    }

    /// Replace the profile with `fallback`, keeping the first originally requested class
    pub fn substitute(&self, fallback: &HardwareProfile, reason: impl Into<String>) -> Self {
        Self {
            profile: fallback.clone(),
            substituted_from: Some(
                self.substituted_from
                    .clone()
                    .unwrap_or_else(|| self.profile.instance_class.clone()),
            ),
            substitution_reason: Some(reason.into()),
        }
    }

    pub fn instance_class(&self) -> &str {
        &self.profile.instance_class
    }

    pub fn is_substituted(&self) -> bool {
        self.substituted_from.is_some()
    }
}
