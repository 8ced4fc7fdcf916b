//! # Provider Error Classification
//!
//! Decides how the lifecycle reacts to a provider failure: capacity/quota errors are
//! recovered by substituting a fallback profile, not-found errors during termination mean
//! the instance is already gone, everything else is permanent.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ProviderError;
use crate::constants::{CAPACITY_ERROR_MARKERS, NOT_FOUND_ERROR_MARKERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorClass {
    /// Capacity or quota exhaustion - retry on a different profile
    Capacity,
    /// The referenced instance does not exist
    NotFound,
    /// Anything else - do not retry
    Permanent,
}

impl fmt::Display for ProviderErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorClass::Capacity => write!(f, "Capacity"),
            ProviderErrorClass::NotFound => write!(f, "Not Found"),
            ProviderErrorClass::Permanent => write!(f, "Permanent"),
        }
    }
}

/// Classify by error code first, then by markers embedded in the message
pub fn classify_provider_error(error: &ProviderError) -> ProviderErrorClass {
    let haystacks = error
        .code
        .as_deref()
        .into_iter()
        .chain(std::iter::once(error.message.as_str()));

    for text in haystacks {
        if CAPACITY_ERROR_MARKERS.iter().any(|m| text.contains(m)) {
            return ProviderErrorClass::Capacity;
        }
        if NOT_FOUND_ERROR_MARKERS.iter().any(|m| text.contains(m)) {
            return ProviderErrorClass::NotFound;
        }
    }
    ProviderErrorClass::Permanent
}
