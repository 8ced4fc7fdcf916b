//! Hourly rate lookup: remote pricing source first, then a static table keyed by
//! instance class, then a fixed default.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Pricing lookup failed for {instance_class}: {reason}")]
pub struct PricingError {
    pub instance_class: String,
    pub reason: String,
}

/// Remote price query, e.g. a cloud pricing API
#[async_trait]
pub trait PricingSource: Send + Sync + Debug {
    /// On-demand hourly rate in USD; `Ok(None)` when the source has no listing
    async fn hourly_rate(&self, instance_class: &str) -> Result<Option<f64>, PricingError>;
}

/// Static on-demand Linux rates (us-east-1)
#[derive(Debug, Clone)]
pub struct StaticPriceTable {
    rates: HashMap<String, f64>,
}

impl Default for StaticPriceTable {
    fn default() -> Self {
        let rates = [
            ("t3.micro", 0.0104),
            ("t3.small", 0.0208),
            ("t3.medium", 0.0416),
            ("t3.large", 0.0832),
            ("t3.xlarge", 0.1664),
            ("t3.2xlarge", 0.3328),
            ("c5.large", 0.085),
            ("c5.xlarge", 0.17),
            ("c5.2xlarge", 0.34),
            ("m5.large", 0.096),
            ("m5.xlarge", 0.192),
            ("g4dn.xlarge", 0.526),
        ];
        Self {
            rates: rates
                .iter()
                .map(|(class, rate)| (class.to_string(), *rate))
                .collect(),
        }
    }
}

impl StaticPriceTable {
    pub fn get(&self, instance_class: &str) -> Option<f64> {
        self.rates.get(instance_class).copied()
    }

    pub fn with_rate(mut self, instance_class: impl Into<String>, rate: f64) -> Self {
        self.rates.insert(instance_class.into(), rate);
        self
    }
}

/// Resolves a rate through the fallback chain. Never fails.
#[derive(Debug, Clone)]
pub struct RateResolver {
    source: Option<Arc<dyn PricingSource>>,
    table: StaticPriceTable,
    default_rate: f64,
}

impl RateResolver {
    pub fn new(
        source: Option<Arc<dyn PricingSource>>,
        table: StaticPriceTable,
        default_rate: f64,
    ) -> Self {
        Self {
            source,
            table,
            default_rate,
        }
    }

    /// Resolver backed only by the static table and default rate
    pub fn offline(default_rate: f64) -> Self {
        Self::new(None, StaticPriceTable::default(), default_rate)
    }

    pub async fn resolve(&self, instance_class: &str) -> f64 {
        if let Some(source) = &self.source {
            match source.hourly_rate(instance_class).await {
                Ok(Some(rate)) if rate.is_finite() && rate >= 0.0 => {
                    debug!(instance_class, rate, "💰 PRICING: Rate from pricing source");
                    return rate;
                }
                Ok(_) => {
                    debug!(instance_class, "💰 PRICING: No usable listing, using fallback table");
                }
                Err(e) => {
                    warn!(instance_class, error = %e, "💰 PRICING: Pricing source failed, using fallback table");
                }
            }
        }

        self.table.get(instance_class).unwrap_or_else(|| {
            debug!(
                instance_class,
                default_rate = self.default_rate,
                "💰 PRICING: Unknown instance class, using default rate"
            );
            self.default_rate
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedSource(Result<Option<f64>, PricingError>);

    #[async_trait]
    impl PricingSource for FixedSource {
        async fn hourly_rate(&self, _instance_class: &str) -> Result<Option<f64>, PricingError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_source_rate_wins() {
        let resolver = RateResolver::new(
            Some(Arc::new(FixedSource(Ok(Some(0.5))))),
            StaticPriceTable::default(),
            0.10,
        );
        assert_eq!(resolver.resolve("m5.xlarge").await, 0.5);
    }

    #[tokio::test]
    async fn test_source_failure_falls_back_to_table() {
        let resolver = RateResolver::new(
            Some(Arc::new(FixedSource(Err(PricingError {
                instance_class: "m5.xlarge".into(),
                reason: "throttled".into(),
            })))),
            StaticPriceTable::default(),
            0.10,
        );
        assert_eq!(resolver.resolve("m5.xlarge").await, 0.192);
    }

    #[tokio::test]
    async fn test_unknown_class_uses_default() {
        let resolver = RateResolver::offline(0.10);
        assert_eq!(resolver.resolve("x9.mega").await, 0.10);
    }

    #[tokio::test]
    async fn test_negative_source_rate_is_ignored() {
        let resolver = RateResolver::new(
            Some(Arc::new(FixedSource(Ok(Some(-1.0))))),
            StaticPriceTable::default().with_rate("x9.mega", 2.0),
            0.10,
        );
        assert_eq!(resolver.resolve("x9.mega").await, 2.0);
    }
}
