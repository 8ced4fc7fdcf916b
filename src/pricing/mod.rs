//! # Pricing
//!
//! Rental cost model and hourly rate resolution. A worker resolves its rate once, at
//! provisioning time, and every cost figure of its run uses that cached rate.

pub mod cost;
pub mod rates;

pub use cost::{calculate_cost, round_cost, CostBreakdown};
pub use rates::{PricingError, PricingSource, RateResolver, StaticPriceTable};
