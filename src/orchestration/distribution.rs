//! # Distribution Planner
//!
//! Pure, deterministic sizing of a parallel run: how many workers to rent and how many
//! contiguous jobs each one takes. Partition sizes always sum to the job count, differ by at
//! most one, and never exceed the worker cap.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::OrchestrationError;
use crate::models::Job;

/// Tolerance, in jobs per worker, within which a plan counts as optimal
const OPTIMAL_TOLERANCE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Job count saturates the worker cap; preferred size is overridden
    LargeBatch,
    /// Average partition within tolerance of the preferred size
    Optimal,
    /// Valid split that misses the preferred size by more than the tolerance
    Adjusted,
    /// Too few jobs to split while honouring the minimum partition size
    SingleWorker,
    Empty,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::LargeBatch => write!(f, "large_batch"),
            Strategy::Optimal => write!(f, "optimal"),
            Strategy::Adjusted => write!(f, "adjusted"),
            Strategy::SingleWorker => write!(f, "single_worker"),
            Strategy::Empty => write!(f, "empty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionPlan {
    pub worker_count: usize,
    pub partition_sizes: Vec<usize>,
    pub strategy: Strategy,
    /// Human-readable description, e.g. `4 workers (6-6 jobs each)`
    pub label: String,
    pub warnings: Vec<String>,
}

impl DistributionPlan {
    pub fn total_jobs(&self) -> usize {
        self.partition_sizes.iter().sum()
    }

    pub fn average_per_worker(&self) -> f64 {
        if self.worker_count == 0 {
            0.0
        } else {
            self.total_jobs() as f64 / self.worker_count as f64
        }
    }

    fn empty() -> Self {
        Self {
            worker_count: 0,
            partition_sizes: Vec::new(),
            strategy: Strategy::Empty,
            label: "no jobs".to_string(),
            warnings: Vec::new(),
        }
    }
}

/// One worker's contiguous slice of the job list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// 1-based
    pub batch_id: usize,
    pub jobs: Vec<Job>,
    /// Inclusive global index of the first job
    pub start_index: usize,
    /// Exclusive global index after the last job
    pub end_index: usize,
}

/// Plan how to split `total_jobs` across workers.
///
/// Three cases, checked in order:
/// 1. `total_jobs >= preferred * max_workers`: use every worker, spread the remainder over
///    the first partitions.
/// 2. Otherwise search from `max_workers` down to two workers for the largest count whose
///    smallest partition still holds at least `min_per_worker` jobs.
/// 3. Otherwise one worker takes everything.
pub fn plan_distribution(
    total_jobs: usize,
    preferred_per_worker: usize,
    max_workers: usize,
    min_per_worker: usize,
) -> Result<DistributionPlan, OrchestrationError> {
    if preferred_per_worker == 0 {
        return Err(OrchestrationError::InvalidDistribution(
            "preferred_per_worker must be at least 1".to_string(),
        ));
    }
    if max_workers == 0 {
        return Err(OrchestrationError::InvalidDistribution(
            "max_workers must be at least 1".to_string(),
        ));
    }
    if total_jobs == 0 {
        return Ok(DistributionPlan::empty());
    }

    let mut warnings = Vec::new();

    if total_jobs >= preferred_per_worker.saturating_mul(max_workers) {
        let sizes = even_split(total_jobs, max_workers);
        let label = range_label(&sizes);
        warnings.push(format!(
            "Overriding preferred_per_worker={preferred_per_worker} to fit {total_jobs} jobs on {max_workers} workers ({} jobs each)",
            size_range(&sizes)
        ));
        return Ok(DistributionPlan {
            worker_count: max_workers,
            partition_sizes: sizes,
            strategy: Strategy::LargeBatch,
            label,
            warnings,
        });
    }

    let floor = min_per_worker.max(1);
    for workers in (2..=max_workers).rev() {
        if total_jobs / workers < floor {
            continue;
        }
        let sizes = even_split(total_jobs, workers);
        let average = total_jobs as f64 / workers as f64;
        let strategy = if (average - preferred_per_worker as f64).abs() <= OPTIMAL_TOLERANCE {
            Strategy::Optimal
        } else {
            warnings.push(format!(
                "Using {average:.1} jobs per worker instead of preferred {preferred_per_worker}"
            ));
            Strategy::Adjusted
        };
        return Ok(DistributionPlan {
            worker_count: workers,
            label: range_label(&sizes),
            partition_sizes: sizes,
            strategy,
            warnings,
        });
    }

    warnings.push(format!(
        "Only {total_jobs} jobs (< {}), using a single worker",
        floor * 2
    ));
    Ok(DistributionPlan {
        worker_count: 1,
        partition_sizes: vec![total_jobs],
        strategy: Strategy::SingleWorker,
        label: format!("1 worker ({total_jobs} jobs)"),
        warnings,
    })
}

/// Slice `jobs` into contiguous partitions following `plan`
pub fn partition_jobs(jobs: &[Job], plan: &DistributionPlan) -> Vec<Partition> {
    let mut start = 0;
    plan.partition_sizes
        .iter()
        .enumerate()
        .map(|(index, size)| {
            let end = (start + size).min(jobs.len());
            let partition = Partition {
                batch_id: index + 1,
                jobs: jobs[start..end].to_vec(),
                start_index: start,
                end_index: end,
            };
            start = end;
            partition
        })
        .collect()
}

fn even_split(total: usize, workers: usize) -> Vec<usize> {
    let base = total / workers;
    let remainder = total % workers;
    (0..workers)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

fn size_range(sizes: &[usize]) -> String {
    let min = sizes.iter().min().copied().unwrap_or(0);
    let max = sizes.iter().max().copied().unwrap_or(0);
    if min == max {
        min.to_string()
    } else {
        format!("{min}-{max}")
    }
}

fn range_label(sizes: &[usize]) -> String {
    format!("{} workers ({} jobs each)", sizes.len(), size_range(sizes))
}
