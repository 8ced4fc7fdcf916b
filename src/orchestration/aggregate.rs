//! Merge per-partition outcomes into one [`AggregateResult`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{AggregateResult, DownloadedArtifact, Efficiency, PartitionReport};
use crate::orchestration::distribution::DistributionPlan;
use crate::pricing::round_cost;

/// How the aggregate `success` flag is derived from job counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessPolicy {
    /// At least one job succeeded anywhere
    #[default]
    AnySucceeded,
    /// Every job succeeded
    AllSucceeded,
}

impl SuccessPolicy {
    pub fn evaluate(&self, total_jobs: usize, succeeded_jobs: usize) -> bool {
        match self {
            SuccessPolicy::AnySucceeded => succeeded_jobs > 0,
            SuccessPolicy::AllSucceeded => total_jobs > 0 && succeeded_jobs == total_jobs,
        }
    }
}

pub fn aggregate(
    mut partitions: Vec<PartitionReport>,
    plan: DistributionPlan,
    parallel_time: Duration,
    preferred_per_worker: usize,
    policy: SuccessPolicy,
) -> AggregateResult {
    partitions.sort_by_key(|p| p.batch_id);

    let total_jobs: usize = partitions.iter().map(|p| p.result.total_jobs).sum();
    let succeeded_jobs: usize = partitions.iter().map(|p| p.result.succeeded_jobs).sum();
    let failed_jobs: usize = partitions.iter().map(|p| p.result.failed_jobs).sum();
    let total_cost_usd: f64 = partitions.iter().map(|p| p.result.best_cost_usd()).sum();
    let sequential_time_secs: f64 = partitions.iter().map(|p| p.result.total_time_secs).sum();
    let parallel_time_secs = parallel_time.as_secs_f64();
    let workers_used = plan.worker_count;

    let time_saved_secs = if workers_used > 1 {
        sequential_time_secs - parallel_time_secs
    } else {
        0.0
    };

    let mut job_results: Vec<_> = partitions
        .iter()
        .flat_map(|p| p.result.job_results.iter().cloned())
        .collect();
    job_results.sort_by(|a, b| a.job_name.cmp(&b.job_name));

    let downloaded_files = partitions
        .iter()
        .flat_map(|p| {
            p.result
                .downloaded_files
                .iter()
                .map(move |path| DownloadedArtifact {
                    batch_id: p.batch_id,
                    path: path.clone(),
                    directory: p.result.download_dir.clone(),
                })
        })
        .collect();

    let efficiency = Efficiency {
        speedup_factor: if parallel_time_secs > 0.0 {
            sequential_time_secs / parallel_time_secs
        } else {
            1.0
        },
        cost_per_job_usd: if succeeded_jobs > 0 {
            total_cost_usd / succeeded_jobs as f64
        } else {
            0.0
        },
        success_rate: if total_jobs > 0 {
            succeeded_jobs as f64 / total_jobs as f64
        } else {
            0.0
        },
    };

    AggregateResult {
        success: policy.evaluate(total_jobs, succeeded_jobs),
        total_jobs,
        succeeded_jobs,
        failed_jobs,
        total_cost_usd: round_cost(total_cost_usd),
        sequential_time_secs,
        parallel_time_secs,
        time_saved_secs,
        workers_used,
        preferred_per_worker,
        job_results,
        downloaded_files,
        partitions,
        efficiency,
        plan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobResult, RenderedArtifact, Scenario, WorkerBatchResult};
    use crate::orchestration::distribution::plan_distribution;
    use std::path::PathBuf;

    fn artifact() -> RenderedArtifact {
        RenderedArtifact {
            artifact_id: "f".into(),
            download_locator: "http://w/download/f".into(),
            size_bytes: 1,
            has_effects: true,
            has_subtitles: true,
            scenario: Scenario::FullFeatured,
            expected_scenario: Scenario::FullFeatured,
            local_path: None,
        }
    }

    fn report(batch_id: usize, prefix: &str, ok: usize, failed: usize, time: f64) -> PartitionReport {
        let mut result = WorkerBatchResult::new(ok + failed);
        for i in 0..ok {
            result.record(JobResult::succeeded(format!("{prefix}_ok_{i:02}"), 1.0, artifact()));
        }
        for i in 0..failed {
            result.record(JobResult::failed(format!("{prefix}_fail_{i:02}"), 0.0, "HTTP 500: x"));
        }
        result.total_time_secs = time;
        PartitionReport {
            batch_id,
            start_index: 0,
            end_index: ok + failed,
            result,
        }
    }

    #[test]
    fn test_mixed_partitions() {
        let plan = plan_distribution(20, 7, 3, 5).unwrap();
        let mut setup_failed = report(2, "b", 0, 10, 30.0);
        setup_failed.result.error = Some("Worker setup failed".into());

        let result = aggregate(
            vec![report(3, "c", 3, 2, 50.0), setup_failed, report(1, "a", 5, 0, 60.0)],
            plan,
            Duration::from_secs(70),
            7,
            SuccessPolicy::AnySucceeded,
        );

        assert_eq!(result.total_jobs, 20);
        assert_eq!(result.succeeded_jobs, 8);
        assert_eq!(result.failed_jobs, 12);
        assert!(result.success);
        assert_eq!(result.partitions[0].batch_id, 1);
        assert_eq!(result.sequential_time_secs, 140.0);
        assert_eq!(result.time_saved_secs, 70.0);
        assert_eq!(result.efficiency.speedup_factor, 2.0);
        assert_eq!(result.efficiency.success_rate, 0.4);
        assert_eq!(result.job_results.len(), 20);
        assert!(result
            .job_results
            .windows(2)
            .all(|pair| pair[0].job_name <= pair[1].job_name));
    }

    #[test]
    fn test_strict_policy() {
        let plan = plan_distribution(10, 5, 2, 5).unwrap();
        let result = aggregate(
            vec![report(1, "a", 5, 0, 10.0), report(2, "b", 4, 1, 10.0)],
            plan,
            Duration::from_secs(10),
            5,
            SuccessPolicy::AllSucceeded,
        );
        assert!(!result.success);
    }

    #[test]
    fn test_single_worker_saves_no_time() {
        let plan = plan_distribution(3, 10, 10, 5).unwrap();
        let result = aggregate(
            vec![report(1, "a", 3, 0, 30.0)],
            plan,
            Duration::from_secs(31),
            10,
            SuccessPolicy::default(),
        );
        assert_eq!(result.workers_used, 1);
        assert_eq!(result.time_saved_secs, 0.0);
    }

    #[test]
    fn test_zero_parallel_time_gives_unit_speedup() {
        let plan = plan_distribution(1, 10, 10, 5).unwrap();
        let result = aggregate(
            vec![report(1, "a", 0, 1, 0.0)],
            plan,
            Duration::ZERO,
            10,
            SuccessPolicy::default(),
        );
        assert_eq!(result.efficiency.speedup_factor, 1.0);
        assert_eq!(result.efficiency.cost_per_job_usd, 0.0);
        assert!(!result.success);
    }

    #[test]
    fn test_downloads_tagged_with_batch() {
        let plan = plan_distribution(2, 1, 2, 1).unwrap();
        let mut first = report(1, "a", 1, 0, 1.0);
        first.result.downloaded_files.push(PathBuf::from("out/batch_1/a.mp4"));
        first.result.download_dir = Some(PathBuf::from("out/batch_1"));
        let mut second = report(2, "b", 1, 0, 1.0);
        second.result.downloaded_files.push(PathBuf::from("out/batch_2/b.mp4"));

        let result = aggregate(
            vec![second, first],
            plan,
            Duration::from_secs(1),
            1,
            SuccessPolicy::default(),
        );
        assert_eq!(result.downloaded_files.len(), 2);
        assert_eq!(result.downloaded_files[0].batch_id, 1);
        assert_eq!(
            result.downloaded_files[0].directory,
            Some(PathBuf::from("out/batch_1"))
        );
        assert_eq!(result.downloaded_files[1].batch_id, 2);
    }
}
