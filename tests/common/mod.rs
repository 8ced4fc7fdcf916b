#![allow(dead_code)]

pub mod mock_provider;
pub mod mock_render;

pub use mock_provider::*;
pub use mock_render::*;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use cloudburst_core::config::CloudburstConfig;
use cloudburst_core::models::Job;
use cloudburst_core::orchestration::WorkerLifecycle;

/// Configuration with millisecond polling and no cooldown, writing under `results_dir`
pub fn fast_config(results_dir: &Path) -> CloudburstConfig {
    let mut config = CloudburstConfig::default();
    config.provisioning.network_poll_interval_ms = 1;
    config.provisioning.network_max_polls = 5;
    config.service.api_timeout_minutes = 1;
    config.service.health_poll_interval_ms = 1;
    config.service.health_request_timeout_seconds = 1;
    config.service.request_timeout_seconds = 5;
    config.service.download_timeout_seconds = 5;
    config.batch.job_cooldown_ms = 0;
    config.batch.results_dir = results_dir.to_path_buf();
    config
}

pub fn lifecycle(
    provider: &MockComputeProvider,
    render: &MockRenderService,
    config: CloudburstConfig,
) -> WorkerLifecycle {
    WorkerLifecycle::new(
        Arc::new(provider.clone()),
        Arc::new(render.clone()),
        Arc::new(config),
    )
}

/// Write `count` scenes (`scene_001`...) under `dir` and return their jobs. Every second
/// scene gets a caption track when `captions` is set.
pub fn write_jobs(dir: &Path, count: usize, captions: bool) -> Vec<Job> {
    fs::create_dir_all(dir).unwrap();
    (1..=count)
        .map(|i| {
            let name = format!("scene_{i:03}");
            let image = dir.join(format!("{name}.png"));
            let audio = dir.join(format!("{name}.mp3"));
            fs::write(&image, format!("image-{i}")).unwrap();
            fs::write(&audio, format!("audio-{i}")).unwrap();
            let job = Job::new(name.clone(), image, audio).unwrap();
            if captions && i % 2 == 0 {
                let caption = dir.join(format!("{name}.srt"));
                fs::write(&caption, "1\n00:00:00,000 --> 00:00:01,000\ncaption\n").unwrap();
                job.with_caption(caption)
            } else {
                job
            }
        })
        .collect()
}
