//! # Scene Folder Discovery
//!
//! Builds a job list from a folder laid out as:
//!
//! ```text
//! project/
//! ├── images/scene_001.png
//! └── audio/scene_001.mp3
//!           scene_001.srt   (optional caption track)
//! ```
//!
//! An image without matching audio is skipped.

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::constants::scenes::{
    AUDIO_DIR, AUDIO_EXTENSION, CAPTION_EXTENSION, IMAGES_DIR, IMAGE_EXTENSION, SCENE_PREFIX,
};
use crate::error::{CloudburstError, Result};
use crate::models::Job;

/// Scan `folder` for scenes, sorted by name
pub fn scan_scene_folder(folder: impl AsRef<Path>) -> Result<Vec<Job>> {
    let folder = folder.as_ref();
    let images_dir = folder.join(IMAGES_DIR);
    let audio_dir = folder.join(AUDIO_DIR);
    if !images_dir.is_dir() || !audio_dir.is_dir() {
        return Err(CloudburstError::SceneDiscovery(format!(
            "Missing {IMAGES_DIR}/ or {AUDIO_DIR}/ directories in {}",
            folder.display()
        )));
    }

    let mut names: Vec<String> = fs::read_dir(&images_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(IMAGE_EXTENSION))
        })
        .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
        .filter(|stem| stem.starts_with(SCENE_PREFIX))
        .collect();
    names.sort();

    let mut jobs = Vec::with_capacity(names.len());
    for name in names {
        let image = images_dir.join(format!("{name}.{IMAGE_EXTENSION}"));
        let audio = audio_dir.join(format!("{name}.{AUDIO_EXTENSION}"));
        if !audio.is_file() {
            warn!(scene = %name, "📽️ SCENES: No matching audio, skipping");
            continue;
        }
        let caption = audio_dir.join(format!("{name}.{CAPTION_EXTENSION}"));
        let has_caption = caption.is_file();
        debug!(scene = %name, has_caption, "📽️ SCENES: Found scene");

        let job = Job::new(name, image, audio)?;
        jobs.push(if has_caption {
            job.with_caption(caption)
        } else {
            job
        });
    }

    info!(folder = %folder.display(), scenes = jobs.len(), "📽️ SCENES: Scan complete");
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_scan_matches_audio_and_optional_captions() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        let audio = dir.path().join("audio");
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(&audio).unwrap();

        touch(&images.join("scene_002.png"));
        touch(&images.join("scene_001.png"));
        touch(&images.join("scene_003.png"));
        touch(&images.join("cover.png"));
        touch(&audio.join("scene_001.mp3"));
        touch(&audio.join("scene_001.srt"));
        touch(&audio.join("scene_002.mp3"));

        let jobs = scan_scene_folder(dir.path()).unwrap();
        let names: Vec<&str> = jobs.iter().map(Job::name).collect();

        assert_eq!(names, vec!["scene_001", "scene_002"]);
        assert!(jobs[0].caption().is_some());
        assert!(jobs[1].caption().is_none());
    }

    #[test]
    fn test_missing_directories_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = scan_scene_folder(dir.path()).unwrap_err();
        assert!(matches!(err, CloudburstError::SceneDiscovery(_)));
    }
}
