use std::path::PathBuf;

use crate::error::{HeroError, HeroResult};

pub const FRAME_COUNT: u32 = 40;
pub const WIDTH: u32 = 780;
pub const HEIGHT: u32 = 400;
/// 40 frames at 100 ms gives a four second loop.
pub const FRAME_DELAY_MS: u32 = 100;
/// Matches the darkest stop of the scene's background gradient.
pub const BACKGROUND_RGB: [u8; 3] = [10, 15, 26];
pub const SCRATCH_DIR_NAME: &str = "gif-frames";
pub const OUT_PATH: &str = "blog/images/git-worktrees-hero.gif";

// GIF logical screen dimensions are 16-bit.
const MAX_DIM: u32 = u16::MAX as u32;

/// Everything a generator run needs, assembled by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    pub frame_count: u32,
    pub width: u32,
    pub height: u32,
    pub frame_delay_ms: u32,
    pub background_rgb: [u8; 3],
    pub scratch_dir: PathBuf,
    pub out_path: PathBuf,
}

impl GeneratorConfig {
    /// The blog hero animation, built from the crate constants.
    pub fn hero() -> Self {
        Self {
            frame_count: FRAME_COUNT,
            width: WIDTH,
            height: HEIGHT,
            frame_delay_ms: FRAME_DELAY_MS,
            background_rgb: BACKGROUND_RGB,
            scratch_dir: std::env::temp_dir().join(SCRATCH_DIR_NAME),
            out_path: PathBuf::from(OUT_PATH),
        }
    }

    pub fn validate(&self) -> HeroResult<()> {
        if self.frame_count == 0 {
            return Err(HeroError::validation("frame_count must be non-zero"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(HeroError::validation("width/height must be non-zero"));
        }
        if self.width > MAX_DIM || self.height > MAX_DIM {
            return Err(HeroError::validation(format!(
                "frame size {}x{} exceeds gif limit {MAX_DIM}x{MAX_DIM}",
                self.width, self.height
            )));
        }
        if self.frame_delay_ms == 0 {
            return Err(HeroError::validation("frame_delay_ms must be non-zero"));
        }
        if self.out_path.file_name().is_none() {
            return Err(HeroError::validation(format!(
                "output path '{}' has no file name",
                self.out_path.display()
            )));
        }
        Ok(())
    }

    pub fn with_out_path(mut self, out_path: impl Into<PathBuf>) -> Self {
        self.out_path = out_path.into();
        self
    }

    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir.into();
        self
    }

    /// Scene and bitmap paths for one frame inside the scratch directory.
    pub fn frame_paths(&self, index: u32) -> (PathBuf, PathBuf) {
        (
            self.scratch_dir.join(format!("frame_{index:03}.svg")),
            self.scratch_dir.join(format!("frame_{index:03}.png")),
        )
    }

    /// Total loop length in milliseconds.
    pub fn loop_duration_ms(&self) -> u64 {
        u64::from(self.frame_count) * u64::from(self.frame_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hero_config_is_valid() {
        let cfg = GeneratorConfig::hero();
        cfg.validate().unwrap();
        assert_eq!(cfg.frame_count, 40);
        assert_eq!((cfg.width, cfg.height), (780, 400));
        assert_eq!(cfg.loop_duration_ms(), 4_000);
        assert!(cfg.scratch_dir.ends_with("gif-frames"));
    }

    #[test]
    fn validation_catches_bad_values() {
        let base = GeneratorConfig::hero();

        let mut cfg = base.clone();
        cfg.frame_count = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.height = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.width = 70_000;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.frame_delay_ms = 0;
        assert!(cfg.validate().is_err());

        for path in ["..", "/", "blog/images/.."] {
            let cfg = base.clone().with_out_path(path);
            let err = cfg.validate().unwrap_err();
            assert!(err.to_string().contains("has no file name"), "{path}: {err}");
        }
    }

    #[test]
    fn frame_paths_are_zero_padded() {
        let cfg = GeneratorConfig::hero().with_scratch_dir("/scratch");
        let (svg, png) = cfg.frame_paths(7);
        assert_eq!(svg, PathBuf::from("/scratch/frame_007.svg"));
        assert_eq!(png, PathBuf::from("/scratch/frame_007.png"));
    }
}
