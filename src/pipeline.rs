use std::path::PathBuf;

use anyhow::Context as _;

use crate::{
    config::GeneratorConfig,
    encode_gif::{GifConfig, encode_gif, load_frame},
    error::HeroResult,
    params::FrameParams,
    raster::Rasterizer,
    template::SceneTemplate,
};

/// The encoded animation on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub frame_count: u32,
    pub bytes: u64,
}

impl Artifact {
    pub fn size_kb(&self) -> f64 {
        self.bytes as f64 / 1024.0
    }
}

/// Renders every frame of `template` through `rasterizer` and encodes the result.
///
/// Frames are produced strictly in index order. The first failure aborts the run
/// before any later frame is attempted and before anything is written to
/// `cfg.out_path`. Scene and bitmap files stay in `cfg.scratch_dir`.
#[tracing::instrument(skip(template, rasterizer), fields(backend = rasterizer.name()))]
pub fn generate(
    cfg: &GeneratorConfig,
    template: &SceneTemplate,
    rasterizer: &dyn Rasterizer,
) -> HeroResult<Artifact> {
    cfg.validate()?;
    std::fs::create_dir_all(&cfg.scratch_dir).with_context(|| {
        format!(
            "failed to create scratch directory '{}'",
            cfg.scratch_dir.display()
        )
    })?;

    let mut bitmaps = Vec::with_capacity(cfg.frame_count as usize);
    for index in 0..cfg.frame_count {
        let params = FrameParams::at(index, cfg.frame_count)?;
        let scene = template.render_frame(&params)?;

        let (svg_path, png_path) = cfg.frame_paths(index);
        std::fs::write(&svg_path, scene)
            .with_context(|| format!("write scene '{}'", svg_path.display()))?;
        rasterizer.rasterize(&svg_path, &png_path, cfg.width, cfg.height)?;

        tracing::debug!(
            index,
            w1 = params.w1,
            w2 = params.w2,
            w3 = params.w3,
            p1 = params.p1,
            "rasterized frame"
        );
        bitmaps.push(png_path);
    }
    tracing::info!(frames = cfg.frame_count, "rasterized all frames");

    let frames = bitmaps
        .iter()
        .map(|p| load_frame(p, cfg.width, cfg.height, cfg.background_rgb))
        .collect::<HeroResult<Vec<_>>>()?;

    let bytes = encode_gif(frames, &GifConfig::from(cfg))?;
    tracing::info!(
        path = %cfg.out_path.display(),
        bytes,
        loop_ms = cfg.loop_duration_ms(),
        "wrote gif"
    );

    Ok(Artifact {
        path: cfg.out_path.clone(),
        frame_count: cfg.frame_count,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_kb_uses_binary_kilobytes() {
        let a = Artifact {
            path: PathBuf::from("hero.gif"),
            frame_count: 40,
            bytes: 1536,
        };
        assert_eq!(format!("{:.1}", a.size_kb()), "1.5");
    }
}
