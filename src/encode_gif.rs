use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use image::{
    Delay, Frame, RgbaImage,
    codecs::gif::{GifEncoder, Repeat},
};

use crate::{
    config::GeneratorConfig,
    error::{HeroError, HeroResult},
};

/// NeuQuant sampling speed, 1 (best) ..= 30 (fastest).
pub const DEFAULT_QUANTIZE_SPEED: i32 = 10;

#[derive(Clone, Debug)]
pub struct GifConfig {
    pub width: u32,
    pub height: u32,
    /// Stored by the format in 10 ms units; other values are rounded.
    pub frame_delay_ms: u32,
    pub quantize_speed: i32,
    pub out_path: PathBuf,
}

impl GifConfig {
    pub fn validate(&self) -> HeroResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(HeroError::validation("gif width/height must be non-zero"));
        }
        if self.frame_delay_ms == 0 {
            return Err(HeroError::validation("gif frame delay must be non-zero"));
        }
        if !(1..=30).contains(&self.quantize_speed) {
            return Err(HeroError::validation(format!(
                "gif quantize speed {} out of range 1..=30",
                self.quantize_speed
            )));
        }
        if self.out_path.file_name().is_none() {
            return Err(HeroError::validation(format!(
                "gif output path '{}' has no file name",
                self.out_path.display()
            )));
        }
        Ok(())
    }
}

impl From<&GeneratorConfig> for GifConfig {
    fn from(cfg: &GeneratorConfig) -> Self {
        Self {
            width: cfg.width,
            height: cfg.height,
            frame_delay_ms: cfg.frame_delay_ms,
            quantize_speed: DEFAULT_QUANTIZE_SPEED,
            out_path: cfg.out_path.clone(),
        }
    }
}

pub fn ensure_parent_dir(path: &Path) -> HeroResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Composites straight-alpha pixels over an opaque background. GIF has no
/// partial transparency, so every output pixel has alpha 255.
pub fn flatten_onto_background(src: &RgbaImage, bg_rgb: [u8; 3]) -> RgbaImage {
    let mut out = src.clone();
    for px in out.pixels_mut() {
        let a = px.0[3] as u16;
        if a == 255 {
            continue;
        }
        let inv = 255u16 - a;
        for (c, bg) in px.0[..3].iter_mut().zip(bg_rgb) {
            *c = (mul_div255(*c as u16, a) + mul_div255(bg as u16, inv)).min(255) as u8;
        }
        px.0[3] = 255;
    }
    out
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Decodes a rasterized frame and flattens it for encoding.
pub fn load_frame(path: &Path, width: u32, height: u32, bg_rgb: [u8; 3]) -> HeroResult<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("decode frame '{}'", path.display()))?
        .to_rgba8();
    if img.dimensions() != (width, height) {
        return Err(HeroError::validation(format!(
            "frame '{}' is {}x{}, expected {width}x{height}",
            path.display(),
            img.width(),
            img.height()
        )));
    }
    Ok(flatten_onto_background(&img, bg_rgb))
}

/// Encodes `frames` in order as an infinitely looping GIF and returns its size in bytes.
///
/// The file is written next to `out_path` and renamed into place once complete, so a
/// failed encode never replaces an existing artifact.
pub fn encode_gif(frames: Vec<RgbaImage>, cfg: &GifConfig) -> HeroResult<u64> {
    cfg.validate()?;
    if frames.is_empty() {
        return Err(HeroError::validation("cannot encode a gif with no frames"));
    }
    for (i, f) in frames.iter().enumerate() {
        if f.dimensions() != (cfg.width, cfg.height) {
            return Err(HeroError::validation(format!(
                "frame {i} size mismatch: got {}x{}, expected {}x{}",
                f.width(),
                f.height(),
                cfg.width,
                cfg.height
            )));
        }
    }

    ensure_parent_dir(&cfg.out_path)?;
    let partial = partial_path(&cfg.out_path)?;

    if let Err(e) = write_frames(&partial, frames, cfg) {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }

    let moved = std::fs::rename(&partial, &cfg.out_path).with_context(|| {
        format!(
            "move '{}' into place at '{}'",
            partial.display(),
            cfg.out_path.display()
        )
    });
    if moved.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    moved?;

    let bytes = std::fs::metadata(&cfg.out_path)
        .with_context(|| format!("stat '{}'", cfg.out_path.display()))?
        .len();
    Ok(bytes)
}

fn partial_path(out_path: &Path) -> HeroResult<PathBuf> {
    let mut name = out_path
        .file_name()
        .ok_or_else(|| {
            HeroError::validation(format!(
                "output path '{}' has no file name",
                out_path.display()
            ))
        })?
        .to_os_string();
    name.push(".partial");
    Ok(out_path.with_file_name(name))
}

fn write_frames(path: &Path, frames: Vec<RgbaImage>, cfg: &GifConfig) -> HeroResult<()> {
    let file = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    {
        let mut encoder = GifEncoder::new_with_speed(&mut writer, cfg.quantize_speed);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| HeroError::encode(format!("set gif repeat: {e}")))?;

        let delay = Delay::from_numer_denom_ms(cfg.frame_delay_ms, 1);
        for (i, buf) in frames.into_iter().enumerate() {
            encoder
                .encode_frame(Frame::from_parts(buf, 0, 0, delay))
                .map_err(|e| HeroError::encode(format!("encode frame {i}: {e}")))?;
        }
        // Dropping the encoder writes the gif trailer.
    }

    writer
        .flush()
        .with_context(|| format!("flush '{}'", path.display()))?;
    Ok(())
}
