use std::{
    path::Path,
    process::{Command, Stdio},
    sync::Arc,
};

use anyhow::Context as _;

use crate::error::{HeroError, HeroResult};

/// Converts one scene file on disk into a `width` x `height` PNG on disk.
///
/// Implementations must either leave a bitmap at `png_path` or return an error.
pub trait Rasterizer {
    fn name(&self) -> &str;

    fn rasterize(
        &self,
        svg_path: &Path,
        png_path: &Path,
        width: u32,
        height: u32,
    ) -> HeroResult<()>;
}

/// In-process rasterizer backed by `usvg` + `resvg`.
pub struct ResvgRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl ResvgRasterizer {
    /// Loads the system font database once; it is shared by every frame.
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts");
        Self {
            fontdb: Arc::new(db),
        }
    }

    fn render_with_resources(
        &self,
        svg: &[u8],
        resources_dir: Option<&Path>,
        width: u32,
        height: u32,
    ) -> HeroResult<Vec<u8>> {
        let opts = usvg::Options {
            resources_dir: resources_dir.map(Path::to_path_buf),
            fontdb: Arc::clone(&self.fontdb),
            font_resolver: fallback_font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(svg, &opts)
            .map_err(|e| HeroError::raster(format!("parse svg: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| HeroError::raster(format!("failed to allocate {width}x{height} pixmap")))?;

        // Stretch to the requested size on both axes, like `rsvg-convert -w -h`.
        let sx = (width as f32) / tree.size().width();
        let sy = (height as f32) / tree.size().height();
        let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
        resvg::render(&tree, xform, &mut pixmap.as_mut());

        let mut rgba = Vec::with_capacity(pixmap.data().len());
        for px in pixmap.pixels() {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(rgba)
    }
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for ResvgRasterizer {
    fn name(&self) -> &str {
        "resvg"
    }

    fn rasterize(
        &self,
        svg_path: &Path,
        png_path: &Path,
        width: u32,
        height: u32,
    ) -> HeroResult<()> {
        let svg = std::fs::read(svg_path)
            .with_context(|| format!("read scene '{}'", svg_path.display()))?;
        let rgba = self.render_with_resources(&svg, svg_path.parent(), width, height)?;

        image::save_buffer_with_format(
            png_path,
            &rgba,
            width,
            height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", png_path.display()))?;
        Ok(())
    }
}

// The scene asks for `system-ui` and `ui-monospace`, which fontdb rarely knows by name.
fn fallback_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::{FontResolver, fontdb::Family};

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => Family::Serif,
                    usvg::FontFamily::SansSerif => Family::SansSerif,
                    usvg::FontFamily::Cursive => Family::Cursive,
                    usvg::FontFamily::Fantasy => Family::Fantasy,
                    usvg::FontFamily::Monospace => Family::Monospace,
                    usvg::FontFamily::Named(s) => Family::Name(s),
                });
            }
            families.push(Family::SansSerif);
            families.push(Family::Monospace);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

pub const RSVG_CONVERT: &str = "rsvg-convert";

/// Shells out to an `rsvg-convert` compatible program:
/// `<program> -w <width> -h <height> <svg> -o <png>`.
#[derive(Clone, Debug)]
pub struct CommandRasterizer {
    program: String,
}

impl CommandRasterizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn rsvg_convert() -> Self {
        Self::new(RSVG_CONVERT)
    }
}

impl Rasterizer for CommandRasterizer {
    fn name(&self) -> &str {
        &self.program
    }

    fn rasterize(
        &self,
        svg_path: &Path,
        png_path: &Path,
        width: u32,
        height: u32,
    ) -> HeroResult<()> {
        let output = Command::new(&self.program)
            .arg("-w")
            .arg(width.to_string())
            .arg("-h")
            .arg(height.to_string())
            .arg(svg_path)
            .arg("-o")
            .arg(png_path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                HeroError::raster(format!(
                    "failed to spawn {} (is it installed and on PATH?): {e}",
                    self.program
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HeroError::raster(format!(
                "{} exited with status {} for '{}': {}",
                self.program,
                output.status,
                svg_path.display(),
                stderr.trim()
            )));
        }

        if !png_path.is_file() {
            return Err(HeroError::raster(format!(
                "{} succeeded but wrote no bitmap at '{}'",
                self.program,
                png_path.display()
            )));
        }
        Ok(())
    }
}

/// Best-effort probe, used for diagnostics before a run.
pub fn is_program_on_path(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const RED_SQUARE: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><rect width="10" height="10" fill="#ff0000"/></svg>"##;

    fn scratch(name: &str) -> PathBuf {
        let dir = PathBuf::from("target").join("raster_unit").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn resvg_stretches_to_requested_size() {
        let r = ResvgRasterizer::new();
        let rgba = r.render_with_resources(RED_SQUARE, None, 8, 4).unwrap();
        assert_eq!(rgba.len(), 8 * 4 * 4);
        for px in rgba.chunks_exact(4) {
            assert_eq!(px, &[255, 0, 0, 255]);
        }
    }

    #[test]
    fn resvg_rejects_malformed_svg() {
        let r = ResvgRasterizer::new();
        let err = r.render_with_resources(b"<svg", None, 4, 4).unwrap_err();
        assert!(matches!(err, HeroError::Raster(_)));
    }

    #[test]
    fn resvg_writes_png_file() {
        let dir = scratch("resvg_writes_png_file");
        let svg_path = dir.join("in.svg");
        let png_path = dir.join("out.png");
        std::fs::write(&svg_path, RED_SQUARE).unwrap();
        let _ = std::fs::remove_file(&png_path);

        ResvgRasterizer::new()
            .rasterize(&svg_path, &png_path, 12, 6)
            .unwrap();

        let img = image::open(&png_path).unwrap();
        assert_eq!((img.width(), img.height()), (12, 6));
    }

    #[test]
    fn resvg_missing_input_is_an_error() {
        let dir = scratch("resvg_missing_input");
        let err = ResvgRasterizer::new()
            .rasterize(&dir.join("nope.svg"), &dir.join("nope.png"), 4, 4)
            .unwrap_err();
        assert!(err.to_string().contains("nope.svg"));
    }

    #[test]
    fn command_spawn_failure_is_a_raster_error() {
        let dir = scratch("command_spawn_failure");
        let r = CommandRasterizer::new("herogif-no-such-rasterizer");
        let err = r
            .rasterize(&dir.join("in.svg"), &dir.join("out.png"), 4, 4)
            .unwrap_err();
        assert!(matches!(err, HeroError::Raster(_)));
        assert!(err.to_string().contains("failed to spawn"));
        assert!(!is_program_on_path("herogif-no-such-rasterizer"));
    }

    #[cfg(unix)]
    #[test]
    fn command_nonzero_exit_is_a_raster_error() {
        let dir = scratch("command_nonzero_exit");
        let r = CommandRasterizer::new("false");
        let err = r
            .rasterize(&dir.join("in.svg"), &dir.join("out.png"), 4, 4)
            .unwrap_err();
        assert!(err.to_string().contains("exited with status"));
    }

    #[cfg(unix)]
    #[test]
    fn command_success_without_output_is_an_error() {
        let dir = scratch("command_no_output");
        let png = dir.join("out.png");
        let _ = std::fs::remove_file(&png);
        let err = CommandRasterizer::new("true")
            .rasterize(&dir.join("in.svg"), &png, 4, 4)
            .unwrap_err();
        assert!(err.to_string().contains("wrote no bitmap"));
    }
}
