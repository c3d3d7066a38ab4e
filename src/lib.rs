#![forbid(unsafe_code)]

pub mod config;
pub mod encode_gif;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod raster;
pub mod template;

pub use config::GeneratorConfig;
pub use encode_gif::{GifConfig, encode_gif, flatten_onto_background, load_frame};
pub use error::{HeroError, HeroResult};
pub use params::{FrameParams, Oscillator, frame_time};
pub use pipeline::{Artifact, generate};
pub use raster::{CommandRasterizer, Rasterizer, ResvgRasterizer};
pub use template::SceneTemplate;
