//! Presentation layer for the gifwall engine.
//!
//! Sits between the codec and the embedder's drawing surface:
//!
//! - Display transform computation: scale type, quarter-turn rotation,
//!   translation, and the animated matrix tween between transforms
//! - The closed set of renderables (message, loading, gif) drawn
//!   through the [`Surface`] trait
//! - The animation driver: background decode with delay compensation
//!   and an atomic frame handoff
//! - The wallpaper state model published over watch channels
//!
//! ## Example
//!
//! ```no_run
//! use gifwall_codec::GifDecoder;
//! use gifwall_core::SharedPools;
//! use gifwall_render::{AnimationDriver, GifRenderable, Renderable, TransformSettings};
//!
//! # let gif_bytes: Vec<u8> = vec![];
//! let mut decoder = GifDecoder::new(SharedPools::new());
//! decoder.read(gif_bytes);
//!
//! let driver = AnimationDriver::new(decoder);
//! let mut renderable = Renderable::Gif(GifRenderable::new(
//!     driver,
//!     &TransformSettings::default(),
//! ));
//! renderable.set_size(1080.0, 1920.0);
//! // each vsync: renderable.draw(&mut surface);
//! ```

mod driver;
mod renderable;
mod state;
mod transform;

pub use driver::AnimationDriver;
pub use renderable::{GifRenderable, Renderable, Surface, LOADING_TEXT};
pub use state::{TransformSettings, WallpaperModel, WallpaperStatus, DEFAULT_BACKGROUND};
pub use transform::{
    compute_matrix, Matrix, MatrixTween, RectF, RectFit, Rotation, ScaleType, TWEEN_DURATION_MS,
};
