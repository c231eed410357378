//! The closed set of things the wallpaper can show.
//!
//! A [`Renderable`] is one of three variants: a text message (nothing is
//! set, or an error), a loading placeholder, or a running GIF animation.
//! All three drive the embedder through the same [`Surface`] trait, so
//! switching what is on screen is a plain value swap.

use crate::driver::AnimationDriver;
use crate::state::TransformSettings;
use crate::transform::{compute_matrix, Matrix, MatrixTween, RectF, Rotation, ScaleType};
use gifwall_core::PixelBuffer;
use std::time::Instant;
use tracing::trace;

/// Text shown by the loading placeholder.
pub const LOADING_TEXT: &str = "Loading your new wallpaper";

/// The embedder's drawing target.
///
/// Implementations receive fully composited content: a frame plus its
/// display matrix, or a message. `request_redraw` asks for another
/// `draw` call soon, used while a transform transition is animating.
pub trait Surface {
    /// Present a decoded frame under the given transform.
    fn push_frame(&mut self, frame: &PixelBuffer, matrix: &Matrix, background: u32);
    /// Present a text message over the background color.
    fn push_message(&mut self, message: &str, background: u32);
    /// Schedule another draw.
    fn request_redraw(&mut self);
}

/// Something the wallpaper can currently display.
pub enum Renderable {
    /// A static text prompt.
    Message { text: String, background: u32 },
    /// The loading placeholder.
    Loading { background: u32 },
    /// A running animation.
    Gif(GifRenderable),
}

impl Renderable {
    /// Build the message variant.
    pub fn message(text: impl Into<String>, background: u32) -> Self {
        Renderable::Message {
            text: text.into(),
            background,
        }
    }

    /// Draw onto the surface.
    pub fn draw(&mut self, surface: &mut dyn Surface) {
        match self {
            Renderable::Message { text, background } => {
                surface.push_message(text, *background);
            }
            Renderable::Loading { background } => {
                surface.push_message(LOADING_TEXT, *background);
            }
            Renderable::Gif(gif) => gif.draw(surface),
        }
    }

    /// Propagate a canvas resize.
    pub fn set_size(&mut self, width: f32, height: f32) {
        if let Renderable::Gif(gif) = self {
            gif.set_size(width, height);
        }
    }

    /// Recompute any cached presentation state.
    pub fn invalidate(&mut self) {
        if let Renderable::Gif(gif) = self {
            gif.invalidate();
        }
    }

    /// Stop background work, if any.
    pub fn stop(&mut self) {
        if let Renderable::Gif(gif) = self {
            gif.stop();
        }
    }
}

/// An animated GIF plus its display transform.
///
/// Owns the [`AnimationDriver`] and recomputes the matrix whenever the
/// canvas, scale type, rotation, or translation changes. Animated
/// setting changes run through a [`MatrixTween`] instead of snapping.
pub struct GifRenderable {
    driver: AnimationDriver,
    scale_type: ScaleType,
    rotation: Rotation,
    translation: (f32, f32),
    background: u32,
    canvas: RectF,
    content: RectF,
    matrix: Matrix,
    tween: Option<(MatrixTween, Instant)>,
}

impl GifRenderable {
    /// Wrap a driver with the given display settings. The matrix stays
    /// at identity until the first `set_size`.
    pub fn new(driver: AnimationDriver, settings: &TransformSettings) -> Self {
        let content = RectF::from_size(driver.width() as f32, driver.height() as f32);
        Self {
            driver,
            scale_type: settings.scale_type,
            rotation: settings.rotation,
            translation: settings.translation,
            background: settings.background_color,
            canvas: RectF::from_size(1.0, 1.0),
            content,
            matrix: Matrix::identity(),
            tween: None,
        }
    }

    /// The underlying driver.
    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    /// Current display matrix.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.canvas = RectF::from_size(width, height);
        self.invalidate();
    }

    /// Change the scale type, optionally animating the transition.
    pub fn set_scale_type(&mut self, scale_type: ScaleType, animated: bool) {
        self.scale_type = scale_type;
        if animated {
            self.begin_tween();
        } else {
            self.invalidate();
        }
    }

    /// Change the rotation, optionally animating the transition.
    pub fn set_rotation(&mut self, rotation: Rotation, animated: bool) {
        self.rotation = rotation;
        if animated {
            self.begin_tween();
        } else {
            self.invalidate();
        }
    }

    pub fn set_translation(&mut self, x: f32, y: f32) {
        self.translation = (x, y);
        self.invalidate();
    }

    /// Shift the translation without recomputing the whole matrix.
    pub fn post_translate(&mut self, dx: f32, dy: f32) {
        self.translation.0 += dx;
        self.translation.1 += dy;
        self.matrix.post_translate(dx, dy);
    }

    pub fn set_background_color(&mut self, background: u32) {
        self.background = background;
    }

    /// Recompute the matrix from the current settings and make sure the
    /// animation is running. Cancels a tween in flight.
    pub fn invalidate(&mut self) {
        self.tween = None;
        self.matrix = compute_matrix(
            self.scale_type,
            self.rotation,
            &self.canvas,
            &self.content,
            self.translation,
        );
        self.driver.start();
    }

    /// Draw the current frame; while a tween runs, sample it and ask
    /// for another draw.
    pub fn draw(&mut self, surface: &mut dyn Surface) {
        let mut animating = false;
        if let Some((tween, started)) = &self.tween {
            let elapsed = started.elapsed().as_millis() as u64;
            if tween.is_finished(elapsed) {
                trace!("transform transition finished");
                self.tween = None;
                self.invalidate();
            } else {
                self.matrix = tween.at_elapsed_ms(elapsed);
                animating = true;
            }
        }

        let matrix = self.matrix;
        let background = self.background;
        self.driver.with_frame(|frame| {
            if let Some(frame) = frame {
                surface.push_frame(frame, &matrix, background);
            }
        });

        if animating {
            surface.request_redraw();
        }
    }

    pub fn stop(&mut self) {
        self.driver.stop();
    }

    /// Stop and release everything. Terminal.
    pub fn recycle(&mut self) {
        self.tween = None;
        self.driver.recycle();
    }

    /// Animate from the current matrix to the one implied by the
    /// current settings with zero translation.
    fn begin_tween(&mut self) {
        let target = compute_matrix(
            self.scale_type,
            self.rotation,
            &self.canvas,
            &self.content,
            (0.0, 0.0),
        );
        self.tween = Some((MatrixTween::new(&self.matrix, &target), Instant::now()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gifwall_codec::GifDecoder;
    use gifwall_core::SharedPools;

    /// Surface that records every call.
    #[derive(Default)]
    struct RecordingSurface {
        frames: Vec<(Matrix, u32)>,
        messages: Vec<(String, u32)>,
        redraws: usize,
    }

    impl Surface for RecordingSurface {
        fn push_frame(&mut self, _frame: &PixelBuffer, matrix: &Matrix, background: u32) {
            self.frames.push((*matrix, background));
        }

        fn push_message(&mut self, message: &str, background: u32) {
            self.messages.push((message.to_string(), background));
        }

        fn request_redraw(&mut self) {
            self.redraws += 1;
        }
    }

    fn single_frame_gif() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"GIF89a");
        data.extend_from_slice(&[0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00]);
        data.extend_from_slice(&[0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF]);
        data.extend_from_slice(&[0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00]);
        data.extend_from_slice(&[0x02, 0x02, 0x04, 0x0A, 0x00]);
        data.push(0x3B);
        data
    }

    fn gif_renderable() -> GifRenderable {
        let mut decoder = GifDecoder::new(SharedPools::new());
        assert!(decoder.read(single_frame_gif()).is_ok());
        GifRenderable::new(AnimationDriver::new(decoder), &TransformSettings::default())
    }

    #[test]
    fn test_message_variant_draws_text() {
        let mut surface = RecordingSurface::default();
        let mut renderable = Renderable::message("Open the app to pick a GIF", 0xFF000000);
        renderable.draw(&mut surface);
        assert_eq!(surface.messages.len(), 1);
        assert_eq!(surface.messages[0].0, "Open the app to pick a GIF");
    }

    #[test]
    fn test_loading_variant_draws_placeholder() {
        let mut surface = RecordingSurface::default();
        let mut renderable = Renderable::Loading {
            background: 0xFF101010,
        };
        renderable.draw(&mut surface);
        assert_eq!(surface.messages[0].0, LOADING_TEXT);
        assert_eq!(surface.messages[0].1, 0xFF101010);
    }

    #[test]
    fn test_gif_draws_frame_with_matrix() {
        let mut surface = RecordingSurface::default();
        let mut gif = gif_renderable();
        gif.set_size(4.0, 2.0);
        gif.draw(&mut surface);

        assert_eq!(surface.frames.len(), 1);
        // 2x1 content fit-centered in a 4x2 canvas: uniform scale 2.
        let values = surface.frames[0].0.values();
        assert!((values[0] - 2.0).abs() < 1e-4);
        assert!((values[4] - 2.0).abs() < 1e-4);
        gif.recycle();
    }

    #[test]
    fn test_animated_change_requests_redraws() {
        let mut surface = RecordingSurface::default();
        let mut gif = gif_renderable();
        gif.set_size(4.0, 2.0);

        gif.set_scale_type(ScaleType::CenterCrop, true);
        gif.draw(&mut surface);
        // A tween is in flight, so the draw asks for a follow-up.
        assert_eq!(surface.redraws, 1);
        gif.recycle();
    }

    #[test]
    fn test_unanimated_change_snaps() {
        let mut surface = RecordingSurface::default();
        let mut gif = gif_renderable();
        gif.set_size(4.0, 2.0);

        gif.set_scale_type(ScaleType::CenterCrop, false);
        gif.draw(&mut surface);
        assert_eq!(surface.redraws, 0);
        // Center-crop of 2x1 into 4x2 is also scale 2; matrices match
        // the direct computation.
        let expected = compute_matrix(
            ScaleType::CenterCrop,
            Rotation::North,
            &RectF::from_size(4.0, 2.0),
            &RectF::from_size(2.0, 1.0),
            (0.0, 0.0),
        );
        assert_eq!(surface.frames[0].0, expected);
        gif.recycle();
    }

    #[test]
    fn test_post_translate_shifts_matrix() {
        let mut gif = gif_renderable();
        gif.set_size(4.0, 2.0);
        let before = *gif.matrix();
        gif.post_translate(3.0, -1.0);
        let after = gif.matrix().values();
        assert_eq!(after[2], before.values()[2] + 3.0);
        assert_eq!(after[5], before.values()[5] - 1.0);
        gif.recycle();
    }
}
