//! Display transform computation.
//!
//! Maps the decoded content rectangle onto the canvas according to a
//! scale type, a quarter-turn rotation, and a user translation. The
//! matrix is a row-major 3x3 affine; `post_*` operations compose on the
//! left, so they apply after everything already in the matrix.

use serde::{Deserialize, Serialize};

/// How the content rectangle is fitted into the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    /// Uniformly scale so the whole content fits, centered.
    #[default]
    FitCenter,
    /// Uniformly scale to fit, aligned to the top-left.
    FitStart,
    /// Uniformly scale to fit, aligned to the bottom-right.
    FitEnd,
    /// Scale each axis independently to fill the canvas exactly.
    FitXy,
    /// No scaling; center the content at its natural size.
    Center,
    /// Uniformly scale so the content covers the canvas, centered.
    CenterCrop,
}

impl ScaleType {
    const ALL: [ScaleType; 6] = [
        ScaleType::FitCenter,
        ScaleType::FitStart,
        ScaleType::FitEnd,
        ScaleType::FitXy,
        ScaleType::Center,
        ScaleType::CenterCrop,
    ];

    /// The next scale type in cycling order.
    pub fn next(self) -> ScaleType {
        let i = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

/// Quarter-turn rotation of the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// 0 degrees.
    #[default]
    North,
    /// 90 degrees.
    East,
    /// 180 degrees.
    South,
    /// 270 degrees.
    West,
}

impl Rotation {
    /// Rotation angle in degrees.
    pub fn angle(self) -> f32 {
        match self {
            Rotation::North => 0.0,
            Rotation::East => 90.0,
            Rotation::South => 180.0,
            Rotation::West => 270.0,
        }
    }

    /// True for the 90- and 270-degree turns that swap axes.
    pub fn is_sideways(self) -> bool {
        matches!(self, Rotation::East | Rotation::West)
    }

    /// The next rotation in cycling order.
    pub fn next(self) -> Rotation {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }
}

/// Axis-aligned rectangle in floating-point canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// A rectangle anchored at the origin.
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) * 0.5
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) * 0.5
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// Alignment of `set_rect_to_rect` when aspect ratios differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectFit {
    /// Scale each axis independently; no slack remains.
    Fill,
    /// Uniform scale, slack at the right/bottom.
    Start,
    /// Uniform scale, slack split evenly.
    Center,
    /// Uniform scale, slack at the left/top.
    End,
}

/// Row-major 3x3 affine transform.
///
/// Coefficient layout matches the conventional
/// `[sx, kx, tx, ky, sy, ty, p0, p1, p2]` order; the last row stays
/// `[0, 0, 1]` under every operation here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    m: [f32; 9],
}

impl Matrix {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Build a matrix from raw coefficients.
    pub fn from_values(m: [f32; 9]) -> Self {
        Self { m }
    }

    /// The raw coefficients in row-major order.
    pub fn values(&self) -> [f32; 9] {
        self.m
    }

    /// Overwrite the coefficients.
    pub fn set_values(&mut self, m: [f32; 9]) {
        self.m = m;
    }

    /// Set this matrix to map `src` onto `dst` with the given fit.
    ///
    /// An empty source resets to identity.
    pub fn set_rect_to_rect(&mut self, src: &RectF, dst: &RectF, fit: RectFit) {
        if src.is_empty() {
            *self = Matrix::identity();
            return;
        }
        let mut sx = dst.width() / src.width();
        let mut sy = dst.height() / src.height();
        if fit != RectFit::Fill {
            let s = sx.min(sy);
            sx = s;
            sy = s;
        }
        let mut tx = dst.left - src.left * sx;
        let mut ty = dst.top - src.top * sy;
        let slack_x = dst.width() - src.width() * sx;
        let slack_y = dst.height() - src.height() * sy;
        match fit {
            RectFit::Fill | RectFit::Start => {}
            RectFit::Center => {
                tx += slack_x * 0.5;
                ty += slack_y * 0.5;
            }
            RectFit::End => {
                tx += slack_x;
                ty += slack_y;
            }
        }
        self.m = [sx, 0.0, tx, 0.0, sy, ty, 0.0, 0.0, 1.0];
    }

    /// Set this matrix to center `src` in `dst` at its natural size.
    pub fn set_center_in(&mut self, src: &RectF, dst: &RectF) {
        *self = Matrix::identity();
        self.post_translate(
            (dst.width() - src.width()) * 0.5,
            (dst.height() - src.height()) * 0.5,
        );
    }

    /// Set this matrix to center `src` in `dst` scaled uniformly until
    /// it covers the destination.
    pub fn set_center_crop(&mut self, src: &RectF, dst: &RectF) {
        self.set_center_in(src, dst);
        if src.is_empty() || dst.is_empty() {
            return;
        }
        let src_ratio = src.width() / src.height();
        let dst_ratio = dst.width() / dst.height();
        let scale = if src_ratio > dst_ratio {
            dst.height() / src.height()
        } else {
            dst.width() / src.width()
        };
        self.post_scale(scale, scale, dst.width() * 0.5, dst.height() * 0.5);
    }

    /// Left-multiply by `other`: `self = other * self`.
    fn pre_apply(&mut self, other: &Matrix) {
        let a = &other.m;
        let b = &self.m;
        let mut out = [0.0f32; 9];
        for row in 0..3 {
            for col in 0..3 {
                out[row * 3 + col] = a[row * 3] * b[col]
                    + a[row * 3 + 1] * b[3 + col]
                    + a[row * 3 + 2] * b[6 + col];
            }
        }
        self.m = out;
    }

    /// Apply a translation after the current transform.
    pub fn post_translate(&mut self, dx: f32, dy: f32) {
        self.m[2] += dx;
        self.m[5] += dy;
    }

    /// Apply a scale about a pivot after the current transform.
    pub fn post_scale(&mut self, sx: f32, sy: f32, px: f32, py: f32) {
        let scale = Matrix::from_values([
            sx,
            0.0,
            px - sx * px,
            0.0,
            sy,
            py - sy * py,
            0.0,
            0.0,
            1.0,
        ]);
        self.pre_apply(&scale);
    }

    /// Apply a rotation in degrees about a pivot after the current
    /// transform.
    pub fn post_rotate(&mut self, degrees: f32, px: f32, py: f32) {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let rotate = Matrix::from_values([
            cos,
            -sin,
            px - cos * px + sin * py,
            sin,
            cos,
            py - sin * px - cos * py,
            0.0,
            0.0,
            1.0,
        ]);
        self.pre_apply(&rotate);
    }

    /// Transform a point.
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.m[0] * x + self.m[1] * y + self.m[2],
            self.m[3] * x + self.m[4] * y + self.m[5],
        )
    }

    /// Transform a rectangle to the bounding box of its mapped corners.
    pub fn map_rect(&self, rect: &RectF) -> RectF {
        let corners = [
            self.map_point(rect.left, rect.top),
            self.map_point(rect.right, rect.top),
            self.map_point(rect.left, rect.bottom),
            self.map_point(rect.right, rect.bottom),
        ];
        let mut out = RectF::new(f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for (x, y) in corners {
            out.left = out.left.min(x);
            out.top = out.top.min(y);
            out.right = out.right.max(x);
            out.bottom = out.bottom.max(y);
        }
        out
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Compute the full display transform for a frame of content.
///
/// Placement happens in order: scale-type fit, rotation about the
/// transformed content center, the sideways aspect compensations for
/// `FitCenter` and `FitXy`, and finally the user translation.
pub fn compute_matrix(
    scale_type: ScaleType,
    rotation: Rotation,
    canvas: &RectF,
    content: &RectF,
    translation: (f32, f32),
) -> Matrix {
    let mut matrix = Matrix::identity();
    match scale_type {
        ScaleType::FitCenter => matrix.set_rect_to_rect(content, canvas, RectFit::Center),
        ScaleType::FitStart => matrix.set_rect_to_rect(content, canvas, RectFit::Start),
        ScaleType::FitEnd => matrix.set_rect_to_rect(content, canvas, RectFit::End),
        ScaleType::FitXy => matrix.set_rect_to_rect(content, canvas, RectFit::Fill),
        ScaleType::Center => matrix.set_center_in(content, canvas),
        ScaleType::CenterCrop => matrix.set_center_crop(content, canvas),
    }

    let (pivot_x, pivot_y) = matrix.map_point(content.center_x(), content.center_y());
    matrix.post_rotate(rotation.angle(), pivot_x, pivot_y);

    // A quarter turn swaps the content's axes; the fit variants that
    // depend on aspect ratio need a compensating scale about the pivot.
    if rotation.is_sideways() {
        match scale_type {
            ScaleType::FitCenter => {
                let scale = content.width() / content.height();
                matrix.post_scale(scale, scale, pivot_x, pivot_y);
            }
            ScaleType::FitXy => {
                let scale = canvas.width() / canvas.height();
                matrix.post_scale(scale, 1.0 / scale, pivot_x, pivot_y);
            }
            _ => {}
        }
    }

    matrix.post_translate(translation.0, translation.1);
    matrix
}

/// Default transition duration between two display transforms.
pub const TWEEN_DURATION_MS: u64 = 400;

/// Coefficient-wise interpolation between two transforms.
///
/// Each of the 9 raw coefficients is interpolated linearly under an
/// accelerate/decelerate pacing curve. This is not a rigid-motion
/// interpolation: a large rotation delta passes through degenerate
/// intermediate matrices, which reads as a cross-scale on screen and is
/// the intended visual.
#[derive(Debug, Clone)]
pub struct MatrixTween {
    start: [f32; 9],
    end: [f32; 9],
    duration_ms: u64,
}

impl MatrixTween {
    /// Tween from `start` to `end` over the default duration.
    pub fn new(start: &Matrix, end: &Matrix) -> Self {
        Self::with_duration(start, end, TWEEN_DURATION_MS)
    }

    /// Tween from `start` to `end` over `duration_ms` milliseconds.
    pub fn with_duration(start: &Matrix, end: &Matrix, duration_ms: u64) -> Self {
        Self {
            start: start.values(),
            end: end.values(),
            duration_ms: duration_ms.max(1),
        }
    }

    /// Total duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// The transform this tween settles on.
    pub fn target(&self) -> Matrix {
        Matrix::from_values(self.end)
    }

    /// Sample at a pacing fraction in `[0, 1]` (clamped).
    pub fn at_fraction(&self, fraction: f32) -> Matrix {
        let t = fraction.clamp(0.0, 1.0);
        let eased = t * t * (3.0 - 2.0 * t);
        let mut m = [0.0f32; 9];
        for (i, value) in m.iter_mut().enumerate() {
            *value = self.start[i] + (self.end[i] - self.start[i]) * eased;
        }
        Matrix::from_values(m)
    }

    /// Sample at an elapsed time in milliseconds.
    pub fn at_elapsed_ms(&self, elapsed_ms: u64) -> Matrix {
        self.at_fraction(elapsed_ms as f32 / self.duration_ms as f32)
    }

    /// True once `elapsed_ms` reaches the duration.
    pub fn is_finished(&self, elapsed_ms: u64) -> bool {
        elapsed_ms >= self.duration_ms
    }
}
