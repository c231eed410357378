//! Wallpaper state model.
//!
//! Holds the user-facing settings (scale type, rotation, translation,
//! background color) and the wallpaper lifecycle status, and publishes
//! every change through [`StateChannel`]s. The model is constructed at
//! the entry point and handed down explicitly; observers subscribe to
//! the channels they care about and get replay-latest plus
//! duplicate-suppression for free.

use crate::transform::{Rotation, ScaleType};
use gifwall_core::{StateChannel, Subscriber};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default background color (opaque black).
pub const DEFAULT_BACKGROUND: u32 = 0xFF00_0000;

/// Lifecycle status of the wallpaper content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallpaperStatus {
    /// No animation has been chosen.
    #[default]
    NotSet,
    /// An animation is being loaded and decoded.
    Loading,
    /// An animation is set and ready to draw.
    Set,
}

/// The full set of display settings, as persisted and as consumed by
/// the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformSettings {
    pub scale_type: ScaleType,
    pub rotation: Rotation,
    pub translation: (f32, f32),
    pub background_color: u32,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            scale_type: ScaleType::default(),
            rotation: Rotation::default(),
            translation: (0.0, 0.0),
            background_color: DEFAULT_BACKGROUND,
        }
    }
}

/// Publishes wallpaper settings and status to its subscribers.
pub struct WallpaperModel {
    scale_type: StateChannel<ScaleType>,
    rotation: StateChannel<Rotation>,
    translation: StateChannel<(f32, f32)>,
    background_color: StateChannel<u32>,
    status: StateChannel<WallpaperStatus>,
}

impl WallpaperModel {
    /// Create a model seeded with the given settings and `NotSet` status.
    pub fn new(initial: TransformSettings) -> Self {
        Self {
            scale_type: StateChannel::with_initial(initial.scale_type),
            rotation: StateChannel::with_initial(initial.rotation),
            translation: StateChannel::with_initial(initial.translation),
            background_color: StateChannel::with_initial(initial.background_color),
            status: StateChannel::with_initial(WallpaperStatus::NotSet),
        }
    }

    /// Snapshot the current settings.
    pub fn settings(&self) -> TransformSettings {
        let defaults = TransformSettings::default();
        TransformSettings {
            scale_type: self.scale_type.latest().unwrap_or(defaults.scale_type),
            rotation: self.rotation.latest().unwrap_or(defaults.rotation),
            translation: self.translation.latest().unwrap_or(defaults.translation),
            background_color: self
                .background_color
                .latest()
                .unwrap_or(defaults.background_color),
        }
    }

    /// Current wallpaper status.
    pub fn status(&self) -> WallpaperStatus {
        self.status.latest().unwrap_or_default()
    }

    pub fn set_scale_type(&self, scale_type: ScaleType) {
        self.scale_type.publish(scale_type);
    }

    /// Cycle to the next scale type.
    pub fn set_next_scale_type(&self) {
        let current = self.scale_type.latest().unwrap_or_default();
        self.scale_type.publish(current.next());
    }

    pub fn set_rotation(&self, rotation: Rotation) {
        self.rotation.publish(rotation);
    }

    /// Cycle to the next quarter-turn rotation.
    pub fn set_next_rotation(&self) {
        let current = self.rotation.latest().unwrap_or_default();
        self.rotation.publish(current.next());
    }

    pub fn set_translation(&self, x: f32, y: f32) {
        self.translation.publish((x, y));
    }

    /// Shift the translation by a delta.
    pub fn post_translate(&self, dx: f32, dy: f32) {
        let (x, y) = self.translation.latest().unwrap_or((0.0, 0.0));
        self.translation.publish((x + dx, y + dy));
    }

    pub fn reset_translation(&self) {
        self.translation.publish((0.0, 0.0));
    }

    pub fn set_background_color(&self, color: u32) {
        self.background_color.publish(color);
    }

    pub fn set_status(&self, status: WallpaperStatus) {
        self.status.publish(status);
    }

    /// Discard the current animation: status back to `NotSet` and the
    /// translation assigned to zero.
    pub fn clear(&self) {
        debug!("clearing wallpaper state");
        self.status.publish(WallpaperStatus::NotSet);
        self.translation.publish((0.0, 0.0));
    }

    pub fn subscribe_scale_type(&self) -> Subscriber<ScaleType> {
        self.scale_type.subscribe()
    }

    pub fn subscribe_rotation(&self) -> Subscriber<Rotation> {
        self.rotation.subscribe()
    }

    pub fn subscribe_translation(&self) -> Subscriber<(f32, f32)> {
        self.translation.subscribe()
    }

    pub fn subscribe_background_color(&self) -> Subscriber<u32> {
        self.background_color.subscribe()
    }

    pub fn subscribe_status(&self) -> Subscriber<WallpaperStatus> {
        self.status.subscribe()
    }
}

impl Default for WallpaperModel {
    fn default() -> Self {
        Self::new(TransformSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_settings_replayed() {
        let model = WallpaperModel::new(TransformSettings {
            scale_type: ScaleType::CenterCrop,
            rotation: Rotation::East,
            translation: (3.0, 4.0),
            background_color: 0xFF123456,
        });

        let mut sub = model.subscribe_scale_type();
        assert_eq!(sub.try_changed(), Some(ScaleType::CenterCrop));
        assert_eq!(model.settings().translation, (3.0, 4.0));
        assert_eq!(model.status(), WallpaperStatus::NotSet);
    }

    #[test]
    fn test_cycling() {
        let model = WallpaperModel::default();
        model.set_next_scale_type();
        assert_eq!(model.settings().scale_type, ScaleType::FitStart);
        model.set_next_rotation();
        assert_eq!(model.settings().rotation, Rotation::East);
    }

    #[test]
    fn test_duplicate_settings_do_not_notify() {
        let model = WallpaperModel::default();
        let mut sub = model.subscribe_rotation();
        assert_eq!(sub.try_changed(), Some(Rotation::North));

        model.set_rotation(Rotation::North);
        assert_eq!(sub.try_changed(), None);

        model.set_rotation(Rotation::South);
        assert_eq!(sub.try_changed(), Some(Rotation::South));
    }

    #[test]
    fn test_post_translate_accumulates() {
        let model = WallpaperModel::default();
        model.post_translate(2.0, 3.0);
        model.post_translate(-1.0, 1.0);
        assert_eq!(model.settings().translation, (1.0, 4.0));
    }

    #[test]
    fn test_clear_assigns_empty_state() {
        let model = WallpaperModel::default();
        model.set_status(WallpaperStatus::Set);
        model.set_translation(10.0, 20.0);

        let mut status_sub = model.subscribe_status();
        let mut translation_sub = model.subscribe_translation();
        status_sub.try_changed();
        translation_sub.try_changed();

        model.clear();
        // Clearing assigns, so both channels actually move.
        assert_eq!(status_sub.try_changed(), Some(WallpaperStatus::NotSet));
        assert_eq!(translation_sub.try_changed(), Some((0.0, 0.0)));
        assert_eq!(model.settings().translation, (0.0, 0.0));
    }

    #[test]
    fn test_settings_round_trip_json() {
        let settings = TransformSettings {
            scale_type: ScaleType::FitXy,
            rotation: Rotation::West,
            translation: (1.5, -2.5),
            background_color: 0xFFABCDEF,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: TransformSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
