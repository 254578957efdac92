use crate::client::{CalibrationMaterials, ClientSettings};
use crate::math::srgb_to_linear;
use crate::preview_world::PreviewWorldOptions;
use crate::screen_percentage::ScreenPercentageSettings;
use anyhow::{Context, Result};
use glam::Vec3;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_fov_degrees")]
    pub fov_degrees: f32,
    #[serde(default = "CameraConfig::default_near_clip_plane")]
    pub near_clip_plane: f32,
    #[serde(default = "CameraConfig::default_initial_look_at_distance")]
    pub initial_look_at_distance: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderingConfig {
    #[serde(default = "RenderingConfig::default_true")]
    pub reversed_z: bool,
    #[serde(default = "RenderingConfig::default_true")]
    pub realtime: bool,
    /// sRGB 8-bit background colour.
    #[serde(default = "RenderingConfig::default_background_color")]
    pub background_color: [u8; 3],
    #[serde(default = "RenderingConfig::default_lighting_only_brightness")]
    pub lighting_only_brightness: [f32; 3],
    #[serde(default)]
    pub calibration: CalibrationMaterials,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WidgetConfig {
    #[serde(default = "WidgetConfig::default_width")]
    pub width: u32,
    #[serde(default = "WidgetConfig::default_height")]
    pub height: u32,
    #[serde(default = "WidgetConfig::default_dpi_scale")]
    pub dpi_scale: f32,
    #[serde(default = "WidgetConfig::default_visibility_threshold_secs")]
    pub visibility_threshold_secs: f32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ViewportConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub rendering: RenderingConfig,
    #[serde(default)]
    pub screen_percentage: ScreenPercentageSettings,
    #[serde(default)]
    pub preview_world: PreviewWorldOptions,
    #[serde(default)]
    pub widget: WidgetConfig,
}

#[derive(Debug, Clone, Default)]
pub struct ViewportConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub realtime: Option<bool>,
    pub reversed_z: Option<bool>,
}

impl CameraConfig {
    const fn default_fov_degrees() -> f32 {
        90.0
    }

    const fn default_near_clip_plane() -> f32 {
        10.0
    }

    const fn default_initial_look_at_distance() -> f32 {
        1024.0
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: Self::default_fov_degrees(),
            near_clip_plane: Self::default_near_clip_plane(),
            initial_look_at_distance: Self::default_initial_look_at_distance(),
        }
    }
}

impl RenderingConfig {
    const fn default_true() -> bool {
        true
    }

    const fn default_background_color() -> [u8; 3] {
        [55, 55, 55]
    }

    const fn default_lighting_only_brightness() -> [f32; 3] {
        [0.3, 0.3, 0.3]
    }
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            reversed_z: Self::default_true(),
            realtime: Self::default_true(),
            background_color: Self::default_background_color(),
            lighting_only_brightness: Self::default_lighting_only_brightness(),
            calibration: CalibrationMaterials::default(),
        }
    }
}

impl WidgetConfig {
    const fn default_width() -> u32 {
        1280
    }

    const fn default_height() -> u32 {
        720
    }

    const fn default_dpi_scale() -> f32 {
        1.0
    }

    const fn default_visibility_threshold_secs() -> f32 {
        0.25
    }

    pub fn visibility_threshold(&self) -> Duration {
        Duration::from_secs_f32(self.visibility_threshold_secs.max(0.0))
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            dpi_scale: Self::default_dpi_scale(),
            visibility_threshold_secs: Self::default_visibility_threshold_secs(),
        }
    }
}

impl ViewportConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ViewportConfigOverrides) {
        if let Some(width) = overrides.width {
            self.widget.width = width;
        }
        if let Some(height) = overrides.height {
            self.widget.height = height;
        }
        if let Some(realtime) = overrides.realtime {
            self.rendering.realtime = realtime;
        }
        if let Some(reversed_z) = overrides.reversed_z {
            self.rendering.reversed_z = reversed_z;
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            fov_degrees: self.camera.fov_degrees,
            near_clip_plane: self.camera.near_clip_plane,
            initial_look_at_distance: self.camera.initial_look_at_distance,
            reversed_z: self.rendering.reversed_z,
            realtime: self.rendering.realtime,
            background_color: srgb_to_linear(self.rendering.background_color),
            lighting_only_brightness: Vec3::from_array(self.rendering.lighting_only_brightness),
            calibration: self.rendering.calibration.clone(),
            screen_percentage: self.screen_percentage.clone(),
            dpi_scale: self.widget.dpi_scale,
        }
    }
}

impl ViewportConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.realtime.is_none() && self.reversed_z.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.width.is_some() {
            fields.push("width");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        if self.realtime.is_some() {
            fields.push("realtime");
        }
        if self.reversed_z.is_some() {
            fields.push("reversed_z");
        }
        fields
    }
}
