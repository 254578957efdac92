//! Resolution-fraction policy for preview rendering.

use serde::Deserialize;

/// Lowest resolution fraction the temporal upscaler accepts.
pub const MIN_RESOLUTION_FRACTION: f32 = 0.25;
/// Highest resolution fraction the temporal upscaler accepts.
pub const MAX_RESOLUTION_FRACTION: f32 = 2.0;

pub fn clamp_fraction(fraction: f32) -> f32 {
    fraction.clamp(MIN_RESOLUTION_FRACTION, MAX_RESOLUTION_FRACTION)
}

pub fn fraction_to_percentage(fraction: f32) -> i32 {
    (clamp_fraction(fraction) * 100.0).round() as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScreenPercentageMode {
    Manual,
    #[default]
    BasedOnDisplayResolution,
    BasedOnDpiScale,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScreenPercentageSettings {
    #[serde(default)]
    pub mode: ScreenPercentageMode,
    #[serde(default = "ScreenPercentageSettings::default_manual_percentage")]
    pub manual_percentage: f32,
    #[serde(default = "ScreenPercentageSettings::default_max_rendering_pixels")]
    pub max_rendering_pixels: u64,
}

impl ScreenPercentageSettings {
    fn default_manual_percentage() -> f32 {
        100.0
    }

    const fn default_max_rendering_pixels() -> u64 {
        1920 * 1080
    }
}

impl Default for ScreenPercentageSettings {
    fn default() -> Self {
        Self {
            mode: ScreenPercentageMode::default(),
            manual_percentage: Self::default_manual_percentage(),
            max_rendering_pixels: Self::default_max_rendering_pixels(),
        }
    }
}

/// Picks a resolution fraction from the display size and DPI scale.
#[derive(Debug, Clone)]
pub struct StaticResolutionFractionHeuristic {
    pub settings: ScreenPercentageSettings,
    pub displayed_pixel_count: u64,
    pub dpi_scale: f32,
}

impl StaticResolutionFractionHeuristic {
    pub fn new(settings: ScreenPercentageSettings, displayed_pixel_count: u64, dpi_scale: f32) -> Self {
        Self { settings, displayed_pixel_count, dpi_scale }
    }

    /// Fraction before clamping to the supported range.
    pub fn resolve_unclamped(&self) -> f32 {
        match self.settings.mode {
            ScreenPercentageMode::Manual => self.settings.manual_percentage / 100.0,
            ScreenPercentageMode::BasedOnDpiScale => 1.0 / self.dpi_scale.max(f32::EPSILON),
            ScreenPercentageMode::BasedOnDisplayResolution => {
                let displayed = self.displayed_pixel_count.max(1) as f64;
                let rendered = displayed.min(self.settings.max_rendering_pixels.max(1) as f64);
                (rendered / displayed).sqrt() as f32
            }
        }
    }

    pub fn resolve_resolution_fraction(&self) -> f32 {
        clamp_fraction(self.resolve_unclamped())
    }
}

/// How the renderer derives its internal resolution for a family.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenPercentagePolicy {
    Legacy { resolution_fraction: f32 },
    Custom { name: String, resolution_fraction: f32 },
}

impl ScreenPercentagePolicy {
    pub fn resolution_fraction(&self) -> f32 {
        match self {
            ScreenPercentagePolicy::Legacy { resolution_fraction }
            | ScreenPercentagePolicy::Custom { resolution_fraction, .. } => *resolution_fraction,
        }
    }
}
