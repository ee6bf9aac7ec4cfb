//! Quality tiers and render resolution policy
//!
//! Every backend shares one scale table so a host can size its render
//! targets before it knows which vendor will end up doing the upscale.

use crate::error::UpscaleError;
use crate::resolution::Resolution;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest render extent the policy will hand out on either axis.
pub const MIN_RENDER_DIMENSION: u32 = 128;

/// User-facing performance/quality trade-off.
///
/// Variants are declared from the lowest render scale to the highest, so the
/// derived `Ord` matches the scale ordering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    UltraPerformance,
    Performance,
    Balanced,
    Quality,
    UltraQuality,
}

impl QualityTier {
    pub const ALL: [QualityTier; 5] = [
        QualityTier::UltraPerformance,
        QualityTier::Performance,
        QualityTier::Balanced,
        QualityTier::Quality,
        QualityTier::UltraQuality,
    ];

    /// Render-to-display ratio applied to each axis.
    pub fn scale(self) -> f32 {
        match self {
            QualityTier::UltraPerformance => 0.33,
            QualityTier::Performance => 0.50,
            QualityTier::Balanced => 0.58,
            QualityTier::Quality => 0.67,
            QualityTier::UltraQuality => 0.77,
        }
    }

    /// Sharpening strength recommended for this tier. Lower render scales
    /// lose more detail, so they get more sharpening.
    pub fn recommended_sharpness(self) -> f32 {
        match self {
            QualityTier::UltraPerformance => 0.8,
            QualityTier::Performance => 0.7,
            QualityTier::Balanced => 0.6,
            QualityTier::Quality => 0.5,
            QualityTier::UltraQuality => 0.4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QualityTier::UltraPerformance => "Ultra Performance",
            QualityTier::Performance => "Performance",
            QualityTier::Balanced => "Balanced",
            QualityTier::Quality => "Quality",
            QualityTier::UltraQuality => "Ultra Quality",
        }
    }

    pub(crate) fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityTier {
    type Err = UpscaleError;

    /// Accepts `ultra_performance`, `Ultra Performance`, `ultraperformance`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        QualityTier::ALL
            .into_iter()
            .find(|tier| tier.name().replace(' ', "").to_ascii_lowercase() == key)
            .ok_or_else(|| UpscaleError::Config(format!("unknown quality tier '{s}'")))
    }
}

/// Result of the optimal-settings query for a display/tier pair.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OptimalSettings {
    pub render: Resolution,
    pub min: Resolution,
    pub max: Resolution,
    pub sharpness: f32,
}

/// Render resolution for `display` at `tier`.
///
/// Axes are scaled and truncated independently, then raised to
/// [`MIN_RENDER_DIMENSION`]. A display axis smaller than the minimum is
/// returned unchanged so the render target never exceeds the display.
pub fn render_resolution_for(display: Resolution, tier: QualityTier) -> Resolution {
    let scale = tier.scale();
    Resolution::new(
        scale_axis(display.width, scale),
        scale_axis(display.height, scale),
    )
}

/// Smallest and largest render resolution a backend accepts for `display`.
///
/// The bounds do not depend on the tier: the floor always uses the
/// ultra-performance scale and the ceiling is native resolution.
pub fn capability_bounds(display: Resolution, _tier: QualityTier) -> (Resolution, Resolution) {
    let min = render_resolution_for(display, QualityTier::UltraPerformance);
    (min, display)
}

pub fn optimal_settings(display: Resolution, tier: QualityTier) -> OptimalSettings {
    let (min, max) = capability_bounds(display, tier);
    OptimalSettings {
        render: render_resolution_for(display, tier),
        min,
        max,
        sharpness: tier.recommended_sharpness(),
    }
}

fn scale_axis(extent: u32, scale: f32) -> u32 {
    // f32 multiply then truncate, matching the vendor optimal-settings queries
    let scaled = (extent as f32 * scale) as u32;
    scaled.max(MIN_RENDER_DIMENSION).min(extent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_1080p_matches_vendor_rounding() {
        let render = render_resolution_for(Resolution::new(1920, 1080), QualityTier::Balanced);
        assert_eq!(render, Resolution::new(1113, 626));
    }

    #[test]
    fn common_displays_at_each_tier() {
        let display = Resolution::new(1920, 1080);
        assert_eq!(
            render_resolution_for(display, QualityTier::Performance),
            Resolution::new(960, 540)
        );
        assert_eq!(
            render_resolution_for(Resolution::new(1280, 720), QualityTier::Quality),
            Resolution::new(857, 482)
        );
        assert_eq!(
            render_resolution_for(Resolution::new(3840, 2160), QualityTier::UltraPerformance),
            Resolution::new(1267, 712)
        );
    }

    #[test]
    fn render_stays_between_floor_and_display() {
        let displays = [
            Resolution::new(128, 128),
            Resolution::new(200, 150),
            Resolution::new(640, 480),
            Resolution::new(1366, 768),
            Resolution::new(2560, 1440),
            Resolution::new(7680, 4320),
            Resolution::new(129, 4000),
        ];

        for display in displays {
            for tier in QualityTier::ALL {
                let render = render_resolution_for(display, tier);
                assert!(render.fits_within(display), "{render} exceeds {display} at {tier}");
                assert!(render.width >= MIN_RENDER_DIMENSION, "{render} below floor at {tier}");
                assert!(render.height >= MIN_RENDER_DIMENSION, "{render} below floor at {tier}");
            }
        }
    }

    #[test]
    fn scale_is_monotonic_across_tiers() {
        for pair in QualityTier::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].scale() < pair[1].scale());
            assert!(pair[1].scale() <= 1.0);
        }

        let display = Resolution::new(2560, 1440);
        let mut previous = Resolution::new(0, 0);
        for tier in QualityTier::ALL {
            let render = render_resolution_for(display, tier);
            assert!(render.width >= previous.width && render.height >= previous.height);
            previous = render;
        }
    }

    #[test]
    fn small_display_is_clamped_up_to_floor() {
        let render = render_resolution_for(Resolution::new(300, 200), QualityTier::UltraPerformance);
        assert_eq!(render, Resolution::new(128, 128));
    }

    #[test]
    fn display_below_floor_is_returned_unchanged() {
        let display = Resolution::new(100, 64);
        assert_eq!(render_resolution_for(display, QualityTier::Quality), display);
    }

    #[test]
    fn bounds_ignore_requested_tier() {
        let display = Resolution::new(1920, 1080);
        let (min, max) = capability_bounds(display, QualityTier::UltraQuality);
        assert_eq!(max, display);
        assert_eq!(min, Resolution::new(633, 356));
        assert_eq!(capability_bounds(display, QualityTier::Performance), (min, max));
    }

    #[test]
    fn optimal_settings_bundle_render_and_sharpness() {
        let display = Resolution::new(1920, 1080);
        let settings = optimal_settings(display, QualityTier::Quality);
        assert_eq!(settings.render, render_resolution_for(display, QualityTier::Quality));
        assert!(settings.render.fits_within(settings.max));
        assert!(settings.min.fits_within(settings.render));
        assert_eq!(settings.sharpness, 0.5);
    }

    #[test]
    fn tier_parses_from_config_spellings() {
        assert_eq!("ultra_performance".parse::<QualityTier>().unwrap(), QualityTier::UltraPerformance);
        assert_eq!("Ultra Quality".parse::<QualityTier>().unwrap(), QualityTier::UltraQuality);
        assert_eq!("BALANCED".parse::<QualityTier>().unwrap(), QualityTier::Balanced);
        assert!("cinematic".parse::<QualityTier>().is_err());
    }
}
