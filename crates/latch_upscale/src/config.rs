//! Host-facing upscaler configuration

use crate::backend::BackendKind;
use crate::capability::SimulationMode;
use crate::context::{clamp_unit, DEFAULT_SHARPNESS};
use crate::error::{Result, UpscaleError};
use crate::flags::FeatureFlags;
use crate::quality::QualityTier;
use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upscaler settings, usually loaded from JSON. Missing fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpscalerConfig {
    /// Backends to try, in order. Passthrough is always the last resort.
    /// `"auto"` or an empty list picks an order from `gpu_vendor_id`.
    #[serde(deserialize_with = "preference_or_auto")]
    pub backend_preference: Vec<BackendKind>,
    /// PCI vendor id of the host GPU, when the host knows it.
    pub gpu_vendor_id: Option<u32>,
    pub quality_tier: QualityTier,
    pub sharpness: f32,
    /// Shorthand for `flags.is_hdr`.
    pub hdr: bool,
    pub flags: FlagSettings,
    pub simulation: SimulationMode,
}

/// Per-flag view of [`FeatureFlags`] for configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagSettings {
    pub is_hdr: bool,
    pub depth_inverted: bool,
    pub auto_exposure: bool,
    pub motion_vectors_jittered: bool,
    pub motion_vectors_low_res: bool,
}

impl Default for UpscalerConfig {
    fn default() -> Self {
        Self {
            backend_preference: vec![BackendKind::Dlss, BackendKind::Fsr],
            gpu_vendor_id: None,
            quality_tier: QualityTier::Quality,
            sharpness: DEFAULT_SHARPNESS,
            hdr: false,
            flags: FlagSettings::default(),
            simulation: SimulationMode::Disabled,
        }
    }
}

impl UpscalerConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let mut config: Self =
            serde_json::from_str(text).map_err(|err| UpscaleError::Config(err.to_string()))?;
        config.sharpness = clamp_unit(config.sharpness);
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| UpscaleError::Config(format!("{}: {}", path.display(), err)))?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|err| UpscaleError::Config(err.to_string()))
    }

    /// Backend order to try. An explicit list wins, then the GPU vendor's
    /// default, then DLSS followed by FSR.
    pub fn preference(&self) -> Vec<BackendKind> {
        if !self.backend_preference.is_empty() {
            return self.backend_preference.clone();
        }
        match self.gpu_vendor_id {
            Some(vendor) => BackendKind::preference_for_vendor(vendor),
            None => vec![BackendKind::Dlss, BackendKind::Fsr],
        }
    }

    /// Sharpness clamped to [0, 1].
    pub fn sharpness(&self) -> f32 {
        clamp_unit(self.sharpness)
    }

    /// Flags handed to the backend at session creation.
    pub fn effective_flags(&self) -> FeatureFlags {
        let mut flags = FeatureFlags::from(self.flags);
        flags.set(FeatureFlags::IS_HDR, self.hdr || self.flags.is_hdr);
        flags.set(FeatureFlags::DO_SHARPENING, self.sharpness() > 0.0);
        flags
    }
}

fn preference_or_auto<'de, D>(deserializer: D) -> std::result::Result<Vec<BackendKind>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Preference {
        Keyword(String),
        List(Vec<BackendKind>),
    }

    match Preference::deserialize(deserializer)? {
        Preference::List(list) => Ok(list),
        Preference::Keyword(word) if word == "auto" => Ok(Vec::new()),
        Preference::Keyword(word) => Err(de::Error::invalid_value(
            Unexpected::Str(&word),
            &"\"auto\" or a list of backends",
        )),
    }
}

impl From<FlagSettings> for FeatureFlags {
    fn from(settings: FlagSettings) -> Self {
        let mut flags = FeatureFlags::empty();
        flags.set(FeatureFlags::IS_HDR, settings.is_hdr);
        flags.set(FeatureFlags::DEPTH_INVERTED, settings.depth_inverted);
        flags.set(FeatureFlags::AUTO_EXPOSURE, settings.auto_exposure);
        flags.set(FeatureFlags::MOTION_VECTORS_JITTERED, settings.motion_vectors_jittered);
        flags.set(FeatureFlags::MOTION_VECTORS_LOW_RES, settings.motion_vectors_low_res);
        flags
    }
}
