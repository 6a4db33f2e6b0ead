use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

const DEFAULT_FALL_THRESHOLD: f64 = 0.7;
const DEFAULT_ANGLE_THRESHOLD_HIGH: f64 = 65.0;
const DEFAULT_ANGLE_THRESHOLD_MID: f64 = 40.0;
const DEFAULT_HEIGHT_RATIO_HIGH: f64 = 0.25;
const DEFAULT_HEIGHT_RATIO_MID: f64 = 0.45;
const DEFAULT_HISTORY_LENGTH: usize = 8;
const DEFAULT_MOTION_THRESHOLD: f64 = 0.15;
const DEFAULT_MIN_KEYPOINT_CONFIDENCE: f64 = 0.4;

/// Tier weights and blend factors for a scoring profile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TierWeights {
    pub angle_high: f64,
    pub angle_mid: f64,
    pub height_high: f64,
    pub height_mid: f64,
    /// Added once per posture anomaly (torso inverted, hips at knee level).
    pub posture_step: f64,
    pub body_ratio_high: f64,
    pub body_ratio_mid: f64,
    pub frame_weight: f64,
    pub motion_weight: f64,
}

/// Named weight sets. `Legacy` reproduces the older, simpler scoring
/// (heavier angle/height tiers, no body-ratio or motion contribution) and
/// is kept only for deployments tuned against it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringProfile {
    #[default]
    Extended,
    /// Deprecated: tuned for the pre-motion scorer.
    Legacy,
}

impl ScoringProfile {
    pub fn weights(self) -> TierWeights {
        match self {
            ScoringProfile::Extended => TierWeights {
                angle_high: 0.35,
                angle_mid: 0.15,
                height_high: 0.35,
                height_mid: 0.15,
                posture_step: 0.15,
                body_ratio_high: 0.2,
                body_ratio_mid: 0.1,
                frame_weight: 0.7,
                motion_weight: 0.3,
            },
            ScoringProfile::Legacy => TierWeights {
                angle_high: 0.4,
                angle_mid: 0.2,
                height_high: 0.4,
                height_mid: 0.2,
                posture_step: 0.15,
                body_ratio_high: 0.0,
                body_ratio_mid: 0.0,
                frame_weight: 1.0,
                motion_weight: 0.0,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoringProfile::Extended => "extended",
            ScoringProfile::Legacy => "legacy",
        }
    }
}

impl FromStr for ScoringProfile {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "extended" => Ok(ScoringProfile::Extended),
            "legacy" => Ok(ScoringProfile::Legacy),
            other => Err(anyhow!("unknown scoring profile '{}'", other)),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FallConfigFile {
    fall_threshold: Option<f64>,
    angle_threshold_high: Option<f64>,
    angle_threshold_mid: Option<f64>,
    height_ratio_high: Option<f64>,
    height_ratio_mid: Option<f64>,
    history_length: Option<usize>,
    motion_threshold: Option<f64>,
    min_keypoint_confidence: Option<f64>,
    profile: Option<ScoringProfile>,
}

/// Detector thresholds. Fixed at construction, read-only afterward.
#[derive(Clone, Debug, PartialEq)]
pub struct FallConfig {
    pub fall_threshold: f64,
    pub angle_threshold_high: f64,
    pub angle_threshold_mid: f64,
    pub height_ratio_high: f64,
    pub height_ratio_mid: f64,
    pub history_length: usize,
    pub motion_threshold: f64,
    pub min_keypoint_confidence: f64,
    pub profile: ScoringProfile,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            fall_threshold: DEFAULT_FALL_THRESHOLD,
            angle_threshold_high: DEFAULT_ANGLE_THRESHOLD_HIGH,
            angle_threshold_mid: DEFAULT_ANGLE_THRESHOLD_MID,
            height_ratio_high: DEFAULT_HEIGHT_RATIO_HIGH,
            height_ratio_mid: DEFAULT_HEIGHT_RATIO_MID,
            history_length: DEFAULT_HISTORY_LENGTH,
            motion_threshold: DEFAULT_MOTION_THRESHOLD,
            min_keypoint_confidence: DEFAULT_MIN_KEYPOINT_CONFIDENCE,
            profile: ScoringProfile::default(),
        }
    }
}

/// Read-only view of the active thresholds, for diagnostics endpoints.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigSnapshot {
    pub fall_threshold: f64,
    pub angle_threshold_high: f64,
    pub angle_threshold_mid: f64,
    pub height_ratio_high: f64,
    pub height_ratio_mid: f64,
    pub history_length: usize,
    pub motion_threshold: f64,
    pub min_keypoint_confidence: f64,
    pub profile: &'static str,
    pub weights: TierWeights,
}

impl FallConfig {
    /// Load from the file named by `FALL_CONFIG` (if any), then apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("FALL_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a specific file without consulting `FALL_CONFIG`. Environment
    /// overrides still apply.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: FallConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            fall_threshold: file.fall_threshold.unwrap_or(defaults.fall_threshold),
            angle_threshold_high: file
                .angle_threshold_high
                .unwrap_or(defaults.angle_threshold_high),
            angle_threshold_mid: file
                .angle_threshold_mid
                .unwrap_or(defaults.angle_threshold_mid),
            height_ratio_high: file.height_ratio_high.unwrap_or(defaults.height_ratio_high),
            height_ratio_mid: file.height_ratio_mid.unwrap_or(defaults.height_ratio_mid),
            history_length: file.history_length.unwrap_or(defaults.history_length),
            motion_threshold: file.motion_threshold.unwrap_or(defaults.motion_threshold),
            min_keypoint_confidence: file
                .min_keypoint_confidence
                .unwrap_or(defaults.min_keypoint_confidence),
            profile: file.profile.unwrap_or(defaults.profile),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        override_from_env("FALL_THRESHOLD", &mut self.fall_threshold)?;
        override_from_env("ANGLE_THRESHOLD_HIGH", &mut self.angle_threshold_high)?;
        override_from_env("ANGLE_THRESHOLD_MID", &mut self.angle_threshold_mid)?;
        override_from_env("HEIGHT_RATIO_HIGH", &mut self.height_ratio_high)?;
        override_from_env("HEIGHT_RATIO_MID", &mut self.height_ratio_mid)?;
        override_from_env("HISTORY_LENGTH", &mut self.history_length)?;
        override_from_env("MOTION_THRESHOLD", &mut self.motion_threshold)?;
        override_from_env("MIN_KEYPOINT_CONFIDENCE", &mut self.min_keypoint_confidence)?;
        override_from_env("FALL_SCORING_PROFILE", &mut self.profile)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let named = [
            ("fall_threshold", self.fall_threshold),
            ("angle_threshold_high", self.angle_threshold_high),
            ("angle_threshold_mid", self.angle_threshold_mid),
            ("height_ratio_high", self.height_ratio_high),
            ("height_ratio_mid", self.height_ratio_mid),
            ("motion_threshold", self.motion_threshold),
            ("min_keypoint_confidence", self.min_keypoint_confidence),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(anyhow!("{} must be a finite number", name));
            }
        }
        if self.history_length == 0 {
            return Err(anyhow!("history_length must be at least 1"));
        }
        if self.motion_threshold <= 0.0 {
            return Err(anyhow!("motion_threshold must be greater than zero"));
        }
        if self.angle_threshold_mid > self.angle_threshold_high {
            return Err(anyhow!(
                "angle_threshold_mid ({}) must not exceed angle_threshold_high ({})",
                self.angle_threshold_mid,
                self.angle_threshold_high
            ));
        }
        if self.height_ratio_high > self.height_ratio_mid {
            return Err(anyhow!(
                "height_ratio_high ({}) must not exceed height_ratio_mid ({})",
                self.height_ratio_high,
                self.height_ratio_mid
            ));
        }
        if !(0.0..=1.0).contains(&self.min_keypoint_confidence) {
            return Err(anyhow!("min_keypoint_confidence must be within [0, 1]"));
        }
        Ok(())
    }

    pub fn weights(&self) -> TierWeights {
        self.profile.weights()
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            fall_threshold: self.fall_threshold,
            angle_threshold_high: self.angle_threshold_high,
            angle_threshold_mid: self.angle_threshold_mid,
            height_ratio_high: self.height_ratio_high,
            height_ratio_mid: self.height_ratio_mid,
            history_length: self.history_length,
            motion_threshold: self.motion_threshold,
            min_keypoint_confidence: self.min_keypoint_confidence,
            profile: self.profile.as_str(),
            weights: self.weights(),
        }
    }
}

fn override_from_env<T>(key: &str, slot: &mut T) -> Result<()>
where
    T: FromStr,
{
    if let Ok(raw) = std::env::var(key) {
        if raw.trim().is_empty() {
            return Ok(());
        }
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} has an invalid value '{}'", key, raw))?;
    }
    Ok(())
}

fn read_config_file(path: &Path) -> Result<FallConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        FallConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_empty_history() {
        let cfg = FallConfig {
            history_length: 0,
            ..FallConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_tiers() {
        let cfg = FallConfig {
            angle_threshold_mid: 70.0,
            ..FallConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = FallConfig {
            height_ratio_high: 0.6,
            ..FallConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_motion_threshold() {
        let cfg = FallConfig {
            motion_threshold: 0.0,
            ..FallConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn profiles_parse_and_blend_to_one() {
        assert_eq!(
            "Extended".parse::<ScoringProfile>().unwrap(),
            ScoringProfile::Extended
        );
        assert_eq!(
            "legacy".parse::<ScoringProfile>().unwrap(),
            ScoringProfile::Legacy
        );
        assert!("simple".parse::<ScoringProfile>().is_err());

        for profile in [ScoringProfile::Extended, ScoringProfile::Legacy] {
            let w = profile.weights();
            assert!((w.frame_weight + w.motion_weight - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn snapshot_reports_thresholds() {
        let snap = FallConfig::default().snapshot();
        assert_eq!(snap.history_length, 8);
        assert_eq!(snap.profile, "extended");
        assert_eq!(snap.fall_threshold, 0.7);
    }
}
