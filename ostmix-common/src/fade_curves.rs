//! Fade curve selection for entry fade-outs
//!
//! The curves are applied by the audio engine, so this module only names them
//! and maps each one onto the matching ffmpeg `afade` curve.

use serde::{Deserialize, Serialize};

/// Fade curve types
///
/// - Linear: Constant rate of change (ffmpeg default)
/// - Exponential: Quadratic gain, slow start of the fade
/// - Logarithmic: Quadratic gain mirrored for fade-out, fast drop then slow tail
/// - SCurve: Half-sine, smooth acceleration and deceleration
/// - EqualPower: Quarter-sine, constant perceived loudness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// v(t) = t
    #[default]
    Linear,

    /// v(t) = t²
    Exponential,

    /// v(t) = (1-t)² for fade-out
    Logarithmic,

    /// v(t) = 0.5 × (1 - cos(π × t))
    #[serde(alias = "cosine", alias = "scurve", alias = "s-curve")]
    SCurve,

    /// v(t) = sin(t × π/2)
    #[serde(alias = "equalpower")]
    EqualPower,
}

impl FadeCurve {
    /// Parse curve from string (config value or CLI flag)
    ///
    /// Accepts:
    /// - 'linear'
    /// - 'exponential'
    /// - 'logarithmic'
    /// - 'cosine', 's_curve', 'scurve', 's-curve'
    /// - 'equal_power', 'equalpower'
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(FadeCurve::Linear),
            "exponential" => Some(FadeCurve::Exponential),
            "logarithmic" => Some(FadeCurve::Logarithmic),
            "cosine" | "scurve" | "s-curve" | "s_curve" => Some(FadeCurve::SCurve),
            "equal_power" | "equalpower" => Some(FadeCurve::EqualPower),
            _ => None,
        }
    }

    /// ffmpeg `afade` curve name
    ///
    /// ffmpeg mirrors the curve for `afade=out`, so the quadratic curve serves
    /// both the exponential and the logarithmic shape.
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "tri",
            FadeCurve::Exponential | FadeCurve::Logarithmic => "qua",
            FadeCurve::SCurve => "hsin",
            FadeCurve::EqualPower => "qsin",
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "Linear",
            FadeCurve::Exponential => "Exponential",
            FadeCurve::Logarithmic => "Logarithmic",
            FadeCurve::SCurve => "S-Curve",
            FadeCurve::EqualPower => "Equal Power",
        }
    }

    /// Get all available fade curve variants
    pub fn all_variants() -> &'static [FadeCurve] {
        &[
            FadeCurve::Linear,
            FadeCurve::Exponential,
            FadeCurve::Logarithmic,
            FadeCurve::SCurve,
            FadeCurve::EqualPower,
        ]
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
