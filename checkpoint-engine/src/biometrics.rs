//! Ambiguous vital-sign readings.
//!
//! A reading is a bounded window around the subject's true baseline, never the
//! baseline itself, and the scanner can fail outright. Both outcomes are game
//! state rather than software faults.
use std::fmt;

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    BIOMETRIC_STREAM_DOMAIN, BPM_FLOOR, BPM_FLUCTUATING_CEILING, BPM_STABLE_CEILING,
    BPM_WINDOW_MAX, BPM_WINDOW_MIN, CONFIDENCE_ANOMALOUS_PENALTY, CONFIDENCE_BASE_MAX,
    CONFIDENCE_BASE_MIN, CONFIDENCE_FLOOR, CONFIDENCE_FLUCTUATING_PENALTY,
};
use crate::data::BaselineBpm;
use crate::numbers::failure_probability;
use crate::seed::subject_stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stability {
    Stable,
    Fluctuating,
    Anomalous,
    Error,
}

impl Stability {
    /// Classify a baseline heart rate.
    #[must_use]
    pub const fn for_baseline(bpm: u32) -> Self {
        if bpm <= BPM_STABLE_CEILING {
            Self::Stable
        } else if bpm <= BPM_FLUCTUATING_CEILING {
            Self::Fluctuating
        } else {
            Self::Anomalous
        }
    }

    const fn confidence_penalty(self) -> u8 {
        match self {
            Self::Stable | Self::Error => 0,
            Self::Fluctuating => CONFIDENCE_FLUCTUATING_PENALTY,
            Self::Anomalous => CONFIDENCE_ANOMALOUS_PENALTY,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stable => "STABLE",
            Self::Fluctuating => "FLUCTUATING",
            Self::Anomalous => "ANOMALOUS",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the operator's heart-rate panel shows for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousBiometrics {
    pub bpm_range: BpmRange,
    pub stability: Stability,
    pub confidence: u8,
    pub is_error: bool,
}

impl AmbiguousBiometrics {
    /// The hard equipment-failure reading.
    #[must_use]
    pub const fn equipment_error() -> Self {
        Self {
            bpm_range: BpmRange { min: 0, max: 0 },
            stability: Stability::Error,
            confidence: 0,
            is_error: true,
        }
    }

    /// Panel text, e.g. `"74-80 BPM"` or `"ERR"`.
    #[must_use]
    pub fn display_reading(&self) -> String {
        if self.is_error {
            "ERR".to_string()
        } else {
            format!("{}-{} BPM", self.bpm_range.min, self.bpm_range.max)
        }
    }
}

/// Whether a subject's reading is fixed per subject or re-rolled per encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BiometricPolicy {
    /// Derived from the subject id; every encounter with the subject shows the same reading.
    Seeded,
    /// Drawn from the encounter's session stream.
    #[default]
    Ephemeral,
}

/// Produce one reading from a baseline.
#[must_use]
pub fn generate_ambiguous_biometrics<R: Rng>(
    baseline: &BaselineBpm,
    equipment_reliability: u8,
    rng: &mut R,
) -> AmbiguousBiometrics {
    let bpm = baseline.resolve();
    if rng.gen_bool(failure_probability(equipment_reliability)) {
        return AmbiguousBiometrics::equipment_error();
    }

    let window = rng.gen_range(BPM_WINDOW_MIN..=BPM_WINDOW_MAX);
    let below = window / 2;
    let above = window - below;
    let min = bpm.saturating_sub(below).max(BPM_FLOOR);
    let max = bpm.saturating_add(above).max(min);

    let stability = Stability::for_baseline(bpm);
    let base_confidence = rng.gen_range(CONFIDENCE_BASE_MIN..=CONFIDENCE_BASE_MAX);
    let confidence = base_confidence
        .saturating_sub(stability.confidence_penalty())
        .max(CONFIDENCE_FLOOR);

    AmbiguousBiometrics {
        bpm_range: BpmRange { min, max },
        stability,
        confidence,
        is_error: false,
    }
}

/// Take a reading under the configured policy.
#[must_use]
pub fn observe_biometrics(
    policy: BiometricPolicy,
    subject_id: &str,
    baseline: &BaselineBpm,
    equipment_reliability: u8,
    session_rng: &mut ChaCha20Rng,
) -> AmbiguousBiometrics {
    match policy {
        BiometricPolicy::Seeded => {
            let mut stream = subject_stream(subject_id, BIOMETRIC_STREAM_DOMAIN);
            generate_ambiguous_biometrics(baseline, equipment_reliability, &mut stream)
        }
        BiometricPolicy::Ephemeral => {
            generate_ambiguous_biometrics(baseline, equipment_reliability, session_rng)
        }
    }
}
