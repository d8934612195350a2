//! Centralized balance and tuning constants for checkpoint adjudication.
//!
//! These values define the deterministic math for the rules engine. Keeping
//! them together means balance can only move through reviewed code changes;
//! classification branches never carry their own numbers.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_CONTENT_MISSING_BASELINE: &str = "content.missing-baseline";
pub(crate) const LOG_CONTENT_LENIENT_FALLBACK: &str = "content.lenient-fallback";
pub(crate) const LOG_GATE_TRANSITION: &str = "gate.transition";
pub(crate) const LOG_DECISION_COMMIT: &str = "decision.commit";

// Dossier tuning -----------------------------------------------------------
pub(crate) const DOSSIER_FIELD_COUNT: usize = 5;
pub(crate) const DOSSIER_MIN_GAPS: usize = 1;
pub(crate) const DOSSIER_MAX_GAPS: usize = 4;
pub(crate) const DOSSIER_GAP_SPAN: usize = DOSSIER_MAX_GAPS - DOSSIER_MIN_GAPS + 1;
pub(crate) const REDACTED_LABEL: &str = "[REDACTED]";

// Biometric tuning ---------------------------------------------------------
pub(crate) const DEFAULT_BASELINE_BPM: u32 = 78;
pub const DEFAULT_EQUIPMENT_RELIABILITY: u8 = 85;
pub(crate) const RELIABILITY_MAX: u8 = 100;
pub(crate) const BPM_FLOOR: u32 = 40;
pub(crate) const BPM_WINDOW_MIN: u32 = 4;
pub(crate) const BPM_WINDOW_MAX: u32 = 8;
pub(crate) const BPM_STABLE_CEILING: u32 = 85;
pub(crate) const BPM_FLUCTUATING_CEILING: u32 = 100;
pub(crate) const CONFIDENCE_BASE_MIN: u8 = 85;
pub(crate) const CONFIDENCE_BASE_MAX: u8 = 100;
pub(crate) const CONFIDENCE_FLUCTUATING_PENALTY: u8 = 15;
pub(crate) const CONFIDENCE_ANOMALOUS_PENALTY: u8 = 25;
pub(crate) const CONFIDENCE_FLOOR: u8 = 50;
pub(crate) const BIOMETRIC_STREAM_DOMAIN: &[u8] = b"checkpoint.biometrics";

// Consequence tuning -------------------------------------------------------
pub(crate) const WARNING_BASE_CREDITS: u32 = 5;
pub(crate) const WARNING_PER_EXTRA_MISSED: u32 = 5;
pub(crate) const WARNING_CREDIT_CAP: u32 = 15;
pub(crate) const WARNING_INFRACTIONS: u32 = 0;
pub(crate) const CITATION_BASE_CREDITS: u32 = 20;
pub(crate) const CITATION_PER_EXTRA_MISSED: u32 = 5;
pub(crate) const CITATION_CREDIT_CAP: u32 = 40;
pub(crate) const CITATION_INFRACTIONS: u32 = 1;
pub(crate) const SERIOUS_BASE_CREDITS: u32 = 50;
pub(crate) const SERIOUS_PER_EXTRA_MISSED: u32 = 10;
pub(crate) const SERIOUS_CREDIT_CAP: u32 = 100;
pub(crate) const SERIOUS_INFRACTIONS: u32 = 2;

// Prompts ------------------------------------------------------------------
pub(crate) const PROMPT_PROTOCOL_COMPLETE: &str = "PROTOCOL COMPLETE";
