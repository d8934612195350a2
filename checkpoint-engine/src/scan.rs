//! Scan evidence and its quality classification.
use serde::{Deserialize, Serialize};

/// Supplemental evidence latches gathered alongside the protocol steps.
///
/// These never change which decisions are legal; they decide which hidden
/// facts the operator actually surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScanRecord {
    pub identity_scanned: bool,
    pub health_scanned: bool,
    pub interrogated: bool,
    pub equipment_failure: bool,
}

/// How trustworthy the scan step was for this encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScanQuality {
    pub identity_scanned: bool,
    pub health_scanned: bool,
    pub equipment_failure: bool,
}

impl From<&ScanRecord> for ScanQuality {
    fn from(record: &ScanRecord) -> Self {
        Self {
            identity_scanned: record.identity_scanned,
            health_scanned: record.health_scanned,
            equipment_failure: record.equipment_failure,
        }
    }
}

#[must_use]
pub const fn is_incomplete_scan(quality: &ScanQuality) -> bool {
    quality.equipment_failure || !quality.identity_scanned || !quality.health_scanned
}

/// Operator-facing caveat shown next to any later-revealed dossier.
#[must_use]
pub const fn incomplete_scan_warning(quality: &ScanQuality) -> Option<&'static str> {
    if quality.equipment_failure {
        return Some("SCAN INCOMPLETE: equipment fault during biometric capture");
    }
    match (quality.identity_scanned, quality.health_scanned) {
        (true, true) => None,
        (false, false) => Some("SCAN INCOMPLETE: no identity or health scan on record"),
        (false, true) => Some("SCAN INCOMPLETE: identity scan not performed"),
        (true, false) => Some("SCAN INCOMPLETE: health scan not performed"),
    }
}
