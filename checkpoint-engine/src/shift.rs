//! Shift-level decision log.
use std::collections::BTreeMap;
use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::consequence::{Consequence, ConsequenceKind};
use crate::protocol::{Decision, ProtocolStatus};
use crate::scan::ScanRecord;

/// Immutable record of one committed decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub subject_id: String,
    pub decision: Decision,
    pub protocol: ProtocolStatus,
    pub scans: ScanRecord,
    pub consequence: Consequence,
    /// The subject record was malformed and the consequence fell back to lenient.
    #[serde(default)]
    pub content_fallback: bool,
}

/// Append-only list of the shift's decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShiftLog {
    records: Vec<DecisionRecord>,
}

impl ShiftLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: DecisionRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[DecisionRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn total_credits_penalty(&self) -> u64 {
        self.records
            .iter()
            .map(|r| u64::from(r.consequence.credits_penalty))
            .sum()
    }

    #[must_use]
    pub fn total_infractions(&self) -> u64 {
        self.records
            .iter()
            .map(|r| u64::from(r.consequence.infraction_count))
            .sum()
    }

    /// Count of decisions per consequence tier.
    #[must_use]
    pub fn tally(&self) -> BTreeMap<ConsequenceKind, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.consequence.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Stable fingerprint of the log, for replay comparisons.
    #[must_use]
    pub fn digest(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        for record in &self.records {
            // Serializing plain data structs cannot fail.
            if let Ok(bytes) = serde_json::to_vec(record) {
                hasher.write(&bytes);
            }
        }
        hasher.finish()
    }
}
