//! Dossier gap generation.
//!
//! Which identity fields a subject's dossier redacts is a pure function of the
//! subject id, so reloading an encounter never moves a `[REDACTED]` bar.
use num_traits::cast::cast;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::{
    DOSSIER_FIELD_COUNT, DOSSIER_GAP_SPAN, DOSSIER_MAX_GAPS, DOSSIER_MIN_GAPS, REDACTED_LABEL,
};
use crate::data::{IdentityField, IdentityFields};
use crate::numbers::floor_f64_to_usize;
use crate::seed::seeded_random;

/// Redacted identity fields, in redaction order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DossierGaps {
    redacted: SmallVec<[IdentityField; DOSSIER_MAX_GAPS]>,
}

impl DossierGaps {
    #[must_use]
    pub fn fields(&self) -> &[IdentityField] {
        &self.redacted
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.redacted.len()
    }

    /// Always false; a dossier redacts at least one field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.redacted.is_empty()
    }

    #[must_use]
    pub fn is_redacted(&self, field: IdentityField) -> bool {
        self.redacted.contains(&field)
    }

    /// Text to display for a field: the authored value, or the redaction bar.
    #[must_use]
    pub fn render<'a>(&self, field: IdentityField, identity: &'a IdentityFields) -> &'a str {
        if self.is_redacted(field) {
            REDACTED_LABEL
        } else {
            identity.value(field).unwrap_or(REDACTED_LABEL)
        }
    }
}

fn gap_count(subject_id: &str) -> usize {
    let span = cast::<usize, f64>(DOSSIER_GAP_SPAN).unwrap_or(1.0);
    let raw = floor_f64_to_usize(seeded_random(subject_id) * span) + DOSSIER_MIN_GAPS;
    raw.clamp(DOSSIER_MIN_GAPS, DOSSIER_MAX_GAPS)
}

/// Pick the redacted fields for a subject.
#[must_use]
pub fn generate_dossier_gaps(subject_id: &str) -> DossierGaps {
    let mut ranked: SmallVec<[(f64, IdentityField); DOSSIER_FIELD_COUNT]> = IdentityField::ALL
        .iter()
        .map(|&field| {
            let key = format!("{subject_id}{}", field.index());
            (seeded_random(&key), field)
        })
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let count = gap_count(subject_id);
    DossierGaps {
        redacted: ranked.into_iter().take(count).map(|(_, field)| field).collect(),
    }
}
