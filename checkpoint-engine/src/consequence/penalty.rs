use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ConsequenceKind;
use crate::constants::{
    CITATION_BASE_CREDITS, CITATION_CREDIT_CAP, CITATION_INFRACTIONS, CITATION_PER_EXTRA_MISSED,
    SERIOUS_BASE_CREDITS, SERIOUS_CREDIT_CAP, SERIOUS_INFRACTIONS, SERIOUS_PER_EXTRA_MISSED,
    WARNING_BASE_CREDITS, WARNING_CREDIT_CAP, WARNING_INFRACTIONS, WARNING_PER_EXTRA_MISSED,
};

/// Credit and infraction band for one consequence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PenaltyBand {
    #[serde(default)]
    pub base_credits: u32,
    #[serde(default)]
    pub per_extra_missed: u32,
    #[serde(default)]
    pub credit_cap: u32,
    #[serde(default)]
    pub infractions: u32,
}

impl PenaltyBand {
    /// Credits charged for `missed` overlooked facts, clamped to the band.
    #[must_use]
    pub fn credits_for(&self, missed: usize) -> u32 {
        let extra = u32::try_from(missed.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_credits
            .saturating_add(self.per_extra_missed.saturating_mul(extra))
            .min(self.credit_cap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PenaltyTableError {
    #[error("{kind:?} band cap {cap} is below its base {base}")]
    CapBelowBase {
        kind: ConsequenceKind,
        base: u32,
        cap: u32,
    },
    #[error("{lower:?} band (cap {lower_cap}) overlaps {upper:?} band (base {upper_base})")]
    BandsOverlap {
        lower: ConsequenceKind,
        lower_cap: u32,
        upper: ConsequenceKind,
        upper_base: u32,
    },
    #[error("{lower:?} carries more infractions than {upper:?}")]
    InfractionsNotMonotone {
        lower: ConsequenceKind,
        upper: ConsequenceKind,
    },
}

/// The single tunable table mapping consequence tiers to penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyTable {
    #[serde(default = "PenaltyTable::default_warning")]
    pub warning: PenaltyBand,
    #[serde(default = "PenaltyTable::default_citation")]
    pub citation: PenaltyBand,
    #[serde(default = "PenaltyTable::default_serious")]
    pub serious_infraction: PenaltyBand,
}

impl PenaltyTable {
    const fn default_warning() -> PenaltyBand {
        PenaltyBand {
            base_credits: WARNING_BASE_CREDITS,
            per_extra_missed: WARNING_PER_EXTRA_MISSED,
            credit_cap: WARNING_CREDIT_CAP,
            infractions: WARNING_INFRACTIONS,
        }
    }

    const fn default_citation() -> PenaltyBand {
        PenaltyBand {
            base_credits: CITATION_BASE_CREDITS,
            per_extra_missed: CITATION_PER_EXTRA_MISSED,
            credit_cap: CITATION_CREDIT_CAP,
            infractions: CITATION_INFRACTIONS,
        }
    }

    const fn default_serious() -> PenaltyBand {
        PenaltyBand {
            base_credits: SERIOUS_BASE_CREDITS,
            per_extra_missed: SERIOUS_PER_EXTRA_MISSED,
            credit_cap: SERIOUS_CREDIT_CAP,
            infractions: SERIOUS_INFRACTIONS,
        }
    }

    /// Band for a tier; `None` carries no penalty at all.
    #[must_use]
    pub const fn band(&self, kind: ConsequenceKind) -> PenaltyBand {
        match kind {
            ConsequenceKind::None => PenaltyBand {
                base_credits: 0,
                per_extra_missed: 0,
                credit_cap: 0,
                infractions: 0,
            },
            ConsequenceKind::Warning => self.warning,
            ConsequenceKind::Citation => self.citation,
            ConsequenceKind::SeriousInfraction => self.serious_infraction,
        }
    }

    /// Check that penalties never decrease as severity rises.
    ///
    /// # Errors
    ///
    /// Returns the first band that breaks monotonicity.
    pub fn validate(&self) -> Result<(), PenaltyTableError> {
        for kind in ConsequenceKind::ALL {
            let band = self.band(kind);
            if band.credit_cap < band.base_credits {
                return Err(PenaltyTableError::CapBelowBase {
                    kind,
                    base: band.base_credits,
                    cap: band.credit_cap,
                });
            }
        }
        for pair in ConsequenceKind::ALL.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            let (low, high) = (self.band(lower), self.band(upper));
            if low.credit_cap > high.base_credits {
                return Err(PenaltyTableError::BandsOverlap {
                    lower,
                    lower_cap: low.credit_cap,
                    upper,
                    upper_base: high.base_credits,
                });
            }
            if low.infractions > high.infractions {
                return Err(PenaltyTableError::InfractionsNotMonotone { lower, upper });
            }
        }
        Ok(())
    }
}

impl Default for PenaltyTable {
    fn default() -> Self {
        Self {
            warning: Self::default_warning(),
            citation: Self::default_citation(),
            serious_infraction: Self::default_serious(),
        }
    }
}
