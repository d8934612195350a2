//! Consequence scoring at decision commit.
//!
//! A decision is scored against the subject's private facts, including ones
//! the operator never surfaced. The classifier only chooses a tier; credits and
//! infractions come from the [`PenaltyTable`].
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::data::{DossierAnomaly, SubjectFacts};
use crate::protocol::{Decision, ProtocolStatus};
use crate::scan::ScanRecord;

mod penalty;

pub use penalty::{PenaltyBand, PenaltyTable, PenaltyTableError};

/// How serious an overlooked fact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    Critical,
}

/// A ground-truth fact category the subject held but the operator never surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissedInformation {
    Warrant,
    IncidentHistory,
    TransitLog,
    HealthScan,
    IdentityScan,
    Interrogation,
}

impl MissedInformation {
    pub const ALL: [Self; 6] = [
        Self::Warrant,
        Self::IncidentHistory,
        Self::TransitLog,
        Self::HealthScan,
        Self::IdentityScan,
        Self::Interrogation,
    ];

    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Warrant => Severity::Critical,
            Self::IncidentHistory | Self::HealthScan | Self::IdentityScan => Severity::Medium,
            Self::TransitLog | Self::Interrogation => Severity::Low,
        }
    }

    /// Citation-banner text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warrant => "Active warrant on file",
            Self::IncidentHistory => "Prior incident history",
            Self::TransitLog => "Transit log discrepancy",
            Self::HealthScan => "Irregular health scan",
            Self::IdentityScan => "Identity scan mismatch",
            Self::Interrogation => "Testimony withheld under questioning",
        }
    }

    /// Whether the subject actually carries this fact.
    const fn possessed_by(self, facts: &SubjectFacts) -> bool {
        match self {
            Self::Warrant => facts.has_active_warrant,
            Self::IncidentHistory => facts.has_incident_history,
            Self::TransitLog => matches!(facts.anomaly, DossierAnomaly::TransitDiscrepancy),
            Self::HealthScan => matches!(facts.anomaly, DossierAnomaly::HealthIrregularity),
            Self::IdentityScan => matches!(facts.anomaly, DossierAnomaly::IdentityMismatch),
            Self::Interrogation => matches!(facts.anomaly, DossierAnomaly::ConcealedTestimony),
        }
    }

    /// Whether the evidence step that would reveal this fact was completed.
    const fn surfaced_by(self, status: &ProtocolStatus, scans: &ScanRecord) -> bool {
        match self {
            Self::Warrant => status.warrant_checked,
            Self::IncidentHistory => status.database_queried,
            Self::TransitLog => status.credential_verified,
            Self::HealthScan => scans.health_scanned,
            Self::IdentityScan => scans.identity_scanned,
            Self::Interrogation => scans.interrogated,
        }
    }
}

impl fmt::Display for MissedInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub type MissedSet = SmallVec<[MissedInformation; 6]>;

/// Consequence tier, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsequenceKind {
    None,
    Warning,
    Citation,
    SeriousInfraction,
}

impl ConsequenceKind {
    pub const ALL: [Self; 4] = [
        Self::None,
        Self::Warning,
        Self::Citation,
        Self::SeriousInfraction,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "NO ACTION",
            Self::Warning => "WARNING",
            Self::Citation => "CITATION",
            Self::SeriousInfraction => "SERIOUS INFRACTION",
        }
    }
}

impl fmt::Display for ConsequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable outcome of one committed decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consequence {
    pub kind: ConsequenceKind,
    pub missed_information: MissedSet,
    pub credits_penalty: u32,
    pub infraction_count: u32,
}

impl Consequence {
    /// The most lenient outcome, used when content is too malformed to score.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            kind: ConsequenceKind::None,
            missed_information: MissedSet::new(),
            credits_penalty: 0,
            infraction_count: 0,
        }
    }

    /// Human-readable labels for the citation banner.
    #[must_use]
    pub fn missed_labels(&self) -> Vec<&'static str> {
        self.missed_information
            .iter()
            .map(|missed| missed.label())
            .collect()
    }
}

/// Facts the subject held whose evidence step was never completed.
#[must_use]
pub fn missed_information(
    status: &ProtocolStatus,
    scans: &ScanRecord,
    facts: &SubjectFacts,
) -> MissedSet {
    MissedInformation::ALL
        .into_iter()
        .filter(|missed| missed.possessed_by(facts) && !missed.surfaced_by(status, scans))
        .collect()
}

/// Pick the tier for a decision given what was missed.
#[must_use]
pub fn classify(
    decision: Decision,
    missed: &[MissedInformation],
    facts: &SubjectFacts,
) -> ConsequenceKind {
    let worst = missed.iter().map(|m| m.severity()).max();
    let harmful_admission = decision == Decision::Approve && facts.harmful_if_approved;
    let correct = decision == facts.correct_decision;

    match worst {
        Some(Severity::Critical) => ConsequenceKind::SeriousInfraction,
        _ if harmful_admission => ConsequenceKind::SeriousInfraction,
        Some(Severity::Medium) => ConsequenceKind::Citation,
        _ if !correct => ConsequenceKind::Citation,
        Some(Severity::Low) => ConsequenceKind::Warning,
        None => ConsequenceKind::None,
    }
}

/// Score a committed decision against the subject's private facts.
#[must_use]
pub fn compute_consequence(
    decision: Decision,
    status: &ProtocolStatus,
    scans: &ScanRecord,
    facts: &SubjectFacts,
    table: &PenaltyTable,
) -> Consequence {
    let missed = missed_information(status, scans, facts);
    let kind = classify(decision, &missed, facts);
    let band = table.band(kind);
    Consequence {
        kind,
        credits_penalty: band.credits_for(missed.len()),
        infraction_count: band.infractions,
        missed_information: missed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(anomaly: DossierAnomaly) -> SubjectFacts {
        SubjectFacts {
            has_active_warrant: false,
            has_incident_history: false,
            anomaly,
            correct_decision: Decision::Approve,
            harmful_if_approved: false,
        }
    }

    fn complete_status() -> ProtocolStatus {
        ProtocolStatus {
            scan_complete: true,
            credential_viewed: true,
            credential_verification_required: true,
            credential_verified: true,
            database_queried: true,
            warrant_check_required: true,
            warrant_checked: true,
        }
    }

    fn full_scans() -> ScanRecord {
        ScanRecord {
            identity_scanned: true,
            health_scanned: true,
            interrogated: true,
            equipment_failure: false,
        }
    }

    #[test]
    fn clean_correct_decision_is_none() {
        let consequence = compute_consequence(
            Decision::Approve,
            &complete_status(),
            &full_scans(),
            &facts(DossierAnomaly::None),
            &PenaltyTable::default(),
        );
        assert_eq!(consequence, Consequence::lenient());
    }

    #[test]
    fn missed_warrant_is_serious() {
        let subject = SubjectFacts {
            has_active_warrant: true,
            ..facts(DossierAnomaly::None)
        };
        let status = ProtocolStatus {
            warrant_checked: false,
            warrant_check_required: false,
            ..complete_status()
        };
        for decision in [Decision::Approve, Decision::Deny] {
            let consequence = compute_consequence(
                decision,
                &status,
                &full_scans(),
                &subject,
                &PenaltyTable::default(),
            );
            assert_eq!(consequence.kind, ConsequenceKind::SeriousInfraction);
            assert_eq!(
                consequence.missed_information.as_slice(),
                &[MissedInformation::Warrant]
            );
            assert_eq!(consequence.credits_penalty, 50);
            assert_eq!(consequence.infraction_count, 2);
        }
    }

    #[test]
    fn low_severity_miss_with_correct_decision_warns() {
        let status = ProtocolStatus {
            credential_verified: false,
            ..complete_status()
        };
        let consequence = compute_consequence(
            Decision::Approve,
            &status,
            &full_scans(),
            &facts(DossierAnomaly::TransitDiscrepancy),
            &PenaltyTable::default(),
        );
        assert_eq!(consequence.kind, ConsequenceKind::Warning);
        assert_eq!(consequence.missed_labels(), vec!["Transit log discrepancy"]);
        assert_eq!(consequence.credits_penalty, 5);
        assert_eq!(consequence.infraction_count, 0);
    }

    #[test]
    fn low_severity_miss_with_wrong_decision_cites() {
        let scans = ScanRecord {
            interrogated: false,
            ..full_scans()
        };
        let consequence = compute_consequence(
            Decision::Deny,
            &complete_status(),
            &scans,
            &facts(DossierAnomaly::ConcealedTestimony),
            &PenaltyTable::default(),
        );
        assert_eq!(consequence.kind, ConsequenceKind::Citation);
    }

    #[test]
    fn medium_miss_cites_even_when_correct() {
        let scans = ScanRecord {
            identity_scanned: false,
            ..full_scans()
        };
        let consequence = compute_consequence(
            Decision::Approve,
            &complete_status(),
            &scans,
            &facts(DossierAnomaly::IdentityMismatch),
            &PenaltyTable::default(),
        );
        assert_eq!(consequence.kind, ConsequenceKind::Citation);
        assert_eq!(consequence.credits_penalty, 20);
        assert_eq!(consequence.infraction_count, 1);
    }

    #[test]
    fn wrong_decision_without_misses_cites() {
        let subject = SubjectFacts {
            correct_decision: Decision::Deny,
            ..facts(DossierAnomaly::None)
        };
        let consequence = compute_consequence(
            Decision::Approve,
            &complete_status(),
            &full_scans(),
            &subject,
            &PenaltyTable::default(),
        );
        assert_eq!(consequence.kind, ConsequenceKind::Citation);
        assert!(consequence.missed_information.is_empty());
    }

    #[test]
    fn harmful_admission_is_serious_even_with_full_protocol() {
        let subject = SubjectFacts {
            correct_decision: Decision::Deny,
            harmful_if_approved: true,
            ..facts(DossierAnomaly::None)
        };
        let approve = compute_consequence(
            Decision::Approve,
            &complete_status(),
            &full_scans(),
            &subject,
            &PenaltyTable::default(),
        );
        assert_eq!(approve.kind, ConsequenceKind::SeriousInfraction);
        let deny = compute_consequence(
            Decision::Deny,
            &complete_status(),
            &full_scans(),
            &subject,
            &PenaltyTable::default(),
        );
        assert_eq!(deny.kind, ConsequenceKind::None);
    }

    #[test]
    fn surfaced_facts_are_not_missed() {
        let subject = SubjectFacts {
            has_active_warrant: true,
            has_incident_history: true,
            ..facts(DossierAnomaly::HealthIrregularity)
        };
        let missed = missed_information(&complete_status(), &full_scans(), &subject);
        assert!(missed.is_empty());

        let missed =
            missed_information(&ProtocolStatus::default(), &ScanRecord::default(), &subject);
        assert_eq!(
            missed.as_slice(),
            &[
                MissedInformation::Warrant,
                MissedInformation::IncidentHistory,
                MissedInformation::HealthScan
            ]
        );
    }

    #[test]
    fn penalty_grows_with_missed_count_within_band() {
        let subject = SubjectFacts {
            has_active_warrant: true,
            has_incident_history: true,
            ..facts(DossierAnomaly::IdentityMismatch)
        };
        let consequence = compute_consequence(
            Decision::Deny,
            &ProtocolStatus::default(),
            &ScanRecord::default(),
            &subject,
            &PenaltyTable::default(),
        );
        assert_eq!(consequence.kind, ConsequenceKind::SeriousInfraction);
        assert_eq!(consequence.missed_information.len(), 3);
        assert_eq!(consequence.credits_penalty, 70);
    }

    #[test]
    fn severity_ordering_is_total() {
        assert!(ConsequenceKind::None < ConsequenceKind::Warning);
        assert!(ConsequenceKind::Warning < ConsequenceKind::Citation);
        assert!(ConsequenceKind::Citation < ConsequenceKind::SeriousInfraction);
        assert!(Severity::Low < Severity::Critical);
    }
}
