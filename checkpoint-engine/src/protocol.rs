//! Protocol gate: which evidence was gathered and which decisions are legal.
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{LOG_GATE_TRANSITION, PROMPT_PROTOCOL_COMPLETE};
use crate::data::ProtocolRequirements;
use crate::scan::ScanRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Deny,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => f.write_str("APPROVE"),
            Self::Deny => f.write_str("DENY"),
        }
    }
}

/// Per-encounter protocol latches plus the two requirement flags fixed at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProtocolStatus {
    pub scan_complete: bool,
    pub credential_viewed: bool,
    pub credential_verification_required: bool,
    pub credential_verified: bool,
    pub database_queried: bool,
    pub warrant_check_required: bool,
    pub warrant_checked: bool,
}

impl ProtocolStatus {
    #[must_use]
    pub const fn new(requirements: ProtocolRequirements) -> Self {
        Self {
            scan_complete: false,
            credential_viewed: false,
            credential_verification_required: requirements.credential_verification,
            credential_verified: false,
            database_queried: false,
            warrant_check_required: requirements.warrant_check,
            warrant_checked: false,
        }
    }

    const fn verification_outstanding(&self) -> bool {
        self.credential_verification_required && !self.credential_verified
    }

    const fn warrant_outstanding(&self) -> bool {
        self.warrant_check_required && !self.warrant_checked
    }

    /// Refusal needs the baseline evidence only.
    #[must_use]
    pub const fn deny_enabled(&self) -> bool {
        self.scan_complete && self.credential_viewed && self.database_queried
    }

    /// Admission additionally needs every required verification.
    #[must_use]
    pub const fn approve_enabled(&self) -> bool {
        self.deny_enabled() && !self.verification_outstanding() && !self.warrant_outstanding()
    }

    #[must_use]
    pub const fn allows(&self, decision: Decision) -> bool {
        match decision {
            Decision::Approve => self.approve_enabled(),
            Decision::Deny => self.deny_enabled(),
        }
    }

    /// The single next action the operator should take.
    #[must_use]
    pub const fn next_step(&self) -> NextStep {
        if !self.scan_complete {
            NextStep::Perform(ProtocolStep::Scan)
        } else if !self.credential_viewed {
            NextStep::Perform(ProtocolStep::ViewCredential)
        } else if !self.database_queried {
            NextStep::Perform(ProtocolStep::QueryDatabase)
        } else if self.warrant_outstanding() {
            NextStep::Perform(ProtocolStep::CheckWarrant)
        } else if self.verification_outstanding() {
            NextStep::Perform(ProtocolStep::VerifyCredential)
        } else {
            NextStep::Complete
        }
    }
}

/// Gating steps in prompt priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolStep {
    Scan,
    ViewCredential,
    QueryDatabase,
    CheckWarrant,
    VerifyCredential,
}

impl ProtocolStep {
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Scan => "COMPLETE BIOMETRIC SCAN",
            Self::ViewCredential => "REVIEW CREDENTIAL",
            Self::QueryDatabase => "QUERY DATABASE",
            Self::CheckWarrant => "CHECK WARRANTS",
            Self::VerifyCredential => "VERIFY CREDENTIAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    Perform(ProtocolStep),
    Complete,
}

impl NextStep {
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Perform(step) => step.prompt(),
            Self::Complete => PROMPT_PROTOCOL_COMPLETE,
        }
    }
}

impl fmt::Display for NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prompt())
    }
}

/// Every operator action that can move the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolAction {
    /// Latches `scan_complete` only. The identity and health sub-scans are
    /// separate actions; a completed scan says nothing about whether they ran.
    CompleteScan,
    ViewCredential,
    QueryDatabase,
    VerifyCredential,
    CheckWarrant,
    ScanIdentity,
    ScanHealth,
    Interrogate,
}

impl ProtocolAction {
    pub const ALL: [Self; 8] = [
        Self::CompleteScan,
        Self::ViewCredential,
        Self::QueryDatabase,
        Self::VerifyCredential,
        Self::CheckWarrant,
        Self::ScanIdentity,
        Self::ScanHealth,
        Self::Interrogate,
    ];
}

/// What an action did to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    Latched,
    Unchanged,
    /// The action has no meaning for this subject (e.g. verifying an unflagged credential).
    NotApplicable,
}

/// Contract violations; gameplay outcomes are never reported through this type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdjudicationError {
    #[error("{decision} is not permitted yet; next step is {next}")]
    IllegalDecision { decision: Decision, next: NextStep },
    #[error("a decision was already committed for subject {subject_id}")]
    AlreadyDecided { subject_id: String },
    #[error("encounter is closed; {action:?} rejected")]
    EncounterClosed { action: ProtocolAction },
}

/// Protocol state for a single encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolGate {
    status: ProtocolStatus,
    scans: ScanRecord,
    has_decision: bool,
}

impl ProtocolGate {
    #[must_use]
    pub const fn new(requirements: ProtocolRequirements) -> Self {
        Self {
            status: ProtocolStatus::new(requirements),
            scans: ScanRecord {
                identity_scanned: false,
                health_scanned: false,
                interrogated: false,
                equipment_failure: false,
            },
            has_decision: false,
        }
    }

    #[must_use]
    pub const fn status(&self) -> &ProtocolStatus {
        &self.status
    }

    #[must_use]
    pub const fn scans(&self) -> &ScanRecord {
        &self.scans
    }

    #[must_use]
    pub const fn has_decision(&self) -> bool {
        self.has_decision
    }

    #[must_use]
    pub const fn approve_enabled(&self) -> bool {
        !self.has_decision && self.status.approve_enabled()
    }

    #[must_use]
    pub const fn deny_enabled(&self) -> bool {
        !self.has_decision && self.status.deny_enabled()
    }

    #[must_use]
    pub const fn next_step(&self) -> NextStep {
        self.status.next_step()
    }

    /// Apply one operator action.
    ///
    /// # Errors
    ///
    /// Returns [`AdjudicationError::EncounterClosed`] once a decision has been committed.
    pub fn apply(&mut self, action: ProtocolAction) -> Result<Transition, AdjudicationError> {
        if self.has_decision {
            return Err(AdjudicationError::EncounterClosed { action });
        }
        let status = &mut self.status;
        let scans = &mut self.scans;
        let transition = match action {
            ProtocolAction::CompleteScan => latch(&mut status.scan_complete),
            ProtocolAction::ViewCredential => latch(&mut status.credential_viewed),
            ProtocolAction::QueryDatabase => latch(&mut status.database_queried),
            ProtocolAction::CheckWarrant => latch(&mut status.warrant_checked),
            ProtocolAction::VerifyCredential => {
                if status.credential_verification_required {
                    latch(&mut status.credential_verified)
                } else {
                    Transition::NotApplicable
                }
            }
            ProtocolAction::ScanIdentity => latch(&mut scans.identity_scanned),
            ProtocolAction::ScanHealth => latch(&mut scans.health_scanned),
            ProtocolAction::Interrogate => latch(&mut scans.interrogated),
        };
        log::debug!("{LOG_GATE_TRANSITION} | {action:?} -> {transition:?}");
        Ok(transition)
    }

    /// Record that the health scan produced an equipment error.
    pub(crate) const fn record_equipment_failure(&mut self) {
        self.scans.equipment_failure = true;
    }

    /// Close the gate and hand back the frozen evidence.
    pub(crate) const fn freeze(&mut self) -> (ProtocolStatus, ScanRecord) {
        self.has_decision = true;
        (self.status, self.scans)
    }
}

const fn latch(flag: &mut bool) -> Transition {
    if *flag {
        Transition::Unchanged
    } else {
        *flag = true;
        Transition::Latched
    }
}
