//! One subject's pass through the checkpoint, from first scan to decision.
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::biometrics::{AmbiguousBiometrics, observe_biometrics};
use crate::config::EngineConfig;
use crate::consequence::{Consequence, compute_consequence};
use crate::constants::{LOG_CONTENT_LENIENT_FALLBACK, LOG_DECISION_COMMIT};
use crate::data::{BaselineBpm, Subject, SubjectFacts};
use crate::dossier::{DossierGaps, generate_dossier_gaps};
use crate::protocol::{
    AdjudicationError, Decision, NextStep, ProtocolAction, ProtocolGate, ProtocolStatus,
    Transition,
};
use crate::scan::{ScanQuality, ScanRecord, incomplete_scan_warning};
use crate::seed::derive_stream_seed;
use crate::shift::DecisionRecord;

const SESSION_STREAM_PREFIX: &str = "encounter:";

/// Live encounter state. Owns the protocol gate and the latched readings.
#[derive(Debug, Clone)]
pub struct Encounter {
    subject: Subject,
    config: EngineConfig,
    gate: ProtocolGate,
    gaps: DossierGaps,
    session_rng: ChaCha20Rng,
    biometrics: Option<AmbiguousBiometrics>,
    record: Option<DecisionRecord>,
}

impl Encounter {
    /// Open an encounter. `session_seed` drives every ephemeral roll.
    #[must_use]
    pub fn new(subject: Subject, config: EngineConfig, session_seed: u64) -> Self {
        let tag = format!("{SESSION_STREAM_PREFIX}{}", subject.id);
        let session_rng = ChaCha20Rng::seed_from_u64(derive_stream_seed(
            &session_seed.to_le_bytes(),
            tag.as_bytes(),
        ));
        let gaps = generate_dossier_gaps(&subject.id);
        let gate = ProtocolGate::new(subject.protocol);
        log::debug!(
            "encounter opened for {} ({} dossier gaps)",
            subject.id,
            gaps.len()
        );
        Self {
            subject,
            config,
            gate,
            gaps,
            session_rng,
            biometrics: None,
            record: None,
        }
    }

    #[must_use]
    pub const fn subject(&self) -> &Subject {
        &self.subject
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn dossier_gaps(&self) -> &DossierGaps {
        &self.gaps
    }

    /// The health-scan reading, once taken.
    #[must_use]
    pub const fn biometrics(&self) -> Option<&AmbiguousBiometrics> {
        self.biometrics.as_ref()
    }

    #[must_use]
    pub const fn status(&self) -> &ProtocolStatus {
        self.gate.status()
    }

    #[must_use]
    pub const fn scans(&self) -> &ScanRecord {
        self.gate.scans()
    }

    #[must_use]
    pub fn scan_quality(&self) -> ScanQuality {
        ScanQuality::from(self.gate.scans())
    }

    #[must_use]
    pub fn incomplete_scan_warning(&self) -> Option<&'static str> {
        incomplete_scan_warning(&self.scan_quality())
    }

    #[must_use]
    pub const fn approve_enabled(&self) -> bool {
        self.gate.approve_enabled()
    }

    #[must_use]
    pub const fn deny_enabled(&self) -> bool {
        self.gate.deny_enabled()
    }

    #[must_use]
    pub const fn next_step(&self) -> NextStep {
        self.gate.next_step()
    }

    #[must_use]
    pub const fn is_decided(&self) -> bool {
        self.gate.has_decision()
    }

    #[must_use]
    pub const fn decision_record(&self) -> Option<&DecisionRecord> {
        self.record.as_ref()
    }

    /// Apply an operator action. The first health scan takes the biometric reading.
    ///
    /// # Errors
    ///
    /// Returns [`AdjudicationError::EncounterClosed`] after a decision was committed.
    pub fn perform(&mut self, action: ProtocolAction) -> Result<Transition, AdjudicationError> {
        let transition = self.gate.apply(action)?;
        if action == ProtocolAction::ScanHealth && self.biometrics.is_none() {
            let baseline = self
                .subject
                .baseline_bpm
                .clone()
                .unwrap_or_else(|| BaselineBpm::from(self.subject.baseline()));
            let reading = observe_biometrics(
                self.config.biometric_policy,
                &self.subject.id,
                &baseline,
                self.config.equipment_reliability,
                &mut self.session_rng,
            );
            if reading.is_error {
                log::info!("health scan equipment fault for {}", self.subject.id);
                self.gate.record_equipment_failure();
            }
            self.biometrics = Some(reading);
        }
        Ok(transition)
    }

    /// Commit the operator's decision and score it.
    ///
    /// # Errors
    ///
    /// Returns [`AdjudicationError::AlreadyDecided`] on a second commit and
    /// [`AdjudicationError::IllegalDecision`] when the gate does not permit `decision`.
    pub fn commit(&mut self, decision: Decision) -> Result<DecisionRecord, AdjudicationError> {
        if self.gate.has_decision() {
            return Err(AdjudicationError::AlreadyDecided {
                subject_id: self.subject.id.clone(),
            });
        }
        if !self.gate.status().allows(decision) {
            return Err(AdjudicationError::IllegalDecision {
                decision,
                next: self.gate.next_step(),
            });
        }

        let (status, scans) = self.gate.freeze();
        let (consequence, content_fallback) = match SubjectFacts::from_subject(&self.subject) {
            Ok(facts) => (
                compute_consequence(decision, &status, &scans, &facts, &self.config.penalties),
                false,
            ),
            Err(err) => {
                log::warn!("{LOG_CONTENT_LENIENT_FALLBACK} | {err}");
                (Consequence::lenient(), true)
            }
        };
        log::info!(
            "{LOG_DECISION_COMMIT} | {} {decision} -> {} ({} credits, {} infractions)",
            self.subject.id,
            consequence.kind,
            consequence.credits_penalty,
            consequence.infraction_count
        );

        let record = DecisionRecord {
            subject_id: self.subject.id.clone(),
            decision,
            protocol: status,
            scans,
            consequence,
            content_fallback,
        };
        self.record = Some(record.clone());
        Ok(record)
    }

    /// Walk away without deciding. Nothing is recorded.
    pub fn abandon(self) {
        if !self.gate.has_decision() {
            log::debug!("encounter abandoned for {}", self.subject.id);
        }
    }
}
