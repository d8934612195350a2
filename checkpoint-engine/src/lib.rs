//! Checkpoint Adjudication Engine
//!
//! Platform-agnostic rules for the checkpoint: which decisions the operator may
//! take, the bounded uncertainty shown for each subject, and the consequence
//! scored when a decision is committed. No UI or platform dependencies.

pub mod biometrics;
pub mod config;
pub mod consequence;
pub mod constants;
pub mod data;
pub mod dossier;
pub mod encounter;
pub mod numbers;
pub mod protocol;
pub mod scan;
pub mod seed;
pub mod shift;

use thiserror::Error;

// Re-export commonly used types
pub use biometrics::{
    AmbiguousBiometrics, BiometricPolicy, BpmRange, Stability, generate_ambiguous_biometrics,
    observe_biometrics,
};
pub use config::{ConfigError, EngineConfig};
pub use consequence::{
    Consequence, ConsequenceKind, MissedInformation, MissedSet, PenaltyBand, PenaltyTable,
    PenaltyTableError, Severity, classify, compute_consequence, missed_information,
};
pub use data::{
    BaselineBpm, CatalogError, ContentShapeError, DossierAnomaly, GroundTruth, IdentityField,
    IdentityFields, Incident, ProtocolRequirements, Subject, SubjectCatalog, SubjectFacts,
    SubjectRoster,
};
pub use dossier::{DossierGaps, generate_dossier_gaps};
pub use encounter::Encounter;
pub use protocol::{
    AdjudicationError, Decision, NextStep, ProtocolAction, ProtocolGate, ProtocolStatus,
    ProtocolStep, Transition,
};
pub use scan::{ScanQuality, ScanRecord, incomplete_scan_warning, is_incomplete_scan};
pub use seed::{derive_stream_seed, seeded_random};
pub use shift::{DecisionRecord, ShiftLog};

/// Errors raised when starting an encounter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no subject with id {0:?} in the catalog")]
    UnknownSubject(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Binds a subject catalog to a validated configuration and opens encounters.
pub struct CheckpointEngine<C>
where
    C: SubjectCatalog,
{
    catalog: C,
    config: EngineConfig,
}

impl<C> CheckpointEngine<C>
where
    C: SubjectCatalog,
{
    /// Create an engine over `catalog`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(catalog: C, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { catalog, config })
    }

    #[must_use]
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open an encounter with the subject `id`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSubject`] if the catalog has no such subject.
    pub fn begin_encounter(&self, id: &str, session_seed: u64) -> Result<Encounter, EngineError> {
        let subject = self
            .catalog
            .subject(id)
            .ok_or_else(|| EngineError::UnknownSubject(id.to_string()))?;
        Ok(Encounter::new(
            subject.clone(),
            self.config.clone(),
            session_seed,
        ))
    }
}
