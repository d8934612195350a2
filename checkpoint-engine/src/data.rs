//! Authored subject content and the read-only catalog the engine consults.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_BASELINE_BPM, LOG_CONTENT_MISSING_BASELINE};
use crate::numbers::floor_f64_to_u32;
use crate::protocol::Decision;

/// The five biographical fields a dossier can redact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    Name,
    DateOfBirth,
    Address,
    Occupation,
    Sex,
}

impl IdentityField {
    /// Canonical order; the index doubles as the per-field seed suffix.
    pub const ALL: [Self; 5] = [
        Self::Name,
        Self::DateOfBirth,
        Self::Address,
        Self::Occupation,
        Self::Sex,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Name => 0,
            Self::DateOfBirth => 1,
            Self::Address => 2,
            Self::Occupation => 3,
            Self::Sex => 4,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "NAME",
            Self::DateOfBirth => "DATE OF BIRTH",
            Self::Address => "ADDRESS",
            Self::Occupation => "OCCUPATION",
            Self::Sex => "SEX",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IdentityFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
}

impl IdentityFields {
    #[must_use]
    pub fn value(&self, field: IdentityField) -> Option<&str> {
        let slot = match field {
            IdentityField::Name => &self.name,
            IdentityField::DateOfBirth => &self.date_of_birth,
            IdentityField::Address => &self.address,
            IdentityField::Occupation => &self.occupation,
            IdentityField::Sex => &self.sex,
        };
        slot.as_deref()
    }
}

/// Baseline heart rate as authored: either a number or free text such as "72 bpm, resting".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BaselineBpm {
    Numeric(u32),
    Text(String),
}

/// Raw JSON shape of a baseline before it is normalized.
#[derive(Deserialize)]
#[serde(untagged)]
enum AuthoredBaseline {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for BaselineBpm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match AuthoredBaseline::deserialize(deserializer)? {
            AuthoredBaseline::Number(value) => Self::from_number(value),
            AuthoredBaseline::Text(text) => Self::Text(text),
        })
    }
}

fn leading_integer() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("static pattern compiles"))
}

impl BaselineBpm {
    /// Normalize an authored number: fractions floor, unusable values take the default.
    #[must_use]
    pub fn from_number(value: f64) -> Self {
        floor_f64_to_u32(value).map_or_else(
            || {
                log::warn!(
                    "{LOG_CONTENT_MISSING_BASELINE} | baseline {value} is out of range, using {DEFAULT_BASELINE_BPM}"
                );
                Self::Numeric(DEFAULT_BASELINE_BPM)
            },
            Self::Numeric,
        )
    }

    /// Resolve to beats per minute, extracting the first embedded integer from text.
    #[must_use]
    pub fn resolve(&self) -> u32 {
        match self {
            Self::Numeric(bpm) => *bpm,
            Self::Text(text) => leading_integer()
                .find(text)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or_else(|| {
                    log::warn!(
                        "{LOG_CONTENT_MISSING_BASELINE} | baseline {text:?} has no reading, using {DEFAULT_BASELINE_BPM}"
                    );
                    DEFAULT_BASELINE_BPM
                }),
        }
    }
}

impl From<u32> for BaselineBpm {
    fn from(value: u32) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for BaselineBpm {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub code: String,
    #[serde(default)]
    pub summary: String,
}

/// Which hidden irregularity the subject's dossier carries, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DossierAnomaly {
    #[default]
    None,
    IdentityMismatch,
    HealthIrregularity,
    TransitDiscrepancy,
    ConcealedTestimony,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub correct_decision: Decision,
    #[serde(default)]
    pub harmful_if_approved: bool,
}

/// Requirement flags fixed when an encounter starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProtocolRequirements {
    #[serde(default)]
    pub credential_verification: bool,
    #[serde(default)]
    pub warrant_check: bool,
}

/// A scripted character reviewed at the checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub identity: IdentityFields,
    #[serde(default)]
    pub baseline_bpm: Option<BaselineBpm>,
    #[serde(default)]
    pub warrant: Option<bool>,
    #[serde(default)]
    pub incident_history: Vec<Incident>,
    #[serde(default)]
    pub dossier_anomaly: DossierAnomaly,
    #[serde(default)]
    pub protocol: ProtocolRequirements,
    #[serde(default)]
    pub ground_truth: Option<GroundTruth>,
}

impl Subject {
    /// Baseline BPM with the content default applied.
    #[must_use]
    pub fn baseline(&self) -> u32 {
        if let Some(baseline) = &self.baseline_bpm {
            baseline.resolve()
        } else {
            log::warn!(
                "{LOG_CONTENT_MISSING_BASELINE} | subject {} has no baseline, using {DEFAULT_BASELINE_BPM}",
                self.id
            );
            DEFAULT_BASELINE_BPM
        }
    }
}

/// A subject record is missing something the rules need.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContentShapeError {
    #[error("subject record has no id")]
    MissingId,
    #[error("subject {subject_id} has no warrant flag")]
    MissingWarrantFlag { subject_id: String },
    #[error("subject {subject_id} has no ground truth")]
    MissingGroundTruth { subject_id: String },
    #[error("subject {subject_id} is marked both correct to approve and harmful if approved")]
    ContradictoryGroundTruth { subject_id: String },
}

/// The validated private facts the consequence engine scores against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectFacts {
    pub has_active_warrant: bool,
    pub has_incident_history: bool,
    pub anomaly: DossierAnomaly,
    pub correct_decision: Decision,
    pub harmful_if_approved: bool,
}

impl SubjectFacts {
    /// Project the facts out of an authored record.
    ///
    /// # Errors
    ///
    /// Returns a [`ContentShapeError`] when the record lacks an id, a warrant
    /// flag or ground truth, or when its ground truth calls a harmful
    /// admission correct.
    pub fn from_subject(subject: &Subject) -> Result<Self, ContentShapeError> {
        if subject.id.trim().is_empty() {
            return Err(ContentShapeError::MissingId);
        }
        let has_active_warrant =
            subject
                .warrant
                .ok_or_else(|| ContentShapeError::MissingWarrantFlag {
                    subject_id: subject.id.clone(),
                })?;
        let truth = subject
            .ground_truth
            .ok_or_else(|| ContentShapeError::MissingGroundTruth {
                subject_id: subject.id.clone(),
            })?;
        if truth.harmful_if_approved && truth.correct_decision == Decision::Approve {
            return Err(ContentShapeError::ContradictoryGroundTruth {
                subject_id: subject.id.clone(),
            });
        }
        Ok(Self {
            has_active_warrant,
            has_incident_history: !subject.incident_history.is_empty(),
            anomaly: subject.dossier_anomaly,
            correct_decision: truth.correct_decision,
            harmful_if_approved: truth.harmful_if_approved,
        })
    }
}

/// Read-only subject lookup, loaded once at content init.
pub trait SubjectCatalog {
    /// Look up an authored subject by id.
    fn subject(&self, id: &str) -> Option<&Subject>;

    /// Every subject id, in stable order.
    fn subject_ids(&self) -> Vec<&str>;
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("subject roster is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("subject id {0:?} appears more than once")]
    DuplicateId(String),
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    subjects: Vec<Subject>,
}

/// Immutable JSON-backed catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubjectRoster {
    subjects: BTreeMap<String, Subject>,
}

impl SubjectRoster {
    /// Create an empty roster (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a roster from pre-parsed subjects.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if two subjects share an id.
    pub fn from_subjects(subjects: Vec<Subject>) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for subject in subjects {
            let id = subject.id.clone();
            if map.insert(id.clone(), subject).is_some() {
                return Err(CatalogError::DuplicateId(id));
            }
        }
        Ok(Self { subjects: map })
    }

    /// Load a roster from a JSON document of the form `{"subjects": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or ids collide.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: RosterFile = serde_json::from_str(json)?;
        Self::from_subjects(file.subjects)
    }

    /// The roster bundled with the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled content fails to parse.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(include_str!("../data/subjects.json"))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.values()
    }
}

impl SubjectCatalog for SubjectRoster {
    fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.get(id)
    }

    fn subject_ids(&self) -> Vec<&str> {
        self.subjects.keys().map(String::as_str).collect()
    }
}
