use std::fmt;

use anyhow::Result;
use checkpoint_engine::{Decision, Encounter, ProtocolAction};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

const ERRATIC_ACTION_PROBABILITY: f64 = 0.6;

/// The three steps that make a denial legal.
pub const BASELINE_ACTIONS: [ProtocolAction; 3] = [
    ProtocolAction::CompleteScan,
    ProtocolAction::ViewCredential,
    ProtocolAction::QueryDatabase,
];

/// Scripted operator behaviour for automated shifts.
pub trait OperatorPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Gather evidence for the open encounter.
    fn investigate(&mut self, encounter: &mut Encounter) -> Result<()>;

    /// Pick the decision to commit.
    fn decide(&mut self, encounter: &Encounter) -> Decision;
}

/// Built-in operator strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorStrategy {
    /// Runs every check and always makes the right call.
    Thorough,
    /// Runs the minimum needed to decide and approves whenever allowed.
    Hasty,
    /// Random evidence and random decisions; probes the gate.
    Erratic,
}

impl OperatorStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Thorough => "Thorough",
            Self::Hasty => "Hasty",
            Self::Erratic => "Erratic",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn OperatorPolicy> {
        match self {
            Self::Thorough => Box::new(ThoroughPolicy),
            Self::Hasty => Box::new(HastyPolicy),
            Self::Erratic => Box::new(ErraticPolicy::new(seed)),
        }
    }
}

impl fmt::Display for OperatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct ThoroughPolicy;
struct HastyPolicy;

struct ErraticPolicy {
    rng: ChaCha20Rng,
}

impl ErraticPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl OperatorPolicy for ThoroughPolicy {
    fn name(&self) -> &'static str {
        "Thorough"
    }

    fn investigate(&mut self, encounter: &mut Encounter) -> Result<()> {
        for action in ProtocolAction::ALL {
            encounter.perform(action)?;
        }
        Ok(())
    }

    fn decide(&mut self, encounter: &Encounter) -> Decision {
        encounter
            .subject()
            .ground_truth
            .map_or(Decision::Deny, |truth| truth.correct_decision)
    }
}

impl OperatorPolicy for HastyPolicy {
    fn name(&self) -> &'static str {
        "Hasty"
    }

    fn investigate(&mut self, encounter: &mut Encounter) -> Result<()> {
        for action in BASELINE_ACTIONS {
            encounter.perform(action)?;
        }
        Ok(())
    }

    fn decide(&mut self, encounter: &Encounter) -> Decision {
        if encounter.approve_enabled() {
            Decision::Approve
        } else {
            Decision::Deny
        }
    }
}

impl OperatorPolicy for ErraticPolicy {
    fn name(&self) -> &'static str {
        "Erratic"
    }

    fn investigate(&mut self, encounter: &mut Encounter) -> Result<()> {
        for action in ProtocolAction::ALL {
            if self.rng.gen_bool(ERRATIC_ACTION_PROBABILITY) {
                encounter.perform(action)?;
            }
        }
        Ok(())
    }

    fn decide(&mut self, _encounter: &Encounter) -> Decision {
        if self.rng.gen_bool(0.5) {
            Decision::Approve
        } else {
            Decision::Deny
        }
    }
}
