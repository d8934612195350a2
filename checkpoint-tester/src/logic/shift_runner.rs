use anyhow::{Context, Result};
use checkpoint_engine::{
    AdjudicationError, AmbiguousBiometrics, BiometricPolicy, CheckpointEngine, Decision,
    EngineConfig, ProtocolAction, ShiftLog, SubjectCatalog, SubjectRoster,
};

use crate::logic::policy::{BASELINE_ACTIONS, OperatorStrategy};

/// Assertion hook run after a shift completes.
pub type ShiftExpectation = fn(&ShiftSummary) -> Result<()>;

/// What to run for one scenario iteration.
#[derive(Clone)]
pub struct ShiftPlan {
    pub strategy: OperatorStrategy,
    pub policy_override: Option<BiometricPolicy>,
    /// Run a second shift at `seed + offset` and attach it as the replay.
    pub replay_offset: Option<u64>,
    pub expectations: Vec<ShiftExpectation>,
}

impl ShiftPlan {
    #[must_use]
    pub const fn new(strategy: OperatorStrategy) -> Self {
        Self {
            strategy,
            policy_override: None,
            replay_offset: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: BiometricPolicy) -> Self {
        self.policy_override = Some(policy);
        self
    }

    #[must_use]
    pub const fn with_replay(mut self, offset: u64) -> Self {
        self.replay_offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: ShiftExpectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

/// Outcome of one subject's encounter, beyond the decision record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterTrace {
    pub subject_id: String,
    pub reading: Option<AmbiguousBiometrics>,
    pub scan_warning: Option<&'static str>,
    pub rejected_decision: Option<Decision>,
}

/// Everything a scenario expectation can inspect.
#[derive(Debug, Clone)]
pub struct ShiftSummary {
    pub strategy: OperatorStrategy,
    pub seed: u64,
    pub roster_size: usize,
    pub log: ShiftLog,
    pub traces: Vec<EncounterTrace>,
    /// Gate answers that contradicted the protocol rules.
    pub gate_violations: Vec<String>,
    pub replay: Option<Box<ShiftSummary>>,
}

impl ShiftSummary {
    #[must_use]
    pub fn rejected_commits(&self) -> usize {
        self.traces
            .iter()
            .filter(|trace| trace.rejected_decision.is_some())
            .count()
    }
}

/// Drives whole shifts through the engine.
#[derive(Debug, Clone)]
pub struct ShiftRunner {
    roster: SubjectRoster,
    config: EngineConfig,
    verbose: bool,
}

impl ShiftRunner {
    #[must_use]
    pub const fn new(roster: SubjectRoster, config: EngineConfig, verbose: bool) -> Self {
        Self {
            roster,
            config,
            verbose,
        }
    }

    /// Runner over the bundled roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled roster fails to parse.
    pub fn try_new(config: EngineConfig, verbose: bool) -> Result<Self> {
        let roster = SubjectRoster::builtin().context("loading bundled subject roster")?;
        Ok(Self::new(roster, config, verbose))
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run_plan(&self, plan: &ShiftPlan, seed: u64) -> Result<ShiftSummary> {
        let mut summary = self.run_shift(plan, seed)?;
        if let Some(offset) = plan.replay_offset {
            let replay = self.run_shift(plan, seed.wrapping_add(offset))?;
            summary.replay = Some(Box::new(replay));
        }
        Ok(summary)
    }

    fn run_shift(&self, plan: &ShiftPlan, seed: u64) -> Result<ShiftSummary> {
        let mut config = self.config.clone();
        if let Some(policy) = plan.policy_override {
            config = config.with_policy(policy);
        }
        let engine = CheckpointEngine::new(self.roster.clone(), config)?;
        let mut policy = plan.strategy.create_policy(seed);
        let ids: Vec<String> = engine
            .catalog()
            .subject_ids()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut log = ShiftLog::new();
        let mut traces = Vec::with_capacity(ids.len());
        let mut gate_violations = Vec::new();

        for (idx, id) in ids.iter().enumerate() {
            let session_seed = seed.wrapping_add(u64::try_from(idx).unwrap_or(u64::MAX));
            let mut encounter = engine.begin_encounter(id, session_seed)?;
            policy.investigate(&mut encounter)?;

            let decision = policy.decide(&encounter);
            let allowed = encounter.status().allows(decision);
            let mut rejected_decision = None;
            let record = match encounter.commit(decision) {
                Ok(record) => {
                    if !allowed {
                        gate_violations.push(format!("{id}: {decision} accepted while gated"));
                    }
                    record
                }
                Err(AdjudicationError::IllegalDecision { .. }) => {
                    if allowed {
                        gate_violations.push(format!("{id}: legal {decision} rejected"));
                    }
                    rejected_decision = Some(decision);
                    for action in BASELINE_ACTIONS {
                        encounter.perform(action)?;
                    }
                    encounter.commit(Decision::Deny)?
                }
                Err(err) => return Err(err.into()),
            };

            if encounter.perform(ProtocolAction::CompleteScan).is_ok() {
                gate_violations.push(format!("{id}: action accepted after commit"));
            }
            if encounter.commit(Decision::Deny).is_ok() {
                gate_violations.push(format!("{id}: second commit accepted"));
            }

            if self.verbose {
                println!(
                    "    {id} {} -> {} ({} credits)",
                    record.decision, record.consequence.kind, record.consequence.credits_penalty
                );
            }
            log::debug!("{} committed {} for {id}", policy.name(), record.decision);

            traces.push(EncounterTrace {
                subject_id: id.clone(),
                reading: encounter.biometrics().copied(),
                scan_warning: encounter.incomplete_scan_warning(),
                rejected_decision,
            });
            log.record(record);
        }

        Ok(ShiftSummary {
            strategy: plan.strategy,
            seed,
            roster_size: ids.len(),
            log,
            traces,
            gate_violations,
            replay: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkpoint_engine::ConsequenceKind;

    fn runner() -> ShiftRunner {
        ShiftRunner::try_new(EngineConfig::default(), false).unwrap()
    }

    #[test]
    fn thorough_shift_is_clean() {
        let summary = runner()
            .run_plan(&ShiftPlan::new(OperatorStrategy::Thorough), 7)
            .unwrap();
        assert_eq!(summary.log.len(), summary.roster_size);
        assert_eq!(summary.log.total_credits_penalty(), 0);
        assert!(summary.gate_violations.is_empty());
        assert!(summary.traces.iter().all(|t| t.reading.is_some()));
    }

    #[test]
    fn hasty_shift_collects_penalties() {
        let summary = runner()
            .run_plan(&ShiftPlan::new(OperatorStrategy::Hasty), 7)
            .unwrap();
        let tally = summary.log.tally();
        assert!(tally.get(&ConsequenceKind::SeriousInfraction).copied().unwrap_or(0) >= 1);
        assert!(summary.traces.iter().all(|t| t.reading.is_none()));
        assert_eq!(summary.rejected_commits(), 0);
    }

    #[test]
    fn replay_attaches_second_run() {
        let plan = ShiftPlan::new(OperatorStrategy::Erratic).with_replay(0);
        let summary = runner().run_plan(&plan, 99).unwrap();
        let replay = summary.replay.as_ref().unwrap();
        assert_eq!(replay.seed, 99);
        assert_eq!(replay.log.digest(), summary.log.digest());
        assert!(summary.gate_violations.is_empty());
    }
}
