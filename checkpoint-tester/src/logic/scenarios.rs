use anyhow::Result;
use checkpoint_engine::{BiometricPolicy, ConsequenceKind};

use crate::logic::policy::OperatorStrategy;
use crate::logic::shift_runner::{ShiftPlan, ShiftSummary};

/// A named shift plan with its expectations.
#[derive(Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub plan: ShiftPlan,
}

impl TestScenario {
    const fn new(
        key: &'static str,
        name: &'static str,
        description: &'static str,
        plan: ShiftPlan,
    ) -> Self {
        Self {
            key,
            name,
            description,
            plan,
        }
    }
}

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::new(
            "smoke",
            "Smoke Test",
            "Every subject is processed once and recorded",
            ShiftPlan::new(OperatorStrategy::Hasty).with_expectation(smoke_expectation),
        ),
        TestScenario::new(
            "gate-legality",
            "Gate Legality",
            "Random operators never get an illegal decision past the gate",
            ShiftPlan::new(OperatorStrategy::Erratic).with_expectation(gate_expectation),
        ),
        TestScenario::new(
            "thorough-shift",
            "Thorough Shift",
            "Full protocol with correct calls earns no penalties",
            ShiftPlan::new(OperatorStrategy::Thorough)
                .with_expectation(gate_expectation)
                .with_expectation(clean_shift_expectation),
        ),
        TestScenario::new(
            "hasty-shift",
            "Hasty Shift",
            "Skipping checks is caught and penalties add up",
            ShiftPlan::new(OperatorStrategy::Hasty)
                .with_expectation(gate_expectation)
                .with_expectation(hasty_shift_expectation),
        ),
        TestScenario::new(
            "deterministic-replay",
            "Deterministic Replay",
            "Same seed, same shift, same digest",
            ShiftPlan::new(OperatorStrategy::Erratic)
                .with_replay(0)
                .with_expectation(replay_expectation),
        ),
        TestScenario::new(
            "seeded-biometrics",
            "Seeded Biometrics",
            "Seeded readings stay fixed per subject across sessions",
            ShiftPlan::new(OperatorStrategy::Thorough)
                .with_policy(BiometricPolicy::Seeded)
                .with_replay(1)
                .with_expectation(seeded_readings_expectation),
        ),
    ]
}

pub fn find_scenario(key: &str) -> Option<TestScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog_scenarios()
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

fn smoke_expectation(summary: &ShiftSummary) -> Result<()> {
    anyhow::ensure!(summary.roster_size > 0, "Roster should not be empty");
    anyhow::ensure!(
        summary.log.len() == summary.roster_size,
        "Expected {} records, found {}",
        summary.roster_size,
        summary.log.len()
    );
    let credits: u64 = summary
        .log
        .records()
        .iter()
        .map(|r| u64::from(r.consequence.credits_penalty))
        .sum();
    anyhow::ensure!(
        credits == summary.log.total_credits_penalty(),
        "Shift credit total does not match its records"
    );
    Ok(())
}

fn gate_expectation(summary: &ShiftSummary) -> Result<()> {
    if let Some(first) = summary.gate_violations.first() {
        anyhow::bail!(
            "{} gate violations, first: {first}",
            summary.gate_violations.len()
        );
    }
    for record in summary.log.records() {
        anyhow::ensure!(
            record.protocol.allows(record.decision),
            "{} committed {} without the required protocol",
            record.subject_id,
            record.decision
        );
        if record.protocol.credential_verified {
            anyhow::ensure!(
                record.protocol.credential_verification_required,
                "{} verified a credential that needed no verification",
                record.subject_id
            );
        }
    }
    Ok(())
}

fn clean_shift_expectation(summary: &ShiftSummary) -> Result<()> {
    for record in summary.log.records() {
        anyhow::ensure!(
            record.consequence.kind == ConsequenceKind::None,
            "{} scored {} after a thorough, correct call (missed: {:?})",
            record.subject_id,
            record.consequence.kind,
            record.consequence.missed_labels()
        );
    }
    anyhow::ensure!(
        summary.log.total_infractions() == 0,
        "Thorough shift should carry no infractions"
    );
    Ok(())
}

fn hasty_shift_expectation(summary: &ShiftSummary) -> Result<()> {
    let tally = summary.log.tally();
    let serious = tally
        .get(&ConsequenceKind::SeriousInfraction)
        .copied()
        .unwrap_or(0);
    anyhow::ensure!(serious > 0, "Hasty shift should miss at least one warrant");
    for record in summary.log.records() {
        let missed_warrant = record
            .consequence
            .missed_information
            .contains(&checkpoint_engine::MissedInformation::Warrant);
        if missed_warrant {
            anyhow::ensure!(
                record.consequence.kind == ConsequenceKind::SeriousInfraction,
                "{} missed a warrant but scored {}",
                record.subject_id,
                record.consequence.kind
            );
        }
    }
    anyhow::ensure!(
        summary.traces.iter().all(|t| t.scan_warning.is_some()),
        "Hasty operators skip supplemental scans; every dossier should carry a warning"
    );
    Ok(())
}

fn replay_expectation(summary: &ShiftSummary) -> Result<()> {
    let Some(replay) = summary.replay.as_deref() else {
        anyhow::bail!("Replay run missing");
    };
    anyhow::ensure!(
        replay.log.digest() == summary.log.digest(),
        "Replay digest {:#018x} differs from {:#018x}",
        replay.log.digest(),
        summary.log.digest()
    );
    anyhow::ensure!(
        replay.traces == summary.traces,
        "Replay produced different encounter traces"
    );
    Ok(())
}

fn seeded_readings_expectation(summary: &ShiftSummary) -> Result<()> {
    let Some(replay) = summary.replay.as_deref() else {
        anyhow::bail!("Replay run missing");
    };
    anyhow::ensure!(replay.seed != summary.seed, "Replay should use a new session seed");
    for (first, second) in summary.traces.iter().zip(&replay.traces) {
        anyhow::ensure!(
            first.reading == second.reading,
            "{} reading changed between sessions: {:?} vs {:?}",
            first.subject_id,
            first.reading,
            second.reading
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::shift_runner::ShiftRunner;
    use checkpoint_engine::EngineConfig;

    #[test]
    fn every_scenario_is_listed_once() {
        let keys: Vec<_> = list_scenarios().into_iter().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            vec![
                "smoke",
                "gate-legality",
                "thorough-shift",
                "hasty-shift",
                "deterministic-replay",
                "seeded-biometrics",
            ]
        );
        assert!(find_scenario("hasty-shift").is_some());
        assert!(find_scenario("nope").is_none());
    }

    #[test]
    fn catalog_scenarios_pass_for_a_seed() {
        let runner = ShiftRunner::try_new(EngineConfig::default(), false).unwrap();
        for scenario in catalog_scenarios() {
            let summary = runner.run_plan(&scenario.plan, 1337).unwrap();
            for expectation in &scenario.plan.expectations {
                expectation(&summary)
                    .unwrap_or_else(|err| panic!("{} failed: {err}", scenario.key));
            }
        }
    }

    #[test]
    fn replay_expectation_flags_missing_replay() {
        let runner = ShiftRunner::try_new(EngineConfig::default(), false).unwrap();
        let plan = ShiftPlan::new(OperatorStrategy::Hasty);
        let summary = runner.run_plan(&plan, 1).unwrap();
        assert!(replay_expectation(&summary).is_err());
    }
}
