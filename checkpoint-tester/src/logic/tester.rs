use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::scenarios::TestScenario;
use crate::logic::shift_runner::{ShiftPlan, ShiftRunner, ShiftSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    /// Credits summed over every iteration's shift.
    pub total_credits_penalty: u64,
    pub total_infractions: u64,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    runner: ShiftRunner,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(runner: ShiftRunner, verbose: bool) -> Self {
        Self { runner, verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (operator: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.strategy,
                    seed
                );
            }

            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let outcome = self.run_shift_iterations(&scenario.plan, seed, iterations);

        let avg_duration = if outcome.performance_data.is_empty() {
            Duration::ZERO
        } else {
            outcome.performance_data.iter().sum::<Duration>()
                / u32::try_from(outcome.performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            passed: outcome.failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: outcome.successes,
            failures: outcome.failures,
            total_credits_penalty: outcome.credits,
            total_infractions: outcome.infractions,
            average_duration: avg_duration,
            performance_data: outcome.performance_data,
        }
    }

    fn run_shift_iterations(
        &self,
        plan: &ShiftPlan,
        seed: u64,
        iterations: usize,
    ) -> IterationOutcome {
        let mut outcome = IterationOutcome::default();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = match self.runner.run_plan(plan, iteration_seed) {
                Ok(summary) => summary,
                Err(err) => {
                    outcome.failures.push(format!(
                        "Iteration {} (operator {}, seed {}): shift aborted: {err:#}",
                        i + 1,
                        plan.strategy,
                        iteration_seed
                    ));
                    continue;
                }
            };
            outcome.credits += summary.log.total_credits_penalty();
            outcome.infractions += summary.log.total_infractions();

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let context = summarize_shift(&summary);
                outcome.failures.push(format!(
                    "Iteration {} (operator {}, seed {}, records {}): {} | {}",
                    i + 1,
                    plan.strategy,
                    summary.seed,
                    summary.log.len(),
                    err,
                    context
                ));

                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                    println!("     ↳ Seed {} | {}", summary.seed, context);
                }
            } else {
                outcome.successes += 1;
                let duration = start_time.elapsed();
                outcome.performance_data.push(duration);

                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) credits:{} infractions:{} rejected:{} digest:{:#018x}",
                        i + 1,
                        iterations,
                        summary.log.total_credits_penalty(),
                        summary.log.total_infractions(),
                        summary.rejected_commits(),
                        summary.log.digest()
                    );
                }
            }
        }

        outcome
    }
}

#[derive(Debug, Default)]
struct IterationOutcome {
    successes: usize,
    failures: Vec<String>,
    performance_data: Vec<Duration>,
    credits: u64,
    infractions: u64,
}

fn evaluate_expectations(plan: &ShiftPlan, summary: &ShiftSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn summarize_shift(summary: &ShiftSummary) -> String {
    if summary.log.is_empty() {
        return "no decisions recorded".to_string();
    }

    summary
        .log
        .records()
        .iter()
        .rev()
        .take(3)
        .map(|record| {
            let missed = record.consequence.missed_labels();
            let missed = if missed.is_empty() {
                "-".to_string()
            } else {
                missed.join(", ")
            };
            format!(
                "{}: {} -> {} [{}]",
                record.subject_id, record.decision, record.consequence.kind, missed
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scenarios::find_scenario;
    use checkpoint_engine::EngineConfig;

    fn tester() -> LogicTester {
        LogicTester::new(
            ShiftRunner::try_new(EngineConfig::default(), false).unwrap(),
            false,
        )
    }

    #[test]
    fn scenario_runs_once_per_seed() {
        let scenario = find_scenario("smoke").unwrap();
        let results = tester().run_scenario(&scenario, &[1, 2, 3], 2);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.passed && r.successful_iterations == 2));
        assert_eq!(results[1].seed, 2);
    }

    #[test]
    fn failing_expectation_is_reported() {
        fn always_fails(_: &ShiftSummary) -> anyhow::Result<()> {
            anyhow::bail!("forced failure")
        }
        let mut scenario = find_scenario("smoke").unwrap();
        scenario.plan = scenario.plan.with_expectation(always_fails);
        let results = tester().run_scenario(&scenario, &[5], 1);
        assert!(!results[0].passed);
        assert!(results[0].failures[0].contains("forced failure"));
        assert_eq!(results[0].average_duration, Duration::ZERO);
    }

    #[test]
    fn result_serializes_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            total_credits_penalty: 0,
            total_infractions: 0,
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"average_duration\":12"));
        assert!(json.contains("\"performance_data\":[12]"));
        let restored: ScenarioResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.average_duration, Duration::from_millis(12));
    }
}
