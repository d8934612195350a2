mod logic;
mod util;

use anyhow::{Context, Result};
use checkpoint_engine::{BiometricPolicy, EngineConfig};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{LogicTester, SeedInfo, ShiftRunner, find_scenario, list_scenarios, resolve_seed_inputs};
use util::split_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Readings derived from the subject id (stable across sessions)
    Seeded,
    /// Readings drawn from each encounter's session stream
    Ephemeral,
}

impl From<PolicyArg> for BiometricPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Seeded => Self::Seeded,
            PolicyArg::Ephemeral => Self::Ephemeral,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "checkpoint-tester", version = "0.1.0")]
#[command(about = "Automated QA shifts for the checkpoint adjudication engine")]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated; decimal, 0x-hex, or @phrase)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Biometric reading policy for scenarios that do not pin one
    #[arg(long, value_enum, default_value_t = PolicyArg::Ephemeral)]
    policy: PolicyArg,

    /// Scanner reliability percentage (0-100)
    #[arg(long)]
    reliability: Option<u8>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let config = build_config(&args)?;
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_tokens = split_csv(&args.seeds);
    let seed_infos = resolve_seed_inputs(&seed_tokens)?;
    announce_seeds(&seed_infos);
    let seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();

    let runner = ShiftRunner::try_new(config, args.verbose)?;
    println!(
        "🔧 Scanner reliability: {}% | biometrics: {:?}",
        runner.config().equipment_reliability,
        runner.config().biometric_policy
    );

    let all_results = run_logic_scenarios(&args, &scenarios, &seeds, runner);

    write_reports(&args, &all_results, start_time)?;

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🛂 Checkpoint Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn announce_seeds(seed_infos: &[SeedInfo]) {
    let labels: Vec<String> = seed_infos
        .iter()
        .map(|info| {
            if info.label == info.seed.to_string() {
                info.label.clone()
            } else {
                format!("{} ({})", info.label, info.seed)
            }
        })
        .collect();
    println!("🌱 Seeds: {}", labels.join(", "));
}

fn build_config(args: &Args) -> Result<EngineConfig> {
    let mut config = EngineConfig::default().with_policy(args.policy.into());
    if let Some(reliability) = args.reliability {
        config = config.with_reliability(reliability);
    }
    config.validate().context("invalid engine configuration")?;
    Ok(config)
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.contains(&"all".to_string()) {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    runner: ShiftRunner,
) -> Vec<logic::ScenarioResult> {
    let mut results: Vec<logic::ScenarioResult> = Vec::new();

    println!("{}", "🧠 Running Shift Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(runner, args.verbose);

    for scenario_name in scenarios {
        if let Some(scenario) = find_scenario(scenario_name) {
            let scenario_results = logic_tester.run_scenario(&scenario, seeds, args.iterations);
            results.extend(scenario_results);
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

fn write_reports(args: &Args, results: &[logic::ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Checkpoint Adjudication Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
        }
    }

    let duration = start_time.elapsed();
    writeln!(&mut output_target)?;
    writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
