//! Decision-trace simulator CLI.
//!
//! Evaluates factor inputs (files or built-in presets), prints the audit
//! trace, checks presets against their documented values, and replays the
//! decision path tick by tick.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use simulator::core::evaluator::evaluate;
use simulator::core::input::{FactorInput, InputError};
use simulator::core::presets::{Expectation, builtin_presets, check_expected, preset};
use simulator::core::sequencer::PathSequencer;
use simulator::core::trace::TraceResult;
use simulator::exit_codes;
use simulator::io::config::load_config;
use simulator::io::init::{InitOptions, SimulatorPaths, init_simulator};
use simulator::io::input_store::load_input;
use simulator::logging;
use simulator::render::{render_frame, render_graph, render_trace, render_trace_json};
use simulator::session::Session;

#[derive(Parser)]
#[command(
    name = "simulator",
    version,
    about = "Decision-trace simulator for factor calculation rules"
)]
struct Cli {
    /// Project root containing `.simulator/`.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, PartialEq)]
#[group(required = true, multiple = false)]
struct InputSource {
    /// Factor input JSON file.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Built-in preset index (see `simulator presets`).
    #[arg(long)]
    preset: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.simulator/` with config, schema, and preset inputs.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// List built-in presets with their expected values.
    Presets,
    /// Evaluate one input and print its decision trace.
    Evaluate {
        #[command(flatten)]
        source: InputSource,

        /// Expected result to compare against (presets carry their own).
        #[arg(long, allow_negative_numbers = true)]
        expected: Option<f64>,

        /// Print the trace as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Evaluate every preset and compare with its expected value.
    Check,
    /// Validate the decision graph and list its paths.
    Graph,
    /// Evaluate one input and replay its decision path.
    Replay {
        #[command(flatten)]
        source: InputSource,

        /// Override the configured tick interval.
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            if err.downcast_ref::<InputError>().is_some() {
                eprintln!("invalid input: {:#}", err);
            } else {
                eprintln!("{:#}", err);
            }
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.root, force),
        Command::Presets => cmd_presets(),
        Command::Evaluate {
            source,
            expected,
            json,
        } => cmd_evaluate(&cli.root, &source, expected, json),
        Command::Check => cmd_check(&cli.root),
        Command::Graph => cmd_graph(),
        Command::Replay {
            source,
            interval_ms,
        } => cmd_replay(&cli.root, &source, interval_ms),
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_simulator(root, &InitOptions { force })?;
    println!("initialized {}", paths.sim_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_presets() -> Result<i32> {
    for (index, preset) in builtin_presets().iter().enumerate() {
        println!(
            "{index}: {} ({}) expected {}, {}",
            preset.name, preset.slug, preset.expected, preset.description
        );
    }
    Ok(exit_codes::OK)
}

fn cmd_evaluate(
    root: &Path,
    source: &InputSource,
    expected: Option<f64>,
    json: bool,
) -> Result<i32> {
    let config = load_config(&SimulatorPaths::new(root).config_path)?;
    let sequencer = PathSequencer::standard()?;
    let (input, preset_expected) = resolve_input(source)?;
    input.validate()?;

    let trace = evaluate(&input);
    info!(outcome = %trace.path(), "evaluated");
    let expectation = expected
        .or(preset_expected)
        .map(|expected| check_expected(&trace, expected, config.match_tolerance));

    let output = if json {
        render_trace_json(&trace, &sequencer, expectation.as_ref())?
    } else {
        render_trace(&trace, &sequencer, expectation.as_ref())?
    };
    print!("{output}");
    Ok(exit_code_for(&trace, expectation.as_ref()))
}

fn cmd_check(root: &Path) -> Result<i32> {
    let config = load_config(&SimulatorPaths::new(root).config_path)?;
    let mut failures = 0;
    for preset in builtin_presets() {
        let trace = evaluate(&preset.input);
        let expectation = check_expected(&trace, preset.expected, config.match_tolerance);
        let status = if expectation.is_match() { "ok" } else { "FAIL" };
        println!(
            "{status:<4} {:<18} {} -> {:?}",
            preset.slug,
            trace.path(),
            expectation
        );
        if !expectation.is_match() {
            failures += 1;
        }
    }
    if failures > 0 {
        return Ok(exit_codes::MISMATCH);
    }
    Ok(exit_codes::OK)
}

fn cmd_graph() -> Result<i32> {
    let sequencer = PathSequencer::standard()?;
    print!("{}", render_graph(sequencer.graph())?);
    Ok(exit_codes::OK)
}

fn cmd_replay(root: &Path, source: &InputSource, interval_ms: Option<u64>) -> Result<i32> {
    let mut config = load_config(&SimulatorPaths::new(root).config_path)?;
    if let Some(interval_ms) = interval_ms {
        config.tick_interval_ms = interval_ms;
        config.validate().context("--interval-ms")?;
    }

    let mut session = Session::new(PathSequencer::standard()?, &config)?;
    match (&source.input, source.preset) {
        (Some(path), _) => {
            session.replace_input(load_input(path)?);
            session.set_expected(None);
        }
        (None, Some(index)) => session.load_preset(index)?,
        (None, None) => {}
    }

    session.execute()?;
    let trace = session
        .trace()
        .ok_or_else(|| anyhow!("no trace after execute"))?;
    let expectation = session.expectation();
    print!(
        "{}",
        render_trace(trace, session.sequencer(), expectation.as_ref())?
    );
    let code = exit_code_for(trace, expectation.as_ref());
    let total = session.sequencer().sequence_for(trace.path()).len();
    info!(
        items = total,
        interval = ?session.scheduler().period(),
        "replay"
    );

    println!();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("build replay runtime")?;
    runtime.block_on(async {
        let mut index = 0;
        while let Some(frame) = session.next_frame().await {
            if frame.current.is_some() {
                index += 1;
            }
            println!("{}", render_frame(index, total, &frame));
        }
    });
    Ok(code)
}

/// Input plus the expected value a preset carries.
fn resolve_input(source: &InputSource) -> Result<(FactorInput, Option<f64>)> {
    match (&source.input, source.preset) {
        (Some(path), _) => Ok((load_input(path)?, None)),
        (None, Some(index)) => {
            let preset = preset(index).ok_or_else(|| anyhow!("unknown preset {index}"))?;
            Ok((preset.input, Some(preset.expected)))
        }
        (None, None) => Err(anyhow!("either --input or --preset is required")),
    }
}

fn exit_code_for(trace: &TraceResult, expectation: Option<&Expectation>) -> i32 {
    if trace.is_skipped() {
        return exit_codes::SKIPPED;
    }
    match expectation {
        Some(Expectation::Mismatch { .. }) => exit_codes::MISMATCH,
        _ => exit_codes::OK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["simulator", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
    }

    #[test]
    fn parse_evaluate_preset_with_negative_expected() {
        let cli = Cli::parse_from([
            "simulator",
            "evaluate",
            "--preset",
            "2",
            "--expected",
            "-22400",
        ]);
        match cli.command {
            Command::Evaluate {
                source,
                expected,
                json,
            } => {
                assert_eq!(source.preset, Some(2));
                assert_eq!(source.input, None);
                assert_eq!(expected, Some(-22400.0));
                assert!(!json);
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[test]
    fn input_source_is_required_and_exclusive() {
        assert!(Cli::try_parse_from(["simulator", "evaluate"]).is_err());
        assert!(
            Cli::try_parse_from(["simulator", "replay", "--preset", "0", "--input", "x.json"])
                .is_err()
        );
    }

    #[test]
    fn global_root_applies_to_subcommands() {
        let cli = Cli::parse_from(["simulator", "check", "--root", "/tmp/project"]);
        assert_eq!(cli.root, PathBuf::from("/tmp/project"));
        assert!(matches!(cli.command, Command::Check));
    }

    #[test]
    fn exit_code_prefers_skip_over_expectation() {
        let trace = evaluate(&FactorInput {
            hold_qty: 0,
            ..FactorInput::default()
        });
        assert_eq!(exit_code_for(&trace, None), exit_codes::SKIPPED);

        let trace = evaluate(&FactorInput::default());
        let mismatch = check_expected(&trace, 1.0, 1e-9);
        assert_eq!(exit_code_for(&trace, Some(&mismatch)), exit_codes::MISMATCH);
        assert_eq!(exit_code_for(&trace, None), exit_codes::OK);
    }
}
