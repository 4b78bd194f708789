//! Chroma CLI - color/size outcome prediction
//!
//! Usage:
//!   chroma predict <values..>   Submit a batch and print the prediction
//!   chroma repl                 Read outcomes from stdin, one batch per line
//!   chroma config init [path]   Write a default .chroma/config.toml
//!   chroma config show          Print the effective configuration

use anyhow::{Context, Result};
use chroma_core::{EngineConfig, Period};
use chroma_engine::{Analysis, Engine, EngineState, Prediction, SubmitReport};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "chroma")]
#[command(author, version, about = "Predict the next 0-9 color/size outcome")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./.chroma/config.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for reproducible tie-breaks
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Emit a JSON session report instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit outcomes and print the latest prediction
    Predict {
        /// Outcome values, 0-9; anything else is dropped
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<String>,

        /// Period token of the first value
        #[arg(long, default_value = "00001")]
        period: String,
    },

    /// Interactive session: each stdin line is a batch of outcomes
    Repl {
        /// Period token of the first value
        #[arg(long, default_value = "00001")]
        period: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write the default configuration
    Init {
        /// Directory to create .chroma/ in
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Print the effective configuration
    Show,
}

/// Snapshot of a session, written with `--json`
#[derive(Serialize)]
struct SessionReport<'a> {
    generated_at: DateTime<Utc>,
    state: EngineState,
    accepted: usize,
    rejected: &'a [String],
    next_period: &'a Period,
    prediction: Option<&'a Prediction>,
    analysis: Analysis,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &cli.command {
        Commands::Predict { values, period } => cmd_predict(&cli, values, period),
        Commands::Repl { period } => cmd_repl(&cli, period),
        Commands::Config { action } => match action {
            ConfigCommands::Init { path } => cmd_config_init(path),
            ConfigCommands::Show => cmd_config_show(&cli),
        },
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path)),
        None => EngineConfig::load_or_default(Path::new("."))
            .context("Failed to load .chroma/config.toml"),
    }
}

fn build_engine(cli: &Cli) -> Result<Engine> {
    let config = load_config(cli)?;
    let engine = match cli.seed {
        Some(seed) => Engine::seeded(config, seed),
        None => Engine::new(config),
    };
    engine.context("Invalid engine configuration")
}

fn cmd_predict(cli: &Cli, values: &[String], period: &str) -> Result<()> {
    let mut engine = build_engine(cli)?;
    let report = submit_values(&mut engine, values, period);

    if cli.json {
        print_report(&engine, &report)
    } else {
        print_summary(&engine, &report);
        Ok(())
    }
}

fn submit_values(engine: &mut Engine, values: &[String], period: &str) -> SubmitReport {
    engine.submit_text(&values.join(" "), Period::new(period))
}

fn cmd_repl(cli: &Cli, period: &str) -> Result<()> {
    let mut engine = build_engine(cli)?;
    let mut next_period = Period::new(period);

    info!(
        "Session started: capacity {}, predicting after {} outcomes",
        engine.config().capacity,
        engine.config().minimum_entries_for_prediction
    );
    if !cli.json {
        println!("Enter outcomes (0-9) separated by spaces or commas; 'quit' to exit");
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        if !cli.json {
            print!("{}> ", next_period);
            stdout.flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;
        let line = line.trim();

        match line {
            "" => continue,
            "quit" | "exit" => break,
            "analysis" if !cli.json => {
                print_analysis(&engine.analysis());
                continue;
            }
            _ => {}
        }

        let report = engine.submit_text(line, next_period.clone());
        next_period = report.next_period.clone();

        if cli.json {
            print_report(&engine, &report)?;
        } else {
            print_summary(&engine, &report);
        }
    }

    Ok(())
}

fn cmd_config_init(path: &Path) -> Result<()> {
    EngineConfig::write_default(path)
        .with_context(|| format!("Failed to write config under {:?}", path))?;

    println!("Created {:?}", path.join(".chroma/config.toml"));
    Ok(())
}

fn cmd_config_show(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}

fn print_report(engine: &Engine, report: &SubmitReport) -> Result<()> {
    let session = SessionReport {
        generated_at: Utc::now(),
        state: engine.state(),
        accepted: report.accepted,
        rejected: &report.rejected,
        next_period: &report.next_period,
        prediction: engine.prediction(),
        analysis: engine.analysis(),
    };
    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}

fn print_summary(engine: &Engine, report: &SubmitReport) {
    if report.rejected.is_empty() {
        println!("Accepted {} value(s)", report.accepted);
    } else {
        println!(
            "Accepted {} value(s), dropped {}",
            report.accepted,
            report.rejected.len()
        );
        for reason in &report.rejected {
            println!("  - {}", reason);
        }
    }

    let Some(prediction) = engine.prediction() else {
        println!("State: {}", engine.state());
        return;
    };

    println!("Prediction ({})", prediction.headline());
    println!(
        "  color transition: {} -> {} (p={:.2}, n={})",
        label(prediction.color_transition.last),
        label(prediction.color_transition.most_likely),
        prediction.color_transition.probability,
        prediction.color_transition.support
    );
    println!(
        "  size transition:  {} -> {} (p={:.2}, n={})",
        label(prediction.size_transition.last),
        label(prediction.size_transition.most_likely),
        prediction.size_transition.probability,
        prediction.size_transition.support
    );
    println!(
        "  detectors: color {} ({:.0}%), size {} ({:.0}%), {} digit vote(s)",
        label(prediction.color()),
        prediction.color_verdict.share() * 100.0,
        label(prediction.size()),
        prediction.size_verdict.share() * 100.0,
        prediction.digit_verdict.votes.len()
    );
}

fn print_analysis(analysis: &Analysis) {
    let Some(trend) = &analysis.trend else {
        println!("No outcomes yet");
        return;
    };

    let top: Vec<String> = trend.top_values.iter().map(|d| d.to_string()).collect();
    println!(
        "Trend: {} / {} (dominant {:?}), most frequent {}",
        trend.color,
        trend.size,
        trend.dominant,
        top.join(", ")
    );

    let runs: Vec<String> = analysis
        .runs
        .iter()
        .map(|run| format!("{}x{}", run.color, run.values.len()))
        .collect();
    println!("Runs: {}", runs.join(" "));

    for (digit, value) in &analysis.values {
        println!(
            "  {}: seen {}x, next color {}, next size {}",
            digit,
            value.occurrences.len(),
            label(value.next_color),
            label(value.next_size)
        );
    }
}

fn label<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn engine(seed: u64) -> Engine {
        let config = EngineConfig {
            minimum_entries_for_prediction: 2,
            ..EngineConfig::default()
        };
        Engine::seeded(config, seed).unwrap()
    }

    #[test]
    fn test_predict_accepts_negative_values() {
        let cli = parse(&["chroma", "--seed", "1", "predict", "3", "-1", "5"]);
        let Commands::Predict { values, period } = &cli.command else {
            panic!("expected predict");
        };
        assert_eq!(values, &["3", "-1", "5"]);

        let mut engine = engine(1);
        let report = submit_values(&mut engine, values, period);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected.len(), 1);
        assert!(engine.prediction().is_some());
    }

    #[test]
    fn test_predict_drops_mixed_garbage() {
        let cli = parse(&[
            "chroma", "predict", "3", "-1", "5", "x", "12", "--period", "007",
        ]);
        let Commands::Predict { values, period } = &cli.command else {
            panic!("expected predict");
        };
        assert_eq!(period, "007");

        let mut engine = engine(1);
        let report = submit_values(&mut engine, values, period);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected.len(), 3);
        assert_eq!(report.next_period.as_str(), "009");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["chroma", "config", "show", "--json", "--seed", "4"]);
        assert!(cli.json);
        assert_eq!(cli.seed, Some(4));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigCommands::Show
            }
        ));
    }
}
