//! Handles CLI - drive layer handles headlessly from the command line.
//!
//! Replays scripted pointer sessions against a layer with a frame and resize
//! handle, and exposes the hit-testing and configuration used by the editor.

mod script;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec2;
use handles::{HandleConfig, ResizeHandle};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::script::{Record, Report, Script};

/// Handles CLI - replay pointer sessions against layer handles
#[derive(Parser)]
#[command(name = "handles-cli")]
#[command(about = "Headless driver for layer handles")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Handle configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a pointer script and print what happened
    Replay {
        /// Path to the script (JSON)
        script: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as JSON
    Config,

    /// Report which grip a world point hits on a layer centred at the origin
    Hit {
        x: f32,
        y: f32,

        #[arg(long, default_value_t = 2.0)]
        width: f32,

        #[arg(long, default_value_t = 2.0)]
        height: f32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Replay { script, json } => replay(&script, &config, json),
        Commands::Config => {
            println!("{}", config.to_json_pretty()?);
            Ok(())
        }
        Commands::Hit {
            x,
            y,
            width,
            height,
        } => hit(&config, Vec2::new(x, y), Vec2::new(width, height)),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<HandleConfig> {
    match path {
        Some(path) => HandleConfig::from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(HandleConfig::default()),
    }
}

/// Replay a script file and print the report.
fn replay(path: &Path, config: &HandleConfig, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    let script: Script = serde_json::from_str(&text)
        .with_context(|| format!("Invalid script JSON in {}", path.display()))?;

    let report = script::replay(&script, config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &Report) {
    for step in &report.steps {
        if step.records.is_empty() {
            continue;
        }
        let records: Vec<String> = step.records.iter().map(describe).collect();
        println!("step {:>3}: {}", step.index, records.join(", "));
    }

    let state = &report.final_state;
    println!();
    println!("size:     {:.3} x {:.3}", state.size.x, state.size.y);
    println!("position: ({:.3}, {:.3})", state.position.x, state.position.y);
    if let Some(opacity) = state.frame_opacity {
        println!("frame:    opacity {:.3}", opacity);
    }
    println!(
        "hover:    {}",
        state.hovered_grip.as_deref().unwrap_or("none")
    );
    println!("cursor:   {}", state.cursor);
    println!("meshes:   {}", state.live_meshes);
    println!("elapsed:  {} ms", state.elapsed_ms);
}

fn describe(record: &Record) -> String {
    match record {
        Record::BoundsEntered => "entered".to_string(),
        Record::BoundsExited => "exited".to_string(),
        Record::DragStarted { grip } => format!("drag {grip}"),
        Record::Resized { size, position } => format!(
            "resized to {:.3} x {:.3} at ({:.3}, {:.3})",
            size.x, size.y, position.x, position.y
        ),
        Record::DragEnded => "drag ended".to_string(),
        Record::TransitionFinished { handle } => format!("{handle} finished"),
        Record::TransitionCancelled { handle } => format!("{handle} cancelled"),
    }
}

fn hit(config: &HandleConfig, world: Vec2, size: Vec2) -> Result<()> {
    if size.min_element() <= 0.0 {
        anyhow::bail!("layer size must be positive, got {} x {}", size.x, size.y);
    }

    let handle = ResizeHandle::from_config(config);
    let bounds = geometry::Bounds::from_center_size(Vec2::ZERO, size);
    let screen = script::world_to_screen(&Script::default(), world);

    match handle.hit_test(&bounds, world) {
        Some(grip) => println!(
            "{grip} (cursor {}) at screen ({:.1}, {:.1})",
            grip.cursor(),
            screen.x(),
            screen.y()
        ),
        None => println!("none at screen ({:.1}, {:.1})", screen.x(), screen.y()),
    }
    Ok(())
}
