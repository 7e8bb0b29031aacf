//! Microarchitecture probe CLI.
//!
//! This binary drives the probe against the bundled reference cores. It performs:
//! 1. **Probe:** Classify one reference core and merge the verdict into its labels store.
//! 2. **Batch:** Classify the whole reference lineup, one isolated run per core.
//! 3. **Layout:** Print the probe program synthesized for a start address.
//! 4. **Encode jump:** Print the `jal x0` word for a branch/target pair.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::{fs, process};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use corelabel_core::config::Config;
use corelabel_core::isa::encode_jal;
use corelabel_core::labels::RunEnvironment;
use corelabel_core::models::{MulticycleCore, PipelinedCore};
use corelabel_core::probe::{ProbeReport, ProgramLayout, label_core, probe_or_undetermined};
use corelabel_core::sim::CoreUnderTest;

#[derive(Parser, Debug)]
#[command(
    name = "corelabel",
    author,
    version,
    about = "Bus-level microarchitecture classifier",
    long_about = "Drive a core through a cycle-accurate fetch-bus testbench and label it \
single-cycle, multicycle or pipelined (with depth).\n\nExamples:\n  corelabel probe --model pipelined --depth 5\n  corelabel probe --model multicycle --cpi 3 --output out/mc\n  corelabel batch --output out\n  corelabel layout --start 0x80000000\n  corelabel encode-jump --branch 0x20 --target 0x8"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Probe one reference core.
    Probe {
        /// Reference model to instantiate.
        #[arg(short, long, value_enum, default_value_t = Model::Pipelined)]
        model: Model,

        /// Pipeline depth (pipelined model; 1 is single-cycle).
        #[arg(long, default_value_t = 5)]
        depth: usize,

        /// Edges per instruction (multicycle model).
        #[arg(long, default_value_t = 3)]
        cpi: u32,

        /// Processor name; defaults to a name derived from the model.
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory for the labels file (default: $OUTPUT_DIR or `output`); its last
        /// component names the processor in the labels file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Do not write the labels file.
        #[arg(long)]
        no_save: bool,

        /// Print the report as JSON instead of the statistics table.
        #[arg(long)]
        json: bool,
    },

    /// Probe every reference core; a failing core does not stop the batch.
    Batch {
        /// Output directory; each core gets `<output>/<name>/<name>_labels.json`.
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the probe program for a start address.
    Layout {
        /// First fetched address (decimal or 0x-prefixed hex).
        #[arg(short, long, value_parser = parse_address)]
        start: u64,
    },

    /// Encode `jal x0, target - branch`.
    EncodeJump {
        /// Address of the jump.
        #[arg(short, long, value_parser = parse_address)]
        branch: u64,

        /// Jump target.
        #[arg(short, long, value_parser = parse_address)]
        target: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Model {
    /// In-order pipeline of `--depth` stages.
    Pipelined,
    /// One instruction every `--cpi` edges.
    Multicycle,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Probe {
            model,
            depth,
            cpi,
            name,
            output,
            config,
            no_save,
            json,
        } => {
            let config = load_config(config.as_deref());
            let mut core = build_core(model, depth, cpi, name);
            let report = if no_save {
                probe_or_undetermined(core.as_mut(), &config)
            } else {
                let env =
                    output.map_or_else(RunEnvironment::from_env, RunEnvironment::for_output_dir);
                label_core(core.as_mut(), &config, &env.store())
            };
            match report {
                Ok(report) => print_report(&report, json),
                Err(e) => {
                    eprintln!("\n[!] FATAL: {e}");
                    process::exit(1);
                }
            }
        }
        Commands::Batch { output, config } => cmd_batch(&output, &load_config(config.as_deref())),
        Commands::Layout { start } => cmd_layout(start),
        Commands::EncodeJump { branch, target } => {
            match encode_jal(target as i64 - branch as i64, 0) {
                Ok(word) => println!("{word:#010x}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            }
        }
    }
}

/// Installs the `tracing` subscriber; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Loads a JSON config, or the defaults when no path is given. Exits on error.
fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config {}: {}", path.display(), e);
        process::exit(1);
    });
    Config::from_json(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing config {}: {}", path.display(), e);
        process::exit(1);
    })
}

fn build_core(model: Model, depth: usize, cpi: u32, name: Option<String>) -> Box<dyn CoreUnderTest> {
    match model {
        Model::Pipelined => {
            let name = name.unwrap_or_else(|| format!("pipeline{depth}"));
            Box::new(PipelinedCore::new(name, depth))
        }
        Model::Multicycle => {
            let name = name.unwrap_or_else(|| format!("multicycle{cpi}"));
            Box::new(MulticycleCore::new(name, cpi))
        }
    }
}

/// The reference lineup probed by `batch`.
fn reference_lineup() -> Vec<Box<dyn CoreUnderTest>> {
    vec![
        Box::new(PipelinedCore::single_cycle("singlecycle")),
        Box::new(PipelinedCore::new("pipeline3", 3)),
        Box::new(PipelinedCore::new("pipeline5", 5)),
        Box::new(PipelinedCore::new("pipeline7", 7)),
        Box::new(MulticycleCore::new("multicycle2", 2)),
        Box::new(MulticycleCore::new("multicycle4", 4)),
    ]
}

/// Probes each reference core into its own output directory.
fn cmd_batch(output: &Path, config: &Config) {
    let mut failures = 0_usize;
    for mut core in reference_lineup() {
        let env = RunEnvironment::for_output_dir(output.join(core.name()));
        match label_core(core.as_mut(), config, &env.store()) {
            Ok(report) => println!("{:<14} {}", report.processor, report.verdict),
            Err(e) => {
                failures += 1;
                error!(core = core.name(), error = %e, "probe failed");
                println!("{:<14} error: {}", core.name(), e);
            }
        }
    }
    info!(failures, "batch finished");
    if failures > 0 {
        process::exit(1);
    }
}

fn cmd_layout(start: u64) {
    let layout = match ProgramLayout::from_start(start) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    let map = layout.instruction_map();
    println!("start       {:#010x}", layout.start);
    println!("loop_start  {:#010x}", layout.loop_start);
    println!("branch      {:#010x}", layout.branch);
    println!("finish      {:#010x}", layout.finish);
    println!("jump        {:#010x}", layout.jump_back_word);
    println!("----------------------");
    let mut address = layout.start;
    while address <= layout.finish {
        println!("{address:#010x}: {:#010x}", map.word_at(address, true));
        address += 4;
    }
}

fn print_report(report: &ProbeReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                process::exit(1);
            }
        }
        return;
    }
    println!("[*] {}: {}", report.processor, report.verdict);
    match report.bits {
        Some(bits) => println!("    bits: {bits}"),
        None => println!("    bits: Undetected"),
    }
    report.stats.print();
}

/// Parses a decimal or `0x`-prefixed hexadecimal address.
fn parse_address(text: &str) -> Result<u64, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid address `{text}`: {e}"))
}
