// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

mod access_trace;
mod size_limited_writer;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};

use marchc_config::{MemorySpec, RegionSpec, TestPlan, SCHEMA_VERSION};
use marchc_core::memory::{FaultyMemory, InjectedFault, LinearMemory};
use marchc_core::metrics::{AccessMetrics, PhaseCounts};
use marchc_core::pattern::{BitWalk, Pass};
use marchc_core::{MarchEngine, MismatchFault, Region};

use access_trace::AccessTrace;

const EXIT_PASS: u8 = 0;
const EXIT_FAULT: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const RESULT_SCHEMA_VERSION: &str = "1.0";

/// Default cap on `accesses.log`; a clean run logs 67 lines per byte.
const DEFAULT_MAX_LOG_BYTES: u64 = 64 * 1024 * 1024;

/// Default cap on the simulated region, which is allocated in full.
const DEFAULT_MAX_REGION_BYTES: u64 = 1024 * 1024 * 1024;

fn parse_u64_addr(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(&hex.replace('_', ""), 16)
            .map_err(|e| format!("Invalid hex address '{}': {}", s, e))
    } else {
        u64::from_str(trimmed).map_err(|e| format!("Invalid address '{}': {}", s, e))
    }
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let value = parse_u64_addr(s)?;
    u8::try_from(value).map_err(|_| format!("Value '{}' does not fit in a byte", s))
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Extended March C- memory test",
    long_about = None
)]
struct Cli {
    /// Enable per-phase debug tracing
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the march over simulated memory, optionally with injected faults.
    Run(RunArgs),

    /// Print the values each bit-walk pass writes into a byte.
    Patterns,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the test plan (YAML)
    #[arg(short = 'p', long, conflicts_with_all = ["begin", "end", "size"])]
    plan: Option<PathBuf>,

    /// First address of the region
    #[arg(long, value_parser = parse_u64_addr, required_unless_present = "plan")]
    begin: Option<u64>,

    /// Last address of the region (inclusive)
    #[arg(long, value_parser = parse_u64_addr, conflicts_with = "size", requires = "begin")]
    end: Option<u64>,

    /// Region size instead of an end address, e.g. 4096 or 4KiB
    #[arg(long, requires = "begin")]
    size: Option<String>,

    /// Content of every cell before the run (overrides the plan)
    #[arg(long, value_parser = parse_byte)]
    fill: Option<u8>,

    /// Directory to write run artifacts (result.json, accesses.log)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Record every memory access into accesses.log
    #[arg(long, requires = "output_dir")]
    access_log: bool,

    /// Size cap for accesses.log in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_LOG_BYTES)]
    max_log_bytes: u64,

    /// Largest region the simulation will allocate, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_REGION_BYTES)]
    max_region_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum RunStatus {
    Pass,
    Fault,
}

#[derive(Debug, Serialize)]
struct RunReport {
    result_schema_version: String,
    name: String,
    status: RunStatus,
    region: Region,
    region_len: u64,
    fill: u8,
    injected_faults: Vec<InjectedFault>,
    phases: Vec<PhaseCounts>,
    total_reads: u64,
    total_writes: u64,
    elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    fault: Option<MismatchFault>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level based on --trace flag
    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Patterns => {
            print_patterns();
            ExitCode::from(EXIT_PASS)
        }
    }
}

fn load_plan(args: &RunArgs) -> Result<TestPlan> {
    let mut plan = match &args.plan {
        Some(path) => TestPlan::from_file(path)?,
        None => {
            let region = RegionSpec {
                begin: args.begin.context("Missing required --begin argument")?,
                end: args.end,
                size: args.size.clone(),
            };
            let plan = TestPlan {
                schema_version: SCHEMA_VERSION.to_string(),
                name: "march".to_string(),
                region,
                memory: MemorySpec::default(),
                faults: Vec::new(),
            };
            plan.validate()?;
            plan
        }
    };
    if let Some(fill) = args.fill {
        plan.memory.fill = fill;
    }
    Ok(plan)
}

fn run(args: RunArgs) -> ExitCode {
    let plan = match load_plan(&args) {
        Ok(plan) => plan,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    let region = match plan.region() {
        Ok(region) => region,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    if region.len() > args.max_region_bytes {
        error!(
            "Region {} is too large to simulate (--max-region-bytes {})",
            region, args.max_region_bytes
        );
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }
    let backing = match LinearMemory::try_for_region(&region, plan.memory.fill) {
        Ok(backing) => backing,
        Err(e) => {
            error!("Cannot allocate {} for simulation: {}", region, e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    info!("Plan '{}': {}", plan.name, region);
    info!(
        "Prior content: {:#04x} in {} cells",
        plan.memory.fill,
        region.len()
    );

    let injected = plan.injected_faults();
    let mut memory = FaultyMemory::new(backing);
    for fault in &injected {
        info!("Injecting {:?}", fault);
        memory.inject(*fault);
    }

    let trace = match open_trace(&args) {
        Ok(trace) => trace,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    let metrics = AccessMetrics::new();
    let engine = match MarchEngine::new(memory, region) {
        Ok(engine) => engine,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };
    let outcome = engine.with_observer((&metrics, trace.as_ref())).run();
    match &outcome {
        Ok(()) => info!("PASS: all six phases clean, memory left zeroed"),
        Err(fault) => error!("FAULT: {}", fault),
    }
    for counts in metrics.phases() {
        info!(
            "  {:<16} reads={:<10} writes={}",
            counts.phase.name(),
            counts.reads,
            counts.writes
        );
    }
    info!(
        "Accesses: {} in {:?} ({:.0} accesses/s)",
        metrics.total_reads() + metrics.total_writes(),
        metrics.elapsed(),
        metrics.accesses_per_sec()
    );

    let report = RunReport {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        name: plan.name.clone(),
        status: if outcome.is_ok() {
            RunStatus::Pass
        } else {
            RunStatus::Fault
        },
        region,
        region_len: region.len(),
        fill: plan.memory.fill,
        injected_faults: injected,
        phases: metrics.phases(),
        total_reads: metrics.total_reads(),
        total_writes: metrics.total_writes(),
        elapsed_ms: elapsed_ms(metrics.elapsed()),
        fault: outcome.err(),
    };

    if let Some(trace) = trace {
        if let Err(e) = finish_trace(trace) {
            error!("{:#}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }
    if let Some(output_dir) = &args.output_dir {
        if let Err(e) = write_report(output_dir, &report) {
            error!("{:#}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    match report.status {
        RunStatus::Pass => ExitCode::from(EXIT_PASS),
        RunStatus::Fault => ExitCode::from(EXIT_FAULT),
    }
}

/// Opens `accesses.log` for streaming when `--access-log` is set.
fn open_trace(args: &RunArgs) -> Result<Option<AccessTrace<BufWriter<File>>>> {
    let Some(output_dir) = args.output_dir.as_deref().filter(|_| args.access_log) else {
        return Ok(None);
    };
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;
    let log_path = output_dir.join("accesses.log");
    let f = File::create(&log_path).with_context(|| format!("Failed to create {:?}", log_path))?;
    Ok(Some(AccessTrace::new(BufWriter::new(f), args.max_log_bytes)))
}

fn finish_trace(trace: AccessTrace<BufWriter<File>>) -> Result<()> {
    let (_, summary) = trace.finish().context("Failed to write accesses.log")?;
    if summary.truncated {
        warn!(
            "accesses.log truncated at {} bytes (--max-log-bytes)",
            summary.bytes_written
        );
    }
    info!("Wrote accesses.log ({} bytes)", summary.bytes_written);
    Ok(())
}

fn write_report(output_dir: &Path, report: &RunReport) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let result_path = output_dir.join("result.json");
    let f = File::create(&result_path)
        .with_context(|| format!("Failed to create {:?}", result_path))?;
    serde_json::to_writer_pretty(f, report)
        .with_context(|| format!("Failed to write {:?}", result_path))?;
    info!("Wrote {:?}", result_path);
    Ok(())
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn print_patterns() {
    for pass in Pass::ALL {
        let walk: Vec<String> = BitWalk::new(pass)
            .map(|value| format!("{:02x}", value))
            .collect();
        println!(
            "{:<28} {:02x} -> {}",
            pass.to_string(),
            pass.start(),
            walk.join(" ")
        );
    }
}
