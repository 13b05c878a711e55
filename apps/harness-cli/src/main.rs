use anyhow::Context;
use clap::{Parser, Subcommand};
use harness_bridge::{Bridge, HostEvent, ManualWake, parse_script};
use harness_kernel::{DemoKernel, KernelCall, RecordingKernel};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "harness-cli", about = "Headless host for the input/frame bridge")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print harness version and crate info
    Info,
    /// Feed host events through the bridge and print the calls the kernel saw
    Run {
        /// Events, e.g. "down:65 wake up:65 wake"
        script: Option<String>,
        /// Read events from a file (JSON array or the text form)
        #[arg(short, long, conflicts_with = "script")]
        file: Option<PathBuf>,
        /// Make the kernel's init fault
        #[arg(long)]
        fail_init: bool,
        /// Make the kernel fault on this event's call every time, e.g. "down:65" or "wake"
        #[arg(long = "fail", value_name = "EVENT")]
        fail: Vec<String>,
        /// Print the trace as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the demo kernel headless
    Demo {
        /// Number of host wakes to fire
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Key codes to press and release along the run
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<u32>,
        /// Seed for the demo kernel's sound cues
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

#[derive(Serialize)]
struct RunTrace {
    events: Vec<HostEvent>,
    init_error: Option<String>,
    calls: Vec<KernelCall>,
    errors: Vec<TraceError>,
    violations: Vec<String>,
}

#[derive(Serialize)]
struct TraceError {
    event: HostEvent,
    error: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("harness-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", harness_kernel::crate_info());
            println!("input: {}", harness_input::crate_info());
            println!("bridge: {}", harness_bridge::crate_info());
        }
        Commands::Run {
            script,
            file,
            fail_init,
            fail,
            json,
        } => {
            let events = match (script, file) {
                (_, Some(path)) => load_script(&path)?,
                (Some(text), None) => parse_script(&text)?,
                (None, None) => anyhow::bail!("pass a script or --file"),
            };

            let mut kernel = RecordingKernel::new();
            if fail_init {
                kernel = kernel.fail_init();
            }
            for token in &fail {
                let event: HostEvent = token.parse()?;
                kernel = kernel.fail_on(event.kernel_call());
            }

            let trace = run(kernel, events);
            if json {
                println!("{}", serde_json::to_string_pretty(&trace)?);
            } else {
                print_trace(&trace);
            }
            if !trace.violations.is_empty() {
                anyhow::bail!("{} contract violation(s)", trace.violations.len());
            }
        }
        Commands::Demo {
            frames,
            keys,
            seed,
        } => demo(frames, &keys, seed)?,
    }

    Ok(())
}

fn load_script(path: &Path) -> anyhow::Result<Vec<HostEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    if text.trim_start().starts_with('[') {
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    } else {
        Ok(parse_script(&text)?)
    }
}

fn run(kernel: RecordingKernel, events: Vec<HostEvent>) -> RunTrace {
    let mut bridge = Bridge::new(kernel, ManualWake::new());
    let init_error = bridge.start().err().map(|e| e.to_string());
    let errors = bridge
        .feed_all(events.iter().copied())
        .into_iter()
        .map(|(event, err)| TraceError {
            event,
            error: err.to_string(),
        })
        .collect();

    let (calls, violations) = match bridge.kernel().inspect() {
        Some(kernel) => (kernel.calls().to_vec(), kernel.violations().to_vec()),
        None => (Vec::new(), Vec::new()),
    };
    RunTrace {
        events,
        init_error,
        calls,
        errors,
        violations,
    }
}

fn print_trace(trace: &RunTrace) {
    println!("host events: {}", trace.events.len());
    if let Some(err) = &trace.init_error {
        println!("start failed: {err}");
    }
    println!("kernel calls:");
    for (i, call) in trace.calls.iter().enumerate() {
        println!("  {:>3}  {call}", i + 1);
    }
    if !trace.errors.is_empty() {
        println!("errors:");
        for e in &trace.errors {
            println!("  {} -> {}", e.event, e.error);
        }
    }
    for v in &trace.violations {
        println!("VIOLATION: {v}");
    }
}

fn demo(frames: u64, keys: &[u32], seed: u64) -> anyhow::Result<()> {
    println!("Demo run: seed={seed}, frames={frames}, keys={keys:?}");

    let mut bridge = Bridge::new(DemoKernel::with_seed(seed), ManualWake::new());
    bridge.start()?;

    // spread presses over the run; each key is held for half its slot
    let slot = (frames / keys.len().max(1) as u64).max(2);
    let mut events = Vec::new();
    for frame in 0..frames {
        if let Some(&code) = keys.get((frame / slot) as usize) {
            match frame % slot {
                0 => events.push(HostEvent::KeyDown(code.into())),
                f if f == slot / 2 => events.push(HostEvent::KeyUp(code.into())),
                _ => {}
            }
        }
        events.push(HostEvent::Wake);
    }
    let errors = bridge.feed_all(events);

    let kernel = bridge
        .kernel()
        .inspect()
        .context("kernel is still busy")?;
    let pacing = bridge.scheduler().pacing();
    let stats = bridge.kernel().stats();
    println!(
        "Kernel: frames={}, elapsed={:?}, keys_held={}",
        kernel.frames(),
        kernel.elapsed(),
        kernel.keys_held().len()
    );
    let cues: Vec<u32> = kernel.cues().iter().map(|c| c.0).collect();
    println!("Sound cues: {cues:?}");
    println!(
        "Advance: avg={:?}, min={:?}, max={:?} over {} frames",
        pacing.average(),
        pacing.min(),
        pacing.max(),
        pacing.count()
    );
    println!(
        "Calls: delivered={}, queued={}, faulted={}",
        stats.delivered, stats.queued, stats.faulted
    );
    for (event, err) in &errors {
        println!("  {event} -> {err}");
    }
    Ok(())
}
