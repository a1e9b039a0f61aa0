use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use clap::Parser;
use cachelib::config::{ReplacementPolicyConfig, SimulationConfig, WritePolicy};
use cachelib::io::get_trace_bytes;
use cachelib::report::Report;
use cachelib::simulator::Simulator;
use cachelib::trace::TraceFormat;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

/// Options given on the command line override the configuration file, which overrides the defaults
#[derive(Parser, Debug)]
#[command(about = String::from("Set-associative cache simulator"))]
struct Args {
    /// Path to the trace file
    trace: String,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Number of sets
    #[arg(long)]
    sets: Option<u64>,

    /// Lines per set (associativity)
    #[arg(long)]
    lines: Option<u64>,

    /// Bytes per block
    #[arg(long)]
    block_size: Option<u64>,

    /// Cache hit time in ns
    #[arg(long)]
    hit_time: Option<u64>,

    #[arg(long, value_enum)]
    write_policy: Option<WritePolicy>,

    #[arg(long, value_enum)]
    replacement: Option<ReplacementPolicyConfig>,

    /// Main memory read time in ns
    #[arg(long)]
    read_time: Option<u64>,

    /// Main memory write time in ns
    #[arg(long)]
    write_time: Option<u64>,

    /// Trace grammar, `hex` for `<address> <R|W>` or `decimal` for `<0|1> <address>`
    #[arg(short, long, value_enum, default_value_t = TraceFormat::HexSuffix)]
    format: TraceFormat,

    /// Seed for the random replacement policy
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,

    /// Log at info level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn load_config(&self) -> Result<SimulationConfig, String> {
        let mut config = match &self.config {
            Some(path) => {
                let config_file = File::open(path).map_err(|e| format!("Couldn't open the config file at path {path}: {e}"))?;
                serde_json::from_reader(BufReader::new(config_file)).map_err(|e| format!("Couldn't parse the config file: {e}"))?
            }
            None => SimulationConfig::default(),
        };
        let cache = &mut config.cache;
        cache.set_count = self.sets.unwrap_or(cache.set_count);
        cache.lines_per_set = self.lines.unwrap_or(cache.lines_per_set);
        cache.block_size = self.block_size.unwrap_or(cache.block_size);
        cache.hit_time = self.hit_time.unwrap_or(cache.hit_time);
        cache.write_policy = self.write_policy.unwrap_or(cache.write_policy);
        cache.replacement_policy = self.replacement.unwrap_or(cache.replacement_policy);
        let memory = &mut config.memory;
        memory.read_time = self.read_time.unwrap_or(memory.read_time);
        memory.write_time = self.write_time.unwrap_or(memory.write_time);
        Ok(config)
    }
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::init();
    }
    let config = args.load_config()?;
    let mut simulator = Simulator::new(&config, args.seed).map_err(|e| e.to_string())?;
    let trace_file = File::open(&args.trace).map_err(|e| format!("Couldn't open the trace file at path {}: {e}", args.trace))?;
    let trace_bytes = get_trace_bytes(trace_file)?;
    simulator.simulate(&trace_bytes, args.format);

    let report = Report::new(simulator.get_config(), simulator.get_result());
    let rendered = if args.json {
        serde_json::to_string_pretty(&report).map_err(|e| format!("Couldn't serialise the output {e}"))?
    } else {
        report.to_string()
    };
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered + "\n").map_err(|e| format!("Couldn't write the report to {path}: {e}"))?;
            log::info!("report written to {path}");
        }
        None => println!("{rendered}"),
    }

    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.get_execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}");
        let total_lines = config.cache.total_lines();
        let uninitialised_lines = simulator.get_uninitialised_line_count();
        println!("Uninitialised cache lines: {uninitialised_lines} of {total_lines}");
    }
    Ok(())
}
