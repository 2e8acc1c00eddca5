use anyhow::{anyhow, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sib_harness::{run_simulator, run_stress, SimulatorConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("sib-harness")
        .version(sib_index::VERSION)
        .about("Workload simulator for the SIB destination indexes")
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run seeded concurrent simulation")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML file with simulator settings"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("workers")
                        .long("workers")
                        .value_parser(value_parser!(usize))
                        .help("Number of concurrent workers"),
                )
                .arg(
                    Arg::new("operations")
                        .long("operations")
                        .value_parser(value_parser!(usize))
                        .help("Operations issued by each worker"),
                )
                .arg(
                    Arg::new("destinations")
                        .long("destinations")
                        .value_parser(value_parser!(usize))
                        .help("Size of the shared destination name pool"),
                )
                .arg(
                    Arg::new("buses")
                        .long("buses")
                        .value_parser(value_parser!(usize))
                        .help("Number of buses names are spread over"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the report as JSON"),
                ),
        )
        .subcommand(
            Command::new("stress")
                .about("Run single-threaded bulk timing")
                .arg(
                    Arg::new("destinations")
                        .long("destinations")
                        .default_value("10000")
                        .value_parser(value_parser!(usize))
                        .help("Number of destinations to register"),
                ),
        )
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn simulator_config(args: &ArgMatches) -> Result<SimulatorConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => {
            let input = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SimulatorConfig::from_toml_str(&input)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => SimulatorConfig::default(),
    };

    if let Some(seed) = args.get_one::<u64>("seed") {
        config.seed = *seed;
    }
    if let Some(workers) = args.get_one::<usize>("workers") {
        config.workers = *workers;
    }
    if let Some(operations) = args.get_one::<usize>("operations") {
        config.operations_per_worker = *operations;
    }
    if let Some(destinations) = args.get_one::<usize>("destinations") {
        config.destinations = *destinations;
    }
    if let Some(buses) = args.get_one::<usize>("buses") {
        config.buses = *buses;
    }
    config.validate().context("invalid simulator settings")?;
    Ok(config)
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"))?;

    match matches.subcommand() {
        Some(("simulate", args)) => {
            let config = simulator_config(args)?;

            println!("Running SIB index simulator...");
            println!("Seed: {}", config.seed);
            println!("Workers: {}", config.workers);
            println!("Operations per Worker: {}", config.operations_per_worker);
            println!();

            let report = run_simulator(&config);
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.generate_text());
            }

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("stress", args)) => {
            let destinations = args
                .get_one::<usize>("destinations")
                .copied()
                .ok_or_else(|| anyhow!("--destinations is required"))?;

            println!("Running stress test...");
            println!("Destinations: {destinations}");
            println!();

            let report = run_stress(destinations, &sib_index::IndexConfig::default());

            println!("Stress Test Report:");
            println!("  Destinations: {}", report.destinations);
            println!("  Put + Create Time: {}ms", report.put_ms);
            println!("  Find Time: {}ms", report.find_ms);
            println!("  Remove Time: {}ms", report.remove_ms);
            println!("  Failures: {}", report.failures);
            println!("  Success: {}", report.success);

            std::process::exit(if report.success { 0 } else { 1 });
        }
        _ => {
            cli().print_help()?;
            println!();
            Ok(())
        }
    }
}
