//! SPH-PSM CLI: run matching sessions over synthetic genomes
//!
//! Commands:
//!   sphpsm run     run one protocol mode (or all of them) and print the report
//!   sphpsm config  print or write the protocol configuration
//!   sphpsm help    show usage

use sphpsm_core::genome::synthetic::{owner_genome, query_genome};
use sphpsm_core::{
    Base, Bls12ElGamal, Bn254ElGamal, ModpElGamal, Paillier, ProtocolConfig, ProtocolMode,
    SecretScheme, Session, SessionReport,
};
use std::env;
use std::path::Path;

const CONFIG_FILE: &str = "sphpsm.json";

fn print_usage() {
    println!(
        r#"
SPH-PSM: size- and position-hiding private substring matching

Usage: sphpsm <command> [options]

Commands:
  run    <mode|all> [scheme] [n] [s] [e] [snp] [nomatch]   Run a matching session
  config [path]                                            Print (or write) the configuration
  help                                                     Show this message

Modes:    baseline | whole | opened | proved
Schemes:  bn254 (default) | bls12 | modp | paillier

The owner genome has n positions carrying 'T' on [s, e] and 'A' elsewhere;
the query is the 'T' run on [s, e]. 'snp' spaces positions 1000 apart,
'nomatch' flips one query symbol. Settings are read from {} when present.

Examples:
  sphpsm run whole bn254 1000 400 420
  sphpsm run proved modp 5000 100 120
  sphpsm run opened paillier 300 100 110
  sphpsm run all bls12 200000 5000 9000 snp
  sphpsm config sphpsm.json
"#,
        CONFIG_FILE
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "run" => cmd_run(&args[2..]),
        "config" => cmd_config(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
        }
    }
}

/// Load the configuration file, falling back to defaults
fn load_config() -> ProtocolConfig {
    if !Path::new(CONFIG_FILE).exists() {
        return ProtocolConfig::default();
    }
    match ProtocolConfig::load(CONFIG_FILE) {
        Ok(config) => {
            println!("  Loaded configuration from {}", CONFIG_FILE);
            config
        }
        Err(e) => {
            eprintln!("  {}; using defaults", e);
            ProtocolConfig::default()
        }
    }
}

fn cmd_config(args: &[String]) {
    let config = load_config();
    match args.first() {
        Some(path) => match config.save(path) {
            Ok(()) => println!("  Wrote configuration to {}", path),
            Err(e) => eprintln!("  Failed to write configuration: {}", e),
        },
        None => match config.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("  {}", e),
        },
    }
}

fn cmd_run(args: &[String]) {
    if args.is_empty() {
        eprintln!("Usage: sphpsm run <mode|all> [scheme] [n] [s] [e] [snp] [nomatch]");
        return;
    }

    let modes: Vec<ProtocolMode> = if args[0] == "all" {
        ProtocolMode::all().to_vec()
    } else {
        match args[0].parse() {
            Ok(mode) => vec![mode],
            Err(e) => {
                eprintln!("  {}", e);
                return;
            }
        }
    };

    let positional: Vec<&String> = args[1..]
        .iter()
        .filter(|a| a.as_str() != "snp" && a.as_str() != "nomatch")
        .collect();
    let snp = args.iter().any(|a| a == "snp");
    let nomatch = args.iter().any(|a| a == "nomatch");
    let scheme = positional.first().map(|s| s.as_str()).unwrap_or("bn254");
    let n: u32 = positional.get(1).and_then(|s| s.parse().ok()).unwrap_or(1000);
    let start: u32 = positional.get(2).and_then(|s| s.parse().ok()).unwrap_or(n / 3);
    let end: u32 = positional.get(3).and_then(|s| s.parse().ok()).unwrap_or(start + 10);

    let owner = owner_genome(n, start, end, snp);
    let mut query = query_genome(start, end, snp);
    if nomatch && !query.is_empty() {
        let middle = query.len() / 2;
        query[middle].symbol = b'G';
    }
    println!(
        "\n  Owner genome: {} bases, query: {} bases on [{}, {}]",
        owner.len(),
        query.len(),
        start,
        end
    );

    let config = load_config();
    match scheme {
        "bn254" => run_with::<Bn254ElGamal>(config, &modes, &owner, &query),
        "bls12" => run_with::<Bls12ElGamal>(config, &modes, &owner, &query),
        "modp" => run_with::<ModpElGamal>(config, &modes, &owner, &query),
        "paillier" => run_with::<Paillier>(config, &modes, &owner, &query),
        other => eprintln!("  Unknown scheme: {}", other),
    }
}

fn run_with<S: SecretScheme>(
    config: ProtocolConfig,
    modes: &[ProtocolMode],
    owner: &[Base],
    query: &[Base],
) {
    let session = match Session::<S>::setup(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("  Setup failed: {}", e);
            return;
        }
    };
    for &mode in modes {
        match session.run(mode, owner, query) {
            Ok(report) => print_report(&report),
            Err(e) => eprintln!("  [{}] aborted: {}", mode, e),
        }
    }
}

fn print_report(report: &SessionReport) {
    println!("\n  Mode: {} ({})", report.mode, report.scheme);
    println!("  Session {} started {}", &report.id[..8], report.started_at.format("%H:%M:%S%.3f"));
    println!("  {}", "-".repeat(48));
    for timing in &report.timings {
        println!("  {:<24} {:>12.3} ms", timing.phase, timing.micros as f64 / 1000.0);
    }
    println!("  {}", "-".repeat(48));
    println!("  Result ciphers: {}", report.result_count);
    println!("  Matched:        {}", if report.matched { "yes" } else { "no" });
}
