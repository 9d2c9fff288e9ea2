use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use multi_bank_ledger::{load_script, LedgerConfig, Registry, RunReport, ScriptRunner, Snapshot};

#[derive(Serialize)]
struct Output<'a> {
    report: &'a RunReport,
    ledger: Snapshot<'a>,
}

fn main() -> Result<()> {
    let config = LedgerConfig::from_env();
    init_tracing(&config.log_filter);

    let args: Vec<String> = env::args().collect();
    let Some(script_path) = args.get(1) else {
        eprintln!("Usage: ledger <script.csv>");
        eprintln!("   columns: op,ref,name,bank,user,to_user,to_bank,amount,allow_negative,policy");
        std::process::exit(2);
    };

    run_script(Path::new(script_path), config)
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_script(path: &Path, config: LedgerConfig) -> Result<()> {
    let steps = load_script(path)?;
    tracing::info!(steps = steps.len(), script = %path.display(), "script loaded");

    let mut runner = ScriptRunner::new(Registry::with_config(config));
    let report = runner.run(&steps)?;

    let output = Output {
        report: &report,
        ledger: runner.registry().snapshot(),
    };
    let json = serde_json::to_string_pretty(&output).context("Failed to serialize ledger")?;
    println!("{}", json);

    Ok(())
}
