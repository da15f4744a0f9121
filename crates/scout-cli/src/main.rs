//! Process entry point: wires the CLI args, env/file config, lens
//! resolution, bootstrap, and the orchestrator into one `run` invocation,
//! then maps the result onto the exit codes spec section 6 defines.

mod bootstrap;
mod cli;
mod config_file;
mod connectors;
mod connectors_config;
mod exit_code;
mod lens_resolution;
mod report_format;
mod structured_extract;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use scout_common::Config;
use scout_events::RunEvent;
use scout_orchestrator::{CancellationToken, Orchestrator, Request};
use scout_store::Store;

use cli::{Cli, Command};
use exit_code::{classify_report, ExitOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::from_env();

    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new(config.log_level.clone())).init();

    let Command::Run { query, mode, budget, lens, persist } = cli.command;

    if query.trim().is_empty() {
        eprintln!("error: query must not be empty");
        return ExitCode::from(ExitOutcome::InvalidInput.code() as u8);
    }

    let app_config = match config_file::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(ExitOutcome::InvalidInput.code() as u8);
        }
    };
    let lens_id = lens_resolution::resolve_lens_id(lens.as_deref(), config.lens_id.as_deref(), app_config.default_lens.as_deref());

    let registry = match connectors_config::load_registry(&cli.config.with_file_name("connectors.yaml")) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(ExitOutcome::InvalidInput.code() as u8);
        }
    };

    let lens_contract = match bootstrap::load_lens(&cli.lens_dir, &lens_id, &registry) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("lens validation failed [{}]: {}", e.code, e.details);
            return ExitCode::from(ExitOutcome::LensValidation.code() as u8);
        }
    };
    let lens_contract = Arc::new(lens_contract);

    let store: Option<Arc<dyn Store>> = match bootstrap::connect_store(&config.database_url).await {
        Ok(store) => Some(store as Arc<dyn Store>),
        Err(e) => {
            eprintln!("warning: could not connect to store ({e}); continuing without persistence");
            None
        }
    };

    let orchestrator = bootstrap::build_orchestrator(&config, registry, store);

    let cancellation = CancellationToken::new();
    let ctrl_c_token = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let mut request = Request::new(query, mode.into());
    request.budget_usd = budget;
    request.lens_id = Some(lens_id);
    request.persist = persist;

    let report = orchestrator.run(request, lens_contract, cancellation).await;

    report_format::print_human(&report);

    // Budget exhaustion and a RESOLVE_ONE early match also leave the shared
    // cancellation token's flag set (the orchestrator's internal early-stop
    // path cancels it to unblock in-flight workers), so that flag alone
    // can't distinguish a completed run from a true external cancellation.
    // The event log can: `RunCancelled` is only ever pushed when the token
    // was still live at the orchestrator's own check, i.e. cancelled from
    // outside (see `orchestrator.rs`).
    let was_cancelled = report.events.iter().any(|e| matches!(e, RunEvent::RunCancelled { .. }));
    let outcome = if was_cancelled {
        eprintln!("cancelled");
        ExitOutcome::Cancelled
    } else {
        classify_report(&report, persist)
    };

    ExitCode::from(outcome.code() as u8)
}
