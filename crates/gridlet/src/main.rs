mod cli;
mod error;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use gridlet_config::PartialConfig;
use gridlet_core::{Engine, Outcome};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Install the global subscriber. `quiet` silences everything; otherwise
/// `RUST_LOG` wins over the verbosity count.
fn init_tracing(quiet: bool, verbosity: u8) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else {
        let level = match verbosity {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Some(Command::Completions(args)) = cli.command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Cli::command();
        generate(args.shell, &mut cmd, "gridlet", &mut std::io::stdout());
        return Ok(());
    }

    let config = gridlet_config::load(cli_layer(&cli.global), cli.global.config.as_deref())?;
    init_tracing(config.is_quiet(), config.verbosity());
    debug!(?config, "resolved configuration");

    let engine = Engine::new(config.into_engine_config()?).with_cancellation(cancel_on_ctrl_c());

    match engine.run().await? {
        Outcome::Unchanged(state) => info!(%state, "no change"),
        Outcome::Applied { from, to } => info!(%from, %to, "battery mode changed"),
        Outcome::DryRun { from, to } => info!(%from, %to, "dry run; change not applied"),
    }

    Ok(())
}

/// The command-line layer: only flags actually given are set.
fn cli_layer(global: &GlobalOpts) -> PartialConfig {
    PartialConfig {
        dry_run: global.dry_run.then_some(true),
        quiet: global.quiet.then_some(true),
        verbosity: (global.verbose > 0).then_some(global.verbose),
        enphase_user: global.enphase_user.clone(),
        enphase_password: global.enphase_password.clone(),
        enphase_url_base: global.enphase_url_base.clone(),
        tomorrow_api_key: global.tomorrow_api_key.clone(),
        tomorrow_location: global.tomorrow_location.clone(),
        tomorrow_url_base: global.tomorrow_url_base.clone(),
        timezone: global.timezone.clone(),
        timeout_secs: global.timeout,
    }
}

/// Token cancelled on the first Ctrl-C, aborting the in-flight request.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; cancelling");
            trigger.cancel();
        }
    });
    token
}
