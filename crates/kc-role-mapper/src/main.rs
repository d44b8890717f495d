//! # Keycloak role mapper
//!
//! Makes sure every group in a realm has a realm role of the same name.

#![forbid(unsafe_code)]

use clap::Parser;
use kc_role_mapper::{
    cli::Cli,
    config::MapperConfig,
    output::{confirm, error, info_to, status_stream},
    run::{run, RunOptions},
    IdentityStore, KeycloakClient, MapperResult,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "warn,kc_role_mapper=debug"
    } else {
        "warn,kc_role_mapper=info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = execute(cli).await {
        error(&e.to_string());
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> MapperResult<()> {
    let config = MapperConfig::load(&cli.config, cli.overrides())?;
    let mut status = status_stream(cli.output);
    info_to(&mut status, &format!("Running with {config}"))?;

    let client = KeycloakClient::connect(&config).await?;
    info_to(
        &mut status,
        &format!("Logged in to {} (realm {})", client.base_url(), client.realm()),
    )?;

    let options = RunOptions {
        dry_run: config.dry_run_only,
        assume_yes: cli.yes,
        format: cli.output,
    };
    let mut out = std::io::stdout();
    run(&client, &options, &mut out, &mut status, || {
        confirm("Do you really want to continue?", cli.output)
    })
    .await?;
    Ok(())
}
