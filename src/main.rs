use std::env;

use anyhow::{Context, Result};

use posthog_provider::{
    cli::{Command, ResourceKind, parse_args},
    config::Config,
    logging::init_tracing,
    provider::Provider,
    resources::Resource,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = Config::load(&args.config_path)
        .with_context(|| format!("failed to load config from {}", args.config_path.display()))?;
    let logging_guard = init_tracing(&config.logging)?;
    tracing::info!(
        target: "provider",
        run_id = %logging_guard.run_id(),
        config = %args.config_path.display(),
        "run_started"
    );

    let provider = Provider::configure(&config.provider).context("failed to configure provider")?;

    let state = match args.command {
        Command::Import {
            kind: ResourceKind::Experiment,
            id,
        } => import_and_read(&provider.experiments(), &id).await?,
        Command::Import {
            kind: ResourceKind::Project,
            id,
        } => import_and_read(&provider.projects(), &id).await?,
    };

    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

async fn import_and_read<R: Resource>(resource: &R, raw_id: &str) -> Result<serde_json::Value> {
    let seeded = resource
        .import_state(raw_id)
        .with_context(|| format!("failed to import {}", resource.schema().type_name))?;
    let state = resource
        .read(&seeded)
        .await
        .with_context(|| format!("failed to read {}", resource.schema().type_name))?;

    serde_json::to_value(&state).context("failed to serialize state")
}
