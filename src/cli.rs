use std::path::PathBuf;

use anyhow::{Result, anyhow};

const USAGE: &str = "usage: posthog-provider [--config <path>] import <experiment|project> <id>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Experiment,
    Project,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Import { kind: ResourceKind, id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config_path: PathBuf,
    pub command: Command,
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut args = args.into_iter();
    let mut config_path = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --config"))?;
                config_path = Some(PathBuf::from(value));
            }
            other if other.starts_with("--") => {
                return Err(anyhow!("unknown argument: {other}. {USAGE}"));
            }
            _ => positional.push(arg),
        }
    }

    let command = match positional.as_slice() {
        [verb, kind, id] if verb == "import" => Command::Import {
            kind: parse_kind(kind)?,
            id: id.clone(),
        },
        _ => return Err(anyhow!("{USAGE}")),
    };

    Ok(CliArgs {
        config_path: config_path.unwrap_or_else(|| PathBuf::from("./posthog-provider.jsonc")),
        command,
    })
}

fn parse_kind(raw: &str) -> Result<ResourceKind> {
    match raw {
        "experiment" => Ok(ResourceKind::Experiment),
        "project" => Ok(ResourceKind::Project),
        other => Err(anyhow!("unknown resource kind: {other}. {USAGE}")),
    }
}
