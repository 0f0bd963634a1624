use std::{env, sync::Arc};

use crate::{
    client::{ApiTransport, HttpTransport},
    config::ProviderConfig,
    error::{ProviderError, configuration_error},
    resources::{
        ExperimentResource, ProjectResource, experiment::EXPERIMENT_SCHEMA,
        project::PROJECT_SCHEMA, schema::ResourceSchema,
    },
};

pub const PROVIDER_TYPE_NAME: &str = "posthog";
pub const TOKEN_ENV_VAR: &str = "POSTHOG_TOKEN";
pub const DEFAULT_HOST: &str = "app.posthog.com";

/// Holds the shared transport handed to every resource instance.
#[derive(Clone)]
pub struct Provider {
    transport: Arc<dyn ApiTransport>,
}

impl Provider {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    pub fn configure(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let token = resolve_token(config.token.as_deref(), env::var(TOKEN_ENV_VAR).ok())?;
        let host = config
            .host
            .as_deref()
            .filter(|host| !host.trim().is_empty())
            .unwrap_or(DEFAULT_HOST);

        let transport = HttpTransport::new(host, token)?;
        tracing::info!(
            target: "provider",
            base_url = %transport.base_url(),
            "provider_configured"
        );

        Ok(Self::new(Arc::new(transport)))
    }

    pub fn resource_schemas(&self) -> [&'static ResourceSchema; 2] {
        [&PROJECT_SCHEMA, &EXPERIMENT_SCHEMA]
    }

    pub fn projects(&self) -> ProjectResource {
        ProjectResource::new(Arc::clone(&self.transport))
    }

    pub fn experiments(&self) -> ExperimentResource {
        ExperimentResource::new(Arc::clone(&self.transport))
    }
}

fn resolve_token(
    configured: Option<&str>,
    from_env: Option<String>,
) -> Result<String, ProviderError> {
    configured
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .or(from_env.filter(|token| !token.is_empty()))
        .ok_or_else(|| {
            configuration_error(format!(
                "Required token could not be found. Please set the token in the provider \
                 configuration or by using the `{TOKEN_ENV_VAR}` environment variable."
            ))
        })
}
