use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    client::{ApiTransport, call_json},
    error::{ProviderError, invalid_attribute, missing_attribute},
    resources::{
        Resource,
        import_id::{EXPERIMENT_IMPORT_ID, parse_import_id},
        schema::{AttributeSpec, ResourceSchema},
        variants::{self, VariantMap},
        wire::{
            Experiment, ExperimentCreateInput, ExperimentDeleteInput, ExperimentParameters,
            ExperimentUpdateInput,
        },
    },
};

pub const EXPERIMENT_SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "posthog_experiment",
    description: "PostHog experiment.",
    attributes: &[
        AttributeSpec::computed("id", "Identifier of the experiment."),
        AttributeSpec::required(
            "project_id",
            "Identifier of the project the experiment belongs to.",
        )
        .immutable(),
        AttributeSpec::required("name", "Name of the experiment."),
        AttributeSpec::optional("description", "Description of the experiment."),
        AttributeSpec::required(
            "feature_flag_key",
            "Key for the feature flag that controls this experiment.",
        )
        .immutable(),
        AttributeSpec::computed(
            "feature_flag_id",
            "Identifier of the feature flag created for this experiment.",
        ),
        AttributeSpec::required(
            "variants",
            "Experiment variants keyed by name. Must include 'control'.",
        ),
        AttributeSpec::optional(
            "start_date",
            "Start date of the experiment (ISO 8601 format).",
        ),
        AttributeSpec::optional("end_date", "End date of the experiment (ISO 8601 format)."),
    ],
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentModel {
    #[serde(default)]
    pub id: Option<i64>,
    pub project_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub feature_flag_key: String,
    #[serde(default)]
    pub feature_flag_id: Option<i64>,
    #[serde(default)]
    pub variants: VariantMap,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl ExperimentModel {
    pub fn imported(project_id: i64, id: i64) -> Self {
        Self {
            id: Some(id),
            project_id,
            ..Self::default()
        }
    }

    fn require_id(&self) -> Result<i64, ProviderError> {
        self.id.ok_or_else(|| missing_attribute("id"))
    }

    fn validate_planned(&self) -> Result<(), ProviderError> {
        if self.name.is_empty() {
            return Err(invalid_attribute(
                "attribute 'name' must be at least 1 character long",
            ));
        }
        if self.feature_flag_key.is_empty() {
            return Err(invalid_attribute(
                "attribute 'feature_flag_key' must be at least 1 character long",
            ));
        }
        Ok(())
    }

    /// Folds a service response into local state. An empty description and
    /// absent dates leave the local values in place.
    fn merge(&mut self, experiment: Experiment) {
        self.id = Some(experiment.id);
        self.name = experiment.name;

        if let Some(description) = experiment.description.filter(|d| !d.is_empty()) {
            self.description = Some(description);
        }

        self.feature_flag_key = experiment.feature_flag.key;
        self.feature_flag_id = Some(experiment.feature_flag.id);

        if experiment.start_date.is_some() {
            self.start_date = experiment.start_date;
        }
        if experiment.end_date.is_some() {
            self.end_date = experiment.end_date;
        }

        self.variants = variants::decode(&experiment.parameters.feature_flag_variants);
    }
}

fn experiments_path(project_id: i64) -> String {
    format!("/projects/{project_id}/experiments")
}

fn experiment_path(project_id: i64, id: i64) -> String {
    format!("/projects/{project_id}/experiments/{id}")
}

#[derive(Clone)]
pub struct ExperimentResource {
    transport: Arc<dyn ApiTransport>,
}

impl ExperimentResource {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Resource for ExperimentResource {
    type Model = ExperimentModel;

    fn schema(&self) -> &'static ResourceSchema {
        &EXPERIMENT_SCHEMA
    }

    async fn create(&self, planned: &ExperimentModel) -> Result<ExperimentModel, ProviderError> {
        planned.validate_planned()?;
        let feature_flag_variants = variants::encode(&planned.variants)?;

        let input = ExperimentCreateInput {
            name: planned.name.clone(),
            description: planned.description.clone(),
            feature_flag_key: planned.feature_flag_key.clone(),
            parameters: ExperimentParameters {
                feature_flag_variants,
            },
            start_date: planned.start_date.clone(),
            end_date: planned.end_date.clone(),
        };

        let experiment: Experiment = call_json(
            self.transport.as_ref(),
            Method::POST,
            &experiments_path(planned.project_id),
            Some(&input),
        )
        .await
        .map_err(|err| err.with_context("Unable to create experiment"))?;

        let mut state = planned.clone();
        state.merge(experiment);
        tracing::debug!(
            target: "resource.experiment",
            project_id = state.project_id,
            id = ?state.id,
            "experiment_created"
        );
        Ok(state)
    }

    async fn read(&self, state: &ExperimentModel) -> Result<ExperimentModel, ProviderError> {
        let id = state.require_id()?;

        let experiment: Experiment = call_json::<(), _>(
            self.transport.as_ref(),
            Method::GET,
            &experiment_path(state.project_id, id),
            None,
        )
        .await
        .map_err(|err| err.with_context("Unable to read experiment"))?;

        let mut refreshed = state.clone();
        refreshed.merge(experiment);
        tracing::debug!(
            target: "resource.experiment",
            project_id = refreshed.project_id,
            id,
            "experiment_read"
        );
        Ok(refreshed)
    }

    async fn update(
        &self,
        planned: &ExperimentModel,
        prior: &ExperimentModel,
    ) -> Result<ExperimentModel, ProviderError> {
        planned.validate_planned()?;
        let id = planned.id.or(prior.id).ok_or_else(|| missing_attribute("id"))?;
        let feature_flag_variants = variants::encode(&planned.variants)?;

        let input = ExperimentUpdateInput {
            name: planned.name.clone(),
            description: planned.description.clone().unwrap_or_default(),
            parameters: ExperimentParameters {
                feature_flag_variants,
            },
            start_date: planned.start_date.clone(),
            end_date: planned.end_date.clone(),
        };

        let experiment: Experiment = call_json(
            self.transport.as_ref(),
            Method::PATCH,
            &experiment_path(planned.project_id, id),
            Some(&input),
        )
        .await
        .map_err(|err| err.with_context("Unable to update experiment"))?;

        let mut state = planned.clone();
        state.merge(experiment);
        tracing::debug!(
            target: "resource.experiment",
            project_id = state.project_id,
            id,
            "experiment_updated"
        );
        Ok(state)
    }

    async fn delete(&self, state: &ExperimentModel) -> Result<(), ProviderError> {
        let id = state.require_id()?;

        call_json::<_, Value>(
            self.transport.as_ref(),
            Method::PATCH,
            &experiment_path(state.project_id, id),
            Some(&ExperimentDeleteInput { deleted: true }),
        )
        .await
        .map_err(|err| err.with_context("Unable to delete experiment"))?;

        tracing::debug!(
            target: "resource.experiment",
            project_id = state.project_id,
            id,
            "experiment_deleted"
        );
        Ok(())
    }

    fn import_state(&self, raw_id: &str) -> Result<ExperimentModel, ProviderError> {
        let parsed = parse_import_id::<i64>(raw_id, &EXPERIMENT_IMPORT_ID)?;
        Ok(ExperimentModel::imported(parsed.parent, parsed.id))
    }
}
