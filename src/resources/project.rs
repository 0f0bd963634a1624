use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    client::{ApiTransport, call_json},
    error::{ProviderError, invalid_attribute, missing_attribute},
    resources::{
        Resource,
        import_id::{PROJECT_IMPORT_ID, parse_import_id},
        schema::{AttributeSpec, ResourceSchema},
        wire::{Project, ProjectInput},
    },
};

pub const PROJECT_SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "posthog_project",
    description: "PostHog project.",
    attributes: &[
        AttributeSpec::computed("id", "Identifier of the project."),
        AttributeSpec::required("name", "Name of the project."),
        AttributeSpec::required(
            "organization_id",
            "Identifier of the organization the project belongs to.",
        )
        .immutable(),
        AttributeSpec::computed("token", "API token of the project."),
    ],
};

static ORGANIZATION_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .expect("organization id pattern must compile")
});

pub fn validate_organization_id(organization_id: &str) -> Result<(), ProviderError> {
    if ORGANIZATION_ID_PATTERN.is_match(organization_id) {
        Ok(())
    } else {
        Err(invalid_attribute(format!(
            "attribute 'organization_id' must be an id. Got: {organization_id:?}"
        )))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectModel {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    pub organization_id: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl ProjectModel {
    pub fn imported(organization_id: impl Into<String>, id: i64) -> Self {
        Self {
            id: Some(id),
            organization_id: organization_id.into(),
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
        validate_organization_id(&self.organization_id)
    }

    fn merge(&mut self, project: Project) {
        self.id = Some(project.id);
        self.name = project.name;
        self.organization_id = project.organization;
        self.token = Some(project.api_token);
    }
}

fn projects_path(organization_id: &str) -> String {
    format!("/organizations/{organization_id}/projects")
}

fn project_path(organization_id: &str, id: i64) -> String {
    format!("/organizations/{organization_id}/projects/{id}")
}

#[derive(Clone)]
pub struct ProjectResource {
    transport: Arc<dyn ApiTransport>,
}

impl ProjectResource {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Resource for ProjectResource {
    type Model = ProjectModel;

    fn schema(&self) -> &'static ResourceSchema {
        &PROJECT_SCHEMA
    }

    async fn create(&self, planned: &ProjectModel) -> Result<ProjectModel, ProviderError> {
        planned.validate_planned()?;

        let project: Project = call_json(
            self.transport.as_ref(),
            Method::POST,
            &projects_path(&planned.organization_id),
            Some(&ProjectInput {
                name: planned.name.clone(),
            }),
        )
        .await
        .map_err(|err| err.with_context("Unable to create project"))?;

        let mut state = planned.clone();
        state.merge(project);
        tracing::debug!(target: "resource.project", id = ?state.id, "project_created");
        Ok(state)
    }

    async fn read(&self, state: &ProjectModel) -> Result<ProjectModel, ProviderError> {
        let id = state.require_id()?;

        let project: Project = call_json::<(), _>(
            self.transport.as_ref(),
            Method::GET,
            &project_path(&state.organization_id, id),
            None,
        )
        .await
        .map_err(|err| err.with_context("Unable to read project"))?;

        let mut refreshed = state.clone();
        refreshed.merge(project);
        tracing::debug!(target: "resource.project", id, "project_read");
        Ok(refreshed)
    }

    async fn update(
        &self,
        planned: &ProjectModel,
        prior: &ProjectModel,
    ) -> Result<ProjectModel, ProviderError> {
        planned.validate_planned()?;
        let id = planned.id.or(prior.id).ok_or_else(|| missing_attribute("id"))?;

        let project: Project = call_json(
            self.transport.as_ref(),
            Method::PATCH,
            &project_path(&planned.organization_id, id),
            Some(&ProjectInput {
                name: planned.name.clone(),
            }),
        )
        .await
        .map_err(|err| err.with_context("Unable to update project"))?;

        let mut state = planned.clone();
        state.id = Some(id);
        state.name = project.name;
        state.token = Some(project.api_token);
        tracing::debug!(target: "resource.project", id, "project_updated");
        Ok(state)
    }

    async fn delete(&self, state: &ProjectModel) -> Result<(), ProviderError> {
        let id = state.require_id()?;

        call_json::<(), Value>(
            self.transport.as_ref(),
            Method::DELETE,
            &project_path(&state.organization_id, id),
            None,
        )
        .await
        .map_err(|err| err.with_context("Unable to delete project"))?;

        tracing::debug!(target: "resource.project", id, "project_deleted");
        Ok(())
    }

    fn import_state(&self, raw_id: &str) -> Result<ProjectModel, ProviderError> {
        let parsed = parse_import_id::<String>(raw_id, &PROJECT_IMPORT_ID)?;
        Ok(ProjectModel::imported(parsed.parent, parsed.id))
    }
}
