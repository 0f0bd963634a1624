use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::{error::ProviderError, resources::schema::ResourceSchema};

pub mod experiment;
pub mod import_id;
pub mod project;
pub mod schema;
pub mod variants;
pub mod wire;

pub use experiment::{ExperimentModel, ExperimentResource};
pub use project::{ProjectModel, ProjectResource};

/// Lifecycle of one managed entity kind.
///
/// Every operation performs at most one remote call and returns the new local
/// state; on error the caller keeps its previous state untouched.
#[async_trait]
pub trait Resource: Send + Sync {
    type Model: Serialize + DeserializeOwned + Send + Sync;

    fn schema(&self) -> &'static ResourceSchema;

    async fn create(&self, planned: &Self::Model) -> Result<Self::Model, ProviderError>;

    async fn read(&self, state: &Self::Model) -> Result<Self::Model, ProviderError>;

    async fn update(
        &self,
        planned: &Self::Model,
        prior: &Self::Model,
    ) -> Result<Self::Model, ProviderError>;

    async fn delete(&self, state: &Self::Model) -> Result<(), ProviderError>;

    /// Seeds identity attributes only; a Read fills in the rest.
    fn import_state(&self, raw_id: &str) -> Result<Self::Model, ProviderError>;
}
