use serde::Serialize;
use serde_json::Value;

use crate::error::{ProviderError, protocol_error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeMode {
    Required,
    Optional,
    Computed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub mode: AttributeMode,
    /// A changed value forces replacement instead of an in-place update.
    pub immutable: bool,
}

impl AttributeSpec {
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            mode: AttributeMode::Required,
            immutable: false,
        }
    }

    pub const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            mode: AttributeMode::Optional,
            immutable: false,
        }
    }

    pub const fn computed(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            mode: AttributeMode::Computed,
            immutable: false,
        }
    }

    pub const fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub description: &'static str,
    pub attributes: &'static [AttributeSpec],
}

impl ResourceSchema {
    pub fn immutable_attributes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes
            .iter()
            .filter(|attribute| attribute.immutable)
            .map(|attribute| attribute.name)
    }

    /// Immutable attributes whose value differs between `prior` and `planned`.
    pub fn requires_replace<M: Serialize>(
        &self,
        prior: &M,
        planned: &M,
    ) -> Result<Vec<&'static str>, ProviderError> {
        let prior = to_object(prior)?;
        let planned = to_object(planned)?;

        Ok(self
            .immutable_attributes()
            .filter(|name| prior.get(*name) != planned.get(*name))
            .collect())
    }
}

fn to_object<M: Serialize>(model: &M) -> Result<Value, ProviderError> {
    let value = serde_json::to_value(model)
        .map_err(|err| protocol_error(format!("failed to serialize resource state: {err}")))?;
    if !value.is_object() {
        return Err(protocol_error("resource state must serialize to an object"));
    }
    Ok(value)
}
