//! Conversion between the user-authored variant map and the service's ordered
//! variant list.
//!
//! The service requires the `control` variant to be the first element of
//! `feature_flag_variants`. The local map carries no position, so the order is
//! rebuilt on every encode: `control` first, then the remaining keys in the
//! map's iteration order. Callers must not rely on the order of the non-control
//! entries. Percentages are passed through untouched; nothing here checks that
//! they sum to 100.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ProviderError, invalid_variants},
    resources::wire::FeatureFlagVariant,
};

pub const CONTROL_VARIANT: &str = "control";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantModel {
    pub percentage: i64,
}

impl VariantModel {
    pub fn new(percentage: i64) -> Self {
        Self { percentage }
    }
}

pub type VariantMap = BTreeMap<String, VariantModel>;

/// A variant collection known to contain `control`, kept apart from the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlledVariants {
    control: i64,
    others: Vec<(String, i64)>,
}

impl ControlledVariants {
    pub fn from_map(variants: &VariantMap) -> Result<Self, ProviderError> {
        let control = variants
            .get(CONTROL_VARIANT)
            .ok_or_else(|| invalid_variants("Variants must include 'control'."))?;

        let others = variants
            .iter()
            .filter(|(key, _)| key.as_str() != CONTROL_VARIANT)
            .map(|(key, variant)| (key.clone(), variant.percentage))
            .collect();

        Ok(Self {
            control: control.percentage,
            others,
        })
    }

    pub fn into_wire(self) -> Vec<FeatureFlagVariant> {
        let mut wire = Vec::with_capacity(self.others.len() + 1);
        wire.push(FeatureFlagVariant {
            key: CONTROL_VARIANT.to_string(),
            rollout_percentage: self.control,
        });
        wire.extend(
            self.others
                .into_iter()
                .map(|(key, rollout_percentage)| FeatureFlagVariant {
                    key,
                    rollout_percentage,
                }),
        );
        wire
    }
}

pub fn encode(variants: &VariantMap) -> Result<Vec<FeatureFlagVariant>, ProviderError> {
    Ok(ControlledVariants::from_map(variants)?.into_wire())
}

/// Later duplicates overwrite earlier ones.
pub fn decode(wire: &[FeatureFlagVariant]) -> VariantMap {
    wire.iter()
        .map(|variant| {
            (
                variant.key.clone(),
                VariantModel::new(variant.rollout_percentage),
            )
        })
        .collect()
}
