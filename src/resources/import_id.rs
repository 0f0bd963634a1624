//! Composite `parent:child` identifiers accepted by import.

use crate::error::{ProviderError, malformed_identifier};

/// Shape of the parent half of a composite identifier.
pub trait ParentId: Sized {
    fn parse_parent(raw: &str) -> Option<Self>;
}

impl ParentId for i64 {
    fn parse_parent(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

/// Opaque parent, accepted as-is once non-empty.
impl ParentId for String {
    fn parse_parent(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportIdFormat {
    pub parent: &'static str,
    pub child: &'static str,
}

pub const EXPERIMENT_IMPORT_ID: ImportIdFormat = ImportIdFormat {
    parent: "project_id",
    child: "experiment_id",
};

pub const PROJECT_IMPORT_ID: ImportIdFormat = ImportIdFormat {
    parent: "organization_id",
    child: "project_id",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeId<P> {
    pub parent: P,
    pub id: i64,
}

pub fn parse_import_id<P: ParentId>(
    raw: &str,
    format: &ImportIdFormat,
) -> Result<CompositeId<P>, ProviderError> {
    let parts: Vec<&str> = raw.split(':').collect();

    let [parent_raw, child_raw] = parts.as_slice() else {
        return Err(format_mismatch(raw, format));
    };
    if parent_raw.is_empty() || child_raw.is_empty() {
        return Err(format_mismatch(raw, format));
    }

    let parent = P::parse_parent(parent_raw).ok_or_else(|| {
        malformed_identifier(format!(
            "expected {} to be a number. Got: {:?}",
            format.parent, parent_raw
        ))
    })?;

    let id = child_raw.parse::<i64>().map_err(|_| {
        malformed_identifier(format!(
            "expected {} to be a number. Got: {:?}",
            format.child, child_raw
        ))
    })?;

    Ok(CompositeId { parent, id })
}

fn format_mismatch(raw: &str, format: &ImportIdFormat) -> ProviderError {
    malformed_identifier(format!(
        "expected import identifier with format: {}:{}. Got: {:?}",
        format.parent, format.child, raw
    ))
}
