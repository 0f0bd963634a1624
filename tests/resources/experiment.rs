use std::sync::Arc;

use reqwest::Method;
use serde_json::json;

use posthog_provider::{
    error::{ProviderErrorKind, remote_error},
    resources::{
        ExperimentModel, ExperimentResource, Resource,
        variants::{VariantMap, VariantModel},
    },
};

use crate::support::ScriptedTransport;

fn variants(entries: &[(&str, i64)]) -> VariantMap {
    entries
        .iter()
        .map(|(key, percentage)| (key.to_string(), VariantModel::new(*percentage)))
        .collect()
}

fn planned() -> ExperimentModel {
    ExperimentModel {
        project_id: 1,
        name: "Test".to_string(),
        feature_flag_key: "k".to_string(),
        variants: variants(&[("control", 50), ("test", 50)]),
        ..ExperimentModel::default()
    }
}

fn remote_experiment() -> serde_json::Value {
    json!({
        "id": 7,
        "name": "Test",
        "description": "",
        "feature_flag": {"id": 9, "key": "k"},
        "parameters": {
            "feature_flag_variants": [
                {"key": "control", "rollout_percentage": 50},
                {"key": "test", "rollout_percentage": 50}
            ]
        },
        "start_date": null,
        "end_date": null
    })
}

#[tokio::test]
async fn given_valid_plan_when_created_then_server_fields_are_merged() {
    let transport = ScriptedTransport::new();
    transport.respond(Ok(remote_experiment()));
    let resource = ExperimentResource::new(transport.clone());

    let state = resource.create(&planned()).await.expect("create should succeed");

    assert_eq!(state.id, Some(7));
    assert_eq!(state.feature_flag_id, Some(9));
    assert_eq!(state.variants, variants(&[("control", 50), ("test", 50)]));
    assert_eq!(state.description, None);

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::POST);
    assert_eq!(calls[0].path, "/projects/1/experiments");
    assert_eq!(
        calls[0].body,
        Some(json!({
            "name": "Test",
            "feature_flag_key": "k",
            "parameters": {
                "feature_flag_variants": [
                    {"key": "control", "rollout_percentage": 50},
                    {"key": "test", "rollout_percentage": 50}
                ]
            }
        }))
    );
}

#[tokio::test]
async fn given_control_sorting_last_when_created_then_control_is_sent_first() {
    let transport = ScriptedTransport::new();
    transport.respond(Ok(remote_experiment()));
    let resource = ExperimentResource::new(transport.clone());

    let plan = ExperimentModel {
        variants: variants(&[("test", 30), ("control", 70), ("abc", 0)]),
        ..planned()
    };
    resource.create(&plan).await.expect("create should succeed");

    let body = transport.calls()[0].body.clone().expect("create sends a body");
    assert_eq!(
        body["parameters"]["feature_flag_variants"][0],
        json!({"key": "control", "rollout_percentage": 70})
    );
}

#[tokio::test]
async fn given_missing_control_when_created_then_no_remote_call_is_made() {
    let transport = ScriptedTransport::new();
    let resource = ExperimentResource::new(transport.clone());

    let plan = ExperimentModel {
        variants: variants(&[("test", 100)]),
        ..planned()
    };
    let err = resource.create(&plan).await.expect_err("control is mandatory");

    assert_eq!(err.kind, ProviderErrorKind::InvalidVariants);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn given_empty_name_when_created_then_validation_fails_locally() {
    let transport = ScriptedTransport::new();
    let resource = ExperimentResource::new(transport.clone());

    let plan = ExperimentModel {
        name: String::new(),
        ..planned()
    };
    let err = resource.create(&plan).await.expect_err("name is required");

    assert_eq!(err.kind, ProviderErrorKind::InvalidAttribute);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn given_remote_failure_when_created_then_error_carries_transport_message() {
    let transport = ScriptedTransport::new();
    transport.respond(Err(remote_error("status 400: bad flag key").with_status(400)));
    let resource = ExperimentResource::new(transport.clone());

    let err = resource.create(&planned()).await.expect_err("remote failure");

    assert!(err.is_remote());
    assert_eq!(err.status, Some(400));
    assert_eq!(
        err.to_string(),
        "Unable to create experiment: status 400: bad flag key"
    );
}

#[tokio::test]
async fn given_import_identifier_when_imported_then_only_identity_is_seeded() {
    let resource = ExperimentResource::new(ScriptedTransport::new());

    let state = resource.import_state("5:42").expect("well formed");

    assert_eq!(state, ExperimentModel::imported(5, 42));
    assert_eq!(state.project_id, 5);
    assert_eq!(state.id, Some(42));
    assert!(state.name.is_empty());
    assert!(state.feature_flag_key.is_empty());
    assert!(state.variants.is_empty());
    assert_eq!(state.feature_flag_id, None);
}

#[tokio::test]
async fn given_malformed_import_identifier_when_imported_then_validation_fails() {
    let resource = ExperimentResource::new(ScriptedTransport::new());

    let err = resource.import_state("5-42").expect_err("missing colon");
    assert_eq!(err.kind, ProviderErrorKind::MalformedIdentifier);
}

#[tokio::test]
async fn given_imported_state_when_read_then_remote_entity_fills_state() {
    let transport = ScriptedTransport::new();
    transport.respond(Ok(json!({
        "id": 42,
        "name": "Imported",
        "description": "from ui",
        "feature_flag": {"id": 3, "key": "imported-flag"},
        "parameters": {
            "feature_flag_variants": [{"key": "control", "rollout_percentage": 100}]
        },
        "start_date": "2024-03-01T00:00:00Z"
    })));
    let resource = ExperimentResource::new(transport.clone());

    let seeded = resource.import_state("5:42").expect("well formed");
    let state = resource.read(&seeded).await.expect("read should succeed");

    assert_eq!(transport.calls()[0].method, Method::GET);
    assert_eq!(transport.calls()[0].path, "/projects/5/experiments/42");
    assert_eq!(transport.calls()[0].body, None);
    assert_eq!(state.name, "Imported");
    assert_eq!(state.description.as_deref(), Some("from ui"));
    assert_eq!(state.feature_flag_key, "imported-flag");
    assert_eq!(state.feature_flag_id, Some(3));
    assert_eq!(state.start_date.as_deref(), Some("2024-03-01T00:00:00Z"));
    assert_eq!(state.end_date, None);
    assert_eq!(state.variants, variants(&[("control", 100)]));
}

#[tokio::test]
async fn given_not_found_when_read_then_generic_remote_error_is_reported() {
    let transport = ScriptedTransport::new();
    transport.respond(Err(remote_error("status 404: Not found.").with_status(404)));
    let resource = ExperimentResource::new(transport.clone());

    let err = resource
        .read(&ExperimentModel::imported(5, 42))
        .await
        .expect_err("entity is gone");

    assert_eq!(err.kind, ProviderErrorKind::Remote);
    assert_eq!(err.status, Some(404));
}

#[tokio::test]
async fn given_state_without_id_when_read_then_missing_attribute_is_reported() {
    let transport = ScriptedTransport::new();
    let resource = ExperimentResource::new(transport.clone());

    let err = resource
        .read(&planned())
        .await
        .expect_err("id is required");

    assert_eq!(err.kind, ProviderErrorKind::MissingAttribute);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn given_changed_plan_when_updated_then_patch_omits_flag_key() {
    let transport = ScriptedTransport::new();
    transport.respond(Ok(json!({
        "id": 7,
        "name": "Renamed",
        "feature_flag": {"id": 9, "key": "k"},
        "parameters": {
            "feature_flag_variants": [
                {"key": "control", "rollout_percentage": 20},
                {"key": "test", "rollout_percentage": 80}
            ]
        },
        "end_date": "2024-06-01T00:00:00Z"
    })));
    let resource = ExperimentResource::new(transport.clone());

    let prior = ExperimentModel {
        id: Some(7),
        feature_flag_id: Some(9),
        ..planned()
    };
    let plan = ExperimentModel {
        id: None,
        name: "Renamed".to_string(),
        variants: variants(&[("control", 20), ("test", 80)]),
        end_date: Some("2024-06-01T00:00:00Z".to_string()),
        ..planned()
    };

    let state = resource.update(&plan, &prior).await.expect("update should succeed");

    let calls = transport.calls();
    assert_eq!(calls[0].method, Method::PATCH);
    assert_eq!(calls[0].path, "/projects/1/experiments/7");
    assert_eq!(
        calls[0].body,
        Some(json!({
            "name": "Renamed",
            "description": "",
            "parameters": {
                "feature_flag_variants": [
                    {"key": "control", "rollout_percentage": 20},
                    {"key": "test", "rollout_percentage": 80}
                ]
            },
            "end_date": "2024-06-01T00:00:00Z"
        }))
    );
    assert_eq!(state.id, Some(7));
    assert_eq!(state.name, "Renamed");
    assert_eq!(state.variants, variants(&[("control", 20), ("test", 80)]));
    assert_eq!(state.end_date.as_deref(), Some("2024-06-01T00:00:00Z"));
}

#[tokio::test]
async fn given_existing_experiment_when_deleted_then_soft_delete_patch_is_sent() {
    let transport = ScriptedTransport::new();
    transport.respond(Ok(json!({"id": 7, "name": "Test", "deleted": true})));
    let resource = ExperimentResource::new(transport.clone());

    let state = ExperimentModel {
        id: Some(7),
        ..planned()
    };
    resource.delete(&state).await.expect("delete should succeed");

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::PATCH);
    assert_eq!(calls[0].path, "/projects/1/experiments/7");
    assert_eq!(calls[0].body, Some(json!({"deleted": true})));
}

#[tokio::test]
async fn given_shared_transport_when_resources_cloned_then_calls_go_through_it() {
    let transport = ScriptedTransport::new();
    transport.respond(Ok(remote_experiment()));
    transport.respond(Ok(remote_experiment()));
    let resource = ExperimentResource::new(Arc::clone(&transport) as _);
    let other = resource.clone();

    resource.create(&planned()).await.expect("first create");
    other.create(&planned()).await.expect("second create");

    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn given_plan_without_control_when_updated_then_no_remote_call_is_made() {
    let transport = ScriptedTransport::new();
    let resource = ExperimentResource::new(transport.clone());

    let prior = ExperimentModel {
        id: Some(7),
        ..planned()
    };
    let plan = ExperimentModel {
        variants: variants(&[("test", 100)]),
        ..prior.clone()
    };
    let err = resource
        .update(&plan, &prior)
        .await
        .expect_err("control is mandatory");

    assert_eq!(err.kind, ProviderErrorKind::InvalidVariants);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn given_no_known_id_when_updated_then_missing_attribute_is_reported() {
    let transport = ScriptedTransport::new();
    let resource = ExperimentResource::new(transport.clone());

    let err = resource
        .update(&planned(), &planned())
        .await
        .expect_err("id is required");

    assert_eq!(err.kind, ProviderErrorKind::MissingAttribute);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn given_remote_failure_when_updated_then_error_carries_transport_message() {
    let transport = ScriptedTransport::new();
    transport.respond(Err(remote_error("status 500: boom").with_status(500)));
    let resource = ExperimentResource::new(transport.clone());

    let prior = ExperimentModel {
        id: Some(7),
        ..planned()
    };
    let err = resource
        .update(&prior, &prior)
        .await
        .expect_err("remote failure");

    assert!(err.is_remote());
    assert_eq!(err.status, Some(500));
    assert_eq!(err.to_string(), "Unable to update experiment: status 500: boom");
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn given_state_without_id_when_deleted_then_no_remote_call_is_made() {
    let transport = ScriptedTransport::new();
    let resource = ExperimentResource::new(transport.clone());

    let err = resource.delete(&planned()).await.expect_err("id is required");

    assert_eq!(err.kind, ProviderErrorKind::MissingAttribute);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn given_remote_failure_when_deleted_then_error_carries_transport_message() {
    let transport = ScriptedTransport::new();
    transport.respond(Err(remote_error("status 404: Not found.").with_status(404)));
    let resource = ExperimentResource::new(transport.clone());

    let state = ExperimentModel {
        id: Some(7),
        ..planned()
    };
    let err = resource.delete(&state).await.expect_err("remote failure");

    assert!(err.is_remote());
    assert_eq!(err.status, Some(404));
    assert_eq!(
        err.to_string(),
        "Unable to delete experiment: status 404: Not found."
    );
}
