//! Request validation, defaulting and submission scenarios

mod common;

use common::{connect, posted_config, scripted_backend, SD_SERVICE, TRAINER_SERVICE};
use selas_core::application::rpc::names;
use selas_core::application::{PatchTrainerArgs, StableDiffusionArgs};
use selas_core::domain::{DatasetImage, PatchConfig, Sampler};
use selas_core::port::result_channel::mocks::MockResultChannel;
use selas_core::{SelasError, ValidationError};
use serde_json::json;
use std::sync::{Arc, Mutex};

fn dataset() -> Vec<DatasetImage> {
    vec![
        DatasetImage::new("https://img/1.png", "a red chair"),
        DatasetImage::new("https://img/2.png", "a blue chair"),
    ]
}

/// Omitted fields get the documented defaults exactly
#[tokio::test]
async fn test_defaults_are_sent_exactly() {
    let transport = scripted_backend();
    let client = connect(&transport, &MockResultChannel::new()).await.unwrap();

    let job_id = client
        .run_stable_diffusion("", &StableDiffusionArgs::default())
        .await
        .unwrap();
    assert_eq!(job_id, "job-1");

    assert_eq!(
        posted_config(&transport),
        json!({
            "steps": 28,
            "skip_steps": 0,
            "batch_size": 1,
            "sampler": "k_euler",
            "guidance_scale": 10.0,
            "width": 512,
            "height": 512,
            "prompt": "banana in the kitchen",
            "negative_prompt": "ugly",
            "image_format": "jpeg",
            "translate_prompt": false,
            "nsfw_filter": false
        })
    );

    let calls = transport.calls_to(names::POST_JOB);
    assert_eq!(calls[0].params["p_service_id"], "svc-sd");
    assert_eq!(calls[0].params["p_worker_filter"], json!({"branch": "prod"}));
}

#[tokio::test]
async fn test_patches_are_resolved_to_ids_with_weights() {
    let transport = scripted_backend();
    let client = connect(&transport, &MockResultChannel::new()).await.unwrap();

    let args = StableDiffusionArgs {
        steps: Some(0),
        sampler: Some(Sampler::Ddim),
        patches: vec![
            PatchConfig::new("f-compo").with_alpha_unet(0.5),
            PatchConfig::new("existing-name"),
        ],
        ..Default::default()
    };
    client.run_stable_diffusion("a chair", &args).await.unwrap();

    let config = posted_config(&transport);
    assert_eq!(config["steps"], 0);
    assert_eq!(config["sampler"], "ddim");
    assert_eq!(config["prompt"], "a chair");
    assert_eq!(
        config["add_ons"],
        json!([
            {"id": "ao-1", "config": {"alpha_unet": 0.5, "alpha_text_encoder": 1.0, "steps": 100}},
            {"id": "ao-2", "config": {"alpha_unet": 1.0, "alpha_text_encoder": 1.0, "steps": 100}}
        ])
    );
}

#[tokio::test]
async fn test_missing_add_on_is_rejected_before_submission() {
    let transport = scripted_backend();
    let client = connect(&transport, &MockResultChannel::new()).await.unwrap();
    let calls_before = transport.call_count();

    let args = StableDiffusionArgs {
        patches: vec![PatchConfig::new("missing-addon")],
        ..Default::default()
    };
    let err = client.run_stable_diffusion("x", &args).await.unwrap_err();

    assert!(matches!(
        err,
        SelasError::Validation(ValidationError::UnknownAddOn(ref name)) if name == "missing-addon"
    ));
    assert!(!transport.was_called(names::POST_JOB));
    assert_eq!(transport.call_count(), calls_before);
}

#[tokio::test]
async fn test_incompatible_add_on_is_rejected() {
    let transport = scripted_backend();
    let client = connect(&transport, &MockResultChannel::new()).await.unwrap();

    let args = StableDiffusionArgs {
        patches: vec![PatchConfig::new("upscale-only")],
        ..Default::default()
    };
    let err = client.run_stable_diffusion("x", &args).await.unwrap_err();

    assert!(matches!(
        err,
        SelasError::Validation(ValidationError::IncompatibleAddOn { .. })
    ));
    assert!(!transport.was_called(names::POST_JOB));
}

#[tokio::test]
async fn test_unknown_and_mismatched_services() {
    let transport = scripted_backend();
    let client = connect(&transport, &MockResultChannel::new()).await.unwrap();

    let args = StableDiffusionArgs {
        service_name: Some("nope".to_string()),
        ..Default::default()
    };
    let err = client.run_stable_diffusion("x", &args).await.unwrap_err();
    assert!(matches!(
        err,
        SelasError::Validation(ValidationError::UnknownService(_))
    ));

    let args = StableDiffusionArgs {
        service_name: Some(TRAINER_SERVICE.to_string()),
        ..Default::default()
    };
    let err = client.run_stable_diffusion("x", &args).await.unwrap_err();
    assert!(matches!(
        err,
        SelasError::Validation(ValidationError::WrongInterface { .. })
    ));

    let err = client.post_job("nope", &json!({})).await.unwrap_err();
    assert!(err.is_validation());
    assert!(!transport.was_called(names::POST_JOB));
}

#[tokio::test]
async fn test_patch_trainer_rejects_existing_name() {
    let transport = scripted_backend();
    let client = connect(&transport, &MockResultChannel::new()).await.unwrap();

    let err = client
        .run_patch_trainer(dataset(), "existing-name", &PatchTrainerArgs::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SelasError::Validation(ValidationError::AddOnAlreadyExists(_))
    ));
    assert!(!transport.was_called(names::POST_JOB));
}

/// A bad trainer service fails without touching the backend or the snapshot
#[tokio::test]
async fn test_patch_trainer_service_checked_before_add_on_refresh() {
    let transport = scripted_backend();
    let client = connect(&transport, &MockResultChannel::new()).await.unwrap();
    let calls_before = transport.call_count();
    let revision_before = client.catalog().revision();

    let unknown = PatchTrainerArgs {
        service_name: Some("nope".to_string()),
        ..Default::default()
    };
    let err = client
        .run_patch_trainer(vec![], "f-new", &unknown)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SelasError::Validation(ValidationError::UnknownService(_))
    ));

    let mismatched = PatchTrainerArgs {
        service_name: Some(SD_SERVICE.to_string()),
        ..Default::default()
    };
    let err = client
        .run_patch_trainer(dataset(), "f-new", &mismatched)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SelasError::Validation(ValidationError::WrongInterface { .. })
    ));

    assert_eq!(transport.call_count(), calls_before);
    assert_eq!(transport.calls_to(names::GET_ADD_ONS).len(), 1);
    assert_eq!(client.catalog().revision(), revision_before);
}

#[tokio::test]
async fn test_patch_trainer_defaults() {
    let transport = scripted_backend();
    let client = connect(&transport, &MockResultChannel::new()).await.unwrap();

    client
        .run_patch_trainer(dataset(), "my-chairs", &PatchTrainerArgs::default())
        .await
        .unwrap();

    let config = posted_config(&transport);
    assert_eq!(config["patch_name"], "my-chairs");
    assert_eq!(config["learning_rate"], 1e-4);
    assert_eq!(config["steps"], 100);
    assert_eq!(config["rank"], 4);
    assert_eq!(config["description"], "");
    assert_eq!(config["dataset"][1]["label"], "a blue chair");

    let calls = transport.calls_to(names::POST_JOB);
    assert_eq!(calls[0].params["p_service_id"], "svc-train");
}

#[tokio::test]
async fn test_price_then_submit_then_receive() {
    let transport = scripted_backend();
    let channel = MockResultChannel::new();
    let client = connect(&transport, &channel).await.unwrap();
    transport.on(names::GET_CONFIG_COST, json!(0.25));

    let cost = client
        .get_config_cost(SD_SERVICE, &json!({"steps": 28}))
        .await
        .unwrap();
    assert_eq!(cost, json!(0.25));
    let calls = transport.calls_to(names::GET_CONFIG_COST);
    assert_eq!(calls[0].params["p_config"], "{\"steps\":28}");

    let job_id = client
        .run_stable_diffusion("x", &StableDiffusionArgs::default())
        .await
        .unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    client
        .subscribe_to_job(&job_id, move |result| {
            sink.lock().unwrap().push(result.into_value())
        })
        .await
        .unwrap();

    assert_eq!(channel.publish("job-job-1", "result", json!({"images": []})), 1);
    assert_eq!(channel.publish("job-job-1", "result", json!({"images": []})), 0);
    assert_eq!(*received.lock().unwrap(), vec![json!({"images": []})]);
}
