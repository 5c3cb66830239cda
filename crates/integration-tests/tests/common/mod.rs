//! Shared fixtures: a scripted backend with a small catalog

#![allow(dead_code)]

use selas_core::application::rpc::names;
use selas_core::domain::{AppCredentials, WorkerFilter};
use selas_core::port::result_channel::mocks::MockResultChannel;
use selas_core::port::rpc_transport::mocks::MockRpcTransport;
use selas_core::SelasService;
use serde_json::{json, Value};
use std::sync::Arc;

pub const SD_SERVICE: &str = "stable-diffusion-2-1-base";
pub const TRAINER_SERVICE: &str = "patch_trainer_v1";

pub fn credentials() -> AppCredentials {
    AppCredentials::new("app-1", "app-key", "user-ext-1", "user-token")
}

pub fn services() -> Value {
    json!([
        {"id": "svc-sd", "name": SD_SERVICE, "interface": "stable-diffusion"},
        {"id": "svc-train", "name": TRAINER_SERVICE, "interface": "train-patch-stable-diffusion"},
        {"id": "svc-up", "name": "upscaler", "interface": "upscale"}
    ])
}

pub fn add_ons() -> Value {
    json!([
        {"id": "ao-1", "name": "f-compo", "service_name": [SD_SERVICE]},
        {"id": "ao-2", "name": "existing-name", "service_name": SD_SERVICE},
        {"id": "ao-3", "name": "upscale-only", "service_name": ["upscaler"]}
    ])
}

/// Transport answering the bootstrap calls and a job submission
pub fn scripted_backend() -> MockRpcTransport {
    let transport = MockRpcTransport::new();
    transport
        .on(names::GET_USER_ID, json!("user-internal-1"))
        .on(names::ECHO, json!("check"))
        .on(names::GET_SERVICES, services())
        .on(names::GET_ADD_ONS, add_ons())
        .on(names::POST_JOB, json!("job-1"))
        .on(names::IS_CREATING_ADD_ON, json!(false));
    transport
}

pub async fn connect(
    transport: &MockRpcTransport,
    channel: &MockResultChannel,
) -> selas_core::Result<SelasService> {
    SelasService::connect(
        Arc::new(transport.clone()),
        Arc::new(channel.clone()),
        &credentials(),
        WorkerFilter::production(),
    )
    .await
}

/// `p_job_config` of the only `post_job` call, decoded
pub fn posted_config(transport: &MockRpcTransport) -> Value {
    let calls = transport.calls_to(names::POST_JOB);
    assert_eq!(calls.len(), 1, "expected exactly one submission");
    let text = calls[0].params["p_job_config"]
        .as_str()
        .expect("job config is sent as text");
    serde_json::from_str(text).unwrap()
}
