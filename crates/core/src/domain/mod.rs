// Domain Layer - Catalog entities and job configurations

pub mod add_on;
pub mod catalog;
pub mod credentials;
pub mod error;
pub mod job;
pub mod job_config;
pub mod service;
pub mod trainer_config;
pub mod worker_filter;

// Re-exports
pub use add_on::{AddOn, AddOnConfig, PatchConfig, PatchWeights};
pub use catalog::CatalogSnapshot;
pub use credentials::{AppCredentials, Identity};
pub use error::ValidationError;
pub use job::{JobId, JobResult};
pub use job_config::{BatchSize, ImageFormat, ImageSize, Sampler, StableDiffusionConfig};
pub use service::{Service, ServiceInterface};
pub use trainer_config::{DatasetImage, PatchTrainerConfig};
pub use worker_filter::WorkerFilter;
