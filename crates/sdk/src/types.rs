//! Request and response types re-exported from the core crate

pub use selas_core::application::{PatchTrainerArgs, StableDiffusionArgs};
pub use selas_core::domain::{
    AddOn, AppCredentials, BatchSize, CatalogSnapshot, DatasetImage, ImageFormat, ImageSize,
    JobId, JobResult, PatchConfig, PatchWeights, Sampler, Service, ServiceInterface,
    StableDiffusionConfig, WorkerFilter,
};
pub use selas_core::{CredentialFault, SelasError, ValidationError};
