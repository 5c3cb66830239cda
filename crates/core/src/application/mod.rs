// Application Layer - Session, request pipeline and client operations

pub mod client;
pub mod constants;
pub mod dispatcher;
pub mod error_classifier;
pub mod request_builder;
pub mod rpc;
pub mod session;
pub mod validation;

// Re-exports
pub use client::SelasService;
pub use request_builder::{BuiltJob, PatchTrainerArgs, StableDiffusionArgs};
pub use rpc::AuthenticatedRpc;
