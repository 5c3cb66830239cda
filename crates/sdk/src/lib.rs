//! Selas SDK - Rust Client Library
//!
//! Provides a convenient client for the Selas job backend: image
//! generation, patch training and add-on management.
//!
//! # Example
//!
//! ```no_run
//! use selas_sdk::{PatchConfig, SelasClient, StableDiffusionArgs};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Configuration and credentials from SELAS_* variables
//!     let client = SelasClient::from_env().await?;
//!
//!     // Submit a job
//!     let args = StableDiffusionArgs {
//!         patches: vec![PatchConfig::new("f-compo")],
//!         ..Default::default()
//!     };
//!     let job_id = client.run_stable_diffusion("banana in the kitchen", &args).await?;
//!
//!     println!("Job submitted: {}", job_id);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::SelasClient;
pub use config::{credentials_from_env, ClientConfig};
pub use error::{Result, SdkError};
pub use types::*;
