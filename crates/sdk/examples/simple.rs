//! Simple SDK Example
//!
//! Demonstrates basic usage of the Selas SDK.
//!
//! # Usage
//!
//! 1. Export the configuration and credentials:
//!    ```bash
//!    export SELAS_BACKEND_URL=https://<project>.supabase.co
//!    export SELAS_BACKEND_KEY=<anon key>
//!    export SELAS_PUSHER_KEY=<pusher key>
//!    export SELAS_APP_ID=... SELAS_APP_KEY=...
//!    export SELAS_APP_USER_EXTERNAL_ID=... SELAS_APP_USER_TOKEN=...
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --example simple
//!    ```

use selas_sdk::{SelasClient, StableDiffusionArgs};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Selas SDK - Simple Example");
    println!("==========================\n");

    // 1. Connect
    println!("1. Connecting...");
    let client = SelasClient::from_env().await?;
    println!("   ✓ Connected as {}\n", client.app_user_id());

    // 2. Catalog
    let catalog = client.catalog();
    println!("2. Catalog:");
    println!("     - Services: {}", catalog.services().len());
    println!("     - Add-ons: {}\n", catalog.add_ons().len());

    // 3. Submit a job
    println!("3. Submitting a job...");
    let args = StableDiffusionArgs::default();
    let job_id = client.run_stable_diffusion("banana in the kitchen", &args).await?;
    println!("   ✓ Job submitted: {}\n", job_id);

    // 4. Wait for the pushed result
    println!("4. Waiting for the result...");
    let (tx, rx) = tokio::sync::oneshot::channel();
    client
        .subscribe_to_job(&job_id, move |result| {
            let _ = tx.send(result);
        })
        .await?;

    match tokio::time::timeout(Duration::from_secs(120), rx).await {
        Ok(Ok(result)) => println!("   ✓ Result: {}", result.as_value()),
        _ => {
            println!("   ⚠ No push received, polling instead");
            let result = client.get_result(&job_id).await?;
            println!("   ✓ Result: {}", result.as_value());
        }
    }

    println!("\n✓ Example completed successfully!");

    Ok(())
}
