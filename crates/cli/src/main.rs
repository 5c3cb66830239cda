//! Selas CLI - Command-line interface for the Selas job backend

mod args;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;
use selas_sdk::{
    AddOn, BatchSize, ClientConfig, DatasetImage, ImageSize, PatchConfig, PatchTrainerArgs,
    SelasClient, Service, StableDiffusionArgs, WorkerFilter,
};
use std::time::Duration;
use tabled::{Table, Tabled};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use args::{Cli, Commands, RunArgs, TrainArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Tabled)]
struct ServiceRow {
    name: String,
    interface: String,
    id: String,
}

impl From<&Service> for ServiceRow {
    fn from(service: &Service) -> Self {
        Self {
            name: service.name.clone(),
            interface: service.interface.to_string(),
            id: service.id.clone(),
        }
    }
}

#[derive(Tabled)]
struct AddOnRow {
    name: String,
    services: String,
    owner: String,
}

impl From<&AddOn> for AddOnRow {
    fn from(add_on: &AddOn) -> Self {
        Self {
            name: add_on.name.clone(),
            services: add_on.service_names.join(", "),
            owner: add_on.owner.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn init_logging() {
    let log_format = std::env::var("SELAS_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("selas=info"));

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn stable_diffusion_args(run: &RunArgs) -> Result<StableDiffusionArgs> {
    let size = |px: Option<u16>| -> Result<Option<ImageSize>> {
        px.map(|px| ImageSize::try_from(px).map_err(|e| anyhow!(e)))
            .transpose()
    };

    Ok(StableDiffusionArgs {
        service_name: run.service.clone(),
        steps: run.steps,
        skip_steps: run.skip_steps,
        batch_size: run
            .batch_size
            .map(|n| BatchSize::try_from(n).map_err(|e| anyhow!(e)))
            .transpose()?,
        sampler: run.sampler,
        guidance_scale: run.guidance_scale,
        width: size(run.width)?,
        height: size(run.height)?,
        negative_prompt: run.negative_prompt.clone(),
        image_format: run.image_format,
        translate_prompt: run.translate_prompt,
        nsfw_filter: run.nsfw_filter,
        seed: run.seed,
        init_image: run.init_image.clone(),
        mask: run.mask.clone(),
        patches: run.patches.iter().map(PatchConfig::new).collect(),
    })
}

fn dataset(train: &TrainArgs) -> Result<Vec<DatasetImage>> {
    train
        .images
        .iter()
        .map(|entry| {
            let (url, label) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("Dataset entry must be URL=LABEL: {}", entry))?;
            Ok(DatasetImage::new(url, label))
        })
        .collect()
}

async fn wait_for_result(client: &SelasClient, job_id: &str, timeout: Duration) -> Result<()> {
    let (tx, rx) = tokio::sync::oneshot::channel();
    client
        .subscribe_to_job(job_id, move |result| {
            let _ = tx.send(result);
        })
        .await
        .context("Failed to subscribe to job results")?;

    println!("{}", format!("Waiting for job {}...", job_id).cyan());

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(result)) => {
            println!("{}", "✓ Result received".green().bold());
            print_json(result.as_value())
        }
        Ok(Err(_)) => anyhow::bail!("Result channel closed before job {} finished", job_id),
        Err(_) => anyhow::bail!("No result for job {} after {:?}", job_id, timeout),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    info!("Selas CLI v{}", VERSION);

    let mut config = ClientConfig::new(
        cli.backend.backend_url.clone(),
        cli.backend.backend_key.clone(),
        cli.backend.pusher_key.clone(),
    )
    .with_worker_filter(WorkerFilter::branch(cli.backend.worker_branch.clone()));
    config.pusher_cluster = cli.backend.pusher_cluster.clone();
    config.pusher_host = cli.backend.pusher_host.clone();
    config.request_timeout = Duration::from_secs(cli.backend.timeout_secs);

    let credentials = cli.credentials.to_credentials();
    let client = SelasClient::connect(config, &credentials)
        .await
        .context("Failed to connect to Selas")?;

    match cli.command {
        Commands::Echo { message } => {
            let echoed = client.echo(&message).await?;
            println!("{}", echoed);
        }

        Commands::Credits => {
            let credits = client.get_app_user_credits().await?;
            println!("{} {}", "Credits:".bold(), credits);
        }

        Commands::History { limit, offset } => {
            let history = client.get_app_user_job_history(limit, offset).await?;
            print_json(&history)?;
        }

        Commands::Services => {
            let services = client.get_service_list().await?;
            let rows: Vec<ServiceRow> = services.iter().map(ServiceRow::from).collect();
            println!("{}", Table::new(rows));
        }

        Commands::AddOns => {
            let add_ons = client.get_add_on_list().await?;
            if add_ons.is_empty() {
                println!("{}", "No add-ons available".yellow());
            } else {
                let rows: Vec<AddOnRow> = add_ons.iter().map(AddOnRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Run(run) => {
            let args = stable_diffusion_args(&run)?;
            let job_id = client.run_stable_diffusion(&run.prompt, &args).await?;

            println!("{}", format!("✓ Job {} submitted", job_id).green().bold());

            if run.wait {
                wait_for_result(&client, &job_id, Duration::from_secs(run.wait_secs)).await?;
            }
        }

        Commands::Cost { service, config } => {
            // Reject malformed JSON before any remote call
            let parsed: serde_json::Value =
                serde_json::from_str(&config).context("Invalid JSON job config")?;
            let cost = client.get_config_cost(&service, &parsed).await?;
            println!("{} {}", "Cost:".bold(), cost);
        }

        Commands::Train(train) => {
            let dataset = dataset(&train)?;
            let args = PatchTrainerArgs {
                service_name: train.service.clone(),
                description: train.description.clone(),
                learning_rate: train.learning_rate,
                steps: train.steps,
                rank: train.rank,
            };
            let job_id = client
                .run_patch_trainer(dataset, &train.patch_name, &args)
                .await?;

            println!(
                "{}",
                format!("✓ Training of {} submitted as job {}", train.patch_name, job_id)
                    .green()
                    .bold()
            );
        }

        Commands::Share { name, user } => {
            client.share_add_on(&name, &user).await?;
            println!("{}", format!("✓ Add-on {} shared with {}", name, user).green().bold());
        }

        Commands::Delete { name } => {
            client.delete_add_on(&name).await?;
            println!("{}", format!("✓ Add-on {} deleted", name).green().bold());
        }

        Commands::Rename { old_name, new_name } => {
            client.rename_add_on(&old_name, &new_name).await?;
            println!(
                "{}",
                format!("✓ Add-on {} renamed to {}", old_name, new_name).green().bold()
            );
        }

        Commands::GetResult { job_id } => {
            let result = client.get_result(&job_id).await?;
            print_json(result.as_value())?;
        }

        Commands::Watch { job_id, wait_secs } => {
            wait_for_result(&client, &job_id, Duration::from_secs(wait_secs)).await?;
        }

        Commands::Workers => {
            let count = client.get_count_active_worker().await?;
            let branch = client
                .worker_filter()
                .branch
                .clone()
                .unwrap_or_else(|| "any".to_string());
            println!("{} {} (branch {})", "Active workers:".bold(), count, branch);
        }
    }

    Ok(())
}
