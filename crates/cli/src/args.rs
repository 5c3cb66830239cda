//! Command-line arguments

use clap::{Args, Parser, Subcommand};
use selas_sdk::{AppCredentials, ImageFormat, Sampler};

const DEFAULT_WAIT_SECS: &str = "300";

#[derive(Parser)]
#[command(name = "selas")]
#[command(about = "Selas job backend CLI", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

#[derive(Args)]
pub struct BackendArgs {
    /// Backend project URL
    #[arg(long, env = "SELAS_BACKEND_URL")]
    pub backend_url: String,

    /// Backend public API key
    #[arg(long, env = "SELAS_BACKEND_KEY", hide_env_values = true)]
    pub backend_key: String,

    /// Pusher application key
    #[arg(long, env = "SELAS_PUSHER_KEY")]
    pub pusher_key: String,

    #[arg(long, env = "SELAS_PUSHER_CLUSTER", default_value = "eu")]
    pub pusher_cluster: String,

    /// WebSocket base URL overriding the Pusher cluster host
    #[arg(long, env = "SELAS_PUSHER_HOST")]
    pub pusher_host: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "SELAS_REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Worker branch jobs are routed to
    #[arg(long, env = "SELAS_WORKER_BRANCH", default_value = "prod")]
    pub worker_branch: String,
}

#[derive(Args)]
pub struct CredentialArgs {
    #[arg(long, env = "SELAS_APP_ID")]
    pub app_id: String,

    #[arg(long, env = "SELAS_APP_KEY", hide_env_values = true)]
    pub app_key: String,

    /// External id of the end user
    #[arg(long, env = "SELAS_APP_USER_EXTERNAL_ID")]
    pub user: String,

    #[arg(long, env = "SELAS_APP_USER_TOKEN", hide_env_values = true)]
    pub user_token: String,
}

impl CredentialArgs {
    pub fn to_credentials(&self) -> AppCredentials {
        AppCredentials::new(
            self.app_id.clone(),
            self.app_key.clone(),
            self.user.clone(),
            self.user_token.clone(),
        )
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Echo a message through the backend
    Echo { message: String },

    /// Show remaining credits
    Credits,

    /// Show past jobs
    History {
        #[arg(short = 'n', long, default_value = "10")]
        limit: u32,

        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// List available services
    Services,

    /// List available add-ons
    AddOns,

    /// Submit an image-generation job
    Run(RunArgs),

    /// Price a job config (JSON) for a service
    Cost { service: String, config: String },

    /// Train a new patch
    Train(TrainArgs),

    /// Share an add-on with another user
    Share {
        name: String,
        /// External id of the recipient
        user: String,
    },

    /// Delete an add-on
    Delete { name: String },

    /// Rename an add-on
    Rename { old_name: String, new_name: String },

    /// Fetch a job result
    #[command(name = "result")]
    GetResult { job_id: String },

    /// Wait for a job result to be pushed
    Watch {
        job_id: String,

        /// Seconds to wait before giving up
        #[arg(long = "wait-secs", default_value = DEFAULT_WAIT_SECS)]
        wait_secs: u64,
    },

    /// Count active workers for the worker branch
    Workers,
}

#[derive(Args)]
pub struct RunArgs {
    pub prompt: String,

    /// Target service (default: stable-diffusion-2-1-base)
    #[arg(long)]
    pub service: Option<String>,

    #[arg(long)]
    pub steps: Option<u32>,

    #[arg(long)]
    pub skip_steps: Option<u32>,

    /// 1, 2, 4, 8 or 16
    #[arg(long)]
    pub batch_size: Option<u8>,

    /// plms, ddim, k_lms, k_euler, k_euler_a or dpm_multistep
    #[arg(long)]
    pub sampler: Option<Sampler>,

    #[arg(long)]
    pub guidance_scale: Option<f64>,

    /// Width in pixels (384 to 768)
    #[arg(long)]
    pub width: Option<u16>,

    /// Height in pixels (384 to 768)
    #[arg(long)]
    pub height: Option<u16>,

    #[arg(long)]
    pub negative_prompt: Option<String>,

    /// png, jpeg, avif or webp
    #[arg(long = "format")]
    pub image_format: Option<ImageFormat>,

    #[arg(long)]
    pub translate_prompt: Option<bool>,

    #[arg(long)]
    pub nsfw_filter: Option<bool>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Init image URL
    #[arg(long)]
    pub init_image: Option<String>,

    /// Mask image URL
    #[arg(long)]
    pub mask: Option<String>,

    /// Add-on to apply (repeatable)
    #[arg(long = "patch")]
    pub patches: Vec<String>,

    /// Wait for the result after submitting
    #[arg(long)]
    pub wait: bool,

    #[arg(long = "wait-secs", default_value = DEFAULT_WAIT_SECS)]
    pub wait_secs: u64,
}

#[derive(Args)]
pub struct TrainArgs {
    pub patch_name: String,

    /// Dataset image as URL=LABEL (repeatable)
    #[arg(long = "image", required = true)]
    pub images: Vec<String>,

    #[arg(long)]
    pub service: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub learning_rate: Option<f64>,

    #[arg(long)]
    pub steps: Option<u32>,

    #[arg(long)]
    pub rank: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const BASE: [&str; 17] = [
        "selas",
        "--backend-url",
        "http://localhost:54321",
        "--backend-key",
        "anon",
        "--pusher-key",
        "pk",
        "--app-id",
        "app",
        "--app-key",
        "key",
        "--user",
        "ext",
        "--user-token",
        "token",
        "--worker-branch",
        "prod",
    ];

    fn parse(extra: &[&str]) -> Cli {
        let mut argv = BASE.to_vec();
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_patches() {
        let cli = parse(&[
            "run", "a cat", "--steps", "40", "--sampler", "k_euler", "--patch", "f-compo",
            "--patch", "f-other", "--format", "png",
        ]);

        match cli.command {
            Commands::Run(run) => {
                assert_eq!(run.prompt, "a cat");
                assert_eq!(run.steps, Some(40));
                assert_eq!(run.sampler, Some(Sampler::KEuler));
                assert_eq!(run.image_format, Some(ImageFormat::Png));
                assert_eq!(run.patches, vec!["f-compo", "f-other"]);
                assert!(!run.wait);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_unknown_sampler_is_rejected() {
        let mut argv = BASE.to_vec();
        argv.extend_from_slice(&["run", "x", "--sampler", "euler"]);
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_train_requires_images() {
        let mut argv = BASE.to_vec();
        argv.extend_from_slice(&["train", "my-patch"]);
        assert!(Cli::try_parse_from(argv).is_err());

        let cli = parse(&["train", "my-patch", "--image", "https://x/1.png=a cat"]);
        assert!(matches!(cli.command, Commands::Train(t) if t.images.len() == 1));
    }
}
