// Request Builder
//
// Pure, synchronous: partial caller input + catalog snapshot -> fully
// populated job configuration, or the first validation error.

use crate::application::constants::{
    DEFAULT_PATCH_TRAINER_SERVICE, DEFAULT_STABLE_DIFFUSION_SERVICE,
};
use crate::application::validation;
use crate::domain::job_config::DEFAULT_PROMPT;
use crate::domain::{
    AddOnConfig, BatchSize, CatalogSnapshot, DatasetImage, ImageFormat, ImageSize, PatchConfig,
    PatchTrainerConfig, Sampler, ServiceInterface, StableDiffusionConfig,
};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, ValidationError>;

/// Caller-supplied image-generation parameters; `None` means "use the default"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StableDiffusionArgs {
    pub service_name: Option<String>,
    pub steps: Option<u32>,
    pub skip_steps: Option<u32>,
    pub batch_size: Option<BatchSize>,
    pub sampler: Option<Sampler>,
    pub guidance_scale: Option<f64>,
    pub width: Option<ImageSize>,
    pub height: Option<ImageSize>,
    pub negative_prompt: Option<String>,
    pub image_format: Option<ImageFormat>,
    pub translate_prompt: Option<bool>,
    pub nsfw_filter: Option<bool>,
    pub seed: Option<u64>,
    pub init_image: Option<String>,
    pub mask: Option<String>,
    #[serde(default)]
    pub patches: Vec<PatchConfig>,
}

/// Caller-supplied patch-training parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchTrainerArgs {
    pub service_name: Option<String>,
    pub description: Option<String>,
    pub learning_rate: Option<f64>,
    pub steps: Option<u32>,
    pub rank: Option<u32>,
}

/// A validated configuration and the service it targets
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltJob<C> {
    pub service_name: String,
    pub config: C,
}

/// Resolve a patch to the add-on config sent on the wire.
///
/// Pure: the same patch against the same snapshot always yields the same value.
pub fn patch_config_to_add_on_config(
    catalog: &CatalogSnapshot,
    patch: &PatchConfig,
) -> Result<AddOnConfig> {
    let add_on = validation::resolve_add_on(catalog, &patch.name)?;
    Ok(AddOnConfig {
        id: add_on.id.clone(),
        config: patch.weights(),
    })
}

/// Build an image-generation job.
///
/// Service existence and interface are checked before any patch; patches are
/// checked in the order given.
pub fn build_stable_diffusion(
    prompt: &str,
    args: &StableDiffusionArgs,
    catalog: &CatalogSnapshot,
) -> Result<BuiltJob<StableDiffusionConfig>> {
    let service_name = args
        .service_name
        .as_deref()
        .unwrap_or(DEFAULT_STABLE_DIFFUSION_SERVICE);

    validation::resolve_service_with_interface(
        catalog,
        service_name,
        &ServiceInterface::StableDiffusion,
    )?;
    validation::validate_patches(catalog, service_name, &args.patches)?;

    let add_ons = args
        .patches
        .iter()
        .map(|patch| patch_config_to_add_on_config(catalog, patch))
        .collect::<Result<Vec<_>>>()?;

    let defaults = StableDiffusionConfig::default();
    let prompt = if prompt.is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        prompt.to_string()
    };

    let config = StableDiffusionConfig {
        steps: args.steps.unwrap_or(defaults.steps),
        skip_steps: args.skip_steps.unwrap_or(defaults.skip_steps),
        batch_size: args.batch_size.unwrap_or(defaults.batch_size),
        sampler: args.sampler.unwrap_or(defaults.sampler),
        guidance_scale: args.guidance_scale.unwrap_or(defaults.guidance_scale),
        width: args.width.unwrap_or(defaults.width),
        height: args.height.unwrap_or(defaults.height),
        prompt,
        negative_prompt: args
            .negative_prompt
            .clone()
            .unwrap_or(defaults.negative_prompt),
        init_image: args.init_image.clone(),
        mask: args.mask.clone(),
        image_format: args.image_format.unwrap_or(defaults.image_format),
        translate_prompt: args.translate_prompt.unwrap_or(defaults.translate_prompt),
        nsfw_filter: args.nsfw_filter.unwrap_or(defaults.nsfw_filter),
        seed: args.seed,
        add_ons,
    };

    Ok(BuiltJob {
        service_name: service_name.to_string(),
        config,
    })
}

/// Build a patch-training job.
///
/// The name check is only as fresh as `catalog`; the backend has the final say.
pub fn build_patch_trainer(
    dataset: Vec<DatasetImage>,
    patch_name: &str,
    args: &PatchTrainerArgs,
    catalog: &CatalogSnapshot,
) -> Result<BuiltJob<PatchTrainerConfig>> {
    let service_name = args
        .service_name
        .as_deref()
        .unwrap_or(DEFAULT_PATCH_TRAINER_SERVICE);

    validation::resolve_service_with_interface(
        catalog,
        service_name,
        &ServiceInterface::TrainPatchStableDiffusion,
    )?;
    validation::ensure_add_on_name_available(catalog, patch_name)?;

    let mut config = PatchTrainerConfig::new(dataset, patch_name);
    if let Some(description) = &args.description {
        config.description = description.clone();
    }
    if let Some(learning_rate) = args.learning_rate {
        config.learning_rate = learning_rate;
    }
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(rank) = args.rank {
        config.rank = rank;
    }

    Ok(BuiltJob {
        service_name: service_name.to_string(),
        config,
    })
}
