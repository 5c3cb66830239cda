// Image-Generation Job Configuration

use super::AddOnConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STEPS: u32 = 28;
pub const DEFAULT_SKIP_STEPS: u32 = 0;
pub const DEFAULT_GUIDANCE_SCALE: f64 = 10.0;
pub const DEFAULT_PROMPT: &str = "banana in the kitchen";
pub const DEFAULT_NEGATIVE_PROMPT: &str = "ugly";

/// Images per job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BatchSize {
    #[default]
    One,
    Two,
    Four,
    Eight,
    Sixteen,
}

impl BatchSize {
    pub fn get(self) -> u8 {
        match self {
            BatchSize::One => 1,
            BatchSize::Two => 2,
            BatchSize::Four => 4,
            BatchSize::Eight => 8,
            BatchSize::Sixteen => 16,
        }
    }
}

impl TryFrom<u8> for BatchSize {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(BatchSize::One),
            2 => Ok(BatchSize::Two),
            4 => Ok(BatchSize::Four),
            8 => Ok(BatchSize::Eight),
            16 => Ok(BatchSize::Sixteen),
            other => Err(format!(
                "invalid batch size {} (expected 1, 2, 4, 8 or 16)",
                other
            )),
        }
    }
}

impl From<BatchSize> for u8 {
    fn from(size: BatchSize) -> Self {
        size.get()
    }
}

/// Output width or height in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum ImageSize {
    Px384,
    Px448,
    #[default]
    Px512,
    Px575,
    Px640,
    Px704,
    Px768,
}

impl ImageSize {
    pub const ALL: [ImageSize; 7] = [
        ImageSize::Px384,
        ImageSize::Px448,
        ImageSize::Px512,
        ImageSize::Px575,
        ImageSize::Px640,
        ImageSize::Px704,
        ImageSize::Px768,
    ];

    pub fn pixels(self) -> u16 {
        match self {
            ImageSize::Px384 => 384,
            ImageSize::Px448 => 448,
            ImageSize::Px512 => 512,
            ImageSize::Px575 => 575,
            ImageSize::Px640 => 640,
            ImageSize::Px704 => 704,
            ImageSize::Px768 => 768,
        }
    }
}

impl TryFrom<u16> for ImageSize {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|size| size.pixels() == value)
            .ok_or_else(|| format!("invalid image size {}", value))
    }
}

impl From<ImageSize> for u16 {
    fn from(size: ImageSize) -> Self {
        size.pixels()
    }
}

/// Diffusion sampler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampler {
    Plms,
    Ddim,
    KLms,
    #[default]
    KEuler,
    KEulerA,
    DpmMultistep,
}

impl std::str::FromStr for Sampler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plms" => Ok(Sampler::Plms),
            "ddim" => Ok(Sampler::Ddim),
            "k_lms" => Ok(Sampler::KLms),
            "k_euler" => Ok(Sampler::KEuler),
            "k_euler_a" => Ok(Sampler::KEulerA),
            "dpm_multistep" => Ok(Sampler::DpmMultistep),
            other => Err(format!("unknown sampler: {}", other)),
        }
    }
}

/// Encoding of the produced images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    #[default]
    Jpeg,
    Avif,
    Webp,
}

impl std::str::FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "png" => Ok(ImageFormat::Png),
            "jpeg" => Ok(ImageFormat::Jpeg),
            "avif" => Ok(ImageFormat::Avif),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(format!("unknown image format: {}", other)),
        }
    }
}

/// Full parameter set of one image-generation job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StableDiffusionConfig {
    pub steps: u32,
    pub skip_steps: u32,
    pub batch_size: BatchSize,
    pub sampler: Sampler,
    pub guidance_scale: f64,
    pub width: ImageSize,
    pub height: ImageSize,
    pub prompt: String,
    pub negative_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
    pub image_format: ImageFormat,
    pub translate_prompt: bool,
    pub nsfw_filter: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_ons: Vec<AddOnConfig>,
}

impl Default for StableDiffusionConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            skip_steps: DEFAULT_SKIP_STEPS,
            batch_size: BatchSize::default(),
            sampler: Sampler::default(),
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            width: ImageSize::default(),
            height: ImageSize::default(),
            prompt: DEFAULT_PROMPT.to_string(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            init_image: None,
            mask: None,
            image_format: ImageFormat::default(),
            translate_prompt: false,
            nsfw_filter: false,
            seed: None,
            add_ons: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::assert_err;

    #[test]
    fn test_default_config_wire_shape() {
        let value = serde_json::to_value(StableDiffusionConfig::default()).unwrap();

        assert_eq!(
            value,
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
    }

    #[test]
    fn test_discrete_sizes_reject_other_values() {
        assert_eq!(BatchSize::try_from(8).unwrap(), BatchSize::Eight);
        assert_err!(BatchSize::try_from(3));
        assert_eq!(ImageSize::try_from(768).unwrap(), ImageSize::Px768);
        assert_err!(ImageSize::try_from(1024));

        let parsed: Result<StableDiffusionConfig, _> = serde_json::from_value(json!({
            "steps": 28, "skip_steps": 0, "batch_size": 3, "sampler": "k_euler",
            "guidance_scale": 10, "width": 512, "height": 512, "prompt": "p",
            "negative_prompt": "n", "image_format": "jpeg",
            "translate_prompt": false, "nsfw_filter": false
        }));
        assert_err!(parsed);
    }

    #[test]
    fn test_sampler_wire_names() {
        assert_eq!(serde_json::to_value(Sampler::KEulerA).unwrap(), "k_euler_a");
        assert_eq!(
            serde_json::to_value(Sampler::DpmMultistep).unwrap(),
            "dpm_multistep"
        );
        assert_eq!("k_lms".parse::<Sampler>().unwrap(), Sampler::KLms);
    }
}
