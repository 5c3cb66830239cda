// Add-on (Patch) Domain Model

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_ALPHA_TEXT_ENCODER: f64 = 1.0;
pub const DEFAULT_ALPHA_UNET: f64 = 1.0;
pub const DEFAULT_PATCH_STEPS: u32 = 100;

/// A user-visible trained patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    /// Names of the services this add-on can be applied to
    #[serde(
        rename = "service_name",
        default,
        deserialize_with = "one_or_many"
    )]
    pub service_names: Vec<String>,
}

impl AddOn {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        service_names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner: None,
            service_names: service_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_compatible_with(&self, service_name: &str) -> bool {
        self.service_names.iter().any(|name| name == service_name)
    }
}

// The backend returns either a single service name or a list of them
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(name)) => vec![name],
        Some(OneOrMany::Many(names)) => names,
        None => Vec::new(),
    })
}

/// Caller-side request to apply a patch by name
///
/// Unset weights fall back to 1.0 / 1.0 / 100 steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchConfig {
    pub name: String,
    #[serde(default)]
    pub alpha_text_encoder: Option<f64>,
    #[serde(default)]
    pub alpha_unet: Option<f64>,
    #[serde(default)]
    pub steps: Option<u32>,
}

impl PatchConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alpha_text_encoder: None,
            alpha_unet: None,
            steps: None,
        }
    }

    pub fn with_alpha_text_encoder(mut self, alpha: f64) -> Self {
        self.alpha_text_encoder = Some(alpha);
        self
    }

    pub fn with_alpha_unet(mut self, alpha: f64) -> Self {
        self.alpha_unet = Some(alpha);
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Weights with defaults applied
    pub fn weights(&self) -> PatchWeights {
        PatchWeights {
            alpha_unet: self.alpha_unet.unwrap_or(DEFAULT_ALPHA_UNET),
            alpha_text_encoder: self
                .alpha_text_encoder
                .unwrap_or(DEFAULT_ALPHA_TEXT_ENCODER),
            steps: self.steps.unwrap_or(DEFAULT_PATCH_STEPS),
        }
    }
}

/// Blend weights sent with an applied patch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchWeights {
    pub alpha_unet: f64,
    pub alpha_text_encoder: f64,
    pub steps: u32,
}

impl Default for PatchWeights {
    fn default() -> Self {
        Self {
            alpha_unet: DEFAULT_ALPHA_UNET,
            alpha_text_encoder: DEFAULT_ALPHA_TEXT_ENCODER,
            steps: DEFAULT_PATCH_STEPS,
        }
    }
}

/// A validated patch, resolved to its add-on id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOnConfig {
    pub id: String,
    pub config: PatchWeights,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_name_accepts_string_or_list() {
        let single: AddOn = serde_json::from_value(json!({
            "id": "a1", "name": "f-compo", "service_name": "stable-diffusion-1-5"
        }))
        .unwrap();
        assert_eq!(single.service_names, vec!["stable-diffusion-1-5"]);

        let many: AddOn = serde_json::from_value(json!({
            "id": "a2",
            "name": "f-boop",
            "service_name": ["stable-diffusion-1-5", "stable-diffusion-2-1-base"]
        }))
        .unwrap();
        assert!(many.is_compatible_with("stable-diffusion-2-1-base"));
        assert!(!many.is_compatible_with("stable-diffusion-2-1"));

        let missing: AddOn =
            serde_json::from_value(json!({"id": "a3", "name": "orphan", "service_name": null}))
                .unwrap();
        assert!(missing.service_names.is_empty());
    }

    #[test]
    fn test_patch_weights_defaults() {
        let weights = PatchConfig::new("f-compo").weights();
        assert_eq!(weights, PatchWeights::default());
        assert_eq!(weights.alpha_unet, 1.0);
        assert_eq!(weights.alpha_text_encoder, 1.0);
        assert_eq!(weights.steps, 100);

        let weights = PatchConfig::new("f-compo")
            .with_alpha_unet(0.5)
            .with_steps(1000)
            .weights();
        assert_eq!(weights.alpha_unet, 0.5);
        assert_eq!(weights.alpha_text_encoder, 1.0);
        assert_eq!(weights.steps, 1000);
    }
}
