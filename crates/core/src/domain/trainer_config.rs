// Patch-Training Job Configuration

use serde::{Deserialize, Serialize};

pub const DEFAULT_LEARNING_RATE: f64 = 1e-4;
pub const DEFAULT_TRAINING_STEPS: u32 = 100;
pub const DEFAULT_RANK: u32 = 4;

/// One labelled training image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetImage {
    pub url: String,
    pub label: String,
}

impl DatasetImage {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// Full parameter set of one patch-training job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchTrainerConfig {
    pub dataset: Vec<DatasetImage>,
    pub patch_name: String,
    pub description: String,
    pub learning_rate: f64,
    pub steps: u32,
    pub rank: u32,
}

impl PatchTrainerConfig {
    pub fn new(dataset: Vec<DatasetImage>, patch_name: impl Into<String>) -> Self {
        Self {
            dataset,
            patch_name: patch_name.into(),
            description: String::new(),
            learning_rate: DEFAULT_LEARNING_RATE,
            steps: DEFAULT_TRAINING_STEPS,
            rank: DEFAULT_RANK,
        }
    }
}
