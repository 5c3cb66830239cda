// Service Domain Model

use serde::{Deserialize, Serialize};

/// Interface tag declared by a service.
///
/// Tags the SDK knows how to build requests for get their own variant;
/// anything else is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceInterface {
    StableDiffusion,
    TrainPatchStableDiffusion,
    Other(String),
}

impl ServiceInterface {
    pub fn as_str(&self) -> &str {
        match self {
            ServiceInterface::StableDiffusion => "stable-diffusion",
            ServiceInterface::TrainPatchStableDiffusion => "train-patch-stable-diffusion",
            ServiceInterface::Other(tag) => tag,
        }
    }
}

impl From<String> for ServiceInterface {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "stable-diffusion" => ServiceInterface::StableDiffusion,
            "train-patch-stable-diffusion" => ServiceInterface::TrainPatchStableDiffusion,
            _ => ServiceInterface::Other(tag),
        }
    }
}

impl From<ServiceInterface> for String {
    fn from(interface: ServiceInterface) -> Self {
        interface.as_str().to_string()
    }
}

impl std::fmt::Display for ServiceInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remotely executed job type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub interface: ServiceInterface,
}

impl Service {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        interface: impl Into<ServiceInterface>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            interface: interface.into(),
        }
    }
}

impl From<&str> for ServiceInterface {
    fn from(tag: &str) -> Self {
        ServiceInterface::from(tag.to_string())
    }
}
