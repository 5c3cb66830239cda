// Request pipeline constants (No magic values)

/// Service used by `run_stable_diffusion` when none is named
pub const DEFAULT_STABLE_DIFFUSION_SERVICE: &str = "stable-diffusion-2-1-base";

/// Service used by `run_patch_trainer` when none is named
pub const DEFAULT_PATCH_TRAINER_SERVICE: &str = "patch_trainer_v1";

/// String sent through the echo procedure during bootstrap
pub const CONNECTION_CHECK: &str = "check";
