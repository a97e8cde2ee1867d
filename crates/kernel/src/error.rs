use arena_assets::AssetLoadError;
use arena_common::EntityId;
use arena_physics::PhysicsError;

/// Errors surfaced by world construction and frame stepping.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// A mesh could not be resolved or parsed; no entity was created.
    #[error(transparent)]
    AssetLoad(#[from] AssetLoadError),
    /// The physics collaborator failed. During a frame step this is fatal for
    /// that frame: no transforms were updated.
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),
    #[error("scene config: {0}")]
    Config(String),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KernelError {
    /// True for a physics step fault, the one error that halts simulation.
    pub fn is_step_fault(&self) -> bool {
        matches!(self, Self::Physics(PhysicsError::StepFault { .. }))
    }
}
