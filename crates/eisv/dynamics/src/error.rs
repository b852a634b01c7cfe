/// Errors from the dynamics layer.
///
/// The per-step math never fails; only configuration lookups do.
#[derive(Debug, thiserror::Error)]
pub enum DynamicsError {
    #[error("unknown dynamics profile: {0}")]
    UnknownProfile(String),
}
