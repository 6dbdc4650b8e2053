/// Errors preventing the daemon from starting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid environment configuration.
    #[error(transparent)]
    Config(#[from] miniapp::config::Error),

    /// The app manifest can't be served.
    #[error("invalid manifest: {0}")]
    Manifest(#[from] miniapp::manifest::Error),
}
