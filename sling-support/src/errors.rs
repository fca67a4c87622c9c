use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlingError {
    #[error("Server configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuildError(#[from] reqwest::Error),

    #[error("Server not found: {0}")]
    ServerNotFound(String),

    #[error("No default server configured")]
    NoDefaultServer,

    #[error("No active servers available")]
    NoActiveServers,
}
