use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchpromptError {
    #[error("remote call failed: {0}")]
    RemoteCallFailed(String),

    #[error("config load error: {0}")]
    ConfigLoad(String),

    #[error("invalid config: {0}")]
    ConfigValidation(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("input error: {0}")]
    Input(String),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}
