use forum_sync_engine::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Could not migrate the {0} database. {1}")]
    MigrationError(&'static str, String),
    #[error("The post template could not be loaded. {0}")]
    TemplateError(#[from] RenderError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}
