use thiserror::Error;

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Preset not found: {0}")]
    RecordNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Collection unavailable: {0}")]
    CollectionUnavailable(String),

    /// Programmer errors: malformed registrations, missing required options,
    /// impossible requests. Never caught inside the crate.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, PresetError>;
