use thiserror::Error;

use crate::core::types::EntityId;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Unresolved {dictionary} reference: {name:?}")]
    UnresolvedReference { dictionary: &'static str, name: String },

    #[error("Unsupported operation {operation} on {variant}")]
    Unsupported {
        operation: &'static str,
        variant: &'static str,
    },

    #[error("Corrupt save document: {0}")]
    CorruptSave(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
