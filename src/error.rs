use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    InvalidData(String),
    InvalidConfig(String),
    InvalidShape(String),
    /// A persisted model is missing, unreadable, corrupt, or shape-incompatible.
    ModelLoad(String),
    ModelSave(String),
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::InvalidShape(msg) => write!(f, "invalid shape: {msg}"),
            Error::ModelLoad(msg) => write!(f, "failed to load model: {msg}"),
            Error::ModelSave(msg) => write!(f, "failed to save model: {msg}"),
            Error::Config(msg) => write!(f, "failed to read config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
