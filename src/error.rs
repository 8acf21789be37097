
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TracebookError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Unknown key: {0}")]
    KeyNotFound(String),
    #[error("Unknown subkey '{subkey}' under key '{key}'")]
    SubkeyNotFound { key: String, subkey: String },
    #[error("Store already holds keys, pass overwrite to replace it")]
    OverwriteProtected,
    #[error("Parse error in {origin} at line {line}: {message}")]
    Parse { origin: String, line: usize, message: String },
    #[error("Column '{subkey}' of key '{key}' holds {actual} values, expected {expected}")]
    ColumnLengthMismatch { key: String, subkey: String, expected: usize, actual: usize },
    #[error("Key '{key}' cannot be written: {detail}")]
    Unrepresentable { key: String, detail: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TracebookError>;
