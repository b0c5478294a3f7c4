use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no data directory available")]
    NoDataDir,
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not encode snapshot: {0}")]
    Encode(#[from] SnapshotError),
}

/// Reasons a stored snapshot is rejected as a whole.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot holds no messages")]
    Empty,
    #[error("message {0} has blank text")]
    BlankText(String),
    #[error("message id {0} appears more than once")]
    DuplicateId(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppendError {
    #[error("message text is empty or whitespace")]
    BlankText,
    #[error("message id {0} already in timeline")]
    DuplicateId(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not render config: {0}")]
    Render(#[from] toml::ser::Error),
}
