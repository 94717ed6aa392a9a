use query_core::CoreError;
use sql_query_connector::SqlError;
use std::io::Write as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    CoreError(#[from] CoreError),

    #[error("{0}")]
    ConnectorError(#[from] SqlError),

    #[error("{0}")]
    ConfigurationError(String),

    #[error("Error decoding JSON: {0}")]
    JsonDecodeError(#[from] serde_json::Error),

    #[error("{0}")]
    IOError(#[from] std::io::Error),

    #[error("Could not install the logger: {0}")]
    LoggerError(String),
}

impl EngineError {
    /// Writes the error as one JSON line to stderr, shaped like the errors of
    /// a response.
    pub fn render_as_json(&self) -> std::io::Result<()> {
        let error = serde_json::json!({ "errors": [{ "message": self.to_string() }] });

        let stderr = std::io::stderr();
        let mut writer = std::io::LineWriter::new(stderr.lock());
        serde_json::to_writer(&mut writer, &error)?;
        writeln!(&mut writer)?;
        writer.flush()
    }
}
