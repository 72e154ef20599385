use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphLoomError {
    #[error("connection error: {0}")]
    ConnectionError(String),
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("query error: {0}")]
    QueryError(String),
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("resolution error: {0}")]
    ResolutionError(String),
    #[error("exhausted: {0}")]
    Exhausted(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl GraphLoomError {
    pub fn connection<T: Into<String>>(msg: T) -> Self {
        GraphLoomError::ConnectionError(msg.into())
    }

    pub fn schema<T: Into<String>>(msg: T) -> Self {
        GraphLoomError::SchemaError(msg.into())
    }

    pub fn query<T: Into<String>>(msg: T) -> Self {
        GraphLoomError::QueryError(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        GraphLoomError::ConfigError(msg.into())
    }

    pub fn resolution<T: Into<String>>(msg: T) -> Self {
        GraphLoomError::ResolutionError(msg.into())
    }

    pub fn exhausted<T: Into<String>>(msg: T) -> Self {
        GraphLoomError::Exhausted(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        GraphLoomError::InvalidInput(msg.into())
    }
}
