use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Trace delivery failed: {0}")]
    Delivery(String),

    #[error("Trace store returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Helper for creating configuration errors
    ///
    /// # Example
    /// ```
    /// use threadline_core::Error;
    /// let err = Error::config_error("THREADLINE_API_KEY is not set");
    /// ```
    pub fn config_error(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Helper for creating delivery errors
    ///
    /// # Example
    /// ```
    /// use threadline_core::Error;
    /// let err = Error::delivery("connection reset");
    /// ```
    pub fn delivery(msg: impl Into<String>) -> Self {
        Error::Delivery(msg.into())
    }

    /// True for failures talking to the trace store, as opposed to local
    /// configuration or encoding problems.
    pub fn is_delivery(&self) -> bool {
        matches!(self, Error::Delivery(_) | Error::Http { .. })
    }
}
