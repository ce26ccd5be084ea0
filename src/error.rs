use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("transport failure for {location}: {message}")]
    Transport { location: String, message: String },

    #[error("malformed response from {location}: {message}")]
    MalformedResponse { location: String, message: String },

    #[error("{what} is not configured for factory '{factory}'; set it in the config file")]
    ConfigurationMissing { factory: String, what: String },

    #[error("unknown factory '{factory}'. Available: {available}")]
    UnknownFactory { factory: String, available: String },

    #[error("unknown sheet type '{sheet}' for factory '{factory}'. Available: {available}")]
    UnknownSheet {
        sheet: String,
        factory: String,
        available: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
