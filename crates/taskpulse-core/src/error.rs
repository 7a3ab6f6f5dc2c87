use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("invalid engine config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("aggregate `{field}` is not a finite number")]
    NonFinite { field: &'static str },

    #[error("unknown card type: {0}")]
    UnknownCard(String),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
