/// Core error type for the crosspost pipeline.
///
/// Adapter crates map their specific errors into this type so the admin
/// surface can report every failure with the stage it came from.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required channel or credential is not configured.
    #[error("{0}")]
    Config(String),

    /// The source post cannot be crossposted as-is.
    #[error("{0}")]
    Validation(String),

    /// The translation service produced no usable output.
    #[error("{0}")]
    Translation(String),

    /// Entity-bearing text exceeds the platform limit.
    #[error("{0}")]
    Length(String),

    #[error("external error: {0}")]
    External(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Short stage label shown to the operator next to the message.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration",
            Error::Validation(_) => "validation",
            Error::Translation(_) => "translation",
            Error::Length(_) => "length",
            Error::External(_) | Error::Io(_) | Error::Json(_) => "publish",
        }
    }

    /// Admin-facing reply for a failed crosspost.
    pub fn user_message(&self) -> String {
        format!("⚠️ [{}] {self}", self.stage())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
