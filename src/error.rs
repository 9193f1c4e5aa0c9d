use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unrecognized channel format: {0}")]
    InvalidChannel(String),

    #[error("yt-dlp not found")]
    ExtractorNotFound,

    #[error("Channel not found or not accessible: {0}")]
    ChannelNotFound(String),

    #[error("Network problem while talking to YouTube: {0}")]
    Network(String),

    #[error("yt-dlp timed out after {0}s")]
    Timeout(u64),

    #[error("yt-dlp failed: {0}")]
    Extractor(String),

    #[error("Channel has no videos: {0}")]
    NoVideos(String),

    #[error("Could not parse yt-dlp output: {0}")]
    Parse(String),

    #[error("Interrupted before the export was written")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Remediation text shown under the error message, if any
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::ExtractorNotFound => Some(
                "Install yt-dlp:\n  pip3 install yt-dlp\n  brew install yt-dlp    # macOS\nor point YT_DLP_PATH at the binary.",
            ),
            Error::ChannelNotFound(_) => Some(
                "Check that the channel URL is correct and the channel is public.\nExpected format: https://www.youtube.com/@channelname",
            ),
            Error::Network(_) => Some("Check your network connection and try again later."),
            Error::Timeout(_) => Some("The request took too long. Check your connection speed and try again later."),
            Error::InvalidChannel(_) => Some(
                "Supported channel formats:\n  @channelname\n  youtube.com/@channelname\n  https://www.youtube.com/@channelname",
            ),
            _ => None,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Interrupted => 130,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
