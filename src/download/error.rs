use strum::IntoStaticStr;
use thiserror::Error;

/// Failure kinds of the fetch-and-deliver pipeline.
///
/// Every external-process and network failure is converted into one of these
/// at the layer where it happens; raw io/reqwest errors never cross a
/// component boundary. The message carries the concrete detail for logs and
/// for the final user-facing outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryError {
    /// The media fetch collaborator could not produce a local file
    #[error("download failed: {0}")]
    FetchFailed(String),
    /// Duration of the file could not be determined. Raised by
    /// `probe::require_duration`; inside a delivery the transcoder reports
    /// the same condition as `EncodeInfeasible`.
    #[error("could not read media duration: {0}")]
    ProbeUnavailable(String),
    /// The byte budget cannot hold a watchable encode
    #[error("cannot fit the video into the size limit: {0}")]
    EncodeInfeasible(String),
    /// The encoder failed or overshot the budget
    #[error("compression failed: {0}")]
    EncodeFailed(String),
    /// The chat transport refused the file
    #[error("could not send the file: {0}")]
    TransportRejected(String),
    /// The external host did not accept the upload
    #[error("upload to file host failed: {0}")]
    UploadFailed(String),
    /// The external host answered with an unusable link
    #[error("file host returned an invalid link: {0}")]
    InvalidHostedUrl(String),
    /// Expected file is not on disk
    #[error("file not found: {0}")]
    FileMissing(String),
}

impl DeliveryError {
    /// Stable snake_case label for logs.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Returns the inner message
    pub fn message(&self) -> &str {
        match self {
            DeliveryError::FetchFailed(msg)
            | DeliveryError::ProbeUnavailable(msg)
            | DeliveryError::EncodeInfeasible(msg)
            | DeliveryError::EncodeFailed(msg)
            | DeliveryError::TransportRejected(msg)
            | DeliveryError::UploadFailed(msg)
            | DeliveryError::InvalidHostedUrl(msg)
            | DeliveryError::FileMissing(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_display() {
        let err = DeliveryError::UploadFailed("status 503".into());
        assert_eq!(err.to_string(), "upload to file host failed: status 503");
    }

    #[test]
    fn test_delivery_error_kind() {
        assert_eq!(DeliveryError::FetchFailed("".into()).kind(), "fetch_failed");
        assert_eq!(DeliveryError::EncodeInfeasible("".into()).kind(), "encode_infeasible");
        assert_eq!(DeliveryError::TransportRejected("".into()).kind(), "transport_rejected");
        assert_eq!(DeliveryError::InvalidHostedUrl("".into()).kind(), "invalid_hosted_url");
        assert_eq!(DeliveryError::FileMissing("".into()).kind(), "file_missing");
    }

    #[test]
    fn test_message() {
        assert_eq!(DeliveryError::EncodeFailed("exit 1".into()).message(), "exit 1");
    }
}
