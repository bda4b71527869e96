//! URL validation utilities
//!
//! Provides validation for URLs crossing a trust boundary:
//! - Links typed in by users before they reach the downloader
//! - Links returned by the external file host before they reach users

use thiserror::Error;
use url::Url;

/// Validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Not parseable as an absolute URL
    #[error("Malformed URL '{url}': {reason}")]
    Malformed { url: String, reason: String },

    /// Scheme other than http/https
    #[error("Unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    /// URL without a host component
    #[error("URL has no host: {0}")]
    MissingHost(String),

    /// Explicit port outside [1, 65535]
    #[error("Invalid port {0}")]
    InvalidPort(u32),
}

fn parse_web_url(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| ValidationError::Malformed {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::MissingHost(trimmed.to_string()));
    }

    Ok(url)
}

/// Validates a link returned by the external file host.
///
/// A hosting service cannot be trusted to return a usable URL, so the text is
/// only accepted when it is an absolute http/https URL with a host and, if a
/// port is given, a port in [1, 65535]. Ports above 65535 already fail to parse.
///
/// # Examples
/// ```
/// use tubedrop::core::validation::validate_hosted_url;
///
/// assert!(validate_hosted_url("https://transfer.sh/abc/video.mp4").is_ok());
/// assert!(validate_hosted_url("http://files.example.com:8080/v.mp4").is_ok());
///
/// assert!(validate_hosted_url("ftp://transfer.sh/abc/video.mp4").is_err());
/// assert!(validate_hosted_url("https://transfer.sh:70000/video.mp4").is_err());
/// assert!(validate_hosted_url("Service unavailable").is_err());
/// ```
pub fn validate_hosted_url(raw: &str) -> Result<Url, ValidationError> {
    let url = parse_web_url(raw)?;

    if let Some(port) = url.port() {
        if port == 0 {
            return Err(ValidationError::InvalidPort(u32::from(port)));
        }
    }

    Ok(url)
}

/// Validates a link sent by a user before handing it to the downloader.
///
/// Links pasted without a scheme (`youtu.be/...`, `www.youtube.com/...`) are
/// read as https.
pub fn validate_source_url(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Err(url::ParseError::RelativeUrlWithoutBase) => parse_web_url(&format!("https://{}", trimmed)),
        _ => parse_web_url(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hosted_url_accepts_http_and_https() {
        assert!(validate_hosted_url("https://transfer.sh/xyz/file.mp4").is_ok());
        assert!(validate_hosted_url("http://transfer.sh/xyz/file.mp4").is_ok());
    }

    #[test]
    fn test_hosted_url_trims_whitespace() {
        let url = validate_hosted_url("  https://transfer.sh/xyz/file.mp4\n").unwrap();
        assert_eq!(url.as_str(), "https://transfer.sh/xyz/file.mp4");
    }

    #[test]
    fn test_hosted_url_rejects_ftp() {
        assert_eq!(
            validate_hosted_url("ftp://transfer.sh/file.mp4"),
            Err(ValidationError::UnsupportedScheme("ftp".to_string()))
        );
    }

    #[test]
    fn test_hosted_url_rejects_port_zero() {
        assert_eq!(
            validate_hosted_url("https://transfer.sh:0/file.mp4"),
            Err(ValidationError::InvalidPort(0))
        );
    }

    #[test]
    fn test_hosted_url_rejects_out_of_range_port() {
        assert!(matches!(
            validate_hosted_url("https://transfer.sh:65536/file.mp4"),
            Err(ValidationError::Malformed { .. })
        ));
    }

    #[test]
    fn test_hosted_url_accepts_max_port() {
        let url = validate_hosted_url("https://transfer.sh:65535/file.mp4").unwrap();
        assert_eq!(url.port(), Some(65535));
    }

    #[test]
    fn test_hosted_url_rejects_plain_text() {
        assert!(matches!(
            validate_hosted_url("Upload quota exceeded"),
            Err(ValidationError::Malformed { .. })
        ));
        assert!(validate_hosted_url("").is_err());
    }

    #[test]
    fn test_source_url() {
        assert!(validate_source_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").is_ok());
        assert!(validate_source_url("https://youtu.be/dQw4w9WgXcQ").is_ok());
        assert!(validate_source_url("javascript:alert(1)").is_err());
        assert!(validate_source_url("just some words").is_err());
    }

    #[test]
    fn test_source_url_without_scheme() {
        let url = validate_source_url("youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(url.as_str(), "https://youtu.be/dQw4w9WgXcQ");

        let url = validate_source_url(" www.youtube.com/watch?v=dQw4w9WgXcQ ").unwrap();
        assert_eq!(url.host_str(), Some("www.youtube.com"));
        assert_eq!(url.scheme(), "https");

        assert!(validate_source_url("not a link").is_err());
        assert!(validate_source_url("").is_err());
    }
}
