//! Sending files through the chat transport.
//!
//! A file is first offered as rich media (a playable video) and, if the
//! transport refuses that, once more as a generic document attachment.

use async_trait::async_trait;
use std::path::Path;

use crate::download::error::DeliveryError;

/// What the delivery pipeline needs from a chat.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends the file as a playable video.
    async fn send_media(&self, path: &Path, caption: &str) -> Result<(), DeliveryError>;

    /// Sends the file as a generic attachment.
    async fn send_document(&self, path: &Path, caption: &str) -> Result<(), DeliveryError>;

    /// Sends a plain text message.
    async fn send_text(&self, text: &str) -> Result<(), DeliveryError>;
}

/// Ways to put a file into the chat, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMethod {
    Media,
    Document,
}

impl SendMethod {
    pub const FALLBACK_ORDER: [SendMethod; 2] = [SendMethod::Media, SendMethod::Document];

    async fn send(self, transport: &dyn ChatTransport, path: &Path, caption: &str) -> Result<(), DeliveryError> {
        match self {
            SendMethod::Media => transport.send_media(path, caption).await,
            SendMethod::Document => transport.send_document(path, caption).await,
        }
    }
}

/// Tries each method of `SendMethod::FALLBACK_ORDER`, stopping at the first success.
///
/// Returns the method that worked, or the last rejection.
pub async fn send_with_fallback(
    transport: &dyn ChatTransport,
    path: &Path,
    caption: &str,
) -> Result<SendMethod, DeliveryError> {
    let mut last_error = DeliveryError::TransportRejected("no send method attempted".to_string());

    for method in SendMethod::FALLBACK_ORDER {
        match method.send(transport, path, caption).await {
            Ok(()) => {
                log::info!("Sent {} as {:?}", path.display(), method);
                return Ok(method);
            }
            Err(e) => {
                log::warn!("Sending {} as {:?} failed: {}", path.display(), method, e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedTransport {
        reject_media: bool,
        reject_document: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn send_media(&self, _path: &Path, _caption: &str) -> Result<(), DeliveryError> {
            self.calls.lock().unwrap().push("media");
            if self.reject_media {
                return Err(DeliveryError::TransportRejected("wrong media type".into()));
            }
            Ok(())
        }

        async fn send_document(&self, _path: &Path, _caption: &str) -> Result<(), DeliveryError> {
            self.calls.lock().unwrap().push("document");
            if self.reject_document {
                return Err(DeliveryError::TransportRejected("request entity too large".into()));
            }
            Ok(())
        }

        async fn send_text(&self, _text: &str) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_media_first() {
        let transport = ScriptedTransport::default();
        let method = send_with_fallback(&transport, Path::new("a.mp4"), "Done!").await.unwrap();
        assert_eq!(method, SendMethod::Media);
        assert_eq!(*transport.calls.lock().unwrap(), vec!["media"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_document() {
        let transport = ScriptedTransport {
            reject_media: true,
            ..Default::default()
        };
        let method = send_with_fallback(&transport, Path::new("a.mp4"), "Done!").await.unwrap();
        assert_eq!(method, SendMethod::Document);
        assert_eq!(*transport.calls.lock().unwrap(), vec!["media", "document"]);
    }

    #[tokio::test]
    async fn test_both_rejected_returns_last_error() {
        let transport = ScriptedTransport {
            reject_media: true,
            reject_document: true,
            ..Default::default()
        };
        let err = send_with_fallback(&transport, Path::new("a.mp4"), "Done!").await.unwrap_err();
        assert_eq!(
            err,
            DeliveryError::TransportRejected("request entity too large".into())
        );
        assert_eq!(transport.calls.lock().unwrap().len(), 2);
    }
}
