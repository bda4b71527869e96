//! Mock collaborators for driving the delivery pipeline without Telegram,
//! ffmpeg, yt-dlp or a file host.

#![allow(dead_code)] // Each test binary uses a different subset

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use url::Url;

use tubedrop::download::fetch::MediaFetcher;
use tubedrop::download::transcode::Compressor;
use tubedrop::download::upload::HostUploader;
use tubedrop::download::{ChatTransport, DeliveryError};

/// One call made against the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Media { path: PathBuf, caption: String },
    Document { path: PathBuf, caption: String },
    Text(String),
}

/// Records every send; media and document sends can be set to fail.
#[derive(Default)]
pub struct MockTransport {
    pub reject_media: bool,
    pub reject_document: bool,
    sent: Mutex<Vec<Sent>>,
}

impl MockTransport {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn rejecting_media() -> Self {
        Self {
            reject_media: true,
            ..Self::default()
        }
    }

    pub fn rejecting_everything() -> Self {
        Self {
            reject_media: true,
            reject_document: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    /// Media and document sends, in order
    pub fn file_sends(&self) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| !matches!(s, Sent::Text(_)))
            .collect()
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_media(&self, path: &Path, caption: &str) -> Result<(), DeliveryError> {
        self.record(Sent::Media {
            path: path.to_path_buf(),
            caption: caption.to_string(),
        });
        if self.reject_media {
            return Err(DeliveryError::TransportRejected("Request Entity Too Large".to_string()));
        }
        Ok(())
    }

    async fn send_document(&self, path: &Path, caption: &str) -> Result<(), DeliveryError> {
        self.record(Sent::Document {
            path: path.to_path_buf(),
            caption: caption.to_string(),
        });
        if self.reject_document {
            return Err(DeliveryError::TransportRejected("Request Entity Too Large".to_string()));
        }
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), DeliveryError> {
        self.record(Sent::Text(text.to_string()));
        Ok(())
    }
}

/// What the mock compressor does when called
#[derive(Debug, Clone)]
pub enum CompressBehavior {
    /// Write an output file of this many bytes
    Produce(u64),
    Fail(DeliveryError),
    /// Write an output file of this many bytes, then panic
    PanicAfterWriting(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub target_bytes: u64,
}

pub struct MockCompressor {
    behavior: CompressBehavior,
    calls: Mutex<Vec<CompressCall>>,
}

impl MockCompressor {
    pub fn new(behavior: CompressBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CompressCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Compressor for MockCompressor {
    async fn compress(&self, input: &Path, output: &Path, target_bytes: u64) -> Result<(), DeliveryError> {
        self.calls.lock().unwrap().push(CompressCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            target_bytes,
        });
        match &self.behavior {
            CompressBehavior::Produce(bytes) => {
                write_file(output, *bytes);
                Ok(())
            }
            CompressBehavior::Fail(e) => Err(e.clone()),
            CompressBehavior::PanicAfterWriting(bytes) => {
                write_file(output, *bytes);
                panic!("encoder crashed while writing {}", output.display());
            }
        }
    }
}

/// Returns a fixed response and remembers which files it was given.
pub struct MockUploader {
    response: Result<String, DeliveryError>,
    calls: Mutex<Vec<PathBuf>>,
    /// Whether the uploaded file existed at the time of each call
    saw_file: Mutex<Vec<bool>>,
}

impl MockUploader {
    pub fn returning(body: &str) -> Self {
        Self::with_response(Ok(body.to_string()))
    }

    pub fn failing(e: DeliveryError) -> Self {
        Self::with_response(Err(e))
    }

    fn with_response(response: Result<String, DeliveryError>) -> Self {
        Self {
            response,
            calls: Mutex::new(Vec::new()),
            saw_file: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }

    pub fn saw_file(&self) -> Vec<bool> {
        self.saw_file.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostUploader for MockUploader {
    async fn upload(&self, path: &Path) -> Result<String, DeliveryError> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        self.saw_file.lock().unwrap().push(path.exists());
        self.response.clone()
    }
}

/// Fetcher that "downloads" by creating a file of a given size.
pub struct MockFetcher {
    result: Result<(PathBuf, u64), DeliveryError>,
    calls: Mutex<Vec<Url>>,
}

impl MockFetcher {
    pub fn producing(path: impl Into<PathBuf>, bytes: u64) -> Self {
        Self {
            result: Ok((path.into(), bytes)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(e: DeliveryError) -> Self {
        Self {
            result: Err(e),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<PathBuf, DeliveryError> {
        self.calls.lock().unwrap().push(url.clone());
        match &self.result {
            Ok((path, bytes)) => {
                write_file(path, *bytes);
                Ok(path.clone())
            }
            Err(e) => Err(e.clone()),
        }
    }
}

/// Creates (or truncates) `path` with `bytes` zero bytes.
pub fn write_file(path: &Path, bytes: u64) {
    let file = std::fs::File::create(path).unwrap();
    file.set_len(bytes).unwrap();
}
