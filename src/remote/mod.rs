//! The memory server, as seen by the sync coordinator.
//!
//! [`RemoteClient`] is the seam between the coordinator and the transport.
//! [`http::HttpRemoteClient`] speaks the server's HTTP API; tests substitute
//! scripted implementations.

pub mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RemoteError;
use crate::memory::codec::WireRecord;

/// Content type used when a photo payload does not specify one.
pub const DEFAULT_PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// Binary photo uploaded alongside a new memory.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoPayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl PhotoPayload {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: DEFAULT_PHOTO_CONTENT_TYPE.to_string(),
        }
    }

    /// Guess the content type from a file extension, defaulting to JPEG.
    pub fn from_file_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Self {
        let content_type = match extension.map(str::to_ascii_lowercase).as_deref() {
            Some("png") => "image/png",
            Some("heic") => "image/heic",
            Some("webp") => "image/webp",
            _ => DEFAULT_PHOTO_CONTENT_TYPE,
        };
        Self {
            bytes,
            content_type: content_type.to_string(),
        }
    }
}

/// Remote memory service.
///
/// Implementations return raw JSON; decoding happens in the coordinator so
/// every client shares one decode policy. Timeouts are the implementation's
/// concern and surface as [`RemoteError::NetworkUnavailable`].
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetch every memory the server holds.
    async fn fetch_all(&self) -> Result<Vec<Value>, RemoteError>;

    /// Create a memory with its photo. Returns the server's canonical record,
    /// which may carry a new id and an `image_url`.
    async fn add(&self, record: &WireRecord, photo: &PhotoPayload) -> Result<Value, RemoteError>;

    /// Delete the memory with the given id.
    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_content_type_from_extension() {
        assert_eq!(PhotoPayload::from_file_bytes(vec![], Some("PNG")).content_type, "image/png");
        assert_eq!(PhotoPayload::from_file_bytes(vec![], Some("jpg")).content_type, "image/jpeg");
        assert_eq!(PhotoPayload::from_file_bytes(vec![], None).content_type, "image/jpeg");
    }
}
