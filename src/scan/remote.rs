//! Network-bound decoder tier.
//!
//! The image is POSTed as `multipart/form-data` (field `file`). A successful
//! reply is JSON with the text at `[0].symbol[0].data`; a missing or null value
//! there, or a non-2xx status, is a miss.

use super::camera::CancelToken;
use super::state::DecoderTier;
use super::tier::TierDecoder;
use crate::config::RemoteConfig;
use crate::error::{DecodeMiss, RemoteServiceError};
use crate::models::ImageFile;
use reqwest::blocking::{Client, multipart};
use serde::Deserialize;

/// Raw HTTP reply from the decode service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReply {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

/// Sends an image to the decode service
pub trait RemoteTransport {
    /// One POST of `image`; no retries
    fn post_image(&self, image: &ImageFile) -> Result<RemoteReply, RemoteServiceError>;
}

/// Blocking `reqwest` transport with a whole-request timeout
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a client from `config`
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteServiceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| RemoteServiceError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl RemoteTransport for HttpTransport {
    fn post_image(&self, image: &ImageFile) -> Result<RemoteReply, RemoteServiceError> {
        let mime = image
            .mime_type()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let part = multipart::Part::bytes(image.bytes.clone())
            .file_name(image.name.clone())
            .mime_str(&mime)
            .map_err(|err| RemoteServiceError::Transport(err.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .map_err(|err| RemoteServiceError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| RemoteServiceError::Transport(err.to_string()))?;
        Ok(RemoteReply { status, body })
    }
}

#[derive(Debug, Deserialize)]
struct ReadResult {
    #[serde(default)]
    symbol: Vec<Symbol>,
}

#[derive(Debug, Deserialize)]
struct Symbol {
    data: Option<String>,
    error: Option<String>,
}

/// Extract the decoded text from a service reply
pub fn parse_reply(reply: &RemoteReply) -> Result<String, RemoteServiceError> {
    if !(200..300).contains(&reply.status) {
        return Err(RemoteServiceError::Status(reply.status));
    }
    let results: Vec<ReadResult> = serde_json::from_str(&reply.body)?;
    let symbol = results
        .first()
        .and_then(|r| r.symbol.first())
        .ok_or(RemoteServiceError::MissingData)?;
    if let Some(err) = &symbol.error {
        tracing::debug!(error = %err, "remote decoder reported an error");
    }
    match symbol.data.as_deref() {
        Some(data) if !data.is_empty() => Ok(data.to_string()),
        _ => Err(RemoteServiceError::MissingData),
    }
}

/// Third tier: one call to the remote decoder, no retries.
///
/// A cancelled token stops the call before it is sent. A request already in
/// flight is bounded only by the transport timeout.
#[derive(Debug, Clone)]
pub struct RemoteTier<T> {
    transport: T,
    cancel: Option<CancelToken>,
}

impl<T: RemoteTransport> RemoteTier<T> {
    /// Wrap a transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cancel: None,
        }
    }

    /// Skip the request once `token` is cancelled
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl RemoteTier<HttpTransport> {
    /// HTTP-backed tier from `config`
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteServiceError> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: RemoteTransport> TierDecoder for RemoteTier<T> {
    fn tier(&self) -> DecoderTier {
        DecoderTier::Remote
    }

    #[tracing::instrument(skip_all, fields(file = %image.name, bytes = image.bytes.len()))]
    fn try_decode(&self, image: &ImageFile) -> Result<String, DecodeMiss> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            tracing::debug!("remote decode skipped after cancellation");
            return Err(RemoteServiceError::Cancelled.into());
        }
        let reply = self.transport.post_image(image)?;
        tracing::debug!(status = reply.status, "remote decoder replied");
        Ok(parse_reply(&reply)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(status: u16, body: &str) -> RemoteReply {
        RemoteReply {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_parse_success() {
        let r = reply(200, r#"[{"type":"qrcode","symbol":[{"seq":0,"data":"https://example.com","error":null}]}]"#);
        assert_eq!(parse_reply(&r).unwrap(), "https://example.com");
    }

    #[test]
    fn test_parse_null_data() {
        let r = reply(200, r#"[{"symbol":[{"data":null,"error":"could not find QR code"}]}]"#);
        assert!(matches!(parse_reply(&r), Err(RemoteServiceError::MissingData)));
        let empty = reply(200, r#"[{"symbol":[{"data":""}]}]"#);
        assert!(matches!(parse_reply(&empty), Err(RemoteServiceError::MissingData)));
        let none = reply(200, "[]");
        assert!(matches!(parse_reply(&none), Err(RemoteServiceError::MissingData)));
    }

    #[test]
    fn test_parse_http_error() {
        let r = reply(503, r#"[{"symbol":[{"data":"x"}]}]"#);
        assert!(matches!(parse_reply(&r), Err(RemoteServiceError::Status(503))));
    }

    struct Counting(std::cell::Cell<usize>);

    impl RemoteTransport for Counting {
        fn post_image(&self, _image: &ImageFile) -> Result<RemoteReply, RemoteServiceError> {
            self.0.set(self.0.get() + 1);
            Ok(reply(200, r#"[{"symbol":[{"data":"hi"}]}]"#))
        }
    }

    #[test]
    fn test_cancelled_tier_sends_nothing() {
        let file = ImageFile::new("x.png", Some("image/png".into()), vec![1, 2, 3]);
        let token = CancelToken::new();
        let tier = RemoteTier::new(Counting(Default::default())).with_cancel_token(token.clone());

        assert_eq!(tier.try_decode(&file).unwrap(), "hi");
        token.cancel();
        assert!(matches!(
            tier.try_decode(&file),
            Err(DecodeMiss::Remote(RemoteServiceError::Cancelled))
        ));
        assert_eq!(tier.transport.0.get(), 1);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_reply(&reply(200, "<html>")),
            Err(RemoteServiceError::Malformed(_))
        ));
    }
}
