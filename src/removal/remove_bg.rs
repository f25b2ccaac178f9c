use super::types::{BackgroundRemover, RemovalError, Upload};
use super::IMAGE_FIELD;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tracing::instrument;

pub const DEFAULT_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Hosted remove.bg backend
///
/// Forwards the upload as-is in an `image_file` multipart field, authenticated
/// with the `X-Api-Key` header. No retries and no timeout beyond reqwest's defaults.
pub struct RemoveBgClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RemoveBgClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        tracing::info!("Using remove.bg endpoint {}", endpoint);

        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Build the multipart part, preserving the original file name and type
pub(crate) fn image_part(upload: &Upload) -> Result<Part, RemovalError> {
    let file_name = upload.file_name.clone().unwrap_or_else(|| "image".to_string());
    let part = Part::bytes(upload.bytes.to_vec()).file_name(file_name);

    match &upload.content_type {
        Some(content_type) => part
            .mime_str(content_type)
            .map_err(|_| RemovalError::InvalidContentType(content_type.clone())),
        None => Ok(part),
    }
}

/// Pull a readable message out of an upstream JSON error body
///
/// Accepts both `{"message": ...}` and remove.bg's `{"errors": [{"title": ...}]}`.
pub(crate) fn upstream_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value["message"]
        .as_str()
        .or_else(|| value["errors"][0]["title"].as_str())
        .map(str::to_string)
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    #[instrument(skip(self, upload), fields(bytes = upload.len()))]
    async fn remove(&self, upload: Upload) -> Result<Bytes, RemovalError> {
        let form = Form::new().part(IMAGE_FIELD, image_part(&upload)?);

        tracing::debug!("Calling remove.bg");
        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = upstream_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
            return Err(RemovalError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let image = response.bytes().await?;
        tracing::debug!("remove.bg returned {} bytes", image.len());
        Ok(image)
    }

    fn name(&self) -> &str {
        "remove.bg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_plain() {
        let body = br#"{"message":"quota exceeded"}"#;
        assert_eq!(upstream_message(body).as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn test_upstream_message_removebg_errors() {
        let body = br#"{"errors":[{"title":"Insufficient credits","code":"insufficient_credits"}]}"#;
        assert_eq!(upstream_message(body).as_deref(), Some("Insufficient credits"));
    }

    #[test]
    fn test_upstream_message_not_json() {
        assert_eq!(upstream_message(b"<html>502</html>"), None);
        assert_eq!(upstream_message(br#"{"detail":"x"}"#), None);
    }

    #[test]
    fn test_image_part_rejects_bad_mime() {
        let upload = Upload::new(vec![1, 2, 3]).with_content_type("not a mime");
        assert!(matches!(
            image_part(&upload),
            Err(RemovalError::InvalidContentType(_))
        ));
    }

    #[test]
    fn test_image_part_accepts_image_type() {
        let upload = Upload::new(vec![1, 2, 3])
            .with_file_name("me.jpg")
            .with_content_type("image/jpeg");
        assert!(image_part(&upload).is_ok());
    }
}
