use crate::relay::REMOVAL_FAILED;
use crate::removal::{RemovalError, Upload, IMAGE_FIELD};
use bytes::Bytes;
use reqwest::multipart::Form;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{}", REMOVAL_FAILED)]
    Failed,
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Upload(#[from] RemovalError),
}

impl ClientError {
    /// Message surfaced in the view.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Failed => REMOVAL_FAILED.to_string(),
            ClientError::Request(_) | ClientError::Upload(_) => self.to_string(),
        }
    }
}

/// Talks to a running relay the same way the browser view does.
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/remove-bg", self.base_url)
    }

    pub async fn remove_background(&self, upload: &Upload) -> Result<Bytes, ClientError> {
        let part = crate::removal::image_part(upload)?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self
            .http
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("Relay answered {}", response.status());
            return Err(ClientError::Failed);
        }

        Ok(response.bytes().await?)
    }
}
