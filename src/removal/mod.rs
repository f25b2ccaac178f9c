mod remove_bg;
pub mod types;

pub(crate) use remove_bg::image_part;
pub use remove_bg::{RemoveBgClient, DEFAULT_ENDPOINT};
pub use types::{BackgroundRemover, RemovalError, Upload};

use std::sync::Arc;

/// Multipart field carrying the image, on both the relay and the upstream API
pub const IMAGE_FIELD: &str = "image_file";

/// Create the default remover (remove.bg)
pub fn create_default_remover(api_key: &str, endpoint: &str) -> Arc<dyn BackgroundRemover> {
    Arc::new(RemoveBgClient::with_endpoint(api_key, endpoint))
}
