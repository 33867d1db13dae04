// ABOUTME: Image capability of a runtime: existence check and tarred-context build.
// ABOUTME: Build failures reported mid-stream surface as BuildFailed.

use super::sealed::Sealed;
use super::shared_types::{BuildConfig, BuildContext};
use crate::types::ImageRef;
use async_trait::async_trait;

#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// `Ok(false)` when the runtime has no such image.
    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError>;

    async fn build_image(
        &self,
        config: &BuildConfig,
        context: BuildContext,
    ) -> Result<(), ImageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
