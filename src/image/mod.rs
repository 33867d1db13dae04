// ABOUTME: Image pipeline: builds dll_datalab:latest from an ordered chain of recipe sources.
// ABOUTME: Falls back from the shared recipe to the cached one to the embedded base.

mod context;
mod recipe;

pub use context::BuildSource;
pub use recipe::{BASE_RECIPE, RECIPE_FILE, base_image, compare, label_value};

use crate::inspector::{Inspector, image_ref};
use crate::runtime::{BuildConfig, FullRuntime, ImageError};
use std::fmt;
use std::path::{Path, PathBuf};

/// One recipe source, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// The shared directory holding the most recent recipe.
    RemoteLatest,
    /// The recipe last built on this machine.
    LocalCached,
    /// The recipe compiled into the launcher.
    Base,
}

impl Tier {
    /// Fallback chain for the given share availability.
    pub fn chain(share_available: bool) -> Vec<Tier> {
        if share_available {
            vec![Tier::RemoteLatest, Tier::LocalCached, Tier::Base]
        } else {
            vec![Tier::LocalCached, Tier::Base]
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::RemoteLatest => write!(f, "remote-latest"),
            Tier::LocalCached => write!(f, "local-cached"),
            Tier::Base => write!(f, "base"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("cannot read recipe {path}: {source}")]
    Recipe {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot prepare build context: {0}")]
    Context(std::io::Error),

    #[error(transparent)]
    Runtime(#[from] ImageError),

    #[error("cannot write cached recipe {path}: {source}")]
    Sync {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PullError {
    #[error("no recipe source could be built: {}", describe_attempts(.attempts))]
    Exhausted { attempts: Vec<(Tier, BuildError)> },
}

fn describe_attempts(attempts: &[(Tier, BuildError)]) -> String {
    if attempts.is_empty() {
        return "no sources tried".to_string();
    }
    attempts
        .iter()
        .map(|(tier, e)| format!("{tier}: {e}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of a successful pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pulled {
    pub tier: Tier,
    /// Recipe text the image was built from.
    pub recipe: String,
}

/// Builds and tracks the DataLab image.
pub struct ImagePipeline<'a, R: ?Sized> {
    runtime: &'a R,
    latest_dir: &'a Path,
    local_dir: &'a Path,
}

impl<'a, R: FullRuntime + ?Sized> ImagePipeline<'a, R> {
    pub fn new(runtime: &'a R, latest_dir: &'a Path, local_dir: &'a Path) -> Self {
        Self {
            runtime,
            latest_dir,
            local_dir,
        }
    }

    pub async fn image_loaded(&self) -> Result<bool, ImageError> {
        Inspector::new(self.runtime).image_loaded().await
    }

    /// Build and tag `dll_datalab:latest`, always pulling a fresh base image.
    pub async fn build_image(&self, source: BuildSource) -> Result<(), BuildError> {
        // Tarring a directory is blocking file I/O.
        let context = tokio::task::spawn_blocking(move || source.into_context())
            .await
            .map_err(|e| BuildError::Context(std::io::Error::other(e)))?
            .map_err(BuildError::Context)?;
        let config = BuildConfig {
            tag: image_ref(),
            dockerfile: RECIPE_FILE.to_string(),
            pull: true,
            remove_intermediate: true,
        };
        tracing::debug!("sending {} byte build context", context.0.len());
        self.runtime.build_image(&config, context).await?;
        Ok(())
    }

    /// Build from one tier and return the recipe it used.
    pub async fn pull_image(&self, tier: Tier) -> Result<String, BuildError> {
        let (source, recipe) = match tier {
            Tier::RemoteLatest => self.directory_source(self.latest_dir).await?,
            Tier::LocalCached => self.directory_source(self.local_dir).await?,
            Tier::Base => (
                BuildSource::Recipe(BASE_RECIPE.to_string()),
                BASE_RECIPE.to_string(),
            ),
        };
        match base_image(&recipe) {
            Some(base) => tracing::info!("building image from {} recipe (base {})", tier, base),
            None => tracing::info!("building image from {} recipe", tier),
        }
        self.build_image(source).await?;
        tracing::info!("image built from {} recipe", tier);
        Ok(recipe)
    }

    async fn directory_source(&self, dir: &Path) -> Result<(BuildSource, String), BuildError> {
        let path = dir.join(RECIPE_FILE);
        let recipe = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| BuildError::Recipe { path, source })?;
        Ok((BuildSource::Directory(dir.to_path_buf()), recipe))
    }

    /// Try each tier in order until one builds.
    pub async fn pull_with_fallback(&self, chain: &[Tier]) -> Result<Pulled, PullError> {
        let mut attempts = Vec::new();
        for &tier in chain {
            match self.pull_image(tier).await {
                Ok(recipe) => return Ok(Pulled { tier, recipe }),
                Err(e) => {
                    tracing::warn!("{} recipe failed: {}", tier, e);
                    attempts.push((tier, e));
                }
            }
        }
        Err(PullError::Exhausted { attempts })
    }

    /// Overwrite the cached recipe with what was just built.
    pub async fn sync_local_copy(&self, contents: &str) -> Result<(), BuildError> {
        let path = self.local_dir.join(RECIPE_FILE);
        let written = match tokio::fs::create_dir_all(self.local_dir).await {
            Ok(()) => tokio::fs::write(&path, contents).await,
            Err(e) => Err(e),
        };
        written.map_err(|source| BuildError::Sync {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("cached recipe updated at {}", path.display());
        Ok(())
    }

    /// Whether the cached recipe matches the shared one. `false` means an
    /// update is available.
    pub fn compare(&self) -> bool {
        compare(
            &self.local_dir.join(RECIPE_FILE),
            &self.latest_dir.join(RECIPE_FILE),
        )
    }

    /// Rebuild from the shared recipe and cache it.
    pub async fn update_image(&self) -> Result<String, BuildError> {
        let recipe = self.pull_image(Tier::RemoteLatest).await?;
        self.sync_local_copy(&recipe).await?;
        tracing::info!("image updated from shared recipe");
        Ok(recipe)
    }
}
