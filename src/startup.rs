// ABOUTME: Startup checks run before the launcher accepts commands.
// ABOUTME: Api, Drive, Image and Update steps; each failure names its step.

use crate::config::{Access, DriveDescriptor};
use crate::diagnostics::{Diagnostics, Warning};
use crate::image::{ImagePipeline, PullError, Tier};
use crate::launcher::Launcher;
use crate::runtime::{FullRuntime, ImageError, RuntimeInfoError};
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckStep {
    Api,
    Drive,
    Image,
    Update,
}

impl fmt::Display for CheckStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckStep::Api => "API",
            CheckStep::Drive => "Drive",
            CheckStep::Image => "Image",
            CheckStep::Update => "Update",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("API check failed: container runtime unavailable: {source}")]
    Api { source: RuntimeInfoError },

    #[error("Image check failed: cannot inspect image: {source}")]
    Inspect { source: ImageError },

    #[error("Image check failed: {source}")]
    Pull { source: PullError },

    #[error("Image check failed: {source}")]
    Sync { source: crate::image::BuildError },
}

impl StartupError {
    pub fn step(&self) -> CheckStep {
        match self {
            StartupError::Api { .. } => CheckStep::Api,
            StartupError::Inspect { .. }
            | StartupError::Pull { .. }
            | StartupError::Sync { .. } => CheckStep::Image,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriveAvailability {
    All,
    Some,
    None,
}

impl DriveAvailability {
    /// Only a fully reachable share is used as a recipe source.
    pub fn share_available(self) -> bool {
        self == DriveAvailability::All
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "outcome", content = "tier")]
pub enum ImageOutcome {
    AlreadyLoaded,
    Built(Tier),
}

#[derive(Debug, Clone, Serialize)]
pub struct StartupReport {
    pub drives: DriveAvailability,
    pub image: ImageOutcome,
    /// `None` when the share was not reachable to compare against.
    pub update_available: Option<bool>,
    pub warnings: Vec<Warning>,
}

/// Check the shared recipe and every configured drive.
///
/// An unreadable shared recipe makes the whole share unavailable. Read-only
/// drives must be readable; read-write drives must exist.
pub fn check_drives(latest_recipe: &Path, drives: &[DriveDescriptor]) -> DriveAvailability {
    if std::fs::File::open(latest_recipe).is_err() {
        tracing::debug!("shared recipe {} not readable", latest_recipe.display());
        return DriveAvailability::None;
    }

    let accessible = drives
        .iter()
        .filter(|d| {
            let ok = match d.access {
                Access::Ro => readable(&d.path),
                Access::Rw => d.path.exists(),
            };
            if !ok {
                tracing::debug!("drive {} not accessible ({})", d.path.display(), d.access);
            }
            ok
        })
        .count();

    if accessible == drives.len() {
        DriveAvailability::All
    } else if accessible > 0 {
        DriveAvailability::Some
    } else {
        DriveAvailability::None
    }
}

fn readable(path: &Path) -> bool {
    if path.is_dir() {
        std::fs::read_dir(path).is_ok()
    } else {
        std::fs::File::open(path).is_ok()
    }
}

/// Run every startup step against a constructed launcher.
pub async fn run<R: FullRuntime>(
    launcher: &Launcher<R>,
    diag: &mut Diagnostics,
) -> Result<StartupReport, StartupError> {
    let settings = launcher.settings();

    tracing::info!("checking runtime connection");
    launcher
        .runtime()
        .ping()
        .await
        .map_err(|source| StartupError::Api { source })?;

    tracing::info!("checking shared drives");
    let drives = check_drives(&settings.latest_recipe(), &settings.drives);
    match drives {
        DriveAvailability::All => tracing::info!("shared drives available"),
        DriveAvailability::Some => diag.warn(Warning::drives(
            "shared drives partially accessible, using local recipes",
        )),
        DriveAvailability::None => diag.warn(Warning::drives(
            "shared drives not accessible, using local recipes",
        )),
    }

    tracing::info!("checking DataLab image");
    let pipeline: ImagePipeline<'_, R> = launcher.images();
    let loaded = pipeline
        .image_loaded()
        .await
        .map_err(|source| StartupError::Inspect { source })?;

    let image = if loaded {
        tracing::info!("DataLab image already loaded");
        ImageOutcome::AlreadyLoaded
    } else {
        let chain = Tier::chain(drives.share_available());
        let pulled = match pipeline.pull_with_fallback(&chain).await {
            Ok(pulled) => pulled,
            Err(source) => return Err(StartupError::Pull { source }),
        };
        if pulled.tier != chain[0] {
            diag.warn(Warning::fallback(format!(
                "image built from {} recipe",
                pulled.tier
            )));
        }
        pipeline
            .sync_local_copy(&pulled.recipe)
            .await
            .map_err(|source| StartupError::Sync { source })?;
        ImageOutcome::Built(pulled.tier)
    };

    let update_available = if drives.share_available() {
        tracing::info!("checking for updates");
        let current = pipeline.compare();
        if !current {
            diag.warn(Warning::update_available("a newer DataLab image is available"));
        }
        Some(!current)
    } else {
        None
    };

    Ok(StartupReport {
        drives,
        image,
        update_available,
        warnings: diag.warnings().to_vec(),
    })
}
