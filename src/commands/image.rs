// ABOUTME: Startup check and image update commands.
// ABOUTME: Runs the Api/Drive/Image/Update steps and rebuilds from the shared recipe.

use super::runtime_connection::connect_launcher;
use datalab_launcher::diagnostics::Diagnostics;
use datalab_launcher::error::Result;
use datalab_launcher::output::Output;
use datalab_launcher::startup::{self, DriveAvailability, ImageOutcome, StartupReport};
use std::path::Path;

pub async fn check(config: Option<&Path>, mut output: Output) -> Result<()> {
    output.start_timer();
    let launcher = connect_launcher(config, &output).await?;
    let mut diag = Diagnostics::default();

    let report = startup::run(&launcher, &mut diag).await?;
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    output.data("startup", &report, describe);
    match launcher.list().await {
        Ok(views) => output.containers(&views),
        Err(e) => output.warning(&format!("could not list containers: {e}")),
    }
    output.success("Startup checks complete. Launcher ready.");
    Ok(())
}

fn describe(report: &StartupReport) -> String {
    let drives = match report.drives {
        DriveAvailability::All => "Available",
        DriveAvailability::Some => "Some Available",
        DriveAvailability::None => "Not Available",
    };
    let image = match &report.image {
        ImageOutcome::AlreadyLoaded => "Ready".to_string(),
        ImageOutcome::Built(tier) => format!("Ready (built from {tier} recipe)"),
    };
    let update = match report.update_available {
        Some(true) => "Update Available",
        Some(false) => "Up to date",
        None => "Unknown",
    };
    format!("API:    Connected\nDrive:  {drives}\nImage:  {image}\nUpdate: {update}")
}

pub async fn update(config: Option<&Path>, mut output: Output) -> Result<()> {
    let launcher = connect_launcher(config, &output).await?;
    output.start_timer();

    output.progress("→ Building image from shared recipe...");
    let result = launcher.update_image().await;
    if result.is_ok() {
        output.success("Image updated");
    }

    match launcher.list().await {
        Ok(views) => output.containers(&views),
        Err(e) => output.warning(&format!("could not refresh container list: {e}")),
    }
    result.map(|_| ())
}
