// ABOUTME: Shared helper for connecting the launcher to the local runtime.
// ABOUTME: Loads settings, detects the runtime and builds the Launcher context.

use datalab_launcher::Launcher;
use datalab_launcher::config::Settings;
use datalab_launcher::error::{Error, Result};
use datalab_launcher::output::Output;
use datalab_launcher::runtime::BollardRuntime;
use std::path::Path;

/// Load settings and connect to the local runtime.
pub async fn connect_launcher(
    config: Option<&Path>,
    output: &Output,
) -> Result<Launcher<BollardRuntime>> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::discover(config, &cwd)?;

    output.progress("→ Connecting to container runtime...");
    let launcher = match Launcher::connect(settings).await {
        Ok(launcher) => launcher,
        Err(Error::Runtime(e)) => {
            output.warning(e.kind().hint());
            return Err(Error::Runtime(e));
        }
        Err(e) => return Err(e),
    };
    output.progress(&format!(
        "→ Connected to {}",
        launcher.runtime().runtime_type()
    ));

    Ok(launcher)
}
