// ABOUTME: Container lifecycle commands: list, create, start, stop, remove, open.
// ABOUTME: Every lifecycle command re-lists containers afterwards, success or not.

use super::runtime_connection::connect_launcher;
use datalab_launcher::Launcher;
use datalab_launcher::error::{Error, Result};
use datalab_launcher::output::Output;
use datalab_launcher::runtime::BollardRuntime;
use datalab_launcher::types::Deployment;
use std::path::Path;
use std::time::Duration;

pub async fn list(config: Option<&Path>, output: Output) -> Result<()> {
    let launcher = connect_launcher(config, &output).await?;
    let views = launcher.list().await?;
    output.containers(&views);
    Ok(())
}

pub async fn create(
    config: Option<&Path>,
    name: &str,
    project: &str,
    deployment: Deployment,
    gateway: Option<&str>,
    mut output: Output,
) -> Result<()> {
    if project.trim().is_empty() {
        return Err(Error::MissingField("project id"));
    }
    if deployment == Deployment::Cloud && gateway.is_none_or(|g| g.trim().is_empty()) {
        return Err(Error::MissingField("gateway for a Cloud deployment"));
    }

    let launcher = connect_launcher(config, &output).await?;
    output.start_timer();

    let request = launcher.create_request(name, project, deployment, gateway);
    output.progress("→ Creating container...");
    let result = launcher.create(&request).await;
    if let Ok(handle) = &result {
        output.success(&format!("Created {}", handle.name));
    }
    finish(&launcher, result.map(|_| ()), &output).await
}

#[derive(Debug, Clone, Copy)]
pub enum Transition {
    Start,
    Stop,
    Remove,
}

pub async fn transition(
    config: Option<&Path>,
    name: &str,
    transition: Transition,
    mut output: Output,
) -> Result<()> {
    let launcher = connect_launcher(config, &output).await?;
    output.start_timer();

    let result = match transition {
        Transition::Start => {
            output.progress(&format!("→ Starting {name}..."));
            launcher.start(name).await.map(|h| {
                output.success(&format!("{} {}", h.name, h.state.display_text()));
            })
        }
        Transition::Stop => {
            output.progress(&format!("→ Stopping {name}..."));
            launcher.stop(name).await.map(|h| {
                output.success(&format!("{} {}", h.name, h.state.display_text()));
            })
        }
        Transition::Remove => {
            output.progress(&format!("→ Removing {name}..."));
            launcher
                .remove(name)
                .await
                .map(|()| output.success(&format!("Removed {name}")))
        }
    };

    finish(&launcher, result, &output).await
}

/// Print the address of a running container after the opening countdown.
pub async fn open(config: Option<&Path>, name: &str, output: Output) -> Result<()> {
    let launcher = connect_launcher(config, &output).await?;
    let address = launcher.address(name).await?;

    for remaining in (1..=launcher.settings().opening_countdown).rev() {
        output.progress(&format!("Opening DataLab in {remaining}..."));
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    output.success(&address);
    Ok(())
}

/// Re-list containers, then hand back the action's result.
async fn finish(
    launcher: &Launcher<BollardRuntime>,
    result: Result<()>,
    output: &Output,
) -> Result<()> {
    match launcher.list().await {
        Ok(views) => output.containers(&views),
        Err(e) => output.warning(&format!("could not refresh container list: {e}")),
    }
    result
}
