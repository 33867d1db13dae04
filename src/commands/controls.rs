// ABOUTME: Controls command: shows which actions the form input allows.
// ABOUTME: Thin wrapper over the control state machine.

use super::runtime_connection::connect_launcher;
use datalab_launcher::controls::{Control, Controls, FormInput};
use datalab_launcher::error::Result;
use datalab_launcher::output::Output;
use std::path::Path;

pub async fn controls(config: Option<&Path>, input: FormInput, output: Output) -> Result<()> {
    let launcher = connect_launcher(config, &output).await?;
    let controls = launcher.controls(&input).await?;
    output.data("controls", &controls, describe);
    Ok(())
}

fn describe(controls: &Controls) -> String {
    let show = |c: &Control| {
        format!(
            "{} ({})",
            c.action,
            if c.enabled { "enabled" } else { "disabled" }
        )
    };
    let mut lines = vec![
        format!("State:    {}", controls.state),
        format!("Primary:  {}", show(&controls.positive)),
        format!("Negative: {}", show(&controls.negative)),
    ];
    if let Some(m) = &controls.matched {
        lines.push(format!(
            "Matched:  project={} deployment={} machine={}",
            m.project, m.deployment, m.machine_info
        ));
    }
    lines.join("\n")
}
