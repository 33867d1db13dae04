// ABOUTME: Decides which container actions are offered for the current form input.
// ABOUTME: An explicit state machine over name match, run state and required fields.

use crate::reconcile::ContainerView;
use crate::types::Deployment;
use serde::Serialize;
use std::fmt;

/// What the user has typed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    pub name: String,
    pub project: String,
    pub deployment: Deployment,
    pub gateway: String,
}

impl FormInput {
    /// Container name with spaces replaced by underscores.
    pub fn normalized_name(&self) -> String {
        self.name.trim().replace(' ', "_")
    }

    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
            && self.project.trim().is_empty()
            && self.gateway.trim().is_empty()
    }

    /// Local needs a project; Cloud needs a project and a gateway.
    pub fn has_required_fields(&self) -> bool {
        let project = !self.project.trim().is_empty();
        match self.deployment {
            Deployment::Local => project,
            Deployment::Cloud => project && !self.gateway.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlState {
    Empty,
    MatchedRunning,
    MatchedStoppedOtherRunning,
    MatchedStoppedNoneRunning,
    UnmatchedReady,
    UnmatchedIncomplete,
}

impl ControlState {
    pub fn compute(
        blank: bool,
        matched_running: Option<bool>,
        any_running: bool,
        required_present: bool,
    ) -> Self {
        match matched_running {
            Some(true) => ControlState::MatchedRunning,
            Some(false) if any_running => ControlState::MatchedStoppedOtherRunning,
            Some(false) => ControlState::MatchedStoppedNoneRunning,
            None if blank => ControlState::Empty,
            None if required_present => ControlState::UnmatchedReady,
            None => ControlState::UnmatchedIncomplete,
        }
    }

    /// The (positive, negative) pair of controls for this state.
    pub fn controls(self) -> (Control, Control) {
        use Action::*;
        let on = |action| Control {
            action,
            enabled: true,
        };
        let off = |action| Control {
            action,
            enabled: false,
        };
        match self {
            ControlState::MatchedRunning => (on(Open), on(Stop)),
            ControlState::MatchedStoppedOtherRunning => (off(Start), on(Remove)),
            ControlState::MatchedStoppedNoneRunning => (on(Start), on(Remove)),
            ControlState::UnmatchedReady => (on(Create), off(Remove)),
            ControlState::UnmatchedIncomplete | ControlState::Empty => (off(Create), off(Remove)),
        }
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControlState::Empty => "empty",
            ControlState::MatchedRunning => "matched, running",
            ControlState::MatchedStoppedOtherRunning => "matched, stopped, another running",
            ControlState::MatchedStoppedNoneRunning => "matched, stopped",
            ControlState::UnmatchedReady => "new, ready",
            ControlState::UnmatchedIncomplete => "new, incomplete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Open,
    Stop,
    Start,
    Remove,
    Create,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Open => "open",
            Action::Stop => "stop",
            Action::Start => "start",
            Action::Remove => "remove",
            Action::Create => "create",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Control {
    pub action: Action,
    pub enabled: bool,
}

/// Fields of the matched container the form should lock to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedFields {
    pub project: String,
    pub deployment: String,
    pub machine_info: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub state: ControlState,
    pub positive: Control,
    pub negative: Control,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<MatchedFields>,
}

/// Evaluate the form against the current container list.
pub fn evaluate(input: &FormInput, containers: &[ContainerView]) -> Controls {
    let name = input.normalized_name();
    let matched = if name.is_empty() {
        None
    } else {
        containers.iter().find(|c| c.name == name)
    };
    let any_running = containers.iter().any(ContainerView::is_running);

    let state = ControlState::compute(
        input.is_blank(),
        matched.map(ContainerView::is_running),
        any_running,
        input.has_required_fields(),
    );
    let (positive, negative) = state.controls();

    Controls {
        state,
        positive,
        negative,
        matched: matched.map(|c| MatchedFields {
            project: c.project.clone(),
            deployment: c.deployment.clone(),
            machine_info: c.machine_info.clone(),
        }),
    }
}
