// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (scripts), and JSON output modes.

use crate::reconcile::ContainerView;
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.event("success", message, &mut std::io::stdout()),
        }
    }

    /// Print a warning (suppressed in quiet mode).
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => self.event("warning", message, &mut std::io::stderr()),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => self.event("error", message, &mut std::io::stderr()),
        }
    }

    fn event(&self, event: &str, message: &str, out: &mut dyn std::io::Write) {
        let event = JsonEvent {
            event,
            message,
            duration_secs: self.duration(),
        };
        if let Ok(json) = serde_json::to_string(&event) {
            let _ = writeln!(out, "{json}");
        }
    }

    /// Print a structured value as one JSON line, or with `human` otherwise.
    pub fn data<T: Serialize>(&self, kind: &str, value: &T, human: impl FnOnce(&T) -> String) {
        match self.mode {
            OutputMode::Json => {
                let line = JsonData { event: kind, data: value };
                if let Ok(json) = serde_json::to_string(&line) {
                    println!("{json}");
                }
            }
            OutputMode::Normal | OutputMode::Quiet => println!("{}", human(value)),
        }
    }

    /// Print the container list.
    pub fn containers(&self, views: &[ContainerView]) {
        self.data("containers", &views, |views| render_table(views));
    }
}

/// Render the container list as an aligned table.
pub fn render_table(views: &[ContainerView]) -> String {
    if views.is_empty() {
        return "No DataLab containers.".to_string();
    }

    let headers = [
        "STATUS",
        "NAME",
        "PROJECT",
        "VERSION",
        "USER",
        "DEPLOYMENT",
        "MACHINE",
        "ADDRESS",
    ];
    let rows: Vec<[&str; 8]> = views
        .iter()
        .map(|v| {
            [
                v.status.as_str(),
                v.name.as_str(),
                v.project.as_str(),
                v.version.as_str(),
                v.user.as_str(),
                v.deployment.as_str(),
                v.machine_info.as_str(),
                v.address.as_str(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let format_row = |cells: &[&str; 8]| {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(&headers)];
    lines.extend(rows.iter().map(format_row));
    lines.join("\n")
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct JsonData<'a, T> {
    event: &'a str,
    data: &'a T,
}
