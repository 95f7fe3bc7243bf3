//! Human-readable progress output.
//!
//! Diagnostics go through `tracing`; this reporter is the operator-facing
//! progress stream on stdout: step banners, created/deleted resource ids,
//! the final verdict.

use colored::Colorize;

/// Console reporter for workflow progress.
#[derive(Debug, Clone)]
pub struct Reporter {
    use_color: bool,
}

impl Reporter {
    /// Creates a reporter. Color is disabled when `no_color` is set or the
    /// `NO_COLOR` environment variable is present.
    pub fn new(no_color: bool) -> Self {
        let use_color = !no_color && std::env::var("NO_COLOR").is_err();
        Self { use_color }
    }

    /// Prints a section banner.
    pub fn banner(&self, title: &str) {
        let line = "=".repeat(title.len().max(16));
        if self.use_color {
            println!("\n{}\n{}\n{}", line, title.bold(), line);
        } else {
            println!("\n{line}\n{title}\n{line}");
        }
    }

    /// Prints a workflow step.
    pub fn step(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "==>".cyan().bold(), message);
        } else {
            println!("==> {message}");
        }
    }

    /// Prints an informational line.
    pub fn info(&self, message: &str) {
        println!("    {message}");
    }

    /// Prints a created/deleted resource id.
    pub fn resource(&self, verb: &str, kind: &str, id: &str) {
        if self.use_color {
            println!("    {verb} {kind} {}", id.yellow());
        } else {
            println!("    {verb} {kind} {id}");
        }
    }

    /// Prints a success line.
    pub fn success(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "ok:".green().bold(), message);
        } else {
            println!("ok: {message}");
        }
    }

    /// Prints a warning line.
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "warning:".yellow().bold(), message);
        } else {
            eprintln!("warning: {message}");
        }
    }

    /// Prints an error line.
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "error:".red().bold(), message);
        } else {
            eprintln!("error: {message}");
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(false)
    }
}
