//! Centralized shell output and progress management.
//!
//! All user-facing status lines go through [`Shell`] so spacing, colors and
//! verbosity are handled in one place. Machine-readable artifacts (graph
//! JSON, order listings) go to stdout directly from the commands.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::util::diagnostic::{self, Diagnostic};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only, no progress
    Quiet,
    /// Default: status messages + progress spinners
    #[default]
    Normal,
    /// --verbose: status lines and debug logs, no spinners
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Aligned,
    Finished,
    Pruned,
    Wrote,

    // In-progress statuses (cyan)
    Indexing,
    Analyzing,
    Sorting,

    // Info statuses (blue)
    Info,
    Unchanged,

    // Warning statuses (yellow)
    Skipped,
    Warning,

    // Error status (red)
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Aligned => "Aligned",
            Status::Finished => "Finished",
            Status::Pruned => "Pruned",
            Status::Wrote => "Wrote",
            Status::Indexing => "Indexing",
            Status::Analyzing => "Analyzing",
            Status::Sorting => "Sorting",
            Status::Info => "Info",
            Status::Unchanged => "Unchanged",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Aligned | Status::Finished | Status::Pruned | Status::Wrote => "\x1b[1;32m",
            Status::Indexing | Status::Analyzing | Status::Sorting => "\x1b[1;36m",
            Status::Info | Status::Unchanged => "\x1b[1;34m",
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }

    /// Width for right alignment.
    fn width(&self) -> usize {
        12
    }
}

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    /// Create a new shell.
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };

        Shell {
            verbosity,
            use_color,
        }
    }

    /// Create a shell from CLI flags. Quiet wins over verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Shell::new(verbosity, color)
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`. In quiet mode only errors print.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() && status != Status::Error {
            return;
        }

        eprintln!("{} {}", self.format_status(status), msg);
    }

    /// Print an info message.
    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: impl Display) {
        self.status(Status::Error, msg);
    }

    /// Print a diagnostic. Notes are hidden unless verbose; in quiet mode
    /// only errors print.
    pub fn diagnostic(&self, diag: &Diagnostic) {
        if self.is_quiet() && !diag.is_error() {
            return;
        }
        if diag.severity == diagnostic::Severity::Note && !self.is_verbose() {
            return;
        }
        diagnostic::emit(diag, self.use_color);
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        let width = status.width();

        if self.use_color {
            format!("{}{:>width$}\x1b[0m", status.color_code(), text, width = width)
        } else {
            format!("{:>width$}", text, width = width)
        }
    }

    /// Create a spinner for a long-running step.
    ///
    /// In quiet or verbose mode, or when stderr is not a terminal, the
    /// spinner is a no-op.
    pub fn spinner(&self, msg: impl Display) -> Progress {
        let pb = if self.verbosity != Verbosity::Normal || !io::stderr().is_terminal() {
            None
        } else {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                pb.set_style(style);
            }
            pb.set_message(msg.to_string());
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        };
        Progress { pb }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, ColorChoice::Auto)
    }
}

/// Spinner wrapper that respects shell mode.
pub struct Progress {
    pb: Option<ProgressBar>,
}

impl Progress {
    /// Update the spinner message.
    pub fn set_message(&self, msg: impl Display) {
        if let Some(pb) = &self.pb {
            pb.set_message(msg.to_string());
        }
    }

    /// Finish and clear the spinner.
    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_modes() {
        let shell = Shell::new(Verbosity::Normal, ColorChoice::Never);
        assert!(!shell.is_quiet());
        assert!(!shell.is_verbose());
        assert!(!shell.use_color());

        let quiet = Shell::from_flags(true, true, ColorChoice::Never);
        assert!(quiet.is_quiet());

        let verbose = Shell::from_flags(false, true, ColorChoice::Always);
        assert!(verbose.is_verbose());
        assert!(verbose.use_color());
    }

    #[test]
    fn test_color_choice_parse() {
        assert_eq!("auto".parse::<ColorChoice>().unwrap(), ColorChoice::Auto);
        assert_eq!("always".parse::<ColorChoice>().unwrap(), ColorChoice::Always);
        assert_eq!("never".parse::<ColorChoice>().unwrap(), ColorChoice::Never);
        assert!("invalid".parse::<ColorChoice>().is_err());
    }

    #[test]
    fn test_status_formatting() {
        let shell = Shell::new(Verbosity::Normal, ColorChoice::Never);

        let formatted = shell.format_status(Status::Aligned);
        assert_eq!(formatted.trim(), "Aligned");
        assert_eq!(formatted.len(), 12);
    }
}
