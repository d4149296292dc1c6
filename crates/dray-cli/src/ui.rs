//! Terminal output helpers.
//!
//! Status lines go to stdout, warnings to stderr. Logging (tracing) is for
//! diagnostics; these are the CLI's actual user-facing output.

use owo_colors::OwoColorize;

/// Apply the color policy: `--no-color` or `NO_COLOR` disables ANSI output.
pub fn init_colors(no_color: bool) {
    if no_color || std::env::var_os("NO_COLOR").is_some() {
        owo_colors::set_override(false);
    }
}

pub fn success(message: impl AsRef<str>) {
    println!("{} {}", "✓".green().bold(), message.as_ref());
}

pub fn warn(message: impl AsRef<str>) {
    eprintln!("{} {}", "!".yellow().bold(), message.as_ref());
}

/// Indented `label: value` detail line under a status line.
pub fn detail(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", format!("{label}:").dimmed(), value);
}
