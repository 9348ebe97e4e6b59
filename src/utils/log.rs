//! Logging utilities with colored module prefixes.
//!
//! Provides the `log!` macro for formatted terminal output:
//!
//! ```ignore
//! log!("serve"; "http://{addr}");
//! log!("compile"; "rendering {} url(s)", count);
//! ```

use colored::{ColoredString, Colorize};
use std::io::{Write, stderr};

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::utils::log::log($module, &format!($($arg)*))
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix to stderr.
///
/// stderr keeps log lines out of the way when a command's stdout is
/// the payload (e.g. `render-url` piping a page to a file).
#[inline]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stderr = stderr().lock();
    writeln!(stderr, "{prefix} {message}").ok();
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module {
        "serve" => prefix.bright_blue().bold(),
        "compile" => prefix.bright_green().bold(),
        "error" | "crash" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_prefix_brackets() {
        // Prefix is wrapped in brackets regardless of color
        let serve = colorize_prefix("serve");
        assert!(format!("{serve}").contains("[serve]"));

        let other = colorize_prefix("entry");
        assert!(format!("{other}").contains("[entry]"));
    }

    #[test]
    fn test_log_does_not_panic() {
        log("test", "plain message");
        log("test", "");
    }
}
