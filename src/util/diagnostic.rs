//! User-friendly diagnostic messages.
//!
//! Every fatal error is reported with its root cause, the context it was
//! found in and, where there is one, a suggested fix.

use std::fmt;

/// Common suggestion messages.
pub mod suggestions {
    /// When the project file cannot be read.
    pub const NO_PROJECT: &str = "Pass the project file with `--project FILE`";

    /// When a native build step fails.
    pub const BUILD_FAILED: &str = "Run `pydeploy build --verbose` for more details";
}

/// An error message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let error = if color { "\x1b[1;31merror\x1b[0m" } else { "error" };
        output.push_str(&format!("{}: {}\n", error, self.message));

        for ctx in &self.context {
            output.push_str(&format!("  → {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("unable to resolve module `_winreg` for Python v2.7")
            .with_context("`_winreg` is required by `urllib`")
            .with_suggestion("Restrict the dependency with a `win#` scope");

        let output = diag.format(false);
        assert!(output.contains("error: unable to resolve module `_winreg`"));
        assert!(output.contains("required by `urllib`"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Restrict the dependency"));
    }

    #[test]
    fn test_bare_error_has_no_help_block() {
        let output = Diagnostic::error("`_ssl` dropped").format(false);
        assert_eq!(output, "error: `_ssl` dropped\n");
    }

    #[test]
    fn test_shared_suggestions_have_no_prefix() {
        // `format` adds the `help:` heading itself.
        let output = Diagnostic::error("qmake failed")
            .with_suggestion(suggestions::BUILD_FAILED)
            .format(false);
        assert_eq!(output.matches("help").count(), 1);
    }
}
