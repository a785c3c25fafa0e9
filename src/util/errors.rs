//! Error taxonomy for pydeploy.
//!
//! Every failure the core reports to the user is one of these kinds. They
//! travel inside `anyhow::Error` and are recovered at the CLI boundary with
//! `downcast_ref` so they can be rendered as a [`Diagnostic`].

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// A user-facing deployment error.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum DeployError {
    /// Malformed or contradictory project, architecture or scope configuration.
    #[error("{message}")]
    #[diagnostic(code(pydeploy::config))]
    Config {
        message: String,
        /// File and/or field the problem was found in.
        context: Option<String>,
    },

    #[error("'{name}' is not a supported platform")]
    #[diagnostic(
        code(pydeploy::config::unknown_platform),
        help("Run `pydeploy targets` to see the supported platforms")
    )]
    UnknownPlatform { name: String },

    #[error("'{name}' is not a supported architecture")]
    #[diagnostic(
        code(pydeploy::config::unknown_architecture),
        help("Run `pydeploy targets` to see the supported architectures")
    )]
    UnknownArchitecture { name: String },

    #[error("invalid target expression '{expression}': {reason}")]
    #[diagnostic(code(pydeploy::config::scope))]
    InvalidScope { expression: String, reason: String },

    /// A module (or one of its dependencies) has no variant for the version.
    #[error("unable to resolve module `{module}` for Python v{version}")]
    #[diagnostic(code(pydeploy::resolve::unresolved))]
    UnresolvedDependency {
        module: String,
        required_by: Option<String>,
        version: String,
    },

    /// Something that has to be installed or set up is missing.
    #[error("{what}")]
    #[diagnostic(code(pydeploy::prerequisite))]
    MissingPrerequisite { what: String, help: Option<String> },

    /// A spawned native build step failed.
    #[error("`{command}` failed with exit code {code:?}")]
    #[diagnostic(code(pydeploy::external_tool))]
    ExternalTool {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl DeployError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        DeployError::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with file/field context.
    pub fn config_in(message: impl Into<String>, context: impl Into<String>) -> Self {
        DeployError::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a missing prerequisite error.
    pub fn missing(what: impl Into<String>) -> Self {
        DeployError::MissingPrerequisite {
            what: what.into(),
            help: None,
        }
    }

    /// Create a missing prerequisite error with a hint.
    pub fn missing_with_help(what: impl Into<String>, help: impl Into<String>) -> Self {
        DeployError::MissingPrerequisite {
            what: what.into(),
            help: Some(help.into()),
        }
    }

    /// Whether this error is a configuration error of any flavour.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            DeployError::Config { .. }
                | DeployError::UnknownPlatform { .. }
                | DeployError::UnknownArchitecture { .. }
                | DeployError::InvalidScope { .. }
        )
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            DeployError::Config { message, context } => {
                let mut diag = Diagnostic::error(message.clone());
                if let Some(ctx) = context {
                    diag = diag.with_context(ctx.clone());
                }
                diag
            }

            DeployError::UnknownPlatform { .. } | DeployError::UnknownArchitecture { .. } => {
                Diagnostic::error(self.to_string())
                    .with_suggestion("Run `pydeploy targets` to list the supported targets")
            }

            DeployError::InvalidScope { .. } => Diagnostic::error(self.to_string())
                .with_suggestion("Scopes look like `linux`, `win-64`, `!ios` or `macos|ios`"),

            DeployError::UnresolvedDependency {
                module,
                required_by,
                version,
            } => {
                let mut diag = Diagnostic::error(self.to_string());
                if let Some(by) = required_by {
                    diag = diag.with_context(format!("`{}` is required by `{}`", module, by));
                }
                diag.with_suggestion(format!(
                    "Check that `{}` is available in Python v{} for the target",
                    module, version
                ))
                .with_suggestion("Run `pydeploy modules --python <version>` to list the modules")
            }

            DeployError::MissingPrerequisite { what, help } => {
                let mut diag = Diagnostic::error(what.clone());
                if let Some(help) = help {
                    diag = diag.with_suggestion(help.clone());
                }
                diag
            }

            DeployError::ExternalTool { stderr, .. } => {
                let mut diag = Diagnostic::error(self.to_string());
                for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
                    diag = diag.with_context(line.to_string());
                }
                diag.with_suggestion(suggestions::BUILD_FAILED)
            }
        }
    }
}
