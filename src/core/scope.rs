//! Target expressions restricting something to a subset of architectures.
//!
//! An expression is a `|` separated list of alternatives. Each alternative is
//! a platform name (`linux`), an architecture name (`win-64`) or a negated
//! platform name (`!ios`). The empty expression covers everything.
//!
//! Names are validated when the expression is parsed, so evaluating it
//! against an architecture cannot fail.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::platform::{Architecture, Platform, PlatformKind};
use crate::util::errors::DeployError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Term {
    Platform(PlatformKind),
    NotPlatform(PlatformKind),
    Architecture(&'static str),
}

impl Term {
    fn covers(&self, arch: &Architecture) -> bool {
        match self {
            Term::Platform(kind) => arch.platform_kind() == *kind,
            Term::NotPlatform(kind) => arch.platform_kind() != *kind,
            Term::Architecture(name) => arch.name == *name,
        }
    }
}

/// A parsed target expression.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetExpression {
    source: String,
    terms: Vec<Term>,
}

impl TargetExpression {
    /// The expression that covers every architecture.
    pub fn everywhere() -> Self {
        TargetExpression::default()
    }

    /// Parse and validate an expression.
    pub fn parse(expression: &str) -> Result<Self, DeployError> {
        let source = expression.trim();
        if source.is_empty() {
            return Ok(TargetExpression::default());
        }

        let invalid = |reason: &str| DeployError::InvalidScope {
            expression: source.to_string(),
            reason: reason.to_string(),
        };

        let mut terms = Vec::new();
        for alternative in source.split('|') {
            let alternative = alternative.trim();
            if alternative.is_empty() {
                return Err(invalid("empty alternative"));
            }

            let term = if let Some(name) = alternative.strip_prefix('!') {
                if name.is_empty() || name.starts_with('!') {
                    return Err(invalid("'!' must be followed by a platform name"));
                }
                Term::NotPlatform(Platform::find(name)?.kind)
            } else if alternative.contains('-') {
                let arch = Architecture::all()
                    .find(|a| a.name == alternative)
                    .ok_or_else(|| DeployError::UnknownArchitecture {
                        name: alternative.to_string(),
                    })?;
                Term::Architecture(arch.name)
            } else {
                Term::Platform(Platform::find(alternative)?.kind)
            };

            terms.push(term);
        }

        Ok(TargetExpression {
            source: source.to_string(),
            terms,
        })
    }

    /// Check if the expression covers an architecture.
    pub fn covers(&self, arch: &Architecture) -> bool {
        self.terms.is_empty() || self.terms.iter().any(|t| t.covers(arch))
    }

    /// Whether this is the empty expression.
    pub fn is_everywhere(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Parse `expression` and evaluate it against `arch` in one step.
pub fn covers(expression: &str, arch: &Architecture) -> Result<bool, DeployError> {
    Ok(TargetExpression::parse(expression)?.covers(arch))
}

impl fmt::Display for TargetExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for TargetExpression {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetExpression::parse(s)
    }
}

impl Serialize for TargetExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for TargetExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TargetExpression::parse(&s).map_err(serde::de::Error::custom)
    }
}
