//! Configuration error types with source location tracking
//!
//! Provides rich diagnostic output using miette for configuration validation errors.

// False positives from miette's derive macros - fields are used but rustc doesn't see it
#![allow(unused_assignments)]

use super::types::{MAX_VOLUME_INCREMENT, SessionConfig, Span};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A single validation issue with location information
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    /// Byte span in source
    pub span: Span,
    /// Primary error message
    pub message: String,
    /// Label shown at the span location
    pub label: String,
    /// Optional help text with suggestions
    pub help: Option<String>,
}

impl ConfigIssue {
    /// Create an issue for an unrecognised `play_action` value
    pub fn unknown_play_action(span: Span, value: &str) -> Self {
        Self {
            span,
            message: format!("unknown play action '{value}'"),
            label: "not a play action".to_string(),
            help: Some("valid values: \"pause\", \"restart\"".to_string()),
        }
    }

    /// Create an issue for a volume increment outside 0..=100
    pub fn increment_out_of_range(span: Span, value: i64) -> Self {
        Self {
            span,
            message: format!("volume increment {value} is out of range"),
            label: "out of range".to_string(),
            help: Some(format!(
                "the increment is a percentage between 0 and {MAX_VOLUME_INCREMENT}"
            )),
        }
    }
}

/// Individual validation issue wrapped for miette's `#[related]` attribute
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct ConfigIssueDiagnostic {
    message: String,
    #[label("{label}")]
    span: SourceSpan,
    label: String,
    #[help]
    help: Option<String>,
}

/// Collection of configuration validation errors
///
/// Carries the source file, all issues found (sorted by position), and the
/// configuration obtained by replacing every invalid value with its default.
#[derive(Debug, Error, Diagnostic)]
#[error(
    "configuration has {count} error{s}",
    count = self.issues.len(),
    s = if self.issues.len() == 1 { "" } else { "s" }
)]
#[diagnostic(code(audiokeys::config::validation))]
pub struct ConfigValidationError {
    #[source_code]
    src: NamedSource<String>,

    #[related]
    issues: Vec<ConfigIssueDiagnostic>,

    fallback: SessionConfig,
}

impl ConfigValidationError {
    /// Create a validation error from collected issues
    pub fn new(
        source_name: impl Into<String>,
        source_content: String,
        mut issues: Vec<ConfigIssue>,
        fallback: SessionConfig,
    ) -> Self {
        issues.sort_by_key(|i| i.span.start);

        let diagnostics = issues
            .into_iter()
            .map(|issue| ConfigIssueDiagnostic {
                message: issue.message,
                span: (issue.span.start, issue.span.len()).into(),
                label: issue.label,
                help: issue.help,
            })
            .collect();

        let name: String = source_name.into();
        Self {
            src: NamedSource::new(name, source_content),
            issues: diagnostics,
            fallback,
        }
    }

    /// Number of issues found
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// The valid part of the file, with defaults for invalid values
    pub fn fallback(&self) -> SessionConfig {
        self.fallback
    }
}

/// Top-level configuration errors
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file: {path}")]
    #[diagnostic(code(audiokeys::config::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {msg}")]
    #[diagnostic(code(audiokeys::config::parse))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error")]
        span: Option<SourceSpan>,
        msg: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ConfigValidationError),

    #[error("failed to write config file: {path}")]
    #[diagnostic(code(audiokeys::config::write))]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config")]
    #[diagnostic(code(audiokeys::config::serialize))]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn parse(
        source_name: impl Into<String>,
        source_content: String,
        err: toml::de::Error,
    ) -> Self {
        let name: String = source_name.into();
        Self::Parse {
            src: NamedSource::new(name, source_content),
            span: err.span().map(|r| (r.start, r.len()).into()),
            msg: err.message().to_string(),
        }
    }

    /// Whether the config file simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
