// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics rendered with miette.
//!
//! Figment errors are turned into [`ConfigError`]s that point at the
//! offending line of `pitstop.toml`, name the section it sits in and, for
//! typos, suggest the closest key or section. Keys that came from a
//! `PITSTOP_*` environment variable name that variable instead.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::loader::SECTIONS;

/// Minimum Jaro-Winkler score for a suggestion (`auth_tokn` -> `auth_token`).
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that its section does not define.
    #[error("unknown key `{key}` in [{section}]")]
    #[diagnostic(
        code(pitstop::config::unknown_key),
        help("{}", unknown_key_help(section, suggestion.as_deref(), valid_keys, env_var.as_deref()))
    )]
    UnknownKey {
        key: String,
        section: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted by the section.
        valid_keys: String,
        /// Set when the key came from the environment rather than a file.
        env_var: Option<String>,
        #[label("not a key of [{section}]")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A top-level table pitstop does not have, e.g. `[twilio]` for `[sms]`.
    #[error("unknown section [{section}]")]
    #[diagnostic(
        code(pitstop::config::unknown_section),
        help("{}", unknown_section_help(suggestion.as_deref()))
    )]
    UnknownSection {
        section: String,
        suggestion: Option<String>,
        #[label("pitstop has no such section")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong type, e.g. `port = "eighty"`.
    #[error("invalid type for `{key}`: {detail}")]
    #[diagnostic(code(pitstop::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path such as `gateway.port`.
        key: String,
        detail: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(pitstop::config::missing_key),
        help("add `{key} = <value>` to pitstop.toml")
    )]
    MissingKey { key: String },

    /// A value that parsed but makes no sense (bad cron, inverted window).
    #[error("validation error: {message}")]
    #[diagnostic(code(pitstop::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(pitstop::config::other))]
    Other(String),
}

fn unknown_key_help(
    section: &str,
    suggestion: Option<&str>,
    valid_keys: &str,
    env_var: Option<&str>,
) -> String {
    let mut help = match suggestion {
        Some(s) => format!("did you mean `{s}`? [{section}] accepts: {valid_keys}"),
        None => format!("[{section}] accepts: {valid_keys}"),
    };
    if let Some(var) = env_var {
        help.push_str(&format!(" (set by environment variable {var})"));
    }
    help
}

fn unknown_section_help(suggestion: Option<&str>) -> String {
    let sections = SECTIONS.join(", ");
    match suggestion {
        Some(s) => format!("did you mean [{s}]? Sections: {sections}"),
        None => format!("sections: {sections}"),
    }
}

/// Where a figment error came from.
enum Origin<'a> {
    File { path: &'a str, content: &'a str },
    Env,
    Unknown,
}

fn origin_of<'a>(error: &figment::Error, toml_sources: &'a [(String, String)]) -> Origin<'a> {
    let Some(metadata) = error.metadata.as_ref() else {
        return Origin::Unknown;
    };
    match &metadata.source {
        Some(figment::Source::File(path)) => {
            let path = path.display().to_string();
            toml_sources
                .iter()
                .find(|(p, _)| *p == path)
                .map(|(path, content)| Origin::File { path, content })
                .unwrap_or(Origin::Unknown)
        }
        _ if metadata.name.contains("environment") => Origin::Env,
        // Inline strings from `load_and_validate_str` carry no file source.
        _ => toml_sources
            .first()
            .map(|(path, content)| Origin::File { path, content })
            .unwrap_or(Origin::Unknown),
    }
}

fn span_in(
    origin: &Origin<'_>,
    section: Option<&str>,
    needle: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Origin::File { path, content } = origin else {
        return (None, None);
    };
    match find_key_offset(content, section, needle) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), needle.len())),
            Some(NamedSource::new(*path, content.to_string())),
        ),
        None => (None, None),
    }
}

/// Environment variable the loader maps onto `section.key`.
pub fn env_var_for(section: &str, key: &str) -> String {
    format!("PITSTOP_{}_{}", section.to_uppercase(), key.to_uppercase())
}

/// Converts every error inside a `figment::Error` into a [`ConfigError`].
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
            let origin = origin_of(&error, toml_sources);
            match &error.kind {
                Kind::UnknownField(field, _) if path.is_empty() => {
                    let (span, src) = span_in(&origin, None, &format!("[{field}]"));
                    ConfigError::UnknownSection {
                        section: field.clone(),
                        suggestion: suggest_key(field, SECTIONS),
                        span,
                        src,
                    }
                }
                Kind::UnknownField(field, expected) => {
                    let section = path.join(".");
                    let (span, src) = span_in(&origin, Some(&section), field);
                    let env_var =
                        matches!(origin, Origin::Env).then(|| env_var_for(&section, field));
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        section,
                        env_var,
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => {
                    let mut key = path.clone();
                    key.push(field.to_string());
                    ConfigError::MissingKey { key: key.join(".") }
                }
                Kind::InvalidType(actual, expected) => {
                    let (section, field) = match path.split_last() {
                        Some((field, section)) if !section.is_empty() => {
                            (Some(section.join(".")), field.as_str())
                        }
                        Some((field, _)) => (None, field.as_str()),
                        None => (None, ""),
                    };
                    let (span, src) = if field.is_empty() {
                        (None, None)
                    } else {
                        span_in(&origin, section.as_deref(), field)
                    };
                    ConfigError::InvalidType {
                        key: path.join("."),
                        detail: format!("found {actual}"),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Byte offset of `needle` at the start of a line inside `[section]`.
///
/// The search stops at the next table header, so a key of the same name in a
/// later section is never reported. With no section, the whole document is
/// searched (used for `[section]` headers themselves).
pub fn find_key_offset(content: &str, section: Option<&str>, needle: &str) -> Option<usize> {
    let mut in_section = section.is_none();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        let is_header = trimmed.starts_with('[');

        if let Some(section) = section
            && is_header
        {
            let name = trimmed
                .trim_end()
                .trim_start_matches('[')
                .trim_end_matches(']')
                .trim();
            in_section = name == section;
        } else if in_section && let Some(after) = trimmed.strip_prefix(needle) {
            let boundary = is_header
                || after.is_empty()
                || after.starts_with([' ', '\t', '=', '\n', '\r']);
            if boundary {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }
    None
}

/// Closest candidate by Jaro-Winkler similarity, if any clears the threshold.
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|&c| (c, strsim::jaro_winkler(unknown, c)))
        .filter(|&(_, score)| score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c.to_string())
}

/// Renders each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}
