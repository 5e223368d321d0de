//! Linter: structural and content diagnostics for lead sheets
//!
//! All findings are non-fatal [`Warning`] values — the linter never throws
//! and never alters what it is given; callers decide whether to block on a
//! warning. When handed raw text it additionally re-scans the directive
//! balance with an explicit stack. That scan deliberately duplicates part
//! of the parser's work: the parser's policy is to *tolerate* stray and
//! unterminated environments silently, the linter's policy is to *surface*
//! them, and the two on purpose disagree on severity.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parser::parse;
use crate::song::{Line, Song};

/// Lyric lines longer than this risk forced downscaling in print layouts.
pub const MAX_LYRIC_LINE_LEN: usize = 90;

static RX_CHORD_VALID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-G](?:#|b)?(?:(?:maj|min|m|dim|sus|add)?\d*)?(?:/[A-G](?:#|b)?)?$")
        .expect("valid chord-shape regex")
});

static RX_BALANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\{(start_of|end_of)_([^}:]+).*\}$").expect("valid balance regex")
});

/// Machine-readable warning categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    MissingTitle,
    MissingKey,
    EmptySection,
    LongLine,
    UnknownChord,
    DuplicateSectionHeader,
    SectionMismatch,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::MissingTitle => "missing_title",
            WarningCode::MissingKey => "missing_key",
            WarningCode::EmptySection => "empty_section",
            WarningCode::LongLine => "long_line",
            WarningCode::UnknownChord => "unknown_chord",
            WarningCode::DuplicateSectionHeader => "duplicate_section_header",
            WarningCode::SectionMismatch => "section_mismatch",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Warning {
    fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            section: None,
            line: None,
        }
    }

    fn at_section(mut self, section: usize) -> Self {
        self.section = Some(section);
        self
    }

    fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(section) = self.section {
            write!(f, " (section {})", section)?;
        }
        if let Some(line) = self.line {
            write!(f, " (line {})", line)?;
        }
        Ok(())
    }
}

/// Lint raw ChordPro text: document checks plus the directive-balance scan
/// that is only possible against the source.
pub fn lint(text: &str) -> Vec<Warning> {
    let song = parse(text);
    let mut warnings = lint_song(&song);
    warnings.extend(scan_directive_balance(text));
    debug!(count = warnings.len(), "linted raw text");
    warnings
}

/// Lint an already-parsed document. The `section_mismatch` check needs the
/// raw text and is not available here.
pub fn lint_song(song: &Song) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if song.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
        warnings.push(Warning::new(WarningCode::MissingTitle, "Missing {title}."));
    }
    if song.key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        warnings.push(Warning::new(WarningCode::MissingKey, "Missing {key}."));
    }

    for (si, sec) in song.sections.iter().enumerate() {
        let content: Vec<&Line> = sec.content_lines().collect();
        if content.is_empty() {
            warnings.push(
                Warning::new(
                    WarningCode::EmptySection,
                    format!("Section \"{}\" has no content lines.", sec.label),
                )
                .at_section(si),
            );
        }
        for (li, line) in content.iter().enumerate() {
            if let Some(lyrics) = line.lyrics() {
                if lyrics.chars().count() > MAX_LYRIC_LINE_LEN {
                    warnings.push(
                        Warning::new(
                            WarningCode::LongLine,
                            "Very long lyric line may force downsizing.",
                        )
                        .at_section(si)
                        .at_line(li),
                    );
                }
            }
            for placement in line.chords() {
                if !RX_CHORD_VALID.is_match(&placement.sym) {
                    warnings.push(
                        Warning::new(
                            WarningCode::UnknownChord,
                            format!("Suspicious chord \"{}\".", placement.sym),
                        )
                        .at_section(si)
                        .at_line(li),
                    );
                }
            }
        }
    }

    for i in 1..song.sections.len() {
        let a = &song.sections[i - 1];
        let b = &song.sections[i];
        if a.label == b.label
            && a.content_lines().count() <= 2
            && b.content_lines().count() <= 2
        {
            warnings.push(
                Warning::new(
                    WarningCode::DuplicateSectionHeader,
                    format!("Adjacent duplicate \"{}\" with very few lines.", a.label),
                )
                .at_section(i),
            );
        }
    }

    warnings
}

/// Independent stack scan of `{start_of_x}`/`{end_of_x}` lines.
///
/// A mismatched end pops whatever is on top of the stack anyway; every
/// stray end and every never-closed start yields one warning.
fn scan_directive_balance(text: &str) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let mut stack: Vec<(String, usize)> = Vec::new();

    for (idx, raw) in text.split('\n').enumerate() {
        let Some(cap) = RX_BALANCE.captures(raw.trim()) else {
            continue;
        };
        let kind = cap[2].to_lowercase();
        if cap[1].eq_ignore_ascii_case("start_of") {
            stack.push((kind, idx));
        } else {
            match stack.pop() {
                Some((open_kind, _)) if open_kind == kind => {}
                _ => warnings.push(
                    Warning::new(
                        WarningCode::SectionMismatch,
                        format!("Stray {{end_of_{}}}", kind),
                    )
                    .at_line(idx),
                ),
            }
        }
    }
    for (kind, line) in stack {
        warnings.push(
            Warning::new(
                WarningCode::SectionMismatch,
                format!("Unclosed {{start_of_{}}}", kind),
            )
            .at_line(line),
        );
    }
    warnings
}
