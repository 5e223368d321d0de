//! ChordPro parser: raw lead-sheet text to a [`Song`]
//!
//! Line-oriented over any newline style. The parser is total: every input,
//! however malformed, produces a best-effort document. Unknown directives
//! vanish, stray `{end_of_x}` tags are ignored, and an unterminated section
//! closes itself at end of input — surfacing those is the linter's job, not
//! ours.
//!
//! Two concrete syntaxes are supported. When any environment directive
//! (`{start_of_verse}`, `{sov}`, ...) appears anywhere in the input, the
//! whole document is read in environment mode; otherwise a legacy mode
//! accepts bare `Verse 2` / `[CHORUS]` header lines.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, span, trace, Level};

use crate::song::{
    ChordDefinition, ChordPlacement, InstrumentalDirective, LayoutHints, Line, Section, Song,
};

static RX_LONG_DIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\{(start_of|end_of)_(verse|chorus|bridge|intro|tag|outro)(?::\s*([^}]*?)\s*)?\}$")
        .expect("valid long-directive regex")
});

static RX_SHORT_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\{(sov|soc|sob)(?:[\s:]\s*([^}]*?)\s*)?\}$")
        .expect("valid short-start regex")
});

static RX_SHORT_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\{(eov|eoc|eob)\s*\}$").expect("valid short-end regex"));

static RX_META: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{\s*([^:}]+?)\s*:\s*([^}]*?)\s*\}$").expect("valid metadata regex")
});

static RX_CAPO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\{\s*capo\s*:\s*([^}]*?)\s*\}$").expect("valid capo regex"));

static RX_COLUMNS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\{\s*columns\s*:\s*([^}]*?)\s*\}$").expect("valid columns regex")
});

static RX_COLUMN_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\{\s*column_break\s*\}$").expect("valid column-break regex")
});

static RX_COMMENT_DIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\{\s*(?:c|comment|com|ment)(?:(?::\s*|\s+)([^}]*?))?\s*\}$")
        .expect("valid comment-directive regex")
});

static RX_INSTRUMENTAL_DIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\{\s*(?:instrumental|inst|i)(?:(?::\s*|\s+)([^}]*?))?\s*\}$")
        .expect("valid instrumental-directive regex")
});

static RX_DEFINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\{\s*define\s*:\s*([^}]+?)\s*\}$").expect("valid define regex")
});

static RX_PLAIN_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(verse|chorus|bridge|intro|tag|outro)(?:\s+(\d+))?$")
        .expect("valid plain-header regex")
});

static RX_BRACKET_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\[\s*(verse|chorus|bridge|intro|tag|outro)(?:\s+(\d+))?\s*\]$")
        .expect("valid bracket-header regex")
});

/// An environment start/end directive, long or short form.
#[derive(Debug, PartialEq, Eq)]
enum EnvDirective {
    Start { kind: String, label: Option<String> },
    End { kind: String },
}

fn parse_env_directive(trimmed: &str) -> Option<EnvDirective> {
    if let Some(cap) = RX_LONG_DIR.captures(trimmed) {
        let kind = cap[2].to_lowercase();
        return Some(if cap[1].eq_ignore_ascii_case("start_of") {
            EnvDirective::Start {
                kind,
                label: cap.get(3).map(|m| m.as_str().to_string()),
            }
        } else {
            EnvDirective::End { kind }
        });
    }
    if let Some(cap) = RX_SHORT_START.captures(trimmed) {
        let kind = match cap[1].to_lowercase().as_str() {
            "sov" => "verse",
            "soc" => "chorus",
            _ => "bridge",
        };
        return Some(EnvDirective::Start {
            kind: kind.to_string(),
            label: cap.get(2).map(|m| m.as_str().to_string()),
        });
    }
    if let Some(cap) = RX_SHORT_END.captures(trimmed) {
        let kind = match cap[1].to_lowercase().as_str() {
            "eov" => "verse",
            "eoc" => "chorus",
            _ => "bridge",
        };
        return Some(EnvDirective::End {
            kind: kind.to_string(),
        });
    }
    None
}

fn is_env_directive(trimmed: &str) -> bool {
    RX_LONG_DIR.is_match(trimmed)
        || RX_SHORT_START.is_match(trimmed)
        || RX_SHORT_END.is_match(trimmed)
}

/// Parse ChordPro (or legacy header-style) text into a [`Song`].
///
/// Never fails; see the module docs for the tolerance policy.
pub fn parse(text: &str) -> Song {
    let parse_span = span!(Level::DEBUG, "parse_chordpro", input_len = text.len());
    let _enter = parse_span.enter();

    let lines: Vec<&str> = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let has_env = lines.iter().any(|l| is_env_directive(l.trim()));
    trace!(has_env, line_count = lines.len(), "classified input mode");

    let mut song = Song::default();
    // The single active section; local scratch state, nothing global.
    let mut current: Option<Section> = None;
    // A section suspended by a comment/instrumental pseudo-section, resumed
    // by the next content line.
    let mut resume: Option<(String, String)> = None;

    for raw in &lines {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            // Vertical spacing only matters inside a section.
            if let Some(sec) = current.as_mut() {
                sec.lines.push(Line::empty());
            }
            continue;
        }

        if trimmed.starts_with('#') {
            continue;
        }

        // Single-purpose directives take priority over generic metadata.
        if let Some(cap) = RX_CAPO.captures(trimmed) {
            match cap[1].parse::<u32>() {
                Ok(n) => song.capo = Some(n),
                Err(_) => debug!(body = &cap[1], "ignoring non-numeric capo"),
            }
            continue;
        }
        if let Some(cap) = RX_COLUMNS.captures(trimmed) {
            let requested = cap[1].parse::<i64>().unwrap_or(1);
            song.layout_hints.requested_columns = LayoutHints::normalize_columns(requested);
            continue;
        }
        if RX_COLUMN_BREAK.is_match(trimmed) {
            let index = song.sections.len() + usize::from(current.is_some());
            song.layout_hints.column_break_after.push(index);
            continue;
        }
        if !is_env_directive(trimmed) {
            if let Some(cap) = RX_COMMENT_DIR.captures(trimmed) {
                suspend(&mut song, &mut current, &mut resume);
                song.sections
                    .push(Section::comment(cap.get(1).map_or("", |m| m.as_str())));
                continue;
            }
            if let Some(cap) = RX_INSTRUMENTAL_DIR.captures(trimmed) {
                let spec = parse_instrumental_spec(cap.get(1).map_or("", |m| m.as_str()));
                suspend(&mut song, &mut current, &mut resume);
                song.sections.push(Section::instrumental(spec));
                continue;
            }
        }
        if let Some(cap) = RX_DEFINE.captures(trimmed) {
            let raw_body = cap[1].to_string();
            let name = raw_body
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            song.chord_definitions.push(ChordDefinition {
                name,
                raw: raw_body,
            });
            continue;
        }

        // Generic {key: value} metadata, unless the line is an environment
        // directive (whose long form also fits this shape).
        if let Some(cap) = RX_META.captures(trimmed) {
            if !is_env_directive(trimmed) {
                let key = cap[1].to_lowercase();
                let value = cap[2].to_string();
                match key.as_str() {
                    "title" => song.title = Some(value),
                    "key" => song.key = Some(value),
                    "meta" => {
                        let mut parts = value.splitn(2, char::is_whitespace);
                        if let Some(subkey) = parts.next().filter(|k| !k.is_empty()) {
                            song.extra_meta
                                .insert(subkey, parts.next().unwrap_or("").trim());
                        }
                    }
                    _ => song.extra_meta.insert(&key, value),
                }
                continue;
            }
        }

        if has_env {
            if let Some(dir) = parse_env_directive(trimmed) {
                match dir {
                    EnvDirective::Start { kind, label } => {
                        if let Some(sec) = current.take() {
                            song.sections.push(sec);
                        }
                        resume = None;
                        current = Some(Section::new(&kind, label.as_deref()));
                    }
                    EnvDirective::End { kind } => {
                        resume = None;
                        match current.take() {
                            Some(sec) => song.sections.push(sec),
                            // Stray close: tolerated here, surfaced by the linter.
                            None => trace!(kind = %kind, "ignoring stray end directive"),
                        }
                    }
                }
                continue;
            }
            if trimmed.starts_with('{') && trimmed.ends_with('}') {
                debug!(directive = trimmed, "dropping unknown directive");
                continue;
            }
            content_section(&mut current, &mut resume)
                .lines
                .push(parse_inline(raw));
            continue;
        }

        // Legacy mode: bare or bracket-wrapped section headers.
        if let Some((kind, label)) = parse_legacy_header(trimmed) {
            if let Some(sec) = current.take() {
                song.sections.push(sec);
            }
            resume = None;
            current = Some(Section::new(&kind, Some(&label)));
            continue;
        }
        if trimmed.starts_with('{') && trimmed.ends_with('}') {
            debug!(directive = trimmed, "dropping unknown directive");
            continue;
        }
        content_section(&mut current, &mut resume)
            .lines
            .push(parse_inline(raw));
    }

    // An unterminated section closes implicitly at end of input.
    if let Some(sec) = current.take() {
        song.sections.push(sec);
    }

    debug!(
        sections = song.sections.len(),
        title = song.title.as_deref().unwrap_or(""),
        "parsed document"
    );
    song
}

/// Close the active section ahead of a comment/instrumental pseudo-section,
/// remembering where to pick back up. Sections with no lines yet are
/// discarded rather than pushed, so an interruption right after a start
/// directive leaves no empty ghost behind.
fn suspend(song: &mut Song, current: &mut Option<Section>, resume: &mut Option<(String, String)>) {
    if let Some(sec) = current.take() {
        *resume = Some((sec.kind.clone(), sec.label.clone()));
        if !sec.lines.is_empty() {
            song.sections.push(sec);
        }
    }
}

/// The section receiving content lines, opening the suspended one (or an
/// implicit verse) when none is active.
fn content_section<'a>(
    current: &'a mut Option<Section>,
    resume: &mut Option<(String, String)>,
) -> &'a mut Section {
    current.get_or_insert_with(|| match resume.take() {
        Some((kind, label)) => Section::new(&kind, Some(&label)),
        None => Section::new("verse", None),
    })
}

fn parse_legacy_header(trimmed: &str) -> Option<(String, String)> {
    let cap = RX_PLAIN_HEADER
        .captures(trimmed)
        .or_else(|| RX_BRACKET_HEADER.captures(trimmed))?;
    let kind = cap[1].to_lowercase();
    let label = match cap.get(2) {
        Some(number) => format!("{} {}", crate::song::title_case(&kind), number.as_str()),
        None => crate::song::title_case(&kind),
    };
    Some((kind, label))
}

/// Extract inline `[chord]` markers from a content line.
///
/// Each placement's `index` is the character length of the plain text
/// accumulated so far — a position in the output string, not the input.
/// `[]` is not a chord and stays literal text; an unclosed `[` is literal.
pub(crate) fn parse_inline(line: &str) -> Line {
    let mut plain = String::new();
    let mut plain_chars = 0usize;
    let mut chords = Vec::new();
    let mut rest = line;

    while let Some(open) = rest.find('[') {
        let Some(close_rel) = rest[open + 1..].find(']') else {
            break;
        };
        let close = open + 1 + close_rel;
        if close == open + 1 {
            // literal "[]"
            let through = &rest[..=close];
            plain.push_str(through);
            plain_chars += through.chars().count();
            rest = &rest[close + 1..];
            continue;
        }
        let before = &rest[..open];
        plain.push_str(before);
        plain_chars += before.chars().count();
        chords.push(ChordPlacement::new(&rest[open + 1..close], plain_chars));
        rest = &rest[close + 1..];
    }
    plain.push_str(rest);
    Line::Lyric {
        lyrics: plain,
        chords,
    }
}

/// One token of an instrumental directive body.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SpecToken {
    Chord(String),
    Repeat(u32),
}

/// Parse an `{instrumental: ...}` body.
///
/// The body is either comma-separated (`"D, A, Bm, G x2"`) or
/// whitespace-separated (`"D A Bm G x2"`); both tokenize into the same
/// chord/repeat stream, consumed by one reducer. A standalone `x<digits>`
/// token is a repeat marker; `<chord>x<digits>` splits into both. The last
/// repeat wins and is kept only when greater than one.
pub(crate) fn parse_instrumental_spec(body: &str) -> InstrumentalDirective {
    let mut tokens = Vec::new();
    if body.contains(',') {
        for piece in body.split(',') {
            for word in piece.split_whitespace() {
                push_spec_token(&mut tokens, word);
            }
        }
    } else {
        for word in body.split_whitespace() {
            push_spec_token(&mut tokens, word);
        }
    }

    let mut chords = Vec::new();
    let mut repeat = None;
    for token in tokens {
        match token {
            SpecToken::Chord(sym) => chords.push(sym),
            SpecToken::Repeat(n) => repeat = (n > 1).then_some(n),
        }
    }
    InstrumentalDirective { chords, repeat }
}

fn push_spec_token(tokens: &mut Vec<SpecToken>, word: &str) {
    if let Some(n) = repeat_count(word) {
        tokens.push(SpecToken::Repeat(n));
        return;
    }
    // Attached form: "Bm7x2" is a chord plus a repeat with no separator.
    if let Some(pos) = word.rfind('x') {
        let digits = &word[pos + 1..];
        if pos > 0 && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = digits.parse::<u32>() {
                tokens.push(SpecToken::Chord(word[..pos].to_string()));
                tokens.push(SpecToken::Repeat(n));
                return;
            }
        }
    }
    tokens.push(SpecToken::Chord(word.to_string()));
}

fn repeat_count(word: &str) -> Option<u32> {
    let digits = word.strip_prefix('x')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
