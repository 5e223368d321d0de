//! Document model for ChordPro lead sheets
//!
//! Plain value types shared by the parser, serializer, and linter. The
//! parser creates them fresh for each input; nothing in this module mutates
//! a document in place — transposition helpers return new values.

use serde::{Deserialize, Serialize};

use crate::transpose::transpose_sym_prefer;

/// A chord symbol anchored to a character offset in a lyric line.
///
/// `index` counts characters of the *plain* lyric text (after chord-bracket
/// removal), never positions in the raw source line. Several placements may
/// share one index; their order in the containing `Vec` is significant and
/// survives a serialize → reparse cycle verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordPlacement {
    pub sym: String,
    pub index: usize,
}

impl ChordPlacement {
    pub fn new(sym: impl Into<String>, index: usize) -> Self {
        Self {
            sym: sym.into(),
            index,
        }
    }

    /// Transpose the symbol, leaving the anchor untouched.
    pub fn transposed(&self, steps: i32, prefer_flat: bool) -> Self {
        Self {
            sym: transpose_sym_prefer(&self.sym, steps, prefer_flat),
            index: self.index,
        }
    }
}

/// A chord progression played without words, with an optional repeat count.
///
/// `chords` may be empty, which represents a bare repeat marker such as
/// `{instrumental: x2}`. `repeat` is only ever `Some(n)` for `n > 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentalDirective {
    pub chords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<u32>,
}

impl InstrumentalDirective {
    pub fn new(chords: Vec<String>) -> Self {
        Self {
            chords,
            repeat: None,
        }
    }

    /// Build a directive, keeping the repeat only when it is meaningful.
    pub fn with_repeat(chords: Vec<String>, repeat: u32) -> Self {
        Self {
            chords,
            repeat: (repeat > 1).then_some(repeat),
        }
    }

    /// Map every chord through the transposition engine; the repeat count
    /// is structural and never changes.
    pub fn transposed(&self, steps: i32, prefer_flat: bool) -> Self {
        if steps == 0 {
            return self.clone();
        }
        Self {
            chords: self
                .chords
                .iter()
                .map(|sym| transpose_sym_prefer(sym, steps, prefer_flat))
                .collect(),
            repeat: self.repeat,
        }
    }
}

/// One line of a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Line {
    /// Lyric text with zero or more anchored chords. A blank source line
    /// inside an open section becomes `lyrics: ""` to preserve vertical
    /// spacing.
    Lyric {
        lyrics: String,
        chords: Vec<ChordPlacement>,
    },
    /// A `{c: ...}` comment.
    Comment { comment: String },
    /// An instrumental progression.
    Instrumental { instrumental: InstrumentalDirective },
}

impl Line {
    /// The empty lyric line produced for blank source lines.
    pub fn empty() -> Self {
        Line::Lyric {
            lyrics: String::new(),
            chords: Vec::new(),
        }
    }

    pub fn lyric(lyrics: impl Into<String>, chords: Vec<ChordPlacement>) -> Self {
        Line::Lyric {
            lyrics: lyrics.into(),
            chords,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Line::Comment { .. })
    }

    /// Lyric text, when this is a lyric line.
    pub fn lyrics(&self) -> Option<&str> {
        match self {
            Line::Lyric { lyrics, .. } => Some(lyrics),
            _ => None,
        }
    }

    /// Chord placements, empty for non-lyric lines.
    pub fn chords(&self) -> &[ChordPlacement] {
        match self {
            Line::Lyric { chords, .. } => chords,
            _ => &[],
        }
    }

    fn transposed(&self, steps: i32, prefer_flat: bool) -> Self {
        match self {
            Line::Lyric { lyrics, chords } => Line::Lyric {
                lyrics: lyrics.clone(),
                chords: chords
                    .iter()
                    .map(|c| c.transposed(steps, prefer_flat))
                    .collect(),
            },
            Line::Comment { .. } => self.clone(),
            Line::Instrumental { instrumental } => Line::Instrumental {
                instrumental: instrumental.transposed(steps, prefer_flat),
            },
        }
    }
}

/// A block of lines with a semantic kind (verse, chorus, bridge, ...).
///
/// `kind` is always non-empty; `label` falls back to the title-cased kind
/// when the source gave none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: String,
    pub label: String,
    pub lines: Vec<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrumental: Option<InstrumentalDirective>,
}

impl Section {
    /// Open a section of `kind`, deriving the label when none is given.
    pub fn new(kind: &str, label: Option<&str>) -> Self {
        let kind = kind.to_lowercase();
        let label = match label {
            Some(l) if !l.trim().is_empty() => l.trim().to_string(),
            _ => title_case(&kind),
        };
        Self {
            kind,
            label,
            lines: Vec::new(),
            instrumental: None,
        }
    }

    /// A standalone `{c: ...}` pseudo-section.
    pub fn comment(text: &str) -> Self {
        let mut sec = Section::new("comment", None);
        sec.lines.push(Line::Comment {
            comment: text.to_string(),
        });
        sec
    }

    /// A standalone `{instrumental: ...}` pseudo-section.
    pub fn instrumental(spec: InstrumentalDirective) -> Self {
        let mut sec = Section::new("instrumental", None);
        sec.instrumental = Some(spec.clone());
        sec.lines.push(Line::Instrumental { instrumental: spec });
        sec
    }

    /// Lines that carry musical content (everything but comments).
    pub fn content_lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter().filter(|ln| !ln.is_comment())
    }

    pub fn transposed(&self, steps: i32, prefer_flat: bool) -> Self {
        Self {
            kind: self.kind.clone(),
            label: self.label.clone(),
            lines: self
                .lines
                .iter()
                .map(|ln| ln.transposed(steps, prefer_flat))
                .collect(),
            instrumental: self
                .instrumental
                .as_ref()
                .map(|spec| spec.transposed(steps, prefer_flat)),
        }
    }
}

/// Arbitrary metadata entries in source order.
///
/// Keys are case-insensitive and stored lowercase. Insertion order is part
/// of the serializer's contract, so this is a thin wrapper over a `Vec`
/// rather than a map: re-inserting an existing key replaces the value in
/// place without moving the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraMeta(Vec<(String, String)>);

impl ExtraMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let key = key.trim().to_lowercase();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.trim().to_lowercase();
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Column layout requests recorded at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutHints {
    /// 1 or 2; any other requested value normalizes to 1.
    pub requested_columns: u8,
    /// Zero-based section indices after which a `{column_break}` occurred.
    pub column_break_after: Vec<usize>,
}

impl Default for LayoutHints {
    fn default() -> Self {
        Self {
            requested_columns: 1,
            column_break_after: Vec::new(),
        }
    }
}

impl LayoutHints {
    /// Clamp a requested column count to the supported set.
    pub fn normalize_columns(requested: i64) -> u8 {
        if requested == 2 {
            2
        } else {
            1
        }
    }
}

/// An opaque `{define: ...}` chord fingering, retained verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordDefinition {
    pub name: String,
    pub raw: String,
}

/// A parsed lead sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capo: Option<u32>,
    pub extra_meta: ExtraMeta,
    pub sections: Vec<Section>,
    pub layout_hints: LayoutHints,
    pub chord_definitions: Vec<ChordDefinition>,
}

impl Song {
    /// Build a new document with every chord placement, instrumental chord,
    /// and the key shifted by `steps` semitones. Structure, lyrics, layout
    /// hints, and chord definitions are untouched; zero steps is a clone.
    ///
    /// The transposition engine itself never sees a document — this is the
    /// caller-side mapping over the model.
    pub fn transposed(&self, steps: i32, prefer_flat: bool) -> Self {
        if steps == 0 {
            return self.clone();
        }
        Self {
            title: self.title.clone(),
            key: self
                .key
                .as_ref()
                .map(|k| transpose_sym_prefer(k, steps, prefer_flat)),
            capo: self.capo,
            extra_meta: self.extra_meta.clone(),
            sections: self
                .sections
                .iter()
                .map(|sec| sec.transposed(steps, prefer_flat))
                .collect(),
            layout_hints: self.layout_hints.clone(),
            chord_definitions: self.chord_definitions.clone(),
        }
    }
}

/// Title-case a section kind: `"verse"` becomes `"Verse"`.
pub(crate) fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_label_defaults_to_title_cased_kind() {
        let sec = Section::new("CHORUS", None);
        assert_eq!(sec.kind, "chorus");
        assert_eq!(sec.label, "Chorus");

        let labeled = Section::new("verse", Some("Verse 2"));
        assert_eq!(labeled.label, "Verse 2");

        let blank_label = Section::new("bridge", Some("   "));
        assert_eq!(blank_label.label, "Bridge");
    }

    #[test]
    fn test_extra_meta_preserves_insertion_order() {
        let mut meta = ExtraMeta::new();
        meta.insert("Country", "USA");
        meta.insert("tags", "hymn, slow");
        meta.insert("country", "Canada");

        let entries: Vec<_> = meta.iter().collect();
        assert_eq!(
            entries,
            vec![("country", "Canada"), ("tags", "hymn, slow")]
        );
        assert_eq!(meta.get("COUNTRY"), Some("Canada"));
    }

    #[test]
    fn test_instrumental_repeat_only_kept_when_meaningful() {
        let spec = InstrumentalDirective::with_repeat(vec!["D".into()], 1);
        assert_eq!(spec.repeat, None);

        let spec = InstrumentalDirective::with_repeat(vec!["D".into()], 2);
        assert_eq!(spec.repeat, Some(2));
    }

    #[test]
    fn test_layout_hints_normalize_columns() {
        assert_eq!(LayoutHints::normalize_columns(2), 2);
        assert_eq!(LayoutHints::normalize_columns(1), 1);
        assert_eq!(LayoutHints::normalize_columns(3), 1);
        assert_eq!(LayoutHints::normalize_columns(0), 1);
        assert_eq!(LayoutHints::normalize_columns(-4), 1);
    }

    #[test]
    fn test_song_transposed_maps_chords_and_key() {
        let mut song = Song {
            key: Some("G".to_string()),
            ..Song::default()
        };
        let mut sec = Section::new("verse", None);
        sec.lines.push(Line::lyric(
            "Hello",
            vec![ChordPlacement::new("G", 0), ChordPlacement::new("D/F#", 3)],
        ));
        song.sections.push(sec);

        let up = song.transposed(2, false);
        assert_eq!(up.key.as_deref(), Some("A"));
        assert_eq!(up.sections[0].lines[0].chords()[0].sym, "A");
        assert_eq!(up.sections[0].lines[0].chords()[1].sym, "E/G#");
        assert_eq!(up.sections[0].lines[0].lyrics(), Some("Hello"));

        // zero steps is byte-for-byte identical
        assert_eq!(song.transposed(0, false), song);
    }

    #[test]
    fn test_instrumental_transposed_keeps_repeat() {
        let spec = InstrumentalDirective::with_repeat(vec!["Em".into(), "D".into()], 2);
        let up = spec.transposed(2, false);
        assert_eq!(up.chords, vec!["F#m", "E"]);
        assert_eq!(up.repeat, Some(2));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("verse"), "Verse");
        assert_eq!(title_case("CHORUS"), "Chorus");
        assert_eq!(title_case(""), "");
    }
}
