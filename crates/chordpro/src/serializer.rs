//! Serializer: a [`Song`] back to ChordPro text
//!
//! Two output forms: the canonical directive form (the round-trip form) and
//! a legacy plain form for display or export to header-style consumers. The
//! serializer never mutates the document it is given and has no error
//! conditions — absent fields are simply omitted.
//!
//! Round-trip contract: for any document produced by the parser,
//! `parse(serialize(doc, &SerializeOptions::default()))` preserves the
//! section count, each section's label, each section's line count, each
//! line's lyrics, and each line's chord count and order.

use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::song::{title_case, ChordPlacement, InstrumentalDirective, Line, Section, Song};

/// Output options for [`serialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Emit `{start_of_x}`/`{end_of_x}` environments (canonical form) when
    /// true, bare header lines (legacy form) when false.
    pub use_directives: bool,
    /// Emit the metadata block ahead of the sections.
    pub include_meta: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            use_directives: true,
            include_meta: true,
        }
    }
}

/// Strip brace characters that would corrupt a directive body.
fn clean(s: &str) -> String {
    s.replace(['{', '}'], "").trim().to_string()
}

/// Render a song to text.
pub fn serialize(song: &Song, opts: &SerializeOptions) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if opts.include_meta {
        let meta = meta_block(song);
        if !meta.is_empty() {
            blocks.push(meta.join("\n"));
        }
    }

    for (i, sec) in song.sections.iter().enumerate() {
        let mut block = if opts.use_directives {
            directive_section(sec)
        } else {
            legacy_section(sec)
        };
        if song.layout_hints.column_break_after.contains(&(i + 1)) {
            block.push("{column_break}".to_string());
        }
        blocks.push(block.join("\n"));
    }

    debug!(
        sections = song.sections.len(),
        use_directives = opts.use_directives,
        "serialized document"
    );
    blocks.join("\n\n")
}

fn meta_block(song: &Song) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(title) = song.title.as_deref() {
        let title = clean(title);
        if !title.is_empty() {
            out.push(format!("{{title: {}}}", title));
        }
    }
    if let Some(key) = song.key.as_deref() {
        let key = clean(key);
        if !key.is_empty() {
            out.push(format!("{{key: {}}}", key));
        }
    }
    if let Some(capo) = song.capo {
        out.push(format!("{{capo: {}}}", capo));
    }
    for def in &song.chord_definitions {
        out.push(format!("{{define: {}}}", def.raw));
    }
    if song.layout_hints.requested_columns == 2 {
        out.push("{columns: 2}".to_string());
    }
    for (key, value) in song.extra_meta.iter() {
        if value.is_empty() {
            continue;
        }
        out.push(format!("{{{}: {}}}", key, value));
    }
    out
}

fn directive_section(sec: &Section) -> Vec<String> {
    // Pseudo-sections re-emit as the bare directive that created them.
    if sec.kind == "comment" || sec.kind == "instrumental" {
        let mut block: Vec<String> = sec.lines.iter().map(line_to_text).collect();
        if block.is_empty() {
            if let Some(spec) = &sec.instrumental {
                block.push(instrumental_directive(spec));
            }
        }
        return block;
    }

    let label = clean(&sec.label);
    let mut block = Vec::with_capacity(sec.lines.len() + 2);
    if label.is_empty() {
        block.push(format!("{{start_of_{}}}", sec.kind));
    } else {
        block.push(format!("{{start_of_{}: {}}}", sec.kind, label));
    }
    for line in &sec.lines {
        block.push(line_to_text(line));
    }
    block.push(format!("{{end_of_{}}}", sec.kind));
    block
}

fn legacy_section(sec: &Section) -> Vec<String> {
    match sec.kind.as_str() {
        "comment" => sec
            .lines
            .iter()
            .map(|ln| match ln {
                Line::Comment { comment } => comment.clone(),
                other => line_to_text(other),
            })
            .collect(),
        "instrumental" => {
            let mut block: Vec<String> = sec
                .lines
                .iter()
                .map(|ln| match ln {
                    Line::Instrumental { instrumental } => instrumental_row(instrumental),
                    other => line_to_text(other),
                })
                .collect();
            if block.is_empty() {
                if let Some(spec) = &sec.instrumental {
                    block.push(instrumental_row(spec));
                }
            }
            block
        }
        _ => {
            let mut header = clean(&sec.label);
            if header.is_empty() {
                header = title_case(&sec.kind);
            }
            if header.is_empty() {
                header = "Verse".to_string();
            }
            let mut block = Vec::with_capacity(sec.lines.len() + 1);
            block.push(header);
            for line in &sec.lines {
                block.push(match line {
                    Line::Comment { comment } => comment.clone(),
                    Line::Instrumental { instrumental } => instrumental_row(instrumental),
                    lyric => line_to_text(lyric),
                });
            }
            block
        }
    }
}

fn line_to_text(line: &Line) -> String {
    match line {
        Line::Lyric { lyrics, chords } => line_with_chords(lyrics, chords),
        Line::Comment { comment } => format!("{{c: {}}}", comment),
        Line::Instrumental { instrumental } => instrumental_directive(instrumental),
    }
}

/// Format an instrumental spec as a directive line.
fn instrumental_directive(spec: &InstrumentalDirective) -> String {
    let body = instrumental_body(spec);
    if body.is_empty() {
        "{instrumental}".to_string()
    } else {
        format!("{{instrumental: {}}}", body)
    }
}

/// Comma-joined chord list with the repeat riding on the last token.
fn instrumental_body(spec: &InstrumentalDirective) -> String {
    if spec.chords.is_empty() {
        return spec.repeat.map(|n| format!("x{}", n)).unwrap_or_default();
    }
    let mut parts = spec.chords.clone();
    if let Some(n) = spec.repeat {
        if let Some(last) = parts.last_mut() {
            last.push_str(&format!(" x{}", n));
        }
    }
    parts.join(", ")
}

/// Legacy display row: `D  //  A  //  Bm x2`.
fn instrumental_row(spec: &InstrumentalDirective) -> String {
    if spec.chords.is_empty() {
        return spec.repeat.map(|n| format!("x{}", n)).unwrap_or_default();
    }
    let mut parts = spec.chords.clone();
    if let Some(n) = spec.repeat {
        if let Some(last) = parts.last_mut() {
            last.push_str(&format!(" x{}", n));
        }
    }
    parts.join("  //  ")
}

/// Re-insert `[chord]` markers into a plain lyric line.
///
/// Walks the lyric characters; at each position every placement anchored
/// there is emitted first, in original array order and with no separator,
/// which is how several chords on one syllable round-trip as `[G][C][D]`.
/// Placements at `index == len` land after the last character. The result
/// is right-trimmed of spaces and tabs.
pub fn line_with_chords(lyrics: &str, chords: &[ChordPlacement]) -> String {
    if chords.is_empty() {
        return lyrics.to_string();
    }
    let chars: Vec<char> = lyrics.chars().collect();
    let mut out = String::new();
    for i in 0..=chars.len() {
        for placement in chords.iter().filter(|c| c.index == i) {
            out.push('[');
            out.push_str(&placement.sym);
            out.push(']');
        }
        if i < chars.len() {
            out.push(chars[i]);
        }
    }
    out.trim_end_matches([' ', '\t']).to_string()
}

/// Monospace chord line for text preview: each symbol is padded so it
/// starts in the display column of its anchor character. Column arithmetic
/// uses display width, so wide glyphs in the lyrics keep chords aligned.
pub fn chord_line(lyrics: &str, chords: &[ChordPlacement]) -> String {
    if chords.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = lyrics.chars().collect();
    let mut out = String::new();
    let mut cursor = 0usize;
    for placement in chords {
        let prefix: String = chars.iter().take(placement.index).collect();
        let column = UnicodeWidthStr::width(prefix.as_str());
        if column > cursor {
            out.push_str(&" ".repeat(column - cursor));
            cursor = column;
        }
        out.push_str(&placement.sym);
        cursor += UnicodeWidthStr::width(placement.sym.as_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::song::{ChordDefinition, ExtraMeta};

    fn directive_opts() -> SerializeOptions {
        SerializeOptions::default()
    }

    fn legacy_opts() -> SerializeOptions {
        SerializeOptions {
            use_directives: false,
            include_meta: false,
        }
    }

    #[test]
    fn test_meta_block_order_and_skips() {
        let mut song = Song {
            title: Some("Sample Song".into()),
            key: Some("C".into()),
            capo: Some(3),
            ..Song::default()
        };
        song.chord_definitions.push(ChordDefinition {
            name: "G".into(),
            raw: "G 320003 23xxxx".into(),
        });
        song.layout_hints.requested_columns = 2;
        let mut extra = ExtraMeta::new();
        extra.insert("country", "USA");
        extra.insert("blankish", "");
        extra.insert("youtube", "abc123");
        song.extra_meta = extra;

        let out = serialize(&song, &directive_opts());
        let expected = "{title: Sample Song}\n{key: C}\n{capo: 3}\n{define: G 320003 23xxxx}\n{columns: 2}\n{country: USA}\n{youtube: abc123}";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_line_with_chords_inserts_and_collides() {
        let out = line_with_chords(
            "Hello world",
            &[ChordPlacement::new("G", 0), ChordPlacement::new("D", 6)],
        );
        assert_eq!(out, "[G]Hello [D]world");

        let out = line_with_chords(
            "",
            &[
                ChordPlacement::new("G", 0),
                ChordPlacement::new("C", 0),
                ChordPlacement::new("D", 0),
            ],
        );
        assert_eq!(out, "[G][C][D]");
    }

    #[test]
    fn test_line_with_chords_trailing_placement() {
        let out = line_with_chords("end", &[ChordPlacement::new("D", 3)]);
        assert_eq!(out, "end[D]");
    }

    #[test]
    fn test_line_with_chords_right_trims() {
        let out = line_with_chords("words  ", &[ChordPlacement::new("G", 0)]);
        assert_eq!(out, "[G]words");
        // without chords the line passes through untouched
        assert_eq!(line_with_chords("words  ", &[]), "words  ");
    }

    #[test]
    fn test_directive_sections_and_labels() {
        let song = parse("{start_of_verse: Verse 2}\nhi\n{end_of_verse}\n");
        let out = serialize(&song, &directive_opts());
        assert_eq!(out, "{start_of_verse: Verse 2}\nhi\n{end_of_verse}");
    }

    #[test]
    fn test_empty_section_emits_no_body_line() {
        let song = parse("{start_of_chorus}\n{end_of_chorus}\n");
        let out = serialize(&song, &directive_opts());
        assert_eq!(out, "{start_of_chorus: Chorus}\n{end_of_chorus}");
        let again = parse(&out);
        assert_eq!(again.sections.len(), 1);
        assert_eq!(again.sections[0].lines.len(), 0);
    }

    #[test]
    fn test_comment_and_instrumental_sections() {
        let song = parse("{c: Pick soft}\n{i: Em, D, Am7, Bm7 x2}\n");
        let out = serialize(&song, &directive_opts());
        assert_eq!(out, "{c: Pick soft}\n\n{instrumental: Em, D, Am7, Bm7 x2}");
    }

    #[test]
    fn test_bare_repeat_instrumental() {
        let song = parse("{instrumental: x2}\n");
        let out = serialize(&song, &directive_opts());
        assert_eq!(out, "{instrumental: x2}");
    }

    #[test]
    fn test_column_break_reinserted_after_section() {
        let input = "{sov}\nLine\n{eov}\n{column_break}\n{soc}\nHook\n{eoc}\n";
        let song = parse(input);
        let out = serialize(&song, &directive_opts());
        let lines: Vec<&str> = out.lines().collect();
        let end_pos = lines.iter().position(|l| *l == "{end_of_verse}").unwrap();
        assert_eq!(lines[end_pos + 1], "{column_break}");

        // and it survives another cycle at the same logical position
        let again = parse(&out);
        assert_eq!(
            again.layout_hints.column_break_after,
            song.layout_hints.column_break_after
        );
    }

    #[test]
    fn test_legacy_output_uses_headers() {
        let song = parse("Verse 1\n[C]Line one\n[G]Line two\n\nChorus\n[F]Hook a\n[C]Hook b\n");
        let out = serialize(&song, &legacy_opts());
        assert!(out.starts_with("Verse 1\n"));
        assert!(out.contains("\nChorus\n"));
        assert!(!out.contains("{start_of_"));
    }

    #[test]
    fn test_legacy_instrumental_renders_chord_slash_row() {
        let song = parse("{inst D, A, Bm, G x2}\n");
        let out = serialize(&song, &legacy_opts());
        assert_eq!(out, "D  //  A  //  Bm  //  G x2");
    }

    #[test]
    fn test_chord_line_alignment() {
        let chords = vec![ChordPlacement::new("G", 0), ChordPlacement::new("D", 6)];
        assert_eq!(chord_line("Hello world", &chords), "G     D");
        assert_eq!(chord_line("anything", &[]), "");
    }

    #[test]
    fn test_chord_line_does_not_collapse_adjacent_symbols() {
        let chords = vec![
            ChordPlacement::new("Gmaj7", 0),
            ChordPlacement::new("D", 2),
        ];
        // Gmaj7 is wider than the two columns to D's anchor; D follows
        // immediately rather than overlapping.
        assert_eq!(chord_line("go now", &chords), "Gmaj7D");
    }

    #[test]
    fn test_serialize_without_meta() {
        let song = parse("{title: Demo}\n{sov}\nhi\n{eov}\n");
        let opts = SerializeOptions {
            use_directives: true,
            include_meta: false,
        };
        let out = serialize(&song, &opts);
        assert!(!out.contains("{title:"));
        assert!(out.contains("{start_of_verse"));
    }

    #[test]
    fn test_labels_with_braces_are_cleaned() {
        let song = parse("{sov {sneaky}}\nhi\n{eov}\n");
        // the parser already refuses the brace inside, but a hand-built
        // document must not corrupt the directive either
        let mut song = song;
        if let Some(sec) = song.sections.first_mut() {
            sec.label = "We{ir}d".to_string();
        }
        let out = serialize(&song, &directive_opts());
        assert!(out.contains("{start_of_verse: Weird}"));
    }
}
