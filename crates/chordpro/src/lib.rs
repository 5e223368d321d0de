//! chordpro - Parse, transpose, serialize, and lint ChordPro lead sheets
//!
//! A library for the ChordPro document model: a tolerant parser that turns
//! raw lead-sheet text into a structured [`Song`], a transposition engine
//! over chord and key strings, a serializer that renders documents back to
//! text (canonical directive form or legacy plain form) with a round-trip
//! guarantee, and a linter that flags structural problems without touching
//! the document.
//!
//! # Quick Start
//!
//! ```rust
//! use chordpro::parse;
//!
//! let song = parse("{title: Demo}\n{key: G}\n{sov}\n[G]Hello [D]world\n{eov}\n");
//! assert_eq!(song.title.as_deref(), Some("Demo"));
//! assert_eq!(song.sections[0].lines[0].lyrics(), Some("Hello world"));
//! ```
//!
//! # Transposing
//!
//! The engine works on strings and never holds a document; mapping it over
//! a [`Song`] is the caller's job, packaged as [`Song::transposed`]:
//!
//! ```rust
//! use chordpro::{parse, serialize, transpose::steps_between, SerializeOptions};
//!
//! let song = parse("{key: G}\n{sov}\n[G]Hello [D]world\n{eov}\n");
//! let steps = steps_between("G", "A") as i32;
//! let higher = song.transposed(steps, false);
//! assert_eq!(higher.key.as_deref(), Some("A"));
//!
//! let text = serialize(&higher, &SerializeOptions::default());
//! assert!(text.contains("[A]Hello [E]world"));
//! ```
//!
//! # Error handling
//!
//! There is none to speak of, by design: `parse` accepts any input and
//! degrades gracefully (unknown directives vanish, unmatched closes are
//! ignored, unterminated sections auto-close), the transposition functions
//! pass unrecognized symbols through, and `serialize` omits absent fields.
//! Only [`lint`] reports problems, and those are plain values, not errors.

pub mod canonical;
pub mod lint;
pub mod logging;
pub mod parser;
pub mod serializer;
pub mod song;
pub mod transpose;

pub use canonical::{suggest_canonical_filename, to_canonical};
pub use lint::{lint, lint_song, Warning, WarningCode};
pub use parser::parse;
pub use serializer::{chord_line, serialize, SerializeOptions};
pub use song::{
    ChordDefinition, ChordPlacement, ExtraMeta, InstrumentalDirective, LayoutHints, Line, Section,
    Song,
};
pub use transpose::{
    format_key, key_root, steps_between, transpose_sym, transpose_sym_prefer, Accidental,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serialize_facade() {
        let song = parse("{title: Demo}\n{sov}\n[G]hi\n{eov}\n");
        let text = serialize(&song, &SerializeOptions::default());
        assert!(text.contains("{title: Demo}"));
        assert!(text.contains("[G]hi"));
    }

    #[test]
    fn test_transpose_facade() {
        assert_eq!(transpose_sym("G", 2), "A");
        assert_eq!(steps_between("F#", "Gb"), 0);
    }

    #[test]
    fn test_lint_facade() {
        let warnings = lint("{sov}\nhello\n{eov}\n");
        assert!(warnings.iter().any(|w| w.code == WarningCode::MissingTitle));
    }
}
