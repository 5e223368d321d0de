//! Transposition engine: pitch-class arithmetic over chord and key strings
//!
//! Operates on strings only and never touches a document. Everything after
//! a chord's root is an opaque suffix that is carried along unchanged, which
//! keeps the arithmetic correct for inputs like `Gsus4/B` or `C#m7b5`
//! without needing a full chord grammar. Unrecognized roots (and degenerate
//! tokens like `N.C.`) pass through untouched — there are no error
//! conditions here.

/// The twelve pitch classes in sharp spelling, `C` first.
pub const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// The same pitch classes with flat names for the five accidentals.
pub const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Enharmonic spelling preference for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accidental {
    #[default]
    Sharp,
    Flat,
}

/// Map a flat-spelled root onto its sharp equivalent; anything else is
/// returned as-is.
fn normalize_root(root: &str) -> &str {
    match root {
        "Db" => "C#",
        "Eb" => "D#",
        "Gb" => "F#",
        "Ab" => "G#",
        "Bb" => "A#",
        other => other,
    }
}

/// Index of a (possibly flat-spelled) root in the sharp table.
fn pitch_index(root: &str) -> Option<usize> {
    let normalized = normalize_root(root);
    SHARP_NAMES.iter().position(|name| *name == normalized)
}

/// Split a symbol into its leading `[A-G][#b]?` root and the rest.
fn split_root(sym: &str) -> Option<(&str, &str)> {
    let mut indices = sym.char_indices();
    let (_, first) = indices.next()?;
    if !('A'..='G').contains(&first) {
        return None;
    }
    let root_end = match indices.next() {
        Some((i, '#')) | Some((i, 'b')) => i + 1,
        Some((i, _)) => i,
        None => sym.len(),
    };
    Some((&sym[..root_end], &sym[root_end..]))
}

/// Extract the canonical sharp-spelled root of a key or chord string.
///
/// The leading `[A-G][#b]?` token is matched after skipping leading
/// whitespace; a minor `m` suffix is ignored. Returns `None` when the
/// string carries no recognizable root.
///
/// ```
/// use chordpro::transpose::key_root;
///
/// assert_eq!(key_root("Em"), Some("E"));
/// assert_eq!(key_root("Bb"), Some("A#"));
/// assert_eq!(key_root("N.C."), None);
/// ```
pub fn key_root(key: &str) -> Option<&'static str> {
    let (root, _) = split_root(key.trim_start())?;
    let idx = pitch_index(root)?;
    Some(SHARP_NAMES[idx])
}

/// Forward distance in semitones from `from_key` up to `to_key`, in 0..=11.
///
/// Always non-negative — call sites derive "up vs. down" on their own, and
/// some rely on this range. Returns 0 when either root cannot be resolved.
/// Enharmonic spellings of one pitch class are zero steps apart.
pub fn steps_between(from_key: &str, to_key: &str) -> u8 {
    let (Some(from), Some(to)) = (
        key_root(from_key).and_then(pitch_index),
        key_root(to_key).and_then(pitch_index),
    ) else {
        return 0;
    };
    (to as i32 - from as i32).rem_euclid(12) as u8
}

fn shift(sym: &str, steps: i32, prefer_flat: bool) -> String {
    // Slash chords: both halves transpose independently. A bass half with
    // no recognizable root passes through while the root half still moves.
    if let Some((root_half, bass_half)) = sym.split_once('/') {
        return format!(
            "{}/{}",
            shift(root_half, steps, prefer_flat),
            shift(bass_half, steps, prefer_flat)
        );
    }
    let Some((root, suffix)) = split_root(sym) else {
        return sym.to_string();
    };
    let Some(idx) = pitch_index(root) else {
        return sym.to_string();
    };
    let shifted = (idx as i32 + steps).rem_euclid(12) as usize;
    let name = if prefer_flat {
        FLAT_NAMES[shifted]
    } else {
        SHARP_NAMES[shifted]
    };
    format!("{}{}", name, suffix)
}

/// Transpose a chord symbol by `steps` semitones, sharp-spelled.
///
/// The quality/extension suffix is preserved untouched; unrecognized
/// symbols are returned unchanged.
///
/// ```
/// use chordpro::transpose::transpose_sym;
///
/// assert_eq!(transpose_sym("G", 2), "A");
/// assert_eq!(transpose_sym("Em", 2), "F#m");
/// assert_eq!(transpose_sym("C/G", 2), "D/A");
/// assert_eq!(transpose_sym("Dsus4", -2), "Csus4");
/// ```
pub fn transpose_sym(sym: &str, steps: i32) -> String {
    if steps == 0 {
        return sym.to_string();
    }
    shift(sym, steps, false)
}

/// Like [`transpose_sym`], but spell the result from the flat table when
/// `prefer_flat` is set.
pub fn transpose_sym_prefer(sym: &str, steps: i32, prefer_flat: bool) -> String {
    if steps == 0 {
        return sym.to_string();
    }
    shift(sym, steps, prefer_flat)
}

/// Display-only enharmonic respelling of a key's root; the suffix (for
/// example a minor `m`) is preserved. Strings without a recognizable root
/// come back unchanged.
pub fn format_key(key: &str, preference: Accidental) -> String {
    let Some((root, suffix)) = split_root(key) else {
        return key.to_string();
    };
    let Some(idx) = pitch_index(root) else {
        return key.to_string();
    };
    let name = match preference {
        Accidental::Sharp => SHARP_NAMES[idx],
        Accidental::Flat => FLAT_NAMES[idx],
    };
    format!("{}{}", name, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_root_normalizes_flats() {
        assert_eq!(key_root("C"), Some("C"));
        assert_eq!(key_root("Db"), Some("C#"));
        assert_eq!(key_root("Eb"), Some("D#"));
        assert_eq!(key_root("Gb"), Some("F#"));
        assert_eq!(key_root("Ab"), Some("G#"));
        assert_eq!(key_root("Bb"), Some("A#"));
        assert_eq!(key_root("  F#m"), Some("F#"));
        assert_eq!(key_root("Em7"), Some("E"));
    }

    #[test]
    fn test_key_root_rejects_non_roots() {
        assert_eq!(key_root(""), None);
        assert_eq!(key_root("H"), None);
        assert_eq!(key_root("x2"), None);
        assert_eq!(key_root("N.C."), None);
    }

    #[test]
    fn test_steps_between_identity_across_spellings() {
        assert_eq!(steps_between("F#", "Gb"), 0);
        assert_eq!(steps_between("C#", "Db"), 0);
        assert_eq!(steps_between("A#", "Bb"), 0);
        assert_eq!(steps_between("G", "G"), 0);
        assert_eq!(steps_between("Am", "A"), 0);
    }

    #[test]
    fn test_steps_between_is_forward_distance() {
        assert_eq!(steps_between("G", "A"), 2);
        assert_eq!(steps_between("A", "G"), 10);
        assert_eq!(steps_between("C", "B"), 11);
        assert_eq!(steps_between("Em", "G"), 3);
    }

    #[test]
    fn test_steps_between_unresolvable_is_zero() {
        assert_eq!(steps_between("", "G"), 0);
        assert_eq!(steps_between("G", "?"), 0);
    }

    #[test]
    fn test_transpose_sym_basics() {
        assert_eq!(transpose_sym("G", 2), "A");
        assert_eq!(transpose_sym("Em", 2), "F#m");
        assert_eq!(transpose_sym("Dsus4", -2), "Csus4");
        assert_eq!(transpose_sym("B", 1), "C");
    }

    #[test]
    fn test_transpose_sym_prefers_sharps_even_on_flat_input() {
        assert_eq!(transpose_sym("Bb", -2), "G#");
        assert_eq!(transpose_sym("Eb", 1), "E");
    }

    #[test]
    fn test_transpose_sym_slash_bass_follows_root() {
        assert_eq!(transpose_sym("C/G", 2), "D/A");
        assert_eq!(transpose_sym("Gsus4/B", 1), "G#sus4/C");
        // a bass half without a chord root passes through on its own
        assert_eq!(transpose_sym("C/x", 2), "D/x");
    }

    #[test]
    fn test_transpose_sym_passthrough() {
        assert_eq!(transpose_sym("N.C.", 3), "N.C.");
        assert_eq!(transpose_sym("H7", 3), "H7");
        assert_eq!(transpose_sym("", 3), "");
    }

    #[test]
    fn test_transpose_sym_zero_steps_keeps_spelling() {
        assert_eq!(transpose_sym("Bb", 0), "Bb");
        assert_eq!(transpose_sym_prefer("Bb", 0, false), "Bb");
    }

    #[test]
    fn test_transpose_sym_prefer_flat_table() {
        assert_eq!(transpose_sym_prefer("G", 2, true), "A");
        assert_eq!(transpose_sym_prefer("A", 1, true), "Bb");
        assert_eq!(transpose_sym_prefer("C#m7b5", 2, true), "Ebm7b5");
        assert_eq!(transpose_sym_prefer("C/G", 3, true), "Eb/Bb");
    }

    #[test]
    fn test_transpose_sym_suffix_untouched() {
        assert_eq!(transpose_sym("C#m7b5", 1), "Dm7b5");
        assert_eq!(transpose_sym("Cadd9", 2), "Dadd9");
        assert_eq!(transpose_sym("F#dim7", -1), "Fdim7");
    }

    #[test]
    fn test_format_key() {
        assert_eq!(format_key("F#", Accidental::Flat), "Gb");
        assert_eq!(format_key("Gb", Accidental::Sharp), "F#");
        assert_eq!(format_key("Bbm", Accidental::Flat), "Bbm");
        assert_eq!(format_key("A#m", Accidental::Flat), "Bbm");
        assert_eq!(format_key("C", Accidental::Flat), "C");
        assert_eq!(format_key("N.C.", Accidental::Flat), "N.C.");
    }

    #[test]
    fn test_large_negative_steps_stay_in_range() {
        assert_eq!(transpose_sym("C", -25), "B");
        assert_eq!(transpose_sym("C", 26), "D");
    }
}
