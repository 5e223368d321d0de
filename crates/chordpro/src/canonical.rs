//! Boundary utilities for storage collaborators
//!
//! These sit at the edge of the document model: naming a file for a song
//! and normalizing arbitrary input into the canonical directive form.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::parse;
use crate::serializer::{serialize, SerializeOptions};

static RX_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9a-z]+").expect("valid slug regex"));

/// Suggest a canonical `.chordpro` filename for a song title.
///
/// The slug lowercases the title, collapses every run of non-word
/// characters to a single underscore, and trims underscores at the ends.
///
/// ```
/// use chordpro::canonical::suggest_canonical_filename;
///
/// assert_eq!(suggest_canonical_filename("Amazing Grace"), "amazing_grace.chordpro");
/// assert_eq!(suggest_canonical_filename("  It's Me, O Lord! "), "it_s_me_o_lord.chordpro");
/// ```
pub fn suggest_canonical_filename(title: &str) -> String {
    let lowered = title.to_lowercase();
    let slug = RX_SLUG.replace_all(&lowered, "_");
    let slug = slug.trim_matches('_');
    let slug = if slug.is_empty() { "untitled" } else { slug };
    format!("{}.chordpro", slug)
}

/// Normalize any parseable input (directive or legacy style) into the
/// canonical directive form.
pub fn to_canonical(text: &str) -> String {
    serialize(&parse(text), &SerializeOptions::default())
}
