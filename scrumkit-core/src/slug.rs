//! URL slug derivation for project names and wiki pages

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Derive a slug: lowercase ASCII alphanumerics separated by single dashes.
///
/// Text is decomposed (NFD) and combining marks dropped first, so
/// "Conhecendo a Ferramenta", "Ação" and "Šibenik" all produce readable
/// slugs. Returns an empty string when nothing usable remains; see
/// [`slug_or`] for a non-empty variant.
pub fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_dash = false;
    for ch in raw.trim().nfd().filter(|c| !is_combining_mark(*c)) {
        let lc = ch.to_ascii_lowercase();
        if lc.is_ascii_alphanumeric() {
            out.push(lc);
            prev_dash = false;
        } else if !out.is_empty() && !prev_dash {
            out.push('-');
            prev_dash = true;
        }
    }
    out.trim_matches('-').to_string()
}

/// Slug of `raw`, or `fallback` when `raw` has no ASCII-foldable characters
/// (e.g. "プロジェクト").
pub fn slug_or(raw: &str, fallback: &str) -> String {
    let slug = slugify(raw);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Return `base` if free, otherwise the first free `base-N` for N >= 2.
pub fn unique_slug<F>(base: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
