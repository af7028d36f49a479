//! Kebab-case identifiers derived from display names.

/// Normalize a display name into a kebab-case identifier.
///
/// Apostrophes vanish (`Brann's` → `branns`); every other run of
/// non-alphanumeric characters becomes a single dash. May return an empty
/// string when `raw` has no ASCII alphanumerics.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch.to_ascii_lowercase());
            pending_dash = false;
        } else if matches!(ch, '\'' | '’') {
            // keep possessives glued to their word
        } else {
            pending_dash = true;
        }
    }
    slug
}
