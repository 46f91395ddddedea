use deunicode::deunicode;

/// Upper bound on slug candidates tried before giving up with `SlugConflict`.
pub const MAX_SLUG_ATTEMPTS: usize = 10;

/// Width of the `slug` columns.
pub const MAX_SLUG_LEN: usize = 255;

/// Room kept free for the longest `-{n}` suffix (hyphen plus the digits of an `i64`).
const SUFFIX_RESERVE: usize = 20;

/// Longest base a candidate may start from.
pub const MAX_BASE_LEN: usize = MAX_SLUG_LEN - SUFFIX_RESERVE;

/// slugify
///
/// Derives a URL-safe slug from a human-readable name: transliterates to ASCII, lowercases,
/// collapses every run of non-alphanumeric characters into one hyphen and trims hyphens at
/// both ends. May return an empty string for names without any alphanumeric content.
pub fn slugify(name: &str) -> String {
    let ascii = deunicode(name).to_lowercase();

    let mut slug = String::with_capacity(ascii.len());
    let mut pending_hyphen = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// base_slug
///
/// The slug root for an entity: the slugified name, or `fallback` (the entity's type label)
/// when the name yields nothing. The result never exceeds `MAX_BASE_LEN` and is never all
/// digits, since an all-digit path segment is looked up as an id.
pub fn base_slug(name: &str, fallback: &str) -> String {
    let slug = truncate(&slugify(name), MAX_BASE_LEN);
    if slug.is_empty() {
        fallback.to_string()
    } else if slug.bytes().all(|b| b.is_ascii_digit()) {
        truncate(&format!("{fallback}-{slug}"), MAX_BASE_LEN)
    } else {
        slug
    }
}

/// Cuts an ASCII slug to at most `max` bytes, preferring the last hyphen boundary so no word
/// is split. A single word longer than `max` is cut hard.
fn truncate(slug: &str, max: usize) -> String {
    if slug.len() <= max {
        return slug.to_string();
    }
    let head = &slug[..max];
    let cut = if slug.as_bytes()[max] == b'-' {
        head
    } else {
        match head.rfind('-') {
            Some(pos) if pos > 0 => &head[..pos],
            _ => head,
        }
    };
    cut.trim_end_matches('-').to_string()
}

/// SlugCandidates
///
/// Bounded sequence of slug candidates: the bare base first, then `{base}-{n}` with `n`
/// starting at the table's next identifier. Yields at most `MAX_SLUG_ATTEMPTS` values.
#[derive(Debug, Clone)]
pub struct SlugCandidates {
    base: String,
    next_id: i64,
    yielded: usize,
}

impl SlugCandidates {
    pub fn new(base: impl Into<String>, next_id: i64) -> Self {
        Self {
            base: base.into(),
            next_id,
            yielded: 0,
        }
    }
}

impl Iterator for SlugCandidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.yielded >= MAX_SLUG_ATTEMPTS {
            return None;
        }
        let candidate = match self.yielded {
            0 => self.base.clone(),
            n => format!("{}-{}", self.base, self.next_id + n as i64 - 1),
        };
        self.yielded += 1;
        Some(candidate)
    }
}

/// The error message reported when every candidate is taken.
pub fn exhausted_message(base: &str) -> String {
    format!(
        "Could not assign a unique slug for '{base}' after {MAX_SLUG_ATTEMPTS} attempts"
    )
}
