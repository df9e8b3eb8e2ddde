//! Conversion of free-form labels into Python identifiers.

use ahash::AHashSet;

/// Lowercase Python keywords. Mixed-case keywords (`True`, `None`, ...) can never
/// come out of [`sanitize`] because it lowercases first.
const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Converts a component label into a valid, deterministic identifier.
///
/// Labels with no representable letters fall back to `component_<id>`.
/// `sanitize(&sanitize(x, id), id) == sanitize(x, id)` for every input.
pub fn sanitize(label: &str, id: &str) -> String {
    sanitize_with_prefix(label, id, "component")
}

/// [`sanitize`] with a caller-chosen fallback prefix. `prefix` must already be a clean identifier.
pub fn sanitize_with_prefix(label: &str, id: &str, prefix: &str) -> String {
    let base = clean(label);
    if !base.bytes().any(|b| b.is_ascii_lowercase()) {
        let id_part = clean(id);
        return if id_part.is_empty() {
            prefix.to_string()
        } else {
            format!("{}_{}", prefix, id_part)
        };
    }

    let mut ident = base;
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if PYTHON_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// Lowercases, maps everything outside `[a-z0-9_]` to `_`, collapses runs of `_`
/// and trims them from both ends.
fn clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let c = c.to_ascii_lowercase();
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('_').to_string()
}

/// Hands out identifiers that are unique within one generated program.
///
/// A name that is already taken gets the first free `_2`, `_3`, ... suffix.
#[derive(Debug, Clone, Default)]
pub struct IdentifierScope {
    taken: AHashSet<String>,
}

impl IdentifierScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope in which `reserved` names are never handed out.
    pub fn with_reserved<'a>(reserved: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            taken: reserved.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Claims `base`, or the first free suffixed variant of it.
    pub fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
