//! URL slug generation for event names

/// Convert an arbitrary name into a URL-safe slug.
///
/// Lowercases, keeps ASCII alphanumerics, collapses everything else into
/// single hyphens. Empty input (or input with no alphanumerics) yields "-"
/// so the canonical URL always has a slug segment.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        slug.push('-');
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_name() {
        assert_eq!(slugify("Words of Radiance Signing"), "words-of-radiance-signing");
    }

    #[test]
    fn punctuation_collapses() {
        assert_eq!(slugify("Q&A: London, 2019!"), "q-a-london-2019");
    }

    #[test]
    fn non_ascii_dropped() {
        assert_eq!(slugify("Köln Tour"), "k-ln-tour");
    }

    #[test]
    fn empty_yields_placeholder() {
        assert_eq!(slugify(""), "-");
        assert_eq!(slugify("???"), "-");
    }
}
