/// Derives a URL-safe identifier from a display name.
///
/// Anything other than ASCII letters, digits, whitespace and `-` is dropped. The
/// result is trimmed and lower-cased, then every run of whitespace or hyphens
/// collapses into a single `-`. Pure and idempotent.
pub fn slugify(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_separator = false;
    for c in kept.trim().chars() {
        if c.is_whitespace() || c == '-' {
            in_separator = true;
            continue;
        }
        if in_separator {
            slug.push('-');
            in_separator = false;
        }
        slug.push(c.to_ascii_lowercase());
    }
    if in_separator {
        // trailing hyphens survive trim(); keep one, as the collapse rule does
        slug.push('-');
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Champions League Final"), "champions-league-final");
        assert_eq!(slugify("Football"), "football");
    }

    #[test]
    fn strips_punctuation_and_collapses_runs() {
        assert_eq!(slugify("  Man. Utd vs. Chelsea!!  "), "man-utd-vs-chelsea");
        assert_eq!(slugify("a -- b\t\tc"), "a-b-c");
        assert_eq!(slugify("Café Olé"), "caf-ol");
    }

    #[test]
    fn leading_and_trailing_hyphens_collapse_to_one() {
        assert_eq!(slugify("-abc-"), "-abc-");
        assert_eq!(slugify("--a"), "-a");
    }

    #[test]
    fn empty_input_yields_empty_slug() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn is_idempotent() {
        for s in ["Champions League Final", "  x--Y  z ", "-abc-", "Ünïcode 42", "a\u{a0}b"] {
            let once = slugify(s);
            assert_eq!(slugify(&once), once, "input {s:?}");
        }
    }
}
