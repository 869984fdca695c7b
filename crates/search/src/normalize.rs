//! Accent-stripped, lower-cased text normalization.
//!
//! Free-text search must treat "Panadería", "PANADERIA" and "panaderia"
//! as the same word. Normalization trims, lower-cases and folds the
//! accented Latin characters that appear in listing and municipality
//! names.

/// Fold a single character to its unaccented lowercase form.
///
/// Characters outside the folded set pass through `to_lowercase`.
fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Normalize text for comparison: trim, lower-case, strip accents.
///
/// # Example
/// ```
/// use findixi_search::normalize_text;
///
/// assert_eq!(normalize_text("  Panadería El Añejo "), "panaderia el anejo");
/// assert_eq!(normalize_text("CAFÉ"), "cafe");
/// ```
pub fn normalize_text(value: &str) -> String {
    value
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_char)
        .collect()
}

/// Substring test on normalized forms of both haystack and needle.
///
/// # Example
/// ```
/// use findixi_search::normalized_contains;
///
/// assert!(normalized_contains("La Casona de Añasco", "anasco"));
/// assert!(!normalized_contains("La Casona", "pizza"));
/// ```
pub fn normalized_contains(haystack: &str, needle: &str) -> bool {
    normalize_text(haystack).contains(&normalize_text(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_spanish_accents() {
        assert_eq!(normalize_text("Jardín Botánico"), "jardin botanico");
        assert_eq!(normalize_text("Mayagüez"), "mayaguez");
        assert_eq!(normalize_text("Añasco"), "anasco");
    }

    #[test]
    fn test_lowercases() {
        assert_eq!(normalize_text("FOOD TRUCKS"), "food trucks");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(normalize_text("  pizza  "), "pizza");
    }

    #[test]
    fn test_uppercase_accents_fold() {
        // Uppercase accented chars lowercase first, then fold
        assert_eq!(normalize_text("CAFÉ MARÍA"), "cafe maria");
    }

    #[test]
    fn test_contains_ignores_accents_both_ways() {
        assert!(normalized_contains("Panadería", "panaderia"));
        assert!(normalized_contains("Panaderia", "panadería"));
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(normalize_text(""), "");
        assert!(normalized_contains("anything", ""));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(s in ".*") {
            let once = normalize_text(&s);
            prop_assert_eq!(normalize_text(&once), once);
        }

        #[test]
        fn normalized_text_has_no_uppercase_ascii(s in ".*") {
            prop_assert!(!normalize_text(&s).chars().any(|c| c.is_ascii_uppercase()));
        }
    }
}
