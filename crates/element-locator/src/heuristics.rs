//! Heuristic discovery table
//!
//! A closed, declarative table of generic fallback selectors per known
//! element key, used only once the catalog is exhausted. The candidates are
//! structural and attribute-based, independent of any specific page
//! snapshot. Extending coverage to a new key means adding an entry here; the
//! engine never synthesizes selectors.

/// Generic search-input candidates.
const SEARCH_BAR: &[&str] = &[
    "input[type=\"search\"]",
    "input[role=\"searchbox\"]",
    "input[placeholder*=\"search\" i]",
    "input[aria-label*=\"search\" i]",
];

/// Generic submit-control candidates.
const SEARCH_BUTTON: &[&str] = &[
    "button[type=\"submit\"]",
    "input[type=\"submit\"]",
    "[role=\"button\"][aria-label*=\"search\" i]",
];

/// Result-listing title candidates.
const PRODUCT_TITLE: &[&str] = &[
    "[data-component-type=\"s-search-result\"] h2",
    ".s-result-item h2",
    ".s-search-results h2",
];

/// Price-fragment candidates.
const FIRST_PRODUCT_PRICE: &[&str] = &[
    ".a-price",
    "[data-a-color=\"price\"]",
    ".s-price",
];

/// Heuristic candidates for `key`, in trial order, or `None` when the key
/// has no heuristic coverage.
pub fn heuristic_candidates(key: &str) -> Option<&'static [&'static str]> {
    match key {
        "searchBar" => Some(SEARCH_BAR),
        "searchButton" => Some(SEARCH_BUTTON),
        "productTitle" => Some(PRODUCT_TITLE),
        "firstProductPrice" => Some(FIRST_PRODUCT_PRICE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys_have_candidates() {
        for key in ["searchBar", "searchButton", "productTitle", "firstProductPrice"] {
            let candidates = heuristic_candidates(key);
            assert!(candidates.is_some(), "missing heuristics for {key}");
            assert!(!candidates.unwrap().is_empty());
        }
    }

    #[test]
    fn test_unknown_key_has_none() {
        assert!(heuristic_candidates("checkoutButton").is_none());
        assert!(heuristic_candidates("").is_none());
    }

    #[test]
    fn test_candidates_are_ordered_and_stable() {
        let first = heuristic_candidates("searchBar").unwrap();
        assert_eq!(first[0], "input[type=\"search\"]");
    }
}
