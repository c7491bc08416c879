//! Case folding for case-insensitive message parts.
//!
//! A part marked `~` matches its keyword regardless of case. The canonical
//! spelling of such a part must already be lowercase; matching folds the
//! candidate token once and compares exactly.

/// Fold a string to its lowercase form.
///
/// Uses full Unicode lowercasing, so folded strings may differ in length
/// from their input (e.g. `İ` folds to `i̇`).
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Whether every cased character in the string is already lowercase.
///
/// Caseless characters (digits, operators, ideographs) are ignored, so
/// `"abc1"` and `"日本"` both count as lowercase.
pub fn is_lower_case(text: &str) -> bool {
    text.chars().all(|c| !c.is_uppercase())
}
