//! Story-point weights derived from labels or titles.

/// Ordinal weight vocabulary recognised in issue labels.
pub const WEIGHT_VOCABULARY: [u32; 11] = [0, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89];

const TITLE_SEPARATORS: [char; 9] = ['-', '_', ':', '|', '.', ',', '/', ')', ']'];

/// Derives an issue weight, preferring labels over the title prefix.
pub fn derive_weight<S: AsRef<str>>(labels: &[S], title: &str) -> Option<u32> {
    weight_from_labels(labels).or_else(|| weight_from_title(title))
}

/// Returns the first label that names a vocabulary weight.
///
/// The result depends on the order in which the API lists labels: with
/// `["3", "5"]` the weight is 3, with `["5", "3"]` it is 5.
pub fn weight_from_labels<S: AsRef<str>>(labels: &[S]) -> Option<u32> {
    labels.iter().find_map(|label| {
        let label = label.as_ref();
        WEIGHT_VOCABULARY
            .iter()
            .copied()
            .find(|weight| weight.to_string() == label)
    })
}

/// Parses the numeric token that prefixes a title, e.g. `8-Refactor auth`.
pub fn weight_from_title(title: &str) -> Option<u32> {
    let title = title.trim_start();
    let end = title
        .find(|c: char| c.is_whitespace() || TITLE_SEPARATORS.contains(&c))
        .unwrap_or(title.len());
    let token = &title[..end];
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
