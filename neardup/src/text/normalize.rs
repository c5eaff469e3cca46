use unicode_normalization::UnicodeNormalization;

/// Canonicalizes text for shingling.
///
/// The steps run in a fixed order: lowercase, collapse every whitespace run
/// (newlines and tabs included) into a single space, drop characters that are
/// neither alphanumeric nor whitespace, then apply canonical decomposition
/// (NFD) to what is left.
///
/// ```
/// use neardup::text::normalize;
///
/// assert_eq!(normalize("Hello,\n\tWorld!"), "hello world");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();

    let mut collapsed = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                collapsed.push(' ');
            }
            in_whitespace = true;
        } else {
            in_whitespace = false;
            collapsed.push(c);
        }
    }

    collapsed
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .nfd()
        .collect()
}
