//! Tag set encoding.
//!
//! A job's tags are persisted as one string, sorted and wrapped in `|`
//! (`|a|b|c|`). Searches encode the requested set the same way and wrap it
//! in `%` so it matches as a contiguous run inside the persisted string.

/// Separates tags in both the persisted and the search form.
pub const TAG_DELIMITER: &str = "|";

/// Wildcard wrapped around the search form.
pub const TAG_WILDCARD: &str = "%";

fn sorted<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<String> = tags.into_iter().map(|t| t.as_ref().to_string()).collect();
    sorted.sort();
    sorted.dedup();
    sorted
}

/// Backslash-escape the characters `LIKE` treats specially.
fn escape_like(tag: &str) -> String {
    let mut escaped = String::with_capacity(tag.len());
    for c in tag.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Encode a tag set into a `LIKE` pattern, e.g. `{"b", "a"}` -> `%|a|b|%`.
///
/// The empty string is a real tag and takes part in the encoding. Tag text is
/// matched literally: `%`, `_` and `\` inside a tag are escaped.
pub fn tag_like_string<I, S>(tags: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let escaped: Vec<String> = sorted(tags).iter().map(|t| escape_like(t)).collect();
    let joined = escaped.join(TAG_DELIMITER);
    format!("{TAG_WILDCARD}{TAG_DELIMITER}{joined}{TAG_DELIMITER}{TAG_WILDCARD}")
}

/// Encode a job's tags for storage, e.g. `{"b", "a"}` -> `|a|b|`.
///
/// A job without tags stores the empty string.
pub fn sorted_tag_string<I, S>(tags: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tags = sorted(tags);
    if tags.is_empty() {
        return String::new();
    }
    let joined = tags.join(TAG_DELIMITER);
    format!("{TAG_DELIMITER}{joined}{TAG_DELIMITER}")
}
