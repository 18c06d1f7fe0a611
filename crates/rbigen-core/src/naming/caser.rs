//! Identifier segmentation and recasing.
//!
//! Protobuf names arrive in several conventions (`dotted.package`,
//! `snake_case`, `UpperCamel`, `HTTPAcronyms`). Ruby constants must start
//! with an upper-case letter, so every name that becomes a class or module
//! segment is split into word parts and recombined with each part
//! title-cased. Digits never start a new part.

/// Splits an identifier into its word parts.
///
/// The strategy depends on the shape of the input, checked in order:
///
/// 1. anything containing `.` is split on dots verbatim;
/// 2. anything with an `_` after the first position is split on
///    underscores, gluing a single leading `_` onto the following part;
/// 3. everything else is scanned as mixed case, where an upper-case run
///    followed by a lower-case letter donates its last letter to the next
///    part (`HTTPServer` becomes `HTTP`, `Server`). With a leading `_` only
///    that donation splits, so `_aB` stays whole.
///
/// # Example
///
/// ```
/// use rbigen_core::naming::split_words;
///
/// assert_eq!(split_words("HTTPServer"), vec!["HTTP", "Server"]);
/// assert_eq!(split_words("already_snake_case"), vec!["already", "snake", "case"]);
/// ```
pub fn split_words(identifier: &str) -> Vec<String> {
    if identifier.is_empty() {
        return vec![String::new()];
    }
    if identifier.contains('.') {
        return identifier.split('.').map(str::to_string).collect();
    }
    if identifier.rfind('_').is_some_and(|idx| idx > 0) {
        return split_underscores(identifier);
    }
    split_mixed_case(identifier)
}

fn split_underscores(identifier: &str) -> Vec<String> {
    let mut parts: Vec<String> = identifier.split('_').map(str::to_string).collect();
    if parts.len() > 1 && parts[0].is_empty() {
        parts.remove(0);
        parts[0].insert(0, '_');
    }
    parts
}

fn split_mixed_case(identifier: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut buf = String::new();
    let mut upper_run = false;
    // A leading `_` suppresses lower-to-upper splits for the whole name.
    let leading_underscore = identifier.starts_with('_');

    for c in identifier.chars() {
        let is_upper = c.is_uppercase();

        if is_upper && !upper_run && !buf.is_empty() && !leading_underscore {
            parts.push(std::mem::take(&mut buf));
        } else if !is_upper && upper_run && buf.chars().count() > 1 && !is_underscore_pair(&buf) {
            // The last upper-case letter belongs to the word that starts here.
            if let Some(carried) = buf.pop() {
                parts.push(std::mem::take(&mut buf));
                buf.push(carried);
            }
        }

        upper_run = is_upper;
        buf.push(c);
    }

    parts.push(buf);
    parts
}

/// `_X`: a preserved leading underscore plus one letter
fn is_underscore_pair(buf: &str) -> bool {
    let mut chars = buf.chars();
    chars.next() == Some('_') && chars.next().is_some() && chars.next().is_none()
}

/// Title-cases every part, the first one included, and concatenates them.
pub fn recombine<S: AsRef<str>>(parts: &[S]) -> String {
    parts.iter().map(|part| title_case(part.as_ref())).collect()
}

/// Shorthand for `recombine(&split_words(identifier))`.
pub fn upper_camel_case(identifier: &str) -> String {
    recombine(&split_words(identifier))
}

/// Lower-cases every word part and joins them with `_`.
///
/// Used for Ruby method names derived from RPC names: `GetHTTPStatus`
/// becomes `get_http_status`.
pub fn lower_snake_case(identifier: &str) -> String {
    split_words(identifier)
        .iter()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Upper-cases the first letter of every word in `s`.
///
/// A word starts at the beginning of the string or after a separator.
/// ASCII letters, digits and `_` never separate words, so `my_type` stays
/// one word while `pkg::sub` is two.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev: Option<char> = None;

    for c in s.chars() {
        if prev.map_or(true, is_separator) {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }

    out
}

fn is_separator(c: char) -> bool {
    if c.is_ascii() {
        return !(c.is_ascii_alphanumeric() || c == '_');
    }
    if c.is_alphanumeric() {
        return false;
    }
    c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_acronym_run() {
        assert_eq!(split_words("HTTPServer"), vec!["HTTP", "Server"]);
        assert_eq!(split_words("getHTTPResponseCode"), vec!["get", "HTTP", "Response", "Code"]);
        assert_eq!(split_words("ABc"), vec!["A", "Bc"]);
    }

    #[test]
    fn test_split_snake_case() {
        assert_eq!(split_words("already_snake_case"), vec!["already", "snake", "case"]);
        assert_eq!(split_words("trailing_"), vec!["trailing", ""]);
        assert_eq!(split_words("_private_field"), vec!["_private", "field"]);
    }

    #[test]
    fn test_split_leading_underscore() {
        assert_eq!(split_words("_leadingUnderscore"), vec!["_leading", "Underscore"]);
        assert_eq!(split_words("_Ab"), vec!["_Ab"]);
        assert_eq!(split_words("_"), vec!["_"]);
        assert_eq!(split_words("_aB"), vec!["_aB"]);
        assert_eq!(split_words("_privateHTTPServer"), vec!["_privateHTTP", "Server"]);
        assert_eq!(lower_snake_case("_aB"), "_ab");
    }

    #[test]
    fn test_split_dotted() {
        assert_eq!(split_words("foo.bar_baz.Qux"), vec!["foo", "bar_baz", "Qux"]);
    }

    #[test]
    fn test_split_keeps_digits() {
        assert_eq!(split_words("v1beta2"), vec!["v1beta2"]);
        assert_eq!(split_words("Md5Sum"), vec!["Md5", "Sum"]);
        assert_eq!(split_words(""), vec![""]);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("pkg::sub"), "Pkg::Sub");
        assert_eq!(title_case("my_type"), "My_type");
        assert_eq!(title_case("1abc"), "1abc");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_recombine_titles_first_part() {
        assert_eq!(recombine(&["foo", "bar"]), "FooBar");
        assert_eq!(upper_camel_case("my_package::v1"), "MyPackage::V1");
        assert_eq!(upper_camel_case("acme::widgets"), "Acme::Widgets");
    }

    #[test]
    fn test_lower_snake_case() {
        assert_eq!(lower_snake_case("SayHello"), "say_hello");
        assert_eq!(lower_snake_case("GetHTTPStatus"), "get_http_status");
        assert_eq!(lower_snake_case("list"), "list");
    }
}
