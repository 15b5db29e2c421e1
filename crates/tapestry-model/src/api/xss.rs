//! Link safety.

use std::sync::LazyLock;

use regex_lite::Regex;

/// `script:` with optional line breaks between letters, before any `/`.
static SCRIPT_SCHEME_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^[^/]*s\n*c\n*r\n*i\n*p\n*t\n*:").ok());

/// The link unchanged, or an empty string when it carries a script scheme.
///
/// `script` after a `/` is part of a path, not a scheme, and is allowed.
pub fn check_xss(link: &str) -> String {
    let unsafe_link = SCRIPT_SCHEME_REGEX
        .as_ref()
        .is_some_and(|regex| regex.is_match(link));
    if unsafe_link {
        tracing::debug!(target: "tapestry::model", "dropped unsafe link");
        String::new()
    } else {
        link.to_string()
    }
}
