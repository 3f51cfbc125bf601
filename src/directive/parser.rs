use std::sync::LazyLock;

use regex::Regex;

use crate::directive::locator::ActionLocator;

/// Phrase the backend uses to announce a highlight target.
pub const DIRECTIVE_PHRASE: &str = "Selector for button:";

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"{} (#[A-Za-z0-9_-]+)", regex::escape(DIRECTIVE_PHRASE));
    Regex::new(&pattern).expect("directive pattern compiles")
});

/// Extracts the first highlight directive from a backend reply.
///
/// Returns `None` when the reply carries no directive, which is the common case.
/// Only the first occurrence of the pattern is considered. A token that runs
/// straight into characters outside `[A-Za-z0-9_-]` (for example `#save$btn` or
/// `#menu.open`) yields `None` rather than a truncated selector.
pub fn parse_locator(text: &str) -> Option<ActionLocator> {
    let token = DIRECTIVE_RE.captures(text)?.get(1)?;
    if ends_cleanly(&text[token.end()..]) {
        Some(ActionLocator::element_selector(token.as_str()))
    } else {
        tracing::debug!(
            token = token.as_str(),
            offset = token.start(),
            "directive token is malformed, ignoring reply directive"
        );
        None
    }
}

/// The token must be followed by end of text, whitespace, a closing delimiter, or
/// sentence punctuation that itself ends there.
fn ends_cleanly(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        None => true,
        Some(c) if c.is_whitespace() || is_closing(c) => true,
        Some('.' | ',' | ';' | ':' | '!' | '?') => match chars.next() {
            None => true,
            Some(n) => n.is_whitespace() || is_closing(n),
        },
        Some(_) => false,
    }
}

fn is_closing(c: char) -> bool {
    matches!(c, ')' | ']' | '}' | '"' | '\'' | '`' | '>' | '*')
}
