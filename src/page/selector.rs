use crate::errors::{PageHintError, PageHintResult};
use crate::page::document::Element;

/// A parsed selector list such as `button#launch, .primary`.
///
/// Supports compound selectors built from an optional tag (or `*`), `#id` and
/// `.class` parts. Combinators, attribute selectors and pseudo-classes are
/// rejected as syntax errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    compounds: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    /// Set when the compound names two different ids.
    unsatisfiable: bool,
}

impl SelectorList {
    pub fn parse(input: &str) -> PageHintResult<Self> {
        let compounds = input
            .split(',')
            .map(|part| parse_compound(input, part.trim()))
            .collect::<PageHintResult<Vec<_>>>()?;
        Ok(Self { compounds })
    }

    pub fn matches(&self, element: &Element) -> bool {
        self.compounds.iter().any(|c| c.matches(element))
    }
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if self.unsatisfiable {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(&element.tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes
            .iter()
            .all(|class| element.classes.iter().any(|c| c == class))
    }
}

fn parse_compound(full: &str, part: &str) -> PageHintResult<Compound> {
    if part.is_empty() {
        return Err(PageHintError::selector(full, "empty selector"));
    }

    let mut compound = Compound::default();
    let mut rest = part;

    if let Some(after) = rest.strip_prefix('*') {
        rest = after;
    } else if !rest.starts_with(['#', '.']) {
        let (tag, after) = take_ident(full, rest)?;
        compound.tag = Some(tag.to_string());
        rest = after;
    }

    while let Some(c) = rest.chars().next() {
        let (name, after) = match c {
            '#' | '.' => take_ident(full, &rest[1..])?,
            other => {
                return Err(PageHintError::selector(
                    full,
                    format!("unsupported selector syntax at '{other}'"),
                ))
            }
        };
        if c == '#' {
            if compound.id.as_deref().is_some_and(|id| id != name) {
                compound.unsatisfiable = true;
            } else {
                compound.id = Some(name.to_string());
            }
        } else {
            compound.classes.push(name.to_string());
        }
        rest = after;
    }

    Ok(compound)
}

/// Split a CSS identifier off the front of `input`.
fn take_ident<'a>(full: &str, input: &'a str) -> PageHintResult<(&'a str, &'a str)> {
    let end = input
        .char_indices()
        .find(|&(_, c)| !is_ident_char(c))
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    let ident = &input[..end];

    let mut chars = ident.chars();
    let valid_start = match chars.next() {
        None => false,
        Some(c) if c.is_ascii_digit() => false,
        Some('-') => !matches!(chars.next(), Some(c) if c.is_ascii_digit()),
        Some(_) => true,
    };
    if !valid_start {
        return Err(PageHintError::selector(
            full,
            format!("'{ident}' is not a valid identifier"),
        ));
    }
    Ok((ident, &input[end..]))
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}
