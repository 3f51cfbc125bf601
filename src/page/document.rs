use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{PageHintError, PageHintResult};
use crate::page::selector::SelectorList;

/// Opaque reference to an element of a [`PageDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(usize);

/// The slice of the hosted page's DOM the content script needs.
pub trait PageDocument: Send {
    /// All elements matching `selector`, in document order.
    fn query_selector_all(&self, selector: &str) -> PageHintResult<Vec<ElementHandle>>;

    fn set_inline_style(
        &mut self,
        element: ElementHandle,
        property: &str,
        value: &str,
    ) -> PageHintResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Inline style declarations, keyed by property name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            style: BTreeMap::new(),
            text: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }
}

/// In-memory page: a flat list of elements in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    elements: Vec<Element>,
}

impl StaticDocument {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            elements: Vec::new(),
        }
    }

    /// Load a JSON snapshot of the form `{ "url": ..., "elements": [...] }`.
    pub fn load(path: &Path) -> PageHintResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let document: StaticDocument = serde_json::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            url = document.url.as_deref().unwrap_or("<none>"),
            elements = document.elements.len(),
            "page snapshot loaded"
        );
        Ok(document)
    }

    pub fn push(&mut self, element: Element) -> ElementHandle {
        self.elements.push(element);
        ElementHandle(self.elements.len() - 1)
    }

    pub fn element(&self, handle: ElementHandle) -> Option<&Element> {
        self.elements.get(handle.0)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl PageDocument for StaticDocument {
    fn query_selector_all(&self, selector: &str) -> PageHintResult<Vec<ElementHandle>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| list.matches(el))
            .map(|(i, _)| ElementHandle(i))
            .collect())
    }

    fn set_inline_style(
        &mut self,
        element: ElementHandle,
        property: &str,
        value: &str,
    ) -> PageHintResult<()> {
        let el = self
            .elements
            .get_mut(element.0)
            .ok_or_else(|| PageHintError::Page(format!("element {} no longer exists", element.0)))?;
        el.style.insert(property.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn query_returns_document_order() {
        let mut doc = StaticDocument::new("https://console.example.com");
        let a = doc.push(Element::new("button").with_class("cta"));
        doc.push(Element::new("p"));
        let c = doc.push(Element::new("a").with_class("cta"));

        assert_eq!(doc.query_selector_all(".cta").unwrap(), vec![a, c]);
        assert!(doc.query_selector_all("#nothing").unwrap().is_empty());
    }

    #[test]
    fn invalid_selector_propagates() {
        let doc = StaticDocument::default();
        assert!(matches!(
            doc.query_selector_all("ul > li"),
            Err(PageHintError::Selector { .. })
        ));
    }

    #[test]
    fn set_style_on_stale_handle_fails() {
        let mut doc = StaticDocument::default();
        let err = doc.set_inline_style(ElementHandle(3), "outline", "none").unwrap_err();
        assert!(matches!(err, PageHintError::Page(_)));
    }

    #[test]
    fn loads_json_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "url": "https://console.example.com/ec2",
                "elements": [
                    {{ "tag": "button", "id": "launch-instance", "classes": ["primary"], "text": "Launch" }},
                    {{ "tag": "div", "style": {{ "color": "blue" }} }}
                ]
            }}"#
        )
        .unwrap();

        let doc = StaticDocument::load(file.path()).unwrap();
        assert_eq!(doc.url.as_deref(), Some("https://console.example.com/ec2"));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.elements()[0].id.as_deref(), Some("launch-instance"));
        assert_eq!(doc.elements()[1].style("color"), Some("blue"));
    }
}
