use std::sync::{Arc, Mutex, PoisonError};

use crate::bus::extension::MessageHandler;
use crate::bus::message::{Acknowledgement, DispatchMessage};
use crate::config::HighlightConfig;
use crate::errors::PageHintResult;
use crate::page::document::PageDocument;

pub const DEFAULT_OUTLINE: &str = "2px solid red";

/// Marks every element matching a selector with a fixed inline outline.
#[derive(Debug, Clone)]
pub struct PageActionApplier {
    outline: String,
}

impl Default for PageActionApplier {
    fn default() -> Self {
        Self::new(DEFAULT_OUTLINE)
    }
}

impl PageActionApplier {
    pub fn new(outline: impl Into<String>) -> Self {
        Self {
            outline: outline.into(),
        }
    }

    pub fn from_config(config: &HighlightConfig) -> Self {
        Self::new(config.outline.clone())
    }

    /// Returns how many elements were marked. Zero matches is not an error.
    pub fn apply<D: PageDocument + ?Sized>(
        &self,
        document: &mut D,
        selector: &str,
    ) -> PageHintResult<usize> {
        let matches = document.query_selector_all(selector)?;
        if matches.is_empty() {
            tracing::debug!(selector, "no element matches, nothing to highlight");
            return Ok(0);
        }
        for element in &matches {
            document.set_inline_style(*element, "outline", &self.outline)?;
        }
        tracing::info!(selector, matched = matches.len(), "highlight applied");
        Ok(matches.len())
    }
}

/// Content-script handler applying highlight messages to a shared document.
pub struct HighlightListener<D> {
    applier: PageActionApplier,
    document: Arc<Mutex<D>>,
}

impl<D: PageDocument> HighlightListener<D> {
    pub fn new(applier: PageActionApplier, document: Arc<Mutex<D>>) -> Self {
        Self { applier, document }
    }
}

impl<D: PageDocument + 'static> MessageHandler for HighlightListener<D> {
    fn handle(&mut self, message: DispatchMessage) -> Option<Acknowledgement> {
        match message {
            DispatchMessage::Highlight { selector } => {
                let mut document = self.document.lock().unwrap_or_else(PoisonError::into_inner);
                match self.applier.apply(&mut *document, &selector) {
                    Ok(matched) => Some(Acknowledgement::success(matched)),
                    Err(e) => {
                        tracing::warn!(selector = %selector, error = %e, "highlight failed");
                        Some(Acknowledgement::failure())
                    }
                }
            }
        }
    }
}
