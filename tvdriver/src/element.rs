use crate::errors::AutomationError;
use crate::selector::Selector;
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Attribute the device reports for nodes that can take directional input and text.
pub const FOCUSABLE_ATTRIBUTE: &str = "focusable";

/// Represents a live node in the device's UI tree.
///
/// A `UIElement` is bound to the tree as it was when the selector was resolved.
/// The tree may change between calls, so handles are not meant to be kept
/// around: resolve, act, drop.
#[derive(Debug)]
pub struct UIElement {
    inner: Box<dyn UIElementImpl>,
}

/// Backend-specific operations on a resolved node
pub trait UIElementImpl: Send + Sync + Debug {
    /// Opaque element id assigned by the remote driver
    fn id(&self) -> String;
    /// The selector this element was resolved from
    fn selector(&self) -> &Selector;
    /// Reads a device-reported attribute. `Ok(None)` means the attribute is absent.
    fn attribute(&self, name: &str) -> Result<Option<String>, AutomationError>;
    /// Sends text to the element
    fn send_keys(&self, text: &str) -> Result<(), AutomationError>;
}

impl UIElement {
    /// Create a new UI element from a backend-specific implementation
    pub fn new(impl_: Box<dyn UIElementImpl>) -> Self {
        Self { inner: impl_ }
    }

    pub fn id(&self) -> String {
        self.inner.id()
    }

    pub fn selector(&self) -> &Selector {
        self.inner.selector()
    }

    pub fn attribute(&self, name: &str) -> Result<Option<String>, AutomationError> {
        self.inner.attribute(name)
    }

    /// Whether the device reports this node as focusable.
    ///
    /// Any failure to read the attribute counts as "not focusable".
    #[instrument(level = "debug", skip(self), fields(selector = %self.selector()))]
    pub fn is_focusable(&self) -> bool {
        match self.inner.attribute(FOCUSABLE_ATTRIBUTE) {
            Ok(Some(value)) => value == "true",
            Ok(None) => false,
            Err(e) => {
                debug!("Could not read focusable attribute: {}", e);
                false
            }
        }
    }

    /// Type text into this element
    #[instrument(level = "debug", skip(self, text), fields(selector = %self.selector()))]
    pub fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        self.inner.send_keys(text)
    }

    /// Type text into this element if it is focusable; `NotFocusable` otherwise.
    pub fn fill(&self, text: &str) -> Result<(), AutomationError> {
        if !self.is_focusable() {
            return Err(AutomationError::NotFocusable(self.selector().to_string()));
        }
        self.type_text(text)
    }
}
