mod search_tests;

use crate::{AutomationEngine, AutomationError, RemoteKey, Selector, UIElement, UIElementImpl};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_target(true)
        .with_test_writer()
        .try_init();
}

/// Every call the fake engine or its elements received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Find(String),
    Attribute(String),
    SendKeys(String, String),
    Key(RemoteKey),
}

/// A node in the fake tree.
#[derive(Debug, Clone)]
pub struct FakeNode {
    pub focusable: Result<Option<String>, AutomationError>,
    pub accepts: Result<(), AutomationError>,
}

impl FakeNode {
    pub fn focusable() -> Self {
        Self {
            focusable: Ok(Some("true".into())),
            accepts: Ok(()),
        }
    }

    pub fn plain() -> Self {
        Self {
            focusable: Ok(Some("false".into())),
            accepts: Ok(()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            focusable: Ok(Some("true".into())),
            accepts: Err(AutomationError::DeliveryRejected(
                "element not interactable".into(),
            )),
        }
    }
}

/// In-memory engine keyed by selector text.
#[derive(Debug, Default)]
pub struct FakeEngine {
    nodes: HashMap<String, FakeNode>,
    lookup_errors: HashMap<String, AutomationError>,
    key_errors: HashMap<RemoteKey, AutomationError>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, selector: impl Into<Selector>, node: FakeNode) -> Self {
        self.nodes.insert(selector.into().to_string(), node);
        self
    }

    pub fn with_lookup_error(mut self, selector: impl Into<Selector>, e: AutomationError) -> Self {
        self.lookup_errors.insert(selector.into().to_string(), e);
        self
    }

    pub fn with_key_error(mut self, key: RemoteKey, e: AutomationError) -> Self {
        self.key_errors.insert(key, e);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn finds(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Find(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn deliveries(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendKeys(s, t) => Some((s, t)),
                _ => None,
            })
            .collect()
    }

    pub fn keys(&self) -> Vec<RemoteKey> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Key(k) => Some(k),
                _ => None,
            })
            .collect()
    }
}

impl AutomationEngine for FakeEngine {
    fn session_id(&self) -> &str {
        "fake-session"
    }

    fn find_element(&self, selector: &Selector) -> Result<UIElement, AutomationError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Find(selector.to_string()));

        if let Some(e) = self.lookup_errors.get(selector.as_str()) {
            return Err(e.clone());
        }
        match self.nodes.get(selector.as_str()) {
            Some(node) => Ok(UIElement::new(Box::new(FakeElement {
                selector: selector.clone(),
                node: node.clone(),
                calls: self.calls.clone(),
            }))),
            None => Err(AutomationError::NotFound(selector.to_string())),
        }
    }

    fn dispatch_key(&self, key: RemoteKey) -> Result<(), AutomationError> {
        self.calls.lock().unwrap().push(Call::Key(key));
        match self.key_errors.get(&key) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn settle_delay(&self) -> Duration {
        Duration::ZERO
    }
}

#[derive(Debug)]
struct FakeElement {
    selector: Selector,
    node: FakeNode,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl UIElementImpl for FakeElement {
    fn id(&self) -> String {
        format!("fake:{}", self.selector)
    }

    fn selector(&self) -> &Selector {
        &self.selector
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, AutomationError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Attribute(self.selector.to_string()));
        assert_eq!(name, crate::element::FOCUSABLE_ATTRIBUTE);
        self.node.focusable.clone()
    }

    fn send_keys(&self, text: &str) -> Result<(), AutomationError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::SendKeys(self.selector.to_string(), text.to_string()));
        self.node.accepts.clone()
    }
}
