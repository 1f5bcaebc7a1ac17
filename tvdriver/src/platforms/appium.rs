//! W3C WebDriver client for Appium-hosted devices

use crate::config::Config;
use crate::element::{UIElement, UIElementImpl};
use crate::errors::AutomationError;
use crate::keys::RemoteKey;
use crate::platforms::AutomationEngine;
use crate::selector::Selector;
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";
const PRESS_KEY_SCRIPT: &str = "roku: pressKey";
/// Slack on top of the implicit wait before a command is given up on
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(30);
/// Device-cloud session start can take minutes while a device is allocated
const NEW_SESSION_TIMEOUT: Duration = Duration::from_secs(300);

/// A failed wire call, before it is mapped onto [`AutomationError`].
#[derive(Debug)]
enum WireError {
    /// The request never produced a response
    Connection(String),
    /// The driver answered with a W3C error payload
    Protocol { error: String, message: String },
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireError::Connection(msg) => write!(f, "{msg}"),
            WireError::Protocol { error, message } => write!(f, "{error}: {message}"),
        }
    }
}

impl WireError {
    /// Known W3C error codes map to fixed variants; anything else goes through `fallback`.
    fn into_automation(self, fallback: fn(String) -> AutomationError) -> AutomationError {
        match self {
            WireError::Connection(msg) => AutomationError::Transport(msg),
            WireError::Protocol { error, message } => match error.as_str() {
                "no such element" | "stale element reference" => {
                    AutomationError::NotFound(message)
                }
                "invalid session id" => AutomationError::SessionUnavailable(message),
                _ => fallback(format!("{error}: {message}")),
            },
        }
    }
}

/// HTTP plumbing shared by the engine and every element it hands out.
#[derive(Debug)]
struct Wire {
    http: Client,
    base_url: String,
    session_id: String,
}

impl Wire {
    fn session_path(&self, suffix: &str) -> String {
        format!("/session/{}{}", self.session_id, suffix)
    }

    fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, WireError> {
        send(&self.http, &self.base_url, method, path, body, None)
    }
}

fn send(
    http: &Client,
    base_url: &str,
    method: Method,
    path: &str,
    body: Option<Value>,
    timeout: Option<Duration>,
) -> Result<Value, WireError> {
    let url = format!("{base_url}{path}");
    debug!("{} {}", method, url);

    let mut request = http.request(method, &url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request
        .send()
        .map_err(|e| WireError::Connection(format!("Request to {url} failed: {e}")))?;
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| WireError::Connection(format!("Failed to read response from {url}: {e}")))?;

    let parsed: Option<Value> = serde_json::from_str(&text).ok();

    if status.is_success() {
        return Ok(parsed
            .and_then(|mut v| v.get_mut("value").map(Value::take))
            .unwrap_or(Value::Null));
    }

    let value = parsed.as_ref().and_then(|v| v.get("value"));
    let error = value
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("http {}", status.as_u16()));
    let message = value
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or(text);

    Err(WireError::Protocol { error, message })
}

/// A remote session on one device, driven over the WebDriver wire protocol.
#[derive(Debug)]
pub struct AppiumEngine {
    wire: Arc<Wire>,
    settle_delay: Duration,
}

impl AppiumEngine {
    /// Open a new session with the device capabilities from `config` and set
    /// the implicit wait.
    #[instrument(skip(config), fields(url = %redact(&config.appium_url, &config.api_token)))]
    pub fn connect(config: &Config) -> Result<Self, AutomationError> {
        info!("Attempting to start Appium session...");
        let http = Client::builder()
            .timeout(request_timeout(config.implicit_wait))
            .build()
            .map_err(|e| {
                AutomationError::SessionUnavailable(format!("Failed to build http client: {e}"))
            })?;
        let base_url = config.appium_url.trim_end_matches('/').to_string();

        let body = json!({
            "capabilities": {
                "alwaysMatch": config.capabilities(),
                "firstMatch": [{}],
            }
        });
        let value = send(
            &http,
            &base_url,
            Method::POST,
            "/session",
            Some(body),
            Some(NEW_SESSION_TIMEOUT),
        )
        .map_err(|e| {
            AutomationError::SessionUnavailable(format!("Error starting Appium session: {e}"))
        })?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AutomationError::SessionUnavailable(format!(
                    "New session response carried no sessionId: {value}"
                ))
            })?
            .to_string();

        let engine = Self {
            wire: Arc::new(Wire {
                http,
                base_url,
                session_id,
            }),
            settle_delay: config.settle_delay,
        };

        if let Err(e) = engine.set_implicit_wait(config.implicit_wait) {
            // Leave no orphaned session behind on the device cloud.
            if let Err(quit_err) = engine.quit() {
                warn!("Failed to end session after setup error: {}", quit_err);
            }
            return Err(AutomationError::SessionUnavailable(format!(
                "Failed to set implicit wait: {e}"
            )));
        }

        info!(
            "Appium session started successfully with Session ID: {}",
            engine.session_id()
        );
        Ok(engine)
    }

    pub fn set_implicit_wait(&self, wait: Duration) -> Result<(), AutomationError> {
        let body = json!({ "implicit": wait.as_millis() as u64 });
        self.wire
            .command(Method::POST, &self.wire.session_path("/timeouts"), Some(body))
            .map(|_| ())
            .map_err(|e| e.into_automation(AutomationError::Transport))
    }

    /// End the remote session.
    #[instrument(skip(self), fields(session_id = %self.wire.session_id))]
    pub fn quit(&self) -> Result<(), AutomationError> {
        self.wire
            .command(Method::DELETE, &self.wire.session_path(""), None)
            .map(|_| ())
            .map_err(|e| e.into_automation(AutomationError::Transport))
    }
}

impl AutomationEngine for AppiumEngine {
    fn session_id(&self) -> &str {
        &self.wire.session_id
    }

    #[instrument(level = "debug", skip(self, selector), fields(selector = %selector))]
    fn find_element(&self, selector: &Selector) -> Result<UIElement, AutomationError> {
        let body = json!({ "using": "xpath", "value": selector.as_str() });
        let value = self
            .wire
            .command(Method::POST, &self.wire.session_path("/element"), Some(body))
            .map_err(|e| e.into_automation(AutomationError::Transport))?;

        let element_id = value
            .get(W3C_ELEMENT_KEY)
            .or_else(|| value.get(LEGACY_ELEMENT_KEY))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AutomationError::Internal(format!("Element response carried no element id: {value}"))
            })?;

        Ok(UIElement::new(Box::new(AppiumElement {
            wire: Arc::clone(&self.wire),
            element_id: element_id.to_string(),
            selector: selector.clone(),
        })))
    }

    fn dispatch_key(&self, key: RemoteKey) -> Result<(), AutomationError> {
        let body = json!({
            "script": PRESS_KEY_SCRIPT,
            "args": [{ "key": key.as_str() }],
        });
        self.wire
            .command(Method::POST, &self.wire.session_path("/execute/sync"), Some(body))
            .map(|_| ())
            .map_err(|e| e.into_automation(AutomationError::Transport))
    }

    fn settle_delay(&self) -> Duration {
        self.settle_delay
    }
}

#[derive(Debug)]
struct AppiumElement {
    wire: Arc<Wire>,
    element_id: String,
    selector: Selector,
}

impl AppiumElement {
    fn element_path(&self, suffix: &str) -> String {
        self.wire
            .session_path(&format!("/element/{}{}", self.element_id, suffix))
    }
}

impl UIElementImpl for AppiumElement {
    fn id(&self) -> String {
        self.element_id.clone()
    }

    fn selector(&self) -> &Selector {
        &self.selector
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, AutomationError> {
        let value = self
            .wire
            .command(
                Method::GET,
                &self.element_path(&format!("/attribute/{name}")),
                None,
            )
            .map_err(|e| e.into_automation(AutomationError::Transport))?;

        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    fn send_keys(&self, text: &str) -> Result<(), AutomationError> {
        let chars: Vec<String> = text.chars().map(String::from).collect();
        let body = json!({ "text": text, "value": chars });
        self.wire
            .command(Method::POST, &self.element_path("/value"), Some(body))
            .map(|_| ())
            .map_err(|e| {
                let err = e.into_automation(AutomationError::DeliveryRejected);
                warn!("Failed to send keys to {}: {}", self.selector, err);
                err
            })
    }
}

/// Total time allowed for one command. A lookup for a missing element only
/// answers after the implicit wait, so the client must outlast it.
fn request_timeout(implicit_wait: Duration) -> Duration {
    implicit_wait + REQUEST_TIMEOUT_MARGIN
}

/// Hide the API token when the endpoint embeds it.
fn redact(url: &str, token: &str) -> String {
    if token.is_empty() {
        url.to_string()
    } else {
        url.replace(token, "***")
    }
}
