//! Device-cloud configuration and session capabilities

use crate::errors::AutomationError;
use crate::keys::DEFAULT_SETTLE_DELAY;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api-dev.headspin.io/v0";
pub const DEFAULT_IMPLICIT_WAIT: Duration = Duration::from_secs(30);
const SESSION_UI_BASE: &str = "https://ui-dev.headspin.io/sessions";
const NEW_COMMAND_TIMEOUT_SECS: u64 = 300;

pub const ENV_API_TOKEN: &str = "HEADSPIN_API_TOKEN";
pub const ENV_APP_ID: &str = "APP_ID";
pub const ENV_UDID: &str = "UDID";
pub const ENV_API_BASE: &str = "HEADSPIN_API_BASE";
pub const ENV_APPIUM_URL: &str = "APPIUM_URL";

/// Everything needed to open a session on one device and report labels for it.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: String,
    pub app_id: String,
    pub udid: String,
    pub api_base: String,
    pub appium_url: String,
    pub implicit_wait: Duration,
    pub settle_delay: Duration,
}

impl Config {
    pub fn new(
        api_token: impl Into<String>,
        app_id: impl Into<String>,
        udid: impl Into<String>,
    ) -> Self {
        let api_token = api_token.into();
        let appium_url = default_appium_url(&api_token);
        Self {
            api_token,
            app_id: app_id.into(),
            udid: udid.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            appium_url,
            implicit_wait: DEFAULT_IMPLICIT_WAIT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, AutomationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AutomationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get(ENV_API_TOKEN);
        let app_id = get(ENV_APP_ID);
        let udid = get(ENV_UDID);

        let missing: Vec<&str> = [
            (ENV_API_TOKEN, token.is_none()),
            (ENV_APP_ID, app_id.is_none()),
            (ENV_UDID, udid.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(token), Some(app_id), Some(udid)) = (token, app_id, udid) else {
            return Err(AutomationError::Config(format!(
                "Environment variables not set: {}",
                missing.join(", ")
            )));
        };

        let mut config = Config::new(token, app_id, udid);
        if let Some(base) = get(ENV_API_BASE) {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(url) = get(ENV_APPIUM_URL) {
            config.appium_url = url;
        }
        Ok(config)
    }

    pub fn with_appium_url(mut self, url: impl Into<String>) -> Self {
        self.appium_url = url.into();
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_implicit_wait(mut self, wait: Duration) -> Self {
        self.implicit_wait = wait;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Capabilities requested when opening a session on the device
    pub fn capabilities(&self) -> RokuCapabilities {
        RokuCapabilities {
            platform_name: "roku".to_string(),
            automation_name: "roku".to_string(),
            device_name: "roku".to_string(),
            app_id: self.app_id.clone(),
            udid: self.udid.clone(),
            capture: true,
            new_command_timeout: NEW_COMMAND_TIMEOUT_SECS,
            control_lock: true,
            retry_new_session_failure: false,
        }
    }

    /// Link to the session's waterfall view in the device-cloud UI
    pub fn session_url(&self, session_id: &str) -> String {
        format!("{SESSION_UI_BASE}/{session_id}/waterfall")
    }
}

fn default_appium_url(token: &str) -> String {
    format!("https://appium-dev.headspin.io:443/v0/{token}/wd/hub")
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RokuCapabilities {
    #[serde(rename = "platformName")]
    pub platform_name: String,
    #[serde(rename = "appium:automationName")]
    pub automation_name: String,
    #[serde(rename = "appium:deviceName")]
    pub device_name: String,
    #[serde(rename = "headspin:app.id")]
    pub app_id: String,
    #[serde(rename = "appium:udid")]
    pub udid: String,
    #[serde(rename = "headspin:capture")]
    pub capture: bool,
    #[serde(rename = "appium:newCommandTimeout")]
    pub new_command_timeout: u64,
    #[serde(rename = "headspin:controlLock")]
    pub control_lock: bool,
    #[serde(rename = "headspin:retryNewSessionFailure")]
    pub retry_new_session_failure: bool,
}
