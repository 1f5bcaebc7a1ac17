use crate::config::Config;
use crate::keys::{RemoteKey, DEFAULT_SETTLE_DELAY};
use crate::{AutomationError, Selector, UIElement};
use std::time::Duration;
use tracing::{info, warn};

pub mod appium;

pub use appium::AppiumEngine;

/// The operations the automation core needs from a remote UI session.
///
/// Calls are blocking and issued one at a time. Implementations report
/// failures as [`AutomationError`] values; nothing here panics on a missing
/// node or a dropped connection.
pub trait AutomationEngine: Send + Sync {
    /// Identifier of the remote session, used for labels and diagnostics
    fn session_id(&self) -> &str;

    /// Resolve a selector against the live tree.
    ///
    /// Returns `NotFound` when no node matches and `Transport` when the lookup
    /// itself failed.
    fn find_element(&self, selector: &Selector) -> Result<UIElement, AutomationError>;

    /// Send one remote-control key to the device, without settling.
    fn dispatch_key(&self, key: RemoteKey) -> Result<(), AutomationError>;

    /// How long to wait after a key press before the next operation
    fn settle_delay(&self) -> Duration {
        DEFAULT_SETTLE_DELAY
    }

    /// Press a key and wait for the UI to settle.
    fn press_key(&self, key: RemoteKey) -> Result<(), AutomationError> {
        match self.dispatch_key(key) {
            Ok(()) => {
                info!("Pressed key: {}", key);
                std::thread::sleep(self.settle_delay());
                Ok(())
            }
            Err(e) => {
                warn!("Error pressing key '{}': {}", key, e);
                Err(e)
            }
        }
    }

    /// Press a key given by name. The name is validated before anything is
    /// sent to the device.
    fn press_key_named(&self, name: &str) -> Result<(), AutomationError> {
        let key: RemoteKey = name.parse()?;
        self.press_key(key)
    }
}

/// Open a remote session on the configured device.
pub fn create_engine(config: &Config) -> Result<AppiumEngine, AutomationError> {
    AppiumEngine::connect(config)
}
