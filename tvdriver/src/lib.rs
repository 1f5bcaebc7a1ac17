//! Remote UI automation for set-top media devices
//!
//! This crate drives an accessibility-tree based TV app through a WebDriver
//! session: it presses remote-control keys, locates input fields even when
//! their position in the tree shifts, and types into them.
//!
//! ```no_run
//! use tvdriver::{Config, FocusableSearch, SessionGuard, Selector};
//!
//! let config = Config::from_env()?;
//! let session = SessionGuard::open(&config)?;
//! let filled = FocusableSearch::default().find_and_fill(
//!     &*session,
//!     &Selector::new("//VoiceTextEditBox"),
//!     "latest",
//! )?;
//! println!("filled: {filled}");
//! session.close()?;
//! # Ok::<(), tvdriver::AutomationError>(())
//! ```

pub mod config;
pub mod element;
pub mod errors;
pub mod flow;
pub mod keys;
pub mod platforms;
pub mod search;
pub mod selector;
pub mod session;
pub mod telemetry;
#[cfg(test)]
mod tests;

pub use config::Config;
pub use element::{UIElement, UIElementImpl};
pub use errors::AutomationError;
pub use flow::{FieldEntry, FlowReport, FlowTimings, SettingsFlow};
pub use keys::RemoteKey;
pub use platforms::{create_engine, AppiumEngine, AutomationEngine};
pub use search::{CandidateAttempt, CandidateOutcome, FocusableSearch, SearchReport};
pub use selector::Selector;
pub use session::{RemoteSession, SessionGuard};
pub use telemetry::{LabelReporter, LabelSink};
