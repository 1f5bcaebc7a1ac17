//! The settings flow: open the app's settings screen and fill its required fields.

use crate::errors::AutomationError;
use crate::keys::RemoteKey;
use crate::platforms::AutomationEngine;
use crate::search::FocusableSearch;
use crate::selector::Selector;
use crate::telemetry::{epoch_seconds, LabelSink};
use std::thread;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub const NAVIGATE_STEP_LABEL: &str = "Step 1: Navigate to Settings";
pub const FILL_STEP_LABEL: &str = "Step 2: Fill All Required Fields";

/// Keys that move from the home screen to the settings screen
pub const SETTINGS_PATH: [RemoteKey; 4] = [
    RemoteKey::Up,
    RemoteKey::Right,
    RemoteKey::Right,
    RemoteKey::Select,
];

const DEFAULT_FIELD_SELECTOR: &str = "//VoiceTextEditBox";

/// One text field to fill, identified by an approximate selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    pub text: String,
    pub selector: Selector,
}

impl FieldEntry {
    pub fn new(text: impl Into<String>, selector: impl Into<Selector>) -> Self {
        Self {
            text: text.into(),
            selector: selector.into(),
        }
    }
}

/// Pauses between flow steps.
#[derive(Debug, Clone, Copy)]
pub struct FlowTimings {
    /// Before the first key press, while the app loads
    pub app_load: Duration,
    /// After selecting a field, while the on-screen keyboard opens
    pub keyboard_open: Duration,
    /// After moving off a filled field
    pub between_fields: Duration,
    /// Before returning, so the last screen can be inspected in the recording
    pub before_exit: Duration,
}

impl Default for FlowTimings {
    fn default() -> Self {
        Self {
            app_load: Duration::from_secs(5),
            keyboard_open: Duration::from_secs(1),
            between_fields: Duration::from_secs(1),
            before_exit: Duration::from_secs(10),
        }
    }
}

impl FlowTimings {
    /// No pauses at all
    pub fn none() -> Self {
        Self {
            app_load: Duration::ZERO,
            keyboard_open: Duration::ZERO,
            between_fields: Duration::ZERO,
            before_exit: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldResult {
    pub text: String,
    pub filled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowReport {
    pub fields: Vec<FieldResult>,
}

impl FlowReport {
    pub fn all_filled(&self) -> bool {
        self.fields.iter().all(|f| f.filled)
    }
}

#[derive(Debug, Clone)]
pub struct SettingsFlow {
    pub fields: Vec<FieldEntry>,
    pub search: FocusableSearch,
    pub timings: FlowTimings,
}

impl Default for SettingsFlow {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            search: FocusableSearch::default(),
            timings: FlowTimings::default(),
        }
    }
}

/// Values the settings screen requires before a download can start
pub fn default_fields() -> Vec<FieldEntry> {
    ["qa", "0196cd0b-b2b7-7331-9d8b-9a965d7d4fb7", "en", "latest"]
        .into_iter()
        .map(|text| FieldEntry::new(text, DEFAULT_FIELD_SELECTOR))
        .collect()
}

impl SettingsFlow {
    pub fn new(fields: Vec<FieldEntry>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: FocusableSearch) -> Self {
        self.search = search;
        self
    }

    pub fn with_timings(mut self, timings: FlowTimings) -> Self {
        self.timings = timings;
        self
    }

    #[instrument(skip_all, fields(session_id = %engine.session_id()))]
    pub fn run(
        &self,
        engine: &dyn AutomationEngine,
        labels: Option<&dyn LabelSink>,
    ) -> Result<FlowReport, AutomationError> {
        thread::sleep(self.timings.app_load);

        info!("--- Step 1: Navigating to Settings ---");
        let start = epoch_seconds();
        for key in SETTINGS_PATH {
            press(engine, key)?;
        }
        post(labels, engine, NAVIGATE_STEP_LABEL, start);

        info!("--- Step 2: Filling in required fields ---");
        let start = epoch_seconds();
        let mut report = FlowReport::default();
        for field in &self.fields {
            info!("Filling field with: '{}'", field.text);
            let filled = self.fill_input_field(engine, field)?;
            if !filled {
                error!("Could not fill field '{}' near {}", field.text, field.selector);
            }
            report.fields.push(FieldResult {
                text: field.text.clone(),
                filled,
            });
            thread::sleep(self.timings.between_fields);
        }
        post(labels, engine, FILL_STEP_LABEL, start);

        info!("Automation flow complete. Waiting before exit...");
        thread::sleep(self.timings.before_exit);
        Ok(report)
    }

    /// Select the focused field, type into the nearest focusable node, move down.
    pub fn fill_input_field(
        &self,
        engine: &dyn AutomationEngine,
        field: &FieldEntry,
    ) -> Result<bool, AutomationError> {
        press(engine, RemoteKey::Select)?;
        thread::sleep(self.timings.keyboard_open);
        let filled = self
            .search
            .find_and_fill(engine, &field.selector, &field.text)?;
        press(engine, RemoteKey::Down)?;
        Ok(filled)
    }
}

/// A key that fails to reach the device is logged and skipped; a lost session is not.
fn press(engine: &dyn AutomationEngine, key: RemoteKey) -> Result<(), AutomationError> {
    match engine.press_key(key) {
        Err(e) if e.is_candidate_level() => {
            warn!("Continuing after failed key press '{}'", key);
            Ok(())
        }
        other => other,
    }
}

fn post(labels: Option<&dyn LabelSink>, engine: &dyn AutomationEngine, name: &str, start: f64) {
    if let Some(sink) = labels {
        sink.post_label(engine.session_id(), name, start, epoch_seconds());
    }
}
