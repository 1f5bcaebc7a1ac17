use crate::config::Config;
use crate::errors::AutomationError;
use crate::platforms::{create_engine, AppiumEngine};
use std::ops::Deref;
use tracing::{info, warn};

/// A remote session that has to be ended explicitly.
pub trait RemoteSession {
    fn id(&self) -> &str;
    fn close(&self) -> Result<(), AutomationError>;
}

impl RemoteSession for AppiumEngine {
    fn id(&self) -> &str {
        crate::platforms::AutomationEngine::session_id(self)
    }

    fn close(&self) -> Result<(), AutomationError> {
        self.quit()
    }
}

/// Owns an open session and ends it exactly once: through [`close`](Self::close),
/// or on drop if it was never closed, including while unwinding.
pub struct SessionGuard<S: RemoteSession> {
    session: Option<S>,
    session_url: Option<String>,
}

impl SessionGuard<AppiumEngine> {
    /// Open a session on the device described by `config`.
    pub fn open(config: &Config) -> Result<Self, AutomationError> {
        let engine = create_engine(config)?;
        let url = config.session_url(RemoteSession::id(&engine));
        Ok(Self::new(engine).with_session_url(url))
    }
}

impl<S: RemoteSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session: Some(session),
            session_url: None,
        }
    }

    /// Link logged when the session ends
    pub fn with_session_url(mut self, url: impl Into<String>) -> Self {
        self.session_url = Some(url.into());
        self
    }

    /// End the session now and report whether the remote side acknowledged it.
    pub fn close(mut self) -> Result<(), AutomationError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), AutomationError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        info!("Ending session: {}", session.id());
        if let Some(url) = &self.session_url {
            info!("View session at: {}", url);
        }
        session.close()
    }
}

impl<S: RemoteSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        // `session` is only taken by `release`, which consumes or drops the guard.
        match &self.session {
            Some(session) => session,
            None => unreachable!("session accessed after release"),
        }
    }
}

impl<S: RemoteSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            warn!("Session ended due to a panic");
        }
        if let Err(e) = self.release() {
            warn!("Failed to end session cleanly: {}", e);
        }
    }
}
