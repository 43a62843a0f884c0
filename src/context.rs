//! Per-request context and the access guard in front of the pipeline.
//!
//! A host keeps one [`RequestContext`] per user session and passes it into
//! every pipeline call. Nothing here is process-global.
//!
//! Access control is a separate [`AccessGuard`] checked before the pipeline
//! runs, so the open and the passcode-protected deployments share one entry
//! point ([`crate::quiz::prepare_quiz`]).

use crate::error::QuizError;
use tracing::debug;

/// Login state of one user session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    passcode: Option<String>,
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        self.passcode.is_some()
    }
}

/// Request-scoped state supplied by the host for every pipeline call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    upload_generation: u64,
    session: SessionState,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the passcode the user entered.
    pub fn sign_in(&mut self, passcode: impl Into<String>) {
        self.session.passcode = Some(passcode.into());
    }

    pub fn sign_out(&mut self) {
        self.session = SessionState::default();
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Discard the current upload. The session survives.
    pub fn reset(&mut self) {
        self.upload_generation += 1;
        debug!("Upload reset, generation {}", self.upload_generation);
    }

    /// Counter bumped by every [`RequestContext::reset`].
    pub fn upload_generation(&self) -> u64 {
        self.upload_generation
    }

    /// Widget key for the host's file picker; changes on every reset so the
    /// picker comes back empty.
    pub fn upload_key(&self) -> String {
        format!("upload-{}", self.upload_generation)
    }
}

/// Decides whether a request may run the pipeline.
pub trait AccessGuard: Send + Sync {
    fn check(&self, ctx: &RequestContext) -> Result<(), QuizError>;
}

/// Lets every request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAccess;

impl AccessGuard for OpenAccess {
    fn check(&self, _ctx: &RequestContext) -> Result<(), QuizError> {
        Ok(())
    }
}

/// Requires the session to hold the configured passcode.
#[derive(Clone)]
pub struct PasscodeGuard {
    expected: String,
}

impl PasscodeGuard {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

impl std::fmt::Debug for PasscodeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasscodeGuard").finish_non_exhaustive()
    }
}

impl AccessGuard for PasscodeGuard {
    fn check(&self, ctx: &RequestContext) -> Result<(), QuizError> {
        match ctx.session.passcode.as_deref() {
            None => Err(QuizError::AccessDenied {
                reason: "sign in first".into(),
            }),
            Some(given) if constant_time_eq(given.as_bytes(), self.expected.as_bytes()) => Ok(()),
            Some(_) => Err(QuizError::AccessDenied {
                reason: "wrong passcode".into(),
            }),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
