use std::fmt;

use thiserror::Error;

/// Where the login handshake currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoginState {
    #[default]
    Idle,
    /// The provider SDK finished loading and the button can be used.
    SdkReady,
    /// Waiting for the provider dialog to answer.
    Pending,
    Success {
        access_token: String,
    },
    Canceled,
    Error {
        message: String,
    },
}

impl LoginState {
    pub fn name(&self) -> &'static str {
        match self {
            LoginState::Idle => "idle",
            LoginState::SdkReady => "sdk_ready",
            LoginState::Pending => "pending",
            LoginState::Success { .. } => "success",
            LoginState::Canceled => "canceled",
            LoginState::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoginState::Success { .. } | LoginState::Canceled | LoginState::Error { .. }
        )
    }
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs that move the handshake forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvent {
    SdkLoaded,
    SdkFailed(String),
    LoginRequested,
    Authorized { access_token: String },
    /// The user closed the provider dialog without granting access.
    Declined,
    Failed(String),
    /// The store rejected the granted token.
    ExchangeFailed(String),
    Reset,
}

impl LoginEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LoginEvent::SdkLoaded => "sdk_loaded",
            LoginEvent::SdkFailed(_) => "sdk_failed",
            LoginEvent::LoginRequested => "login_requested",
            LoginEvent::Authorized { .. } => "authorized",
            LoginEvent::Declined => "declined",
            LoginEvent::Failed(_) => "failed",
            LoginEvent::ExchangeFailed(_) => "exchange_failed",
            LoginEvent::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot apply '{event}' while login is {state}")]
pub struct TransitionNotAllowed {
    pub state: &'static str,
    pub event: &'static str,
}

/// The only place login states change.
///
/// A canceled login may be retried directly since the SDK is still loaded;
/// `Reset` returns any state to `Idle`.
pub fn transition(state: &LoginState, event: LoginEvent) -> Result<LoginState, TransitionNotAllowed> {
    let next = match (state, event) {
        (_, LoginEvent::Reset) => LoginState::Idle,
        (LoginState::Idle, LoginEvent::SdkLoaded) => LoginState::SdkReady,
        (LoginState::Idle, LoginEvent::SdkFailed(message)) => LoginState::Error { message },
        (LoginState::SdkReady | LoginState::Canceled, LoginEvent::LoginRequested) => {
            LoginState::Pending
        }
        (LoginState::Pending, LoginEvent::Authorized { access_token }) => {
            LoginState::Success { access_token }
        }
        (LoginState::Pending, LoginEvent::Declined) => LoginState::Canceled,
        (LoginState::Pending, LoginEvent::Failed(message)) => LoginState::Error { message },
        (LoginState::Success { .. }, LoginEvent::ExchangeFailed(message)) => {
            LoginState::Error { message }
        }
        (state, event) => {
            return Err(TransitionNotAllowed {
                state: state.name(),
                event: event.name(),
            })
        }
    };
    Ok(next)
}
