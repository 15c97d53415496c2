use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::SocialLoginConfig;
use crate::machine::{transition, LoginEvent, LoginState, TransitionNotAllowed};

/// Form submitted to the store once the provider grants an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenExchangeForm {
    pub access_token: String,
}

impl TokenExchangeForm {
    /// Form fields in submission order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![("access_token", self.access_token.as_str())]
    }
}

/// Posts the token exchange form to the store backend.
pub trait TokenExchanger {
    type Error: fmt::Display;

    fn exchange(&self, endpoint: &str, form: &TokenExchangeForm) -> Result<(), Self::Error>;
}

/// How the provider dialog answered a login request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResponse {
    Authorized { access_token: String },
    Declined,
    Failed(String),
}

impl From<ProviderResponse> for LoginEvent {
    fn from(response: ProviderResponse) -> Self {
        match response {
            ProviderResponse::Authorized { access_token } => LoginEvent::Authorized { access_token },
            ProviderResponse::Declined => LoginEvent::Declined,
            ProviderResponse::Failed(message) => LoginEvent::Failed(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("social login is not configured")]
    Disabled,
    #[error("login canceled by the user")]
    Canceled,
    #[error("provider reported an error: {0}")]
    Provider(String),
    #[error("token exchange with {endpoint} failed: {message}")]
    Exchange { endpoint: String, message: String },
    #[error(transparent)]
    Transition(#[from] TransitionNotAllowed),
}

/// Drives the login state machine and hands granted tokens to the store.
pub struct LoginFlow<E> {
    config: SocialLoginConfig,
    exchanger: E,
    state: LoginState,
}

impl<E> LoginFlow<E>
where
    E: TokenExchanger,
{
    pub fn new(config: SocialLoginConfig, exchanger: E) -> Self {
        Self {
            config,
            exchanger,
            state: LoginState::Idle,
        }
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    pub fn config(&self) -> &SocialLoginConfig {
        &self.config
    }

    pub fn exchanger(&self) -> &E {
        &self.exchanger
    }

    /// Marks the provider SDK as loaded. A load failure moves the flow to
    /// `Error` and is returned as [`LoginError::Provider`].
    pub fn sdk_loaded(&mut self, result: Result<(), String>) -> Result<(), LoginError> {
        if !self.config.is_enabled() {
            return Err(LoginError::Disabled);
        }
        match result {
            Ok(()) => {
                self.apply(LoginEvent::SdkLoaded)?;
                Ok(())
            }
            Err(message) => {
                log::error!("{} SDK failed to load: {message}", self.config.provider);
                self.apply(LoginEvent::SdkFailed(message.clone()))?;
                Err(LoginError::Provider(message))
            }
        }
    }

    pub fn request_login(&mut self) -> Result<(), LoginError> {
        self.apply(LoginEvent::LoginRequested)?;
        log::debug!(
            "requesting {} login with scope '{}'",
            self.config.provider,
            self.config.scope_param()
        );
        Ok(())
    }

    /// Applies the provider's answer. A granted token is exchanged with the
    /// store; declines and errors are reported back as [`LoginError`].
    pub fn complete(&mut self, response: ProviderResponse) -> Result<(), LoginError> {
        self.apply(response.into())?;
        match &self.state {
            LoginState::Success { access_token } => {
                let form = TokenExchangeForm {
                    access_token: access_token.clone(),
                };
                let endpoint = self.config.exchange_endpoint.clone();
                if let Err(err) = self.exchanger.exchange(&endpoint, &form) {
                    let message = err.to_string();
                    log::error!("token exchange with {endpoint} failed: {message}");
                    self.apply(LoginEvent::ExchangeFailed(message.clone()))?;
                    return Err(LoginError::Exchange { endpoint, message });
                }
                log::info!("{} login exchanged with the store", self.config.provider);
                Ok(())
            }
            LoginState::Canceled => {
                log::warn!("{} login canceled by the user", self.config.provider);
                Err(LoginError::Canceled)
            }
            LoginState::Error { message } => {
                log::error!("{} login failed: {message}", self.config.provider);
                Err(LoginError::Provider(message.clone()))
            }
            _ => Ok(()),
        }
    }

    pub fn reset(&mut self) -> Result<(), LoginError> {
        self.apply(LoginEvent::Reset)?;
        Ok(())
    }

    fn apply(&mut self, event: LoginEvent) -> Result<(), TransitionNotAllowed> {
        let next = transition(&self.state, event)?;
        log::debug!("login state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}
