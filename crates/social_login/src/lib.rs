//! Social-login handshake for the storefront: SDK bootstrap, provider
//! authorization, and exchange of the provider token for a store session.

pub mod config;
pub mod flow;
pub mod machine;

pub use config::SocialLoginConfig;
pub use flow::{LoginError, LoginFlow, ProviderResponse, TokenExchangeForm, TokenExchanger};
pub use machine::{transition, LoginEvent, LoginState, TransitionNotAllowed};
