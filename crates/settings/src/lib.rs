pub mod settings;
pub mod store;

pub use settings::{PrintProfile, Settings, SettingsError};
pub use store::SettingsStore;
