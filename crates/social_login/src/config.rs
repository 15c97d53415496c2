use serde::{Deserialize, Serialize};

/// Provider settings for the social-login button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLoginConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Application id issued by the provider; empty disables the button.
    #[serde(default)]
    pub app_id: String,
    #[serde(default = "default_sdk_version")]
    pub sdk_version: String,
    #[serde(default = "default_scope")]
    pub scope: Vec<String>,
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    #[serde(default = "default_exchange_endpoint")]
    pub exchange_endpoint: String,
}

fn default_provider() -> String {
    "facebook".to_string()
}

fn default_sdk_version() -> String {
    "v8.0".to_string()
}

fn default_scope() -> Vec<String> {
    vec!["email".to_string(), "public_profile".to_string()]
}

fn default_fields() -> Vec<String> {
    ["id", "email", "first_name", "last_name"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_exchange_endpoint() -> String {
    "/customer/login/facebook/".to_string()
}

impl Default for SocialLoginConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            app_id: String::new(),
            sdk_version: default_sdk_version(),
            scope: default_scope(),
            fields: default_fields(),
            exchange_endpoint: default_exchange_endpoint(),
        }
    }
}

impl SocialLoginConfig {
    pub fn is_enabled(&self) -> bool {
        !self.app_id.trim().is_empty()
    }

    /// Scope as the comma separated list the provider SDK expects.
    pub fn scope_param(&self) -> String {
        self.scope.join(",")
    }

    pub fn sanitize(&mut self) {
        if self.provider.trim().is_empty() {
            self.provider = default_provider();
        }
        if self.sdk_version.trim().is_empty() {
            self.sdk_version = default_sdk_version();
        }
        if self.scope.is_empty() {
            self.scope = default_scope();
        }
        if self.fields.is_empty() {
            self.fields = default_fields();
        }
        if self.exchange_endpoint.trim().is_empty() {
            self.exchange_endpoint = default_exchange_endpoint();
        }
        self.app_id = self.app_id.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: SocialLoginConfig =
            serde_json::from_str(r#"{ "app_id": "1234" }"#).unwrap();
        assert_eq!(config.provider, "facebook");
        assert_eq!(config.sdk_version, "v8.0");
        assert_eq!(config.scope_param(), "email,public_profile");
        assert_eq!(config.fields, vec!["id", "email", "first_name", "last_name"]);
        assert_eq!(config.exchange_endpoint, "/customer/login/facebook/");
        assert!(config.is_enabled());
    }

    #[test]
    fn sanitize_restores_blank_values() {
        let mut config = SocialLoginConfig {
            provider: " ".into(),
            app_id: "  99 ".into(),
            sdk_version: String::new(),
            scope: Vec::new(),
            fields: Vec::new(),
            exchange_endpoint: String::new(),
        };
        config.sanitize();
        assert_eq!(config, SocialLoginConfig {
            app_id: "99".into(),
            ..SocialLoginConfig::default()
        });
    }

    #[test]
    fn default_config_is_disabled() {
        assert!(!SocialLoginConfig::default().is_enabled());
    }
}
