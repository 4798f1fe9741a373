//! Startup configuration read from the environment.
//!
//! Environment variables:
//! - `SUPABASE_URL` (or `NEXT_PUBLIC_SUPABASE_URL`): hosted service endpoint
//! - `SUPABASE_ANON_KEY` (or `NEXT_PUBLIC_SUPABASE_ANON_KEY`): public anonymous key
//! - `SUPABASE_SERVICE_ROLE_KEY`: private key, only its presence is reported
//! - `SITE_URL` (or `NEXT_PUBLIC_SITE_URL`): origin used for magic-link callbacks
//! - `APP_ENV`: runtime mode reported by the health endpoint
//! - `BIND_ADDR`: server listen address
//! - `COOKIE_SECURE`: "1" or "true" to mark cookies `Secure`

use serde::Serialize;

pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_APP_ENV: &str = "development";

/// Connection settings for the hosted service, when both public values are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub service_role_key: Option<String>,
    pub site_url: String,
    pub app_env: String,
    pub bind_addr: String,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        Self {
            supabase_url: get(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"]),
            supabase_anon_key: get(&["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"]),
            service_role_key: get(&["SUPABASE_SERVICE_ROLE_KEY"]),
            site_url: get(&["SITE_URL", "NEXT_PUBLIC_SITE_URL"])
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            app_env: get(&["APP_ENV"]).unwrap_or_else(|| DEFAULT_APP_ENV.to_string()),
            bind_addr: get(&["BIND_ADDR"]).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            cookie_secure: get(&["COOKIE_SECURE"])
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    /// Both public values, if present.
    pub fn supabase(&self) -> Option<SupabaseSettings> {
        match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(anon_key)) => Some(SupabaseSettings {
                url: url.clone(),
                anon_key: anon_key.clone(),
            }),
            _ => None,
        }
    }

    pub fn environment_check(&self) -> EnvironmentCheck {
        EnvironmentCheck {
            supabase_url: self.supabase_url.is_some(),
            supabase_anon_key: self.supabase_anon_key.is_some(),
            service_role_key: self.service_role_key.is_some(),
            app_env: self.app_env.clone(),
        }
    }
}

/// Presence of each configuration value, as reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EnvironmentCheck {
    #[serde(rename = "SUPABASE_URL")]
    pub supabase_url: bool,
    #[serde(rename = "SUPABASE_ANON_KEY")]
    pub supabase_anon_key: bool,
    #[serde(rename = "SUPABASE_SERVICE_ROLE_KEY")]
    pub service_role_key: bool,
    #[serde(rename = "APP_ENV")]
    pub app_env: String,
}

impl EnvironmentCheck {
    pub fn public_values_present(&self) -> bool {
        self.supabase_url && self.supabase_anon_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = config(&[]);
        assert!(config.supabase().is_none());
        assert_eq!(config.site_url, DEFAULT_SITE_URL);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.app_env, DEFAULT_APP_ENV);
        assert!(!config.cookie_secure);
    }

    #[test]
    fn test_legacy_names_are_accepted() {
        let config = config(&[
            ("NEXT_PUBLIC_SUPABASE_URL", "https://abc.supabase.co"),
            ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "anon"),
            ("NEXT_PUBLIC_SITE_URL", "https://recipes.example.com/"),
        ]);
        let settings = config.supabase().unwrap();
        assert_eq!(settings.url, "https://abc.supabase.co");
        assert_eq!(settings.anon_key, "anon");
        assert_eq!(config.site_url, "https://recipes.example.com");
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let config = config(&[("SUPABASE_URL", "  "), ("SUPABASE_ANON_KEY", "anon")]);
        let check = config.environment_check();
        assert!(!check.supabase_url);
        assert!(check.supabase_anon_key);
        assert!(!check.public_values_present());
    }

    #[test]
    fn test_environment_check_serializes_variable_names() {
        let config = config(&[("SUPABASE_SERVICE_ROLE_KEY", "secret"), ("APP_ENV", "test")]);
        let json = serde_json::to_value(config.environment_check()).unwrap();
        assert_eq!(json["SUPABASE_SERVICE_ROLE_KEY"], true);
        assert_eq!(json["SUPABASE_URL"], false);
        assert_eq!(json["APP_ENV"], "test");
    }
}
