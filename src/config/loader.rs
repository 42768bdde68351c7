//! Runtime settings from the environment (after `.env` is loaded by the binary).

use crate::error::ConfigError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    /// Base URL of the hosted auth service (e.g. `https://xyz.supabase.co`).
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    /// Privileged key; server side only, never sent to clients.
    pub supabase_service_role_key: Option<String>,
    pub port: u16,
    pub environment: String,
    pub db_max_connections: u32,
    pub require_auth_for_writes: bool,
    pub run_migrations: bool,
    pub seed_sample_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::MissingRequired("DATABASE_URL"))?;
        let port = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue("PORT", v))?,
            None => 3000,
        };
        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS", v))?,
            None => 5,
        };

        Ok(AppConfig {
            database_url,
            supabase_url: get("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            supabase_anon_key: get("SUPABASE_ANON_KEY"),
            supabase_service_role_key: get("SUPABASE_SERVICE_ROLE_KEY"),
            port,
            environment: get("APP_ENV").unwrap_or_else(|| "development".into()),
            db_max_connections,
            require_auth_for_writes: parse_flag(get("REQUIRE_AUTH_FOR_WRITES"), "REQUIRE_AUTH_FOR_WRITES", true)?,
            run_migrations: parse_flag(get("RUN_MIGRATIONS"), "RUN_MIGRATIONS", true)?,
            seed_sample_data: parse_flag(get("SEED_SAMPLE_DATA"), "SEED_SAMPLE_DATA", false)?,
        })
    }
}

fn parse_flag(value: Option<String>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::InvalidValue(key, value.unwrap_or_default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/inventory")])).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.environment, "development");
        assert_eq!(cfg.db_max_connections, 5);
        assert!(cfg.require_auth_for_writes);
        assert!(cfg.run_migrations);
        assert!(!cfg.seed_sample_data);
        assert!(cfg.supabase_url.is_none());
    }

    #[test]
    fn database_url_is_required() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired("DATABASE_URL")));
    }

    #[test]
    fn invalid_port_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x/y"), ("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("PORT", _)));
    }

    #[test]
    fn flags_and_urls_are_normalized() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x/y"),
            ("SUPABASE_URL", "https://demo.supabase.co/"),
            ("REQUIRE_AUTH_FOR_WRITES", "off"),
            ("APP_ENV", "production"),
        ]))
        .unwrap();
        assert_eq!(cfg.supabase_url.as_deref(), Some("https://demo.supabase.co"));
        assert!(!cfg.require_auth_for_writes);
        assert_eq!(cfg.environment, "production");
    }
}
