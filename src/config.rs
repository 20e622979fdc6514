use anyhow::Context;
use serde::Deserialize;

/// Longest accepted session lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// When false, signup accepts a missing handle and the user picks one later.
    pub handle_required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub enum StorageConfig {
    Local {
        upload_dir: String,
        base_url: String,
    },
    S3 {
        endpoint: String,
        region: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        public_base_url: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let require = |key: &str| get(key).with_context(|| format!("{key} must be set"));

        let jwt = JwtConfig {
            secret: require("JWT_SECRET")?,
            issuer: or("JWT_ISSUER", "biolink"),
            audience: or("JWT_AUDIENCE", "biolink-users"),
            ttl_minutes: parse_or(get("JWT_TTL_MINUTES"), "JWT_TTL_MINUTES", 60 * 24 * 14)?,
        };
        anyhow::ensure!(
            (1..=MAX_TTL_MINUTES).contains(&jwt.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {}",
            jwt.ttl_minutes
        );

        let auth = AuthConfig {
            handle_required: parse_or(get("HANDLE_REQUIRED"), "HANDLE_REQUIRED", false)?,
        };

        let app_url = or("APP_URL", "http://localhost:8080");
        let storage = match or("STORAGE_TYPE", "local").as_str() {
            "local" => StorageConfig::Local {
                upload_dir: or("UPLOAD_DIR", "./uploads"),
                base_url: format!("{}/uploads", app_url.trim_end_matches('/')),
            },
            "s3" => StorageConfig::S3 {
                endpoint: require("S3_ENDPOINT")?,
                region: or("S3_REGION", "us-west-004"),
                bucket: require("S3_BUCKET")?,
                access_key: require("S3_KEY_ID")?,
                secret_key: require("S3_APPLICATION_KEY")?,
                public_base_url: require("S3_BASE_URL")?,
            },
            other => anyhow::bail!("unknown STORAGE_TYPE {other:?}, expected \"local\" or \"s3\""),
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            database_max_connections: parse_or(
                get("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                10,
            )?,
            jwt,
            auth,
            storage,
            host: or("APP_HOST", "0.0.0.0"),
            port: parse_or(get("APP_PORT"), "APP_PORT", 8080)?,
            request_timeout_secs: parse_or(get("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS", 30)?,
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key} {v:?}: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_vars(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = config_from(&[("JWT_SECRET", "s3cret")]).expect("config");
        assert_eq!(cfg.jwt.secret, "s3cret");
        assert_eq!(cfg.jwt.issuer, "biolink");
        assert_eq!(cfg.jwt.ttl_minutes, 60 * 24 * 14);
        assert!(!cfg.auth.handle_required);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.port, 8080);
        match cfg.storage {
            StorageConfig::Local { upload_dir, base_url } => {
                assert_eq!(upload_dir, "./uploads");
                assert_eq!(base_url, "http://localhost:8080/uploads");
            }
            other => panic!("expected local storage, got {other:?}"),
        }
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn s3_requires_bucket_and_credentials() {
        let err = config_from(&[("JWT_SECRET", "x"), ("STORAGE_TYPE", "s3")]).unwrap_err();
        assert!(err.to_string().contains("S3_"));

        let cfg = config_from(&[
            ("JWT_SECRET", "x"),
            ("STORAGE_TYPE", "s3"),
            ("S3_ENDPOINT", "https://s3.example.com"),
            ("S3_BUCKET", "avatars"),
            ("S3_KEY_ID", "key"),
            ("S3_APPLICATION_KEY", "app-key"),
            ("S3_BASE_URL", "https://cdn.example.com"),
        ])
        .expect("config");
        assert!(matches!(cfg.storage, StorageConfig::S3 { ref region, .. } if region == "us-west-004"));
    }

    #[test]
    fn malformed_numbers_and_flags_are_rejected() {
        assert!(config_from(&[("JWT_SECRET", "x"), ("APP_PORT", "eighty")]).is_err());
        assert!(config_from(&[("JWT_SECRET", "x"), ("HANDLE_REQUIRED", "maybe")]).is_err());
        let cfg = config_from(&[("JWT_SECRET", "x"), ("HANDLE_REQUIRED", "true")]).expect("config");
        assert!(cfg.auth.handle_required);
    }

    #[test]
    fn jwt_ttl_must_be_positive_and_bounded() {
        for ttl in ["0", "-5", "1000000000000"] {
            let err = config_from(&[("JWT_SECRET", "x"), ("JWT_TTL_MINUTES", ttl)]).unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_MINUTES"), "{ttl}: {err}");
        }
        let cfg = config_from(&[("JWT_SECRET", "x"), ("JWT_TTL_MINUTES", "525600")]).expect("config");
        assert_eq!(cfg.jwt.ttl_minutes, MAX_TTL_MINUTES);
    }

    #[test]
    fn unknown_storage_type_is_rejected() {
        let err = config_from(&[("JWT_SECRET", "x"), ("STORAGE_TYPE", "ftp")]).unwrap_err();
        assert!(err.to_string().contains("STORAGE_TYPE"));
    }
}
