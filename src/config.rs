use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Optional parentless account created at startup so an empty network has
/// a first referral code to hand out.
#[derive(Debug, Clone, Deserialize)]
pub struct RootUserConfig {
    pub email: String,
    pub password: String,
    pub referral_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub root: Option<RootUserConfig>,
}

const DEFAULT_TTL_MINUTES: i64 = 7 * 24 * 60;
const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let max_connections: u32 = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&lookup, "APP_PORT", 3000)?;

        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "referral-tracker".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "referral-tracker-users".into()),
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", DEFAULT_TTL_MINUTES)?,
        };
        anyhow::ensure!(jwt.ttl_minutes > 0, "JWT_TTL_MINUTES must be positive");
        anyhow::ensure!(
            jwt.ttl_minutes <= MAX_TTL_MINUTES,
            "JWT_TTL_MINUTES must be at most {MAX_TTL_MINUTES}"
        );

        let root = match (lookup("ROOT_EMAIL"), lookup("ROOT_PASSWORD")) {
            (Some(email), Some(password)) => Some(RootUserConfig {
                email,
                password,
                referral_code: lookup("ROOT_REFERRAL_CODE"),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            max_connections,
            host,
            port,
            jwt,
            root,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/referrals"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config should parse");

        assert_eq!(cfg.jwt.ttl_minutes, 7 * 24 * 60);
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.max_connections, 10);
        assert!(cfg.root.is_none());
    }

    #[test]
    fn requires_database_url_and_secret() {
        let err = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "x")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let err =
            AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "x"),
            ("APP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }

    #[test]
    fn token_ttl_is_bounded() {
        for raw in ["0", "-5", "99999999999"] {
            let err = AppConfig::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://x"),
                ("JWT_SECRET", "x"),
                ("JWT_TTL_MINUTES", raw),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_MINUTES"), "{raw}: {err}");
        }

        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "x"),
            ("JWT_TTL_MINUTES", "525600"),
        ]))
        .unwrap();
        assert_eq!(cfg.jwt.ttl_minutes, MAX_TTL_MINUTES);
    }

    #[test]
    fn root_user_needs_email_and_password() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "x"),
            ("ROOT_EMAIL", "root@example.com"),
        ]))
        .unwrap();
        assert!(cfg.root.is_none());

        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "x"),
            ("ROOT_EMAIL", "root@example.com"),
            ("ROOT_PASSWORD", "rootpass"),
            ("ROOT_REFERRAL_CODE", "ROOT01"),
        ]))
        .unwrap();
        let root = cfg.root.expect("root configured");
        assert_eq!(root.referral_code.as_deref(), Some("ROOT01"));
    }
}
