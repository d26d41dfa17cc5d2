//! Runtime configuration read from the environment.

use std::net::SocketAddr;

use zap_observability::LogFormat;

/// Deployment mode. Controls how much failure detail reaches callers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    Development,
    #[default]
    Production,
}

impl Mode {
    /// Anything other than `development` is treated as production.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Mode::Development,
            _ => Mode::Production,
        }
    }

    pub fn is_development(self) -> bool {
        matches!(self, Mode::Development)
    }

    pub fn log_format(self) -> LogFormat {
        match self {
            Mode::Development => LogFormat::Text,
            Mode::Production => LogFormat::Json,
        }
    }
}

/// VAPID credentials for Web Push. All three must be set for push to work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VapidConfig {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
    pub mail: Option<String>,
}

impl VapidConfig {
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        mail: impl Into<String>,
    ) -> Self {
        Self {
            public_key: Some(public_key.into()),
            private_key: Some(private_key.into()),
            mail: Some(mail.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub mode: Mode,
    pub bind_addr: SocketAddr,
    pub vapid: VapidConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Production,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            vapid: VapidConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read `ZAP_ENV`, `BIND_ADDR` and `VAPID_*` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let mode = lookup("ZAP_ENV").map(|v| Mode::parse(&v)).unwrap_or(defaults.mode);

        let bind_addr = match lookup("BIND_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "invalid BIND_ADDR; using default");
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let vapid = VapidConfig {
            public_key: non_empty("VAPID_PUBLIC_KEY"),
            private_key: non_empty("VAPID_PRIVATE_KEY"),
            mail: non_empty("VAPID_MAIL"),
        };

        Self {
            mode,
            bind_addr,
            vapid,
        }
    }

    pub fn with_vapid(mut self, vapid: VapidConfig) -> Self {
        self.vapid = vapid;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_production() {
        let cfg = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, AppConfig::default());
        assert!(!cfg.mode.is_development());
    }

    #[test]
    fn reads_all_keys() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("ZAP_ENV", "development"),
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("VAPID_PUBLIC_KEY", "pub"),
            ("VAPID_PRIVATE_KEY", "priv"),
            ("VAPID_MAIL", "ops@example.com"),
        ]));
        assert_eq!(cfg.mode, Mode::Development);
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.vapid, VapidConfig::new("pub", "priv", "ops@example.com"));
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("ZAP_ENV", "staging"),
            ("BIND_ADDR", "not-an-addr"),
            ("VAPID_MAIL", "  "),
        ]));
        assert_eq!(cfg.mode, Mode::Production);
        assert_eq!(cfg.bind_addr, AppConfig::default().bind_addr);
        assert_eq!(cfg.vapid.mail, None);
    }
}
