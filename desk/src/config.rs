//! Desk configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use fxdesk_common::{constants, Currency, CurrencyPair};
use fxdesk_fx::{QuoteEngineConfig, RateCacheConfig, Spread};
use thiserror::Error;

/// Startup configuration failure. Always fatal.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    /// A variable is present but cannot be parsed.
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// Settings parse but contradict each other.
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

impl ConfigError {
    /// Get error code for render instructions.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Missing(_) => "CONFIG_MISSING",
            ConfigError::Invalid { .. } => "CONFIG_INVALID",
            ConfigError::Inconsistent(_) => "CONFIG_INCONSISTENT",
        }
    }
}

/// Quote configuration.
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    /// Currency the source quotes against.
    pub base: Currency,
    /// Currencies requested from the source.
    pub symbols: Vec<Currency>,
    /// Currency the rate board is priced in.
    pub home: Currency,
    /// Pair the conversion dialogue quotes.
    pub pair: CurrencyPair,
    /// Commercial spread.
    pub spread: Spread,
    /// How long a fetched snapshot stays usable.
    pub cache_ttl: chrono::Duration,
    /// Upper bound on one source call.
    pub fetch_timeout: Duration,
    /// Rate source URL override. `None` uses the public endpoint.
    pub rates_endpoint: Option<String>,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base: Currency::Usd,
            symbols: vec![Currency::Rub, Currency::Eur, Currency::Kzt],
            home: Currency::Rub,
            pair: CurrencyPair::new(Currency::Rub, Currency::Kzt),
            spread: Spread::DEFAULT,
            cache_ttl: constants::rate_cache_ttl(),
            fetch_timeout: constants::rate_fetch_timeout(),
            rates_endpoint: None,
        }
    }
}

impl QuoteConfig {
    /// Engine configuration for these settings.
    pub fn engine_config(&self) -> QuoteEngineConfig {
        QuoteEngineConfig {
            base: self.base,
            symbols: self.symbols.clone(),
            home: self.home,
            spread: self.spread,
            cache: RateCacheConfig { ttl: self.cache_ttl },
            fetch_timeout: self.fetch_timeout,
        }
    }

    fn is_quoted(&self, currency: Currency) -> bool {
        currency == self.base || self.symbols.contains(&currency)
    }
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Locked rates older than this are refused. `None` keeps them forever.
    pub rate_lock_ttl: Option<chrono::Duration>,
    /// Sessions untouched for this long are dropped. `None` disables the sweep.
    pub idle_ttl: Option<chrono::Duration>,
    /// How often the idle sweep runs.
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rate_lock_ttl: None,
            idle_ttl: None,
            sweep_interval: constants::session_sweep_interval(),
        }
    }
}

/// Main desk configuration.
#[derive(Clone)]
pub struct DeskConfig {
    /// Telegram bot token.
    pub bot_token: String,
    /// openexchangerates.org app id.
    pub api_key: String,
    /// Quote configuration.
    pub quote: QuoteConfig,
    /// Session configuration.
    pub session: SessionConfig,
}

impl fmt::Debug for DeskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeskConfig")
            .field("bot_token", &"<redacted>")
            .field("api_key", &"<redacted>")
            .field("quote", &self.quote)
            .field("session", &self.session)
            .finish()
    }
}

impl DeskConfig {
    /// Create configuration with default quote and session settings.
    pub fn new(bot_token: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_key: api_key.into(),
            quote: QuoteConfig::default(),
            session: SessionConfig::default(),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// Reads `BOT_TOKEN` (or `TELEGRAM_BOT_TOKEN`) and `OPENEXCHANGE_API_KEY`,
    /// plus the optional `FXDESK_*` overrides.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = present("BOT_TOKEN")
            .or_else(|| present("TELEGRAM_BOT_TOKEN"))
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;
        let api_key = present("OPENEXCHANGE_API_KEY")
            .ok_or(ConfigError::Missing("OPENEXCHANGE_API_KEY"))?;

        let mut config = Self::new(bot_token, api_key);

        if let Some(pair) = present("FXDESK_PAIR") {
            config.quote.pair = parse("FXDESK_PAIR", &pair)?;
        }

        if let Some(spread) = present("FXDESK_SPREAD") {
            let fraction: f64 = parse("FXDESK_SPREAD", &spread)?;
            config.quote.spread = Spread::new(fraction).map_err(|e| ConfigError::Invalid {
                key: "FXDESK_SPREAD",
                reason: e.to_string(),
            })?;
        }

        if let Some(secs) = present("FXDESK_FETCH_TIMEOUT_SECS") {
            let secs: u64 = parse("FXDESK_FETCH_TIMEOUT_SECS", &secs)?;
            config.quote.fetch_timeout = Duration::from_secs(secs);
        }

        if let Some(endpoint) = present("FXDESK_RATES_ENDPOINT") {
            config.quote.rates_endpoint = Some(endpoint.trim().to_string());
        }

        if let Some(secs) = present("FXDESK_RATE_LOCK_SECS") {
            config.session.rate_lock_ttl = optional_secs("FXDESK_RATE_LOCK_SECS", &secs)?;
        }

        if let Some(secs) = present("FXDESK_SESSION_IDLE_SECS") {
            config.session.idle_ttl = optional_secs("FXDESK_SESSION_IDLE_SECS", &secs)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.trim().is_empty() {
            return Err(ConfigError::Missing("BOT_TOKEN"));
        }

        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("OPENEXCHANGE_API_KEY"));
        }

        let quote = &self.quote;
        for currency in [quote.pair.from, quote.pair.to, quote.home] {
            if !quote.is_quoted(currency) {
                return Err(ConfigError::Inconsistent(format!(
                    "{} is neither the base nor a requested symbol",
                    currency
                )));
            }
        }

        if quote.fetch_timeout.is_zero() {
            return Err(ConfigError::Inconsistent(
                "Fetch timeout cannot be 0".to_string(),
            ));
        }

        if quote.cache_ttl <= chrono::Duration::zero() {
            return Err(ConfigError::Inconsistent(
                "Cache TTL must be positive".to_string(),
            ));
        }

        if self.session.sweep_interval.is_zero() {
            return Err(ConfigError::Inconsistent(
                "Session sweep interval cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

/// Seconds as an optional TTL; 0 disables.
fn optional_secs(key: &'static str, raw: &str) -> Result<Option<chrono::Duration>, ConfigError> {
    let secs: i64 = parse(key, raw)?;
    match secs {
        0 => Ok(None),
        s if s < 0 => Err(ConfigError::Invalid {
            key,
            reason: format!("expected seconds >= 0, got {}", s),
        }),
        s => Ok(Some(chrono::Duration::seconds(s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio_test::assert_ok;

    /// Mutex to serialize tests that modify environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![("BOT_TOKEN", "123:abc"), ("OPENEXCHANGE_API_KEY", "app-id")]
    }

    #[test]
    fn test_default_config() {
        let config = DeskConfig::new("123:abc", "app-id");
        assert_ok!(config.validate());
        assert_eq!(config.quote.spread, Spread::DEFAULT);
        assert_eq!(config.quote.cache_ttl, chrono::Duration::minutes(20));
        assert_eq!(config.quote.fetch_timeout, Duration::from_secs(10));
        assert!(config.session.rate_lock_ttl.is_none());
        assert!(config.quote.rates_endpoint.is_none());
    }

    #[test]
    fn test_missing_bot_token() {
        let result = DeskConfig::from_lookup(lookup(&[("OPENEXCHANGE_API_KEY", "app-id")]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("BOT_TOKEN"));
    }

    #[test]
    fn test_missing_api_key() {
        let result = DeskConfig::from_lookup(lookup(&[("BOT_TOKEN", "123:abc")]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("OPENEXCHANGE_API_KEY"));
    }

    #[test]
    fn test_blank_secret_counts_as_missing() {
        let result = DeskConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "   "),
            ("OPENEXCHANGE_API_KEY", "app-id"),
        ]));
        assert!(matches!(result, Err(ConfigError::Missing("BOT_TOKEN"))));
    }

    #[test]
    fn test_telegram_token_alias() {
        let config = DeskConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "456:def"),
            ("OPENEXCHANGE_API_KEY", "app-id"),
        ]))
        .unwrap();
        assert_eq!(config.bot_token, "456:def");
    }

    #[test]
    fn test_overrides() {
        let mut vars = required();
        vars.extend([
            ("FXDESK_PAIR", "eur/rub"),
            ("FXDESK_SPREAD", "0.02"),
            ("FXDESK_FETCH_TIMEOUT_SECS", "5"),
            ("FXDESK_RATES_ENDPOINT", "http://127.0.0.1:8080/latest.json"),
            ("FXDESK_RATE_LOCK_SECS", "300"),
            ("FXDESK_SESSION_IDLE_SECS", "0"),
        ]);

        let config = assert_ok!(DeskConfig::from_lookup(lookup(&vars)));

        assert_eq!(config.quote.pair, CurrencyPair::new(Currency::Eur, Currency::Rub));
        assert_eq!(config.quote.spread.fraction(), 0.02);
        assert_eq!(config.quote.fetch_timeout, Duration::from_secs(5));
        assert_eq!(
            config.quote.rates_endpoint.as_deref(),
            Some("http://127.0.0.1:8080/latest.json")
        );
        assert_eq!(config.session.rate_lock_ttl, Some(chrono::Duration::seconds(300)));
        assert!(config.session.idle_ttl.is_none());
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("FXDESK_SPREAD", "1.5"),
            ("FXDESK_SPREAD", "four"),
            ("FXDESK_PAIR", "RUB-KZT"),
            ("FXDESK_PAIR", "RUB/RUB"),
            ("FXDESK_FETCH_TIMEOUT_SECS", "-1"),
            ("FXDESK_RATE_LOCK_SECS", "-10"),
        ] {
            let mut vars = required();
            vars.push((key, value));
            let err = DeskConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(
                matches!(&err, ConfigError::Invalid { key: k, .. } if *k == key),
                "{key}={value} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_zero_fetch_timeout_is_inconsistent() {
        let mut vars = required();
        vars.push(("FXDESK_FETCH_TIMEOUT_SECS", "0"));
        let err = DeskConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_INCONSISTENT");
    }

    #[test]
    fn test_pair_outside_requested_symbols() {
        let mut config = DeskConfig::new("123:abc", "app-id");
        config.quote.symbols = vec![Currency::Rub];
        assert!(matches!(config.validate(), Err(ConfigError::Inconsistent(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", DeskConfig::new("123:secret", "app-secret"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("BOT_TOKEN", "env-token");
        std::env::set_var("OPENEXCHANGE_API_KEY", "env-key");
        std::env::set_var("FXDESK_SPREAD", "0.05");

        let config = DeskConfig::from_env().unwrap();
        assert_eq!(config.bot_token, "env-token");
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.quote.spread.fraction(), 0.05);

        std::env::remove_var("BOT_TOKEN");
        std::env::remove_var("OPENEXCHANGE_API_KEY");
        std::env::remove_var("FXDESK_SPREAD");
    }
}
