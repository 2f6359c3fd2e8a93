//! Server configuration and its environment loader.

use std::path::PathBuf;
use std::time::Duration;

use broadside_match::{MatchConfig, RuleSet, RuleSetError};
use broadside_session::SessionConfig;

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// A connection that sends nothing for this long is closed.
    pub idle_timeout: Duration,

    pub session: SessionConfig,

    /// Rules and actor settings for every match.
    pub matches: MatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            idle_timeout: Duration::from_secs(300),
            session: SessionConfig::default(),
            matches: MatchConfig::default(),
        }
    }
}

/// A configuration value was present but unusable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT must be a port number, got {0:?}")]
    InvalidPort(String),

    #[error("BROADSIDE_IDLE_SECS must be a positive number of seconds, got {0:?}")]
    InvalidIdleTimeout(String),

    #[error("cannot read rule set {path:?}: {source}")]
    ReadRules {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse rule set {path:?}: {source}")]
    ParseRules {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unplayable rule set: {0}")]
    InvalidRules(#[from] RuleSetError),
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// | Variable              | Effect                                   |
    /// |-----------------------|------------------------------------------|
    /// | `BROADSIDE_BIND`      | full bind address, wins over `PORT`      |
    /// | `PORT`                | bind `0.0.0.0:$PORT`                     |
    /// | `BROADSIDE_IDLE_SECS` | idle timeout in seconds                  |
    /// | `BROADSIDE_RULES`     | path to a JSON [`RuleSet`]               |
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("BROADSIDE_BIND") {
            config.bind_addr = addr;
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
            config.bind_addr = format!("0.0.0.0:{port}");
        }

        if let Some(secs) = lookup("BROADSIDE_IDLE_SECS") {
            let parsed = secs
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::InvalidIdleTimeout(secs.clone()))?;
            config.idle_timeout = Duration::from_secs(parsed);
        }

        if let Some(path) = lookup("BROADSIDE_RULES") {
            config.matches.rules = load_rules(PathBuf::from(path))?;
        }

        Ok(config)
    }
}

fn load_rules(path: PathBuf) -> Result<RuleSet, ConfigError> {
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(source) => return Err(ConfigError::ReadRules { path, source }),
    };
    let rules: RuleSet = match serde_json::from_str(&text) {
        Ok(rules) => rules,
        Err(source) => return Err(ConfigError::ParseRules { path, source }),
    };
    rules.check()?;
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
        assert_eq!(config.matches.rules, RuleSet::classic());
    }

    #[test]
    fn test_from_lookup_port_binds_all_interfaces() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080")])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_from_lookup_bind_wins_over_port() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("BROADSIDE_BIND", "127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_from_lookup_bad_port() {
        let result = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::InvalidPort(p)) if p == "eighty"));
    }

    #[test]
    fn test_from_lookup_idle_timeout() {
        let config = ServerConfig::from_lookup(lookup(&[("BROADSIDE_IDLE_SECS", "45")])).unwrap();
        assert_eq!(config.idle_timeout, Duration::from_secs(45));

        let zero = ServerConfig::from_lookup(lookup(&[("BROADSIDE_IDLE_SECS", "0")]));
        assert!(matches!(zero, Err(ConfigError::InvalidIdleTimeout(_))));
    }

    #[test]
    fn test_from_lookup_rules_file() {
        let path = std::env::temp_dir().join(format!("broadside-rules-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"grid_size": 6, "fleet": [{"length": 2, "count": 2}, {"length": 1, "count": 1}]}"#,
        )
        .unwrap();

        let config = ServerConfig::from_lookup(lookup(&[(
            "BROADSIDE_RULES",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.matches.rules.grid_size, 6);
        assert_eq!(config.matches.rules.piece_count(), 3);
    }

    #[test]
    fn test_from_lookup_rules_file_with_huge_counts() {
        let path = std::env::temp_dir().join(format!("broadside-huge-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"grid_size": 4, "fleet": [{"length": 1, "count": 18446744073709551615}, {"length": 1, "count": 1}]}"#,
        )
        .unwrap();

        let result = ServerConfig::from_lookup(lookup(&[(
            "BROADSIDE_RULES",
            path.to_str().unwrap(),
        )]));
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidRules(RuleSetError::Overflow))
        ));
    }

    #[test]
    fn test_from_lookup_missing_rules_file() {
        let result = ServerConfig::from_lookup(lookup(&[(
            "BROADSIDE_RULES",
            "/nonexistent/broadside/rules.json",
        )]));
        assert!(matches!(result, Err(ConfigError::ReadRules { .. })));
    }
}
