//! Configuration from environment variables

use crate::datasource::Network;
use crate::layout::Canvas;
use std::env;

pub const DEFAULT_ETH_PRICE: f64 = 3000.0;
pub const DEFAULT_CANVAS_WIDTH: f64 = 960.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 720.0;

/// Engine configuration
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Block explorer API key (required only for live fetches)
    pub api_key: Option<String>,

    /// Explorer network, selects base URL and native token symbol
    pub network: Network,

    /// Dollar price of the native token
    pub eth_price: f64,

    /// Minimum aggregated dollar value for links and nodes
    pub dollar_threshold: f64,

    pub canvas_width: f64,
    pub canvas_height: f64,

    /// Radius of the circle non-central addresses sit on
    pub layout_radius: f64,

    pub rust_log: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl FlowConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `EXPLORER_API_KEY` (optional)
    /// - `NETWORK` (default: ethereum; ethereum | bsc)
    /// - `ETH_PRICE` (default: 3000)
    /// - `DOLLAR_THRESHOLD` (default: 0)
    /// - `CANVAS_WIDTH` / `CANVAS_HEIGHT` (default: 960 / 720)
    /// - `LAYOUT_RADIUS` (default: min(width, height) / 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_f64 = |key: &str, default: f64| -> f64 {
            match lookup(key) {
                Some(raw) => match raw.trim().parse::<f64>() {
                    Ok(value) if value.is_finite() => value,
                    _ => {
                        log::warn!("Invalid {} '{}', defaulting to {}", key, raw, default);
                        default
                    }
                },
                None => default,
            }
        };

        let network = match lookup("NETWORK") {
            Some(raw) => Network::parse(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "NETWORK must be 'ethereum' or 'bsc', got '{}'",
                    raw
                ))
            })?,
            None => Network::Ethereum,
        };

        let canvas_width = parse_f64("CANVAS_WIDTH", DEFAULT_CANVAS_WIDTH);
        let canvas_height = parse_f64("CANVAS_HEIGHT", DEFAULT_CANVAS_HEIGHT);
        if canvas_width <= 0.0 || canvas_height <= 0.0 {
            return Err(ConfigError::InvalidValue(
                "CANVAS_WIDTH and CANVAS_HEIGHT must be positive".to_string(),
            ));
        }
        let layout_radius = parse_f64("LAYOUT_RADIUS", canvas_width.min(canvas_height) / 3.0);

        Ok(Self {
            api_key: lookup("EXPLORER_API_KEY")
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            network,
            eth_price: parse_f64("ETH_PRICE", DEFAULT_ETH_PRICE),
            dollar_threshold: parse_f64("DOLLAR_THRESHOLD", 0.0),
            canvas_width,
            canvas_height,
            layout_radius,
            rust_log: lookup("RUST_LOG"),
        })
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.canvas_width, self.canvas_height)
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            network: Network::Ethereum,
            eth_price: DEFAULT_ETH_PRICE,
            dollar_threshold: 0.0,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            layout_radius: DEFAULT_CANVAS_WIDTH.min(DEFAULT_CANVAS_HEIGHT) / 3.0,
            rust_log: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = FlowConfig::from_source(lookup_from(&[])).unwrap();

        assert_eq!(config.api_key, None);
        assert_eq!(config.network, Network::Ethereum);
        assert_eq!(config.eth_price, 3000.0);
        assert_eq!(config.dollar_threshold, 0.0);
        assert_eq!(config.canvas_width, 960.0);
        assert_eq!(config.canvas_height, 720.0);
        assert_eq!(config.layout_radius, 240.0);
    }

    #[test]
    fn test_custom_config() {
        let config = FlowConfig::from_source(lookup_from(&[
            ("EXPLORER_API_KEY", " KEY123 "),
            ("NETWORK", "BSC"),
            ("ETH_PRICE", "2500.5"),
            ("DOLLAR_THRESHOLD", "100"),
            ("CANVAS_WIDTH", "600"),
            ("CANVAS_HEIGHT", "900"),
        ]))
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("KEY123"));
        assert_eq!(config.network, Network::Bsc);
        assert_eq!(config.eth_price, 2500.5);
        assert_eq!(config.dollar_threshold, 100.0);
        assert_eq!(config.layout_radius, 200.0);
    }

    #[test]
    fn test_invalid_values() {
        let err = FlowConfig::from_source(lookup_from(&[("NETWORK", "solana")])).unwrap_err();
        assert!(err.to_string().contains("solana"));

        // Unparsable numbers fall back to defaults
        let config = FlowConfig::from_source(lookup_from(&[("ETH_PRICE", "lots")])).unwrap();
        assert_eq!(config.eth_price, DEFAULT_ETH_PRICE);

        assert!(FlowConfig::from_source(lookup_from(&[("CANVAS_WIDTH", "-5")])).is_err());
    }
}
