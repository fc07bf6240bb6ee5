//! Transfer sources
//!
//! The engine only consumes `RawPayload`; where it comes from is behind the
//! `TransactionSource` trait. `ExplorerClient` talks to Etherscan-compatible
//! APIs, `load_payload_file` reads a payload saved earlier.

pub mod explorer;

use crate::error::DataFetchError;
use crate::flow_core::RawPayload;
use async_trait::async_trait;
use std::fs;
use std::path::Path;

pub use explorer::{Closest, ExplorerClient};

/// Explorer network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Ethereum,
    Bsc,
}

impl Network {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ethereum" | "eth" => Some(Network::Ethereum),
            "bsc" => Some(Network::Bsc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Bsc => "bsc",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Network::Ethereum => "https://api.etherscan.io/api",
            Network::Bsc => "https://api.bscscan.com/api",
        }
    }

    /// Symbol native transfers are grouped and priced under
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Network::Ethereum => "ETH",
            Network::Bsc => "BNB",
        }
    }
}

/// One wallet, one date range
#[derive(Debug, Clone, PartialEq)]
pub struct FetchQuery {
    pub address: String,
    /// `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`
    pub start_date: String,
    pub end_date: String,
}

/// Producer of raw transfer payloads
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch the normal, token and internal transfers of a wallet over a date range
    async fn fetch_period(&self, query: &FetchQuery) -> Result<RawPayload, DataFetchError>;

    /// Source name for logging
    fn source_name(&self) -> &'static str;
}

/// Load a payload JSON file
pub fn load_payload_file<P: AsRef<Path>>(path: P) -> Result<RawPayload, DataFetchError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let payload: RawPayload = serde_json::from_str(&json)?;

    log::info!(
        "Loaded {} normal, {} erc20, {} internal transfers from {}",
        payload.normal.len(),
        payload.erc20.len(),
        payload.internal.len(),
        path.display()
    );
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_network_parse() {
        assert_eq!(Network::parse("Ethereum"), Some(Network::Ethereum));
        assert_eq!(Network::parse(" bsc "), Some(Network::Bsc));
        assert_eq!(Network::parse("solana"), None);
        assert_eq!(Network::Bsc.native_symbol(), "BNB");
    }

    #[test]
    fn test_load_payload_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"normal":[{{"from":"0xA","to":"0xB","value":"1","timeStamp":"1"}}],"erc20":[]}}"#
        )
        .unwrap();

        let payload = load_payload_file(file.path()).unwrap();
        assert_eq!(payload.normal.len(), 1);
        assert!(payload.internal.is_empty());

        assert!(matches!(
            load_payload_file("/definitely/not/here.json"),
            Err(DataFetchError::Io(_))
        ));
    }
}
