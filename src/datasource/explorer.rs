//! Etherscan-compatible explorer client
//!
//! ## API Reference
//!
//! - `module=block&action=getblocknobytime` - date to block number
//! - `module=account&action=txlist` - normal transfers
//! - `module=account&action=tokentx` - ERC20 transfers
//! - `module=account&action=txlistinternal` - internal transfers
//!
//! Every response carries `status` ("1" on success), `message` and `result`.

use super::{FetchQuery, Network, TransactionSource};
use crate::error::DataFetchError;
use crate::flow_core::{RawPayload, RawTx};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::time::Duration;

/// Which side of a timestamp the block lookup should land on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closest {
    Before,
    After,
}

impl Closest {
    pub fn as_str(&self) -> &'static str {
        match self {
            Closest::Before => "before",
            Closest::After => "after",
        }
    }
}

pub struct ExplorerClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    network: Network,
}

impl ExplorerClient {
    pub fn new(network: Network, api_key: Option<String>) -> Result<Self, DataFetchError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(DataFetchError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: network.base_url().to_string(),
            api_key,
            network,
        })
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Resolve a date to the closest block on the given side
    pub async fn date_to_block(&self, date: &str, closest: Closest) -> Result<u64, DataFetchError> {
        let timestamp = parse_date(date)?.to_string();
        let params = [
            ("module", "block"),
            ("action", "getblocknobytime"),
            ("timestamp", timestamp.as_str()),
            ("closest", closest.as_str()),
            ("apikey", self.api_key.as_str()),
        ];

        let body: Value = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?
            .json()
            .await?;

        parse_block_response(&body)
    }

    /// Fetch one transfer category between two blocks, oldest first
    pub async fn fetch_transactions(
        &self,
        address: &str,
        action: &str,
        start_block: u64,
        end_block: u64,
    ) -> Result<Vec<RawTx>, DataFetchError> {
        let start = start_block.to_string();
        let end = end_block.to_string();
        let params = [
            ("module", "account"),
            ("action", action),
            ("address", address),
            ("startblock", start.as_str()),
            ("endblock", end.as_str()),
            ("sort", "asc"),
            ("apikey", self.api_key.as_str()),
        ];

        let body: Value = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?
            .json()
            .await?;

        let txs = parse_transactions_response(action, &body)?;
        log::debug!("Fetched {} {} records for {}", txs.len(), action, address);
        Ok(txs)
    }
}

#[async_trait]
impl TransactionSource for ExplorerClient {
    async fn fetch_period(&self, query: &FetchQuery) -> Result<RawPayload, DataFetchError> {
        let start_block = self.date_to_block(&query.start_date, Closest::After).await?;
        let end_block = self.date_to_block(&query.end_date, Closest::Before).await?;
        log::info!(
            "Fetching {} transfers for {} in blocks {}..={}",
            self.network.as_str(),
            query.address,
            start_block,
            end_block
        );

        let normal = self
            .fetch_transactions(&query.address, "txlist", start_block, end_block)
            .await?;
        let erc20 = self
            .fetch_transactions(&query.address, "tokentx", start_block, end_block)
            .await?;
        let internal = self
            .fetch_transactions(&query.address, "txlistinternal", start_block, end_block)
            .await?;

        log::info!(
            "Fetched {} normal, {} erc20, {} internal transfers",
            normal.len(),
            erc20.len(),
            internal.len()
        );

        Ok(RawPayload {
            normal,
            erc20,
            internal,
        })
    }

    fn source_name(&self) -> &'static str {
        "explorer"
    }
}

/// Unix seconds of a `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` date, read as UTC
pub fn parse_date(date: &str) -> Result<i64, DataFetchError> {
    let trimmed = date.trim();
    let datetime = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| DataFetchError::InvalidDate(date.to_string()))?;

    Ok(datetime.and_utc().timestamp())
}

fn status_ok(body: &Value) -> bool {
    body.get("status").and_then(Value::as_str) == Some("1")
}

fn result_text(body: &Value) -> String {
    match body.get("result") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => body.to_string(),
    }
}

pub fn parse_block_response(body: &Value) -> Result<u64, DataFetchError> {
    if !status_ok(body) {
        return Err(DataFetchError::Api(format!(
            "Error fetching block number: {}",
            result_text(body)
        )));
    }

    let block = match body.get("result") {
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    };
    block.ok_or_else(|| {
        DataFetchError::Api(format!("Unexpected block number: {}", result_text(body)))
    })
}

/// Records of a transfer-list response; "no transactions" is an empty list
pub fn parse_transactions_response(action: &str, body: &Value) -> Result<Vec<RawTx>, DataFetchError> {
    if !status_ok(body) {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        if message == "no transactions found" || message == "0" {
            return Ok(Vec::new());
        }
        return Err(DataFetchError::Api(format!(
            "Error fetching {} transactions: {}",
            action,
            result_text(body)
        )));
    }

    match body.get("result") {
        Some(result) if result.is_array() => Ok(serde_json::from_value(result.clone())?),
        _ => Ok(Vec::new()),
    }
}
