//! Transfer normalization from explorer payloads to a unified timeline

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::error::Error;

/// Decimals assumed for native transfers and for tokens without a usable `tokenDecimal`
pub const DEFAULT_DECIMALS: u32 = 18;

/// Symbol used for token transfers that arrive without one
pub const UNKNOWN_TOKEN: &str = "UNKNOWN";

/// Raw explorer payload: one collection per transaction category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPayload {
    #[serde(default)]
    pub normal: Vec<RawTx>,
    #[serde(default)]
    pub erc20: Vec<RawTx>,
    #[serde(default)]
    pub internal: Vec<RawTx>,
}

/// A single explorer record, as loosely typed as the API returns it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTx {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(rename = "timeStamp", default, skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(rename = "tokenSymbol", default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(rename = "tokenDecimal", default, skip_serializing_if = "Option::is_none")]
    pub token_decimal: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TxType {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "internal")]
    Internal,
    #[serde(rename = "erc20")]
    Erc20,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Normal => "normal",
            TxType::Internal => "internal",
            TxType::Erc20 => "erc20",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Some(TxType::Normal),
            "internal" => Some(TxType::Internal),
            "erc20" | "token" => Some(TxType::Erc20),
            _ => None,
        }
    }

    pub fn all() -> [TxType; 3] {
        [TxType::Normal, TxType::Internal, TxType::Erc20]
    }
}

/// Kind-specific part of a transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TxKind {
    Normal,
    Internal,
    TokenTransfer { symbol: String, decimals: u32 },
}

impl TxKind {
    pub fn tx_type(&self) -> TxType {
        match self {
            TxKind::Normal => TxType::Normal,
            TxKind::Internal => TxType::Internal,
            TxKind::TokenTransfer { .. } => TxType::Erc20,
        }
    }

    /// Decimal places of the raw amount
    pub fn decimals(&self) -> u32 {
        match self {
            TxKind::TokenTransfer { decimals, .. } => *decimals,
            _ => DEFAULT_DECIMALS,
        }
    }

    /// Token symbol for token transfers, `None` for native value
    pub fn token_symbol(&self) -> Option<&str> {
        match self {
            TxKind::TokenTransfer { symbol, .. } => Some(symbol),
            _ => None,
        }
    }
}

/// A normalized transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxRecord {
    pub hash: Option<String>,
    /// Lowercased sender
    pub from: String,
    /// Lowercased recipient
    pub to: String,
    /// Canonical millisecond timestamp; `None` when the source field was unparseable
    pub timestamp_ms: Option<i64>,
    pub kind: TxKind,
    /// Integer amount in base units, as delivered
    pub raw_value: String,
    /// `raw_value` parsed to a float (0 when unparseable)
    pub raw_amount: f64,
}

/// Combined, normalized view of one fetch
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    /// Records in arrival order: normal, erc20, internal
    pub records: Vec<TxRecord>,
    /// (min, max) over valid timestamps
    pub time_extent: Option<(i64, i64)>,
    /// Every address seen as sender or recipient
    pub universe: BTreeSet<String>,
    /// Distinct token-transfer symbols
    pub tokens: BTreeSet<String>,
    /// Records retained with best-effort defaults
    pub malformed_count: usize,
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl RawPayload {
    /// Parse a payload from explorer JSON
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let payload: RawPayload = serde_json::from_str(json)?;
        Ok(payload)
    }

    pub fn total_len(&self) -> usize {
        self.normal.len() + self.erc20.len() + self.internal.len()
    }
}

/// Build the timeline, time extent and address universe of a payload
///
/// Empty collections yield an empty timeline, which callers treat as "no data".
pub fn normalize(payload: &RawPayload) -> Timeline {
    let mut timeline = Timeline::default();
    timeline.records.reserve(payload.total_len());

    let batches = [
        (TxType::Normal, &payload.normal),
        (TxType::Erc20, &payload.erc20),
        (TxType::Internal, &payload.internal),
    ];

    for (tx_type, batch) in batches {
        for raw in batch.iter() {
            let (record, malformed) = normalize_record(tx_type, raw);
            if malformed {
                timeline.malformed_count += 1;
            }

            if let Some(ts) = record.timestamp_ms {
                timeline.time_extent = Some(match timeline.time_extent {
                    Some((min, max)) => (min.min(ts), max.max(ts)),
                    None => (ts, ts),
                });
            }
            timeline.universe.insert(record.from.clone());
            timeline.universe.insert(record.to.clone());
            if let Some(symbol) = record.kind.token_symbol() {
                timeline.tokens.insert(symbol.to_string());
            }

            timeline.records.push(record);
        }
    }

    log::info!(
        "Normalized {} transfers ({} malformed), {} addresses, {} tokens",
        timeline.records.len(),
        timeline.malformed_count,
        timeline.universe.len(),
        timeline.tokens.len()
    );
    log::debug!("Time extent: {:?}", timeline.time_extent);

    timeline
}

fn normalize_record(tx_type: TxType, raw: &RawTx) -> (TxRecord, bool) {
    let mut malformed = false;

    // `timeStamp` wins when both are present
    let ts_field = raw
        .time_stamp
        .as_ref()
        .filter(|v| !is_blank(v))
        .or(raw.timestamp.as_ref());
    let timestamp_ms = ts_field.and_then(parse_number).map(|secs| (secs * 1000.0).round() as i64);
    if timestamp_ms.is_none() {
        log::warn!(
            "Transfer {} missing valid timestamp ({:?}); kept outside every time window",
            raw.hash.as_deref().unwrap_or("<no hash>"),
            ts_field
        );
        malformed = true;
    }

    let raw_value = raw.value.as_ref().map(value_to_string).unwrap_or_default();
    let raw_amount = match raw_value.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() => amount,
        _ => {
            log::warn!(
                "Transfer {} has non-numeric value '{}'; treating as 0",
                raw.hash.as_deref().unwrap_or("<no hash>"),
                raw_value
            );
            malformed = true;
            0.0
        }
    };

    let kind = match tx_type {
        TxType::Normal => TxKind::Normal,
        TxType::Internal => TxKind::Internal,
        TxType::Erc20 => TxKind::TokenTransfer {
            symbol: raw
                .token_symbol
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_TOKEN.to_string()),
            decimals: raw
                .token_decimal
                .as_ref()
                .and_then(parse_number)
                .filter(|d| *d >= 0.0 && d.fract() == 0.0)
                .map(|d| d as u32)
                .unwrap_or(DEFAULT_DECIMALS),
        },
    };

    let record = TxRecord {
        hash: raw.hash.clone(),
        from: raw.from.as_deref().unwrap_or_default().to_lowercase(),
        to: raw.to.as_deref().unwrap_or_default().to_lowercase(),
        timestamp_ms,
        kind,
        raw_value,
        raw_amount,
    };
    (record, malformed)
}

fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
