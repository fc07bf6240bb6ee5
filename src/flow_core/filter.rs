//! Filter pipeline: type, token and time predicates, then unit conversion and pricing
//!
//! The dollar threshold is not applied here; the aggregator applies it to
//! aggregated totals.

use super::normalizer::{Timeline, TxKind, TxRecord, TxType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Active filters of one recompute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub active_types: BTreeSet<TxType>,
    /// Token symbols admitted for token transfers
    pub active_tokens: BTreeSet<String>,
    /// Inclusive millisecond window
    pub time_window: (i64, i64),
    /// Minimum aggregated dollar value, applied post-aggregation
    pub dollar_threshold: f64,
}

impl FilterState {
    /// Default filters after a fetch: every type and token, the full time extent
    pub fn for_timeline(timeline: &Timeline, dollar_threshold: f64) -> Self {
        Self {
            active_types: TxType::all().into_iter().collect(),
            active_tokens: timeline.tokens.clone(),
            time_window: timeline.time_extent.unwrap_or((i64::MIN, i64::MAX)),
            dollar_threshold,
        }
    }

    /// Check the type, token and time predicates in order
    pub fn admits(&self, tx: &TxRecord) -> bool {
        if !self.active_types.contains(&tx.kind.tx_type()) {
            return false;
        }
        if let Some(symbol) = tx.kind.token_symbol() {
            if !self.active_tokens.contains(symbol) {
                return false;
            }
        }
        match tx.timestamp_ms {
            Some(ts) => ts >= self.time_window.0 && ts <= self.time_window.1,
            None => false,
        }
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            active_types: TxType::all().into_iter().collect(),
            active_tokens: BTreeSet::new(),
            time_window: (i64::MIN, i64::MAX),
            dollar_threshold: 0.0,
        }
    }
}

/// Dollar prices used for valuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBook {
    /// Symbol that native (normal/internal) transfers are grouped under
    pub native_symbol: String,
    pub native_price: f64,
    pub token_prices: BTreeMap<String, f64>,
}

impl PriceBook {
    pub fn new(native_symbol: impl Into<String>, native_price: f64) -> Self {
        Self {
            native_symbol: native_symbol.into(),
            native_price,
            token_prices: BTreeMap::new(),
        }
    }

    /// Native price for native transfers, configured price for known tokens, 1 otherwise
    pub fn price_for(&self, kind: &TxKind) -> f64 {
        match kind {
            TxKind::TokenTransfer { symbol, .. } => {
                self.token_prices.get(symbol).copied().unwrap_or(1.0)
            }
            _ => self.native_price,
        }
    }

    pub fn set_token_price(&mut self, symbol: &str, price: f64) {
        self.token_prices.insert(symbol.to_string(), price);
    }

    /// Price a raw token amount of `symbol`, native symbol included
    pub fn price_of_symbol(&self, symbol: &str) -> f64 {
        if symbol == self.native_symbol {
            self.native_price
        } else {
            self.token_prices.get(symbol).copied().unwrap_or(1.0)
        }
    }
}

/// A transfer that passed the filters, with derived values populated
#[derive(Debug, Clone, PartialEq)]
pub struct PricedTx<'a> {
    pub tx: &'a TxRecord,
    /// Link token: the transfer's symbol, or the native symbol
    pub token: &'a str,
    pub converted_value: f64,
    pub dollar_value: f64,
}

/// Run the filter pipeline over a timeline
///
/// Pure: identical inputs always yield identical output in timeline order.
pub fn apply_filters<'a>(
    timeline: &'a Timeline,
    filters: &FilterState,
    prices: &'a PriceBook,
) -> Vec<PricedTx<'a>> {
    let priced: Vec<PricedTx<'a>> = timeline
        .records
        .iter()
        .filter(|tx| filters.admits(tx))
        .map(|tx| {
            let converted_value = convert_units(tx);
            PricedTx {
                tx,
                token: tx.kind.token_symbol().unwrap_or(prices.native_symbol.as_str()),
                converted_value,
                dollar_value: converted_value * prices.price_for(&tx.kind),
            }
        })
        .collect();

    log::debug!(
        "Filtered {} of {} transfers",
        priced.len(),
        timeline.records.len()
    );
    priced
}

/// Raw base units to whole tokens
pub fn convert_units(tx: &TxRecord) -> f64 {
    tx.raw_amount / 10f64.powf(f64::from(tx.kind.decimals()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow_core::normalizer::{normalize, RawPayload, RawTx};
    use serde_json::json;

    fn raw(from: &str, to: &str, value: &str, ts: i64) -> RawTx {
        RawTx {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            value: Some(json!(value)),
            time_stamp: Some(json!(ts.to_string())),
            ..Default::default()
        }
    }

    fn token(from: &str, to: &str, value: &str, ts: i64, symbol: &str, decimals: &str) -> RawTx {
        RawTx {
            token_symbol: Some(symbol.to_string()),
            token_decimal: Some(json!(decimals)),
            ..raw(from, to, value, ts)
        }
    }

    fn timeline() -> Timeline {
        normalize(&RawPayload {
            normal: vec![raw("0xa", "0xb", "2000000000000000000", 100)],
            erc20: vec![
                token("0xb", "0xc", "5000000", 200, "USDC", "6"),
                token("0xc", "0xa", "7", 250, "PEPE", "0"),
            ],
            internal: vec![raw("0xc", "0xa", "500000000000000000", 300)],
        })
    }

    #[test]
    fn test_conversion_and_pricing() {
        let timeline = timeline();
        let filters = FilterState::for_timeline(&timeline, 0.0);
        let mut prices = PriceBook::new("ETH", 3000.0);
        prices.set_token_price("USDC", 1.0);
        prices.set_token_price("PEPE", 0.5);

        let priced = apply_filters(&timeline, &filters, &prices);

        assert_eq!(priced.len(), 4);
        assert_eq!(priced[0].token, "ETH");
        assert_eq!(priced[0].converted_value, 2.0);
        assert_eq!(priced[0].dollar_value, 6000.0);
        assert_eq!(priced[1].token, "USDC");
        assert_eq!(priced[1].converted_value, 5.0);
        assert_eq!(priced[2].dollar_value, 3.5);
        assert_eq!(priced[3].converted_value, 0.5);
        assert_eq!(priced[3].dollar_value, 1500.0);
    }

    #[test]
    fn test_unknown_token_priced_at_one() {
        let timeline = timeline();
        let filters = FilterState::for_timeline(&timeline, 0.0);
        let prices = PriceBook::new("ETH", 3000.0);

        let priced = apply_filters(&timeline, &filters, &prices);
        assert_eq!(priced[1].dollar_value, 5.0);
        assert_eq!(prices.price_of_symbol("PEPE"), 1.0);
        assert_eq!(prices.price_of_symbol("ETH"), 3000.0);
    }

    #[test]
    fn test_type_token_and_time_predicates() {
        let timeline = timeline();
        let prices = PriceBook::new("ETH", 3000.0);

        let mut filters = FilterState::for_timeline(&timeline, 0.0);
        filters.active_types.remove(&TxType::Internal);
        assert_eq!(apply_filters(&timeline, &filters, &prices).len(), 3);

        filters.active_tokens.remove("USDC");
        let priced = apply_filters(&timeline, &filters, &prices);
        assert_eq!(priced.len(), 2);
        assert!(priced.iter().all(|p| p.token != "USDC"));

        // Inclusive bounds
        let mut filters = FilterState::for_timeline(&timeline, 0.0);
        filters.time_window = (200_000, 250_000);
        let priced = apply_filters(&timeline, &filters, &prices);
        assert_eq!(priced.len(), 2);
    }

    #[test]
    fn test_missing_timestamp_never_admitted() {
        let mut timeline = timeline();
        timeline.records[0].timestamp_ms = None;
        let filters = FilterState::default();
        let prices = PriceBook::new("ETH", 3000.0);

        let priced = apply_filters(&timeline, &filters, &prices);
        assert!(priced.iter().all(|p| p.tx.timestamp_ms.is_some()));
    }

    #[test]
    fn test_huge_decimals_convert_to_zero() {
        let record = |decimals: u32| TxRecord {
            hash: None,
            from: "0xa".to_string(),
            to: "0xb".to_string(),
            timestamp_ms: Some(0),
            kind: TxKind::TokenTransfer {
                symbol: "WEIRD".to_string(),
                decimals,
            },
            raw_value: "1000".to_string(),
            raw_amount: 1000.0,
        };

        for decimals in [400, 2_147_483_648, u32::MAX] {
            let converted = convert_units(&record(decimals));
            assert_eq!(converted, 0.0, "decimals {}", decimals);
            assert!(converted.is_finite());
        }
        assert!((convert_units(&record(3)) - 1.0).abs() < 1e-12);
    }
}
