//! Per-address breakdowns for the node detail view and the address list

use super::aggregator::FlowNode;
use super::filter::{PriceBook, PricedTx};
use crate::layout::labels::node_color;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenFlow {
    pub token: String,
    pub amount: f64,
    /// `amount` at the current price of `token`
    pub dollar_value: f64,
}

/// Token-level inflows and outflows of one address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeFlowSummary {
    pub address: String,
    pub inflows: Vec<TokenFlow>,
    pub outflows: Vec<TokenFlow>,
}

/// Row of the address side panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressEntry {
    pub id: String,
    /// inflow + outflow of threshold survivors, 0 otherwise
    pub volume: f64,
    pub hidden: bool,
    pub color: String,
}

/// Break one address's filtered transfers down by token
pub fn node_flow_summary(priced: &[PricedTx<'_>], address: &str, prices: &PriceBook) -> NodeFlowSummary {
    let mut inflows: BTreeMap<&str, f64> = BTreeMap::new();
    let mut outflows: BTreeMap<&str, f64> = BTreeMap::new();

    for p in priced {
        if p.tx.to == address {
            *inflows.entry(p.token).or_insert(0.0) += p.converted_value;
        }
        if p.tx.from == address {
            *outflows.entry(p.token).or_insert(0.0) += p.converted_value;
        }
    }

    let to_flows = |totals: BTreeMap<&str, f64>| -> Vec<TokenFlow> {
        totals
            .into_iter()
            .map(|(token, amount)| TokenFlow {
                token: token.to_string(),
                amount,
                dollar_value: amount * prices.price_of_symbol(token),
            })
            .collect()
    };

    NodeFlowSummary {
        address: address.to_string(),
        inflows: to_flows(inflows),
        outflows: to_flows(outflows),
    }
}

/// Every known address with its traffic, sorted by volume (descending) then address
pub fn address_list(
    universe: &BTreeSet<String>,
    candidates: &[FlowNode],
    hidden: &HashSet<String>,
    colors: &HashMap<String, String>,
) -> Vec<AddressEntry> {
    let volumes: HashMap<&str, f64> = candidates
        .iter()
        .map(|n| (n.id.as_str(), n.total_flow()))
        .collect();

    let mut entries: Vec<AddressEntry> = universe
        .iter()
        .map(|addr| AddressEntry {
            id: addr.clone(),
            volume: volumes.get(addr.as_str()).copied().unwrap_or(0.0),
            hidden: hidden.contains(addr),
            color: node_color(colors, addr).to_string(),
        })
        .collect();

    entries.sort_by(|a, b| b.volume.total_cmp(&a.volume).then_with(|| a.id.cmp(&b.id)));
    entries
}
