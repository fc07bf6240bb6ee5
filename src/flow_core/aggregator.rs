//! Flow aggregation: per-address dollar totals and per-(source, target, token) links
//!
//! Links are thresholded on their gross aggregated dollar value and nodes on
//! their net position. The two checks run independently, so a node can lose
//! its last link and still survive, or the reverse.

use super::filter::PricedTx;
use super::scale::{RadiusScale, WidthScale};
use crate::layout::geometry::token_offset;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Aggregated dollar flows of one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    pub inflow: f64,
    pub outflow: f64,
    /// inflow - outflow
    pub net: f64,
    /// Sizing volume (inflow)
    pub volume: f64,
}

impl FlowNode {
    fn new(id: String) -> Self {
        Self {
            id,
            inflow: 0.0,
            outflow: 0.0,
            net: 0.0,
            volume: 0.0,
        }
    }

    /// Gross traffic through the address
    pub fn total_flow(&self) -> f64 {
        self.inflow + self.outflow
    }
}

/// Aggregated transfers of one token from one address to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: String,
    pub target: String,
    pub token: String,
    /// Sum of converted amounts
    pub amount: f64,
    pub dollar_value: f64,
    /// Perpendicular pixel offset separating parallel token links
    pub token_offset: i32,
}

/// Aggregation output, a read-only snapshot valid until the next recompute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    /// Visible nodes, sorted by address
    pub nodes: Vec<FlowNode>,
    /// Visible links, sorted by (source, target, token)
    pub links: Vec<FlowLink>,
    /// Threshold survivors before the hidden-set step
    pub candidates: Vec<FlowNode>,
    pub radius_scale: RadiusScale,
    pub width_scale: WidthScale,
}

impl FlowGraph {
    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes
            .binary_search_by(|n| n.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.nodes[idx])
    }

    /// Bubble radius of a visible node; the scale's value at 0 otherwise
    pub fn node_radius(&self, id: &str) -> f64 {
        let volume = self.node(id).map(|n| n.volume).unwrap_or(0.0);
        self.radius_scale.radius(volume)
    }

    pub fn link_width(&self, link: &FlowLink) -> f64 {
        self.width_scale.width(link.dollar_value)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Aggregate priced transfers into a flow graph
///
/// Pure function of its inputs. The central wallet is always present and never
/// dropped by the threshold or the hidden set.
pub fn aggregate(
    priced: &[PricedTx<'_>],
    dollar_threshold: f64,
    central_wallet: &str,
    hidden: &HashSet<String>,
) -> FlowGraph {
    let mut nodes: BTreeMap<&str, FlowNode> = BTreeMap::new();
    let mut links: BTreeMap<(&str, &str, &str), FlowLink> = BTreeMap::new();

    for p in priced {
        let src = p.tx.from.as_str();
        let tgt = p.tx.to.as_str();

        nodes
            .entry(src)
            .or_insert_with(|| FlowNode::new(src.to_string()))
            .outflow += p.dollar_value;
        nodes
            .entry(tgt)
            .or_insert_with(|| FlowNode::new(tgt.to_string()))
            .inflow += p.dollar_value;

        let link = links.entry((src, tgt, p.token)).or_insert_with(|| FlowLink {
            source: src.to_string(),
            target: tgt.to_string(),
            token: p.token.to_string(),
            amount: 0.0,
            dollar_value: 0.0,
            token_offset: token_offset(p.token),
        });
        link.amount += p.converted_value;
        link.dollar_value += p.dollar_value;
    }

    if !central_wallet.is_empty() {
        nodes
            .entry(central_wallet)
            .or_insert_with(|| FlowNode::new(central_wallet.to_string()));
    }

    for node in nodes.values_mut() {
        node.net = node.inflow - node.outflow;
        node.volume = node.inflow;
    }

    let surviving_links: Vec<FlowLink> = links
        .into_values()
        .filter(|l| l.dollar_value.abs() >= dollar_threshold)
        .collect();

    let candidates: Vec<FlowNode> = nodes
        .into_values()
        .filter(|n| n.id == central_wallet || n.net.abs() >= dollar_threshold)
        .collect();

    let visible: Vec<FlowNode> = candidates
        .iter()
        .filter(|n| n.id == central_wallet || !hidden.contains(&n.id))
        .cloned()
        .collect();
    let visible_ids: BTreeSet<&str> = visible.iter().map(|n| n.id.as_str()).collect();

    let visible_links: Vec<FlowLink> = surviving_links
        .into_iter()
        .filter(|l| visible_ids.contains(l.source.as_str()) && visible_ids.contains(l.target.as_str()))
        .collect();

    let radius_scale = RadiusScale::from_volumes(visible.iter().map(|n| n.volume));
    let width_scale = WidthScale::from_dollar_values(visible_links.iter().map(|l| l.dollar_value));

    log::debug!(
        "Aggregated {} transfers into {} nodes ({} before hidden) and {} links",
        priced.len(),
        visible.len(),
        candidates.len(),
        visible_links.len()
    );

    FlowGraph {
        nodes: visible,
        links: visible_links,
        candidates,
        radius_scale,
        width_scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow_core::normalizer::{TxKind, TxRecord};

    fn record(from: &str, to: &str) -> TxRecord {
        TxRecord {
            hash: None,
            from: from.to_string(),
            to: to.to_string(),
            timestamp_ms: Some(0),
            kind: TxKind::Normal,
            raw_value: String::new(),
            raw_amount: 0.0,
        }
    }

    fn priced<'a>(tx: &'a TxRecord, token: &'a str, amount: f64, price: f64) -> PricedTx<'a> {
        PricedTx {
            tx,
            token,
            converted_value: amount,
            dollar_value: amount * price,
        }
    }

    #[test]
    fn test_three_transfer_scenario() {
        let (ab, bc, ac) = (record("a", "b"), record("b", "c"), record("a", "c"));
        let input = vec![
            priced(&ab, "ETH", 10.0, 3000.0),
            priced(&bc, "ETH", 5.0, 3000.0),
            priced(&ac, "ETH", 1.0, 3000.0),
        ];

        let graph = aggregate(&input, 0.0, "a", &HashSet::new());

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.node("a").unwrap().net, -33000.0);
        assert_eq!(graph.node("b").unwrap().net, 15000.0);
        assert_eq!(graph.node("c").unwrap().net, 18000.0);
        assert_eq!(graph.node("c").unwrap().volume, 18000.0);

        let summary: Vec<(&str, &str, &str, f64, f64)> = graph
            .links
            .iter()
            .map(|l| (l.source.as_str(), l.target.as_str(), l.token.as_str(), l.amount, l.dollar_value))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a", "b", "ETH", 10.0, 30000.0),
                ("a", "c", "ETH", 1.0, 3000.0),
                ("b", "c", "ETH", 5.0, 15000.0),
            ]
        );
    }

    #[test]
    fn test_high_threshold_keeps_only_central() {
        let (ab, bc, ac) = (record("a", "b"), record("b", "c"), record("a", "c"));
        let input = vec![
            priced(&ab, "ETH", 10.0, 3000.0),
            priced(&bc, "ETH", 5.0, 3000.0),
            priced(&ac, "ETH", 1.0, 3000.0),
        ];

        let graph = aggregate(&input, 30_001.0, "a", &HashSet::new());

        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].id, "a");
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_link_survives_threshold_but_endpoint_dropped() {
        // a -> b 100, b -> a 100: link values pass, b's net (0) does not
        let (ab, ba) = (record("a", "b"), record("b", "a"));
        let input = vec![priced(&ab, "ETH", 100.0, 1.0), priced(&ba, "ETH", 100.0, 1.0)];

        let graph = aggregate(&input, 50.0, "a", &HashSet::new());

        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_node_survives_without_links() {
        let (ab, cb) = (record("a", "b"), record("c", "b"));
        let input = vec![priced(&ab, "ETH", 40.0, 1.0), priced(&cb, "ETH", 40.0, 1.0)];

        let graph = aggregate(&input, 50.0, "a", &HashSet::new());

        // b nets 80 but neither 40-dollar link passes
        assert!(graph.node("b").is_some());
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_hidden_nodes_and_central_exemption() {
        let (ab, bc) = (record("a", "b"), record("b", "c"));
        let input = vec![priced(&ab, "ETH", 1.0, 1.0), priced(&bc, "USDC", 2.0, 1.0)];
        let hidden: HashSet<String> = ["a".to_string(), "c".to_string()].into_iter().collect();

        let graph = aggregate(&input, 0.0, "a", &hidden);

        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(graph.candidates.len(), 3);
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.links[0].target, "b");
    }

    #[test]
    fn test_parallel_tokens_are_separate_links() {
        let ab = record("a", "b");
        let input = vec![
            priced(&ab, "ETH", 1.0, 3000.0),
            priced(&ab, "USDC", 100.0, 1.0),
            priced(&ab, "ETH", 2.0, 3000.0),
        ];

        let graph = aggregate(&input, 0.0, "a", &HashSet::new());

        assert_eq!(graph.links.len(), 2);
        assert_eq!(graph.links[0].token, "ETH");
        assert_eq!(graph.links[0].amount, 3.0);
        assert_eq!(graph.links[0].token_offset, token_offset("ETH"));
        assert_ne!(graph.links[0].token_offset, graph.links[1].token_offset);
    }

    #[test]
    fn test_central_wallet_present_without_transfers() {
        let graph = aggregate(&[], 10.0, "0xcentral", &HashSet::new());
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].net, 0.0);
        assert!(graph.radius_scale.is_constant());
    }
}
