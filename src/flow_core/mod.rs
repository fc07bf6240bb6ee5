//! Flow Core - normalization, filtering and aggregation of wallet transfers
//!
//! # Architecture
//!
//! ```text
//! RawPayload (normal / erc20 / internal)
//!     ↓
//! normalize() → Timeline (records, time extent, address universe)
//!     ↓
//! apply_filters() → PricedTx (type, token, time window; units and dollars)
//!     ↓
//! aggregate() → FlowGraph (threshold, hidden set, radius and width scales)
//! ```
//!
//! Every stage is a pure function of its inputs; positions live in `crate::layout`.

pub mod aggregator;
pub mod filter;
pub mod normalizer;
pub mod scale;
pub mod summary;

pub use aggregator::{aggregate, FlowGraph, FlowLink, FlowNode};
pub use filter::{apply_filters, FilterState, PriceBook, PricedTx};
pub use normalizer::{normalize, RawPayload, RawTx, Timeline, TxKind, TxRecord, TxType};
pub use scale::{LinearScale, RadiusScale, WidthScale};
pub use summary::{address_list, node_flow_summary, AddressEntry, NodeFlowSummary, TokenFlow};
