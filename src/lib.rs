//! Wallet flow engine
//!
//! Turns a wallet's raw explorer transfers into a filtered, priced and
//! aggregated flow graph with stable fixed-position layout.
//!
//! - `datasource` fetches or loads raw transfer payloads
//! - `flow_core` normalizes, filters, prices and aggregates them
//! - `layout` places addresses and computes link/label geometry
//! - `state` owns all user state and exposes commands and queries

pub mod config;
pub mod datasource;
pub mod error;
pub mod flow_core;
pub mod layout;
pub mod state;

pub use {
    config::{ConfigError, FlowConfig},
    datasource::{load_payload_file, ExplorerClient, FetchQuery, Network, TransactionSource},
    error::DataFetchError,
    state::{AppState, FlowEvent, GraphSnapshot, LinkView, NodeView},
};
