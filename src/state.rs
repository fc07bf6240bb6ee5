use {
    crate::{
        config::FlowConfig,
        error::DataFetchError,
        flow_core::{
            address_list, aggregate, apply_filters, node_flow_summary, normalize, AddressEntry,
            FilterState, FlowGraph, FlowNode, NodeFlowSummary, PriceBook, RawPayload, Timeline,
            TxType,
        },
        layout::{
            labels::{display_name, link_label, net_label, node_color, NodeLabel},
            view::node_label_anchor,
            LayoutManager, LinkGeometry, Point, Position, ViewTransform,
        },
    },
    serde::Serialize,
    std::collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    tokio::sync::mpsc,
};

/// Notification sent to render consumers after a command completes
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    /// A fetch replaced the timeline
    DataLoaded { records: usize, addresses: usize },
    /// Filters, prices or user state changed; node/link lists were rebuilt
    RecomputeRequested,
    /// One address was dragged
    PositionChanged(String),
    /// Layout recomputed or reset for every address
    PositionsChanged,
    ViewChanged,
}

/// A node as the bubble layer draws it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub net: f64,
    pub volume: f64,
    /// Bubble radius (px)
    pub radius: f64,
    pub color: String,
    pub position: Position,
}

/// A link as the line, arrow and label layers draw it (screen space)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkView {
    pub source: String,
    pub target: String,
    pub token: String,
    pub width: f64,
    pub label: String,
    pub geometry: LinkGeometry,
}

/// Everything needed to draw the current graph once
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub central_wallet: String,
    pub time_extent: Option<(i64, i64)>,
    pub filters: FilterState,
    pub view: ViewTransform,
    pub nodes: Vec<NodeView>,
    pub links: Vec<LinkView>,
    pub labels: Vec<NodeLabel>,
    pub positions: BTreeMap<String, Position>,
    pub addresses: Vec<AddressEntry>,
}

/// Application state
///
/// Owns everything the original kept in globals. All mutation goes through the
/// command methods below; each runs to completion and leaves `graph` matching
/// the current inputs.
pub struct AppState {
    central_wallet: String,
    timeline: Timeline,
    filters: FilterState,
    prices: PriceBook,
    nicknames: HashMap<String, String>,
    colors: HashMap<String, String>,
    hidden: HashSet<String>,
    layout: LayoutManager,
    layout_radius: f64,
    view: ViewTransform,
    graph: FlowGraph,
    subscribers: Vec<mpsc::UnboundedSender<FlowEvent>>,
}

impl AppState {
    pub fn new(config: &FlowConfig) -> Self {
        let filters = FilterState {
            dollar_threshold: config.dollar_threshold,
            ..FilterState::default()
        };

        Self {
            central_wallet: String::new(),
            timeline: Timeline::default(),
            filters,
            prices: PriceBook::new(config.network.native_symbol(), config.eth_price),
            nicknames: HashMap::new(),
            colors: HashMap::new(),
            hidden: HashSet::new(),
            layout: LayoutManager::new(config.canvas()),
            layout_radius: config.layout_radius,
            view: ViewTransform::identity(),
            graph: FlowGraph::default(),
            subscribers: Vec::new(),
        }
    }

    /// Receive events for every subsequent command
    ///
    /// The channel is unbounded: a subscriber must drain its receiver (or drop
    /// it) or queued events accumulate. A dropped receiver is unsubscribed on
    /// the next event.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<FlowEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: FlowEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Rebuild the node/link lists from the current inputs
    fn recompute(&mut self) {
        let priced = apply_filters(&self.timeline, &self.filters, &self.prices);
        self.graph = aggregate(
            &priced,
            self.filters.dollar_threshold,
            &self.central_wallet,
            &self.hidden,
        );
        self.emit(FlowEvent::RecomputeRequested);
    }

    fn relayout(&mut self) {
        self.layout
            .compute_all(&self.timeline.universe, &self.central_wallet, self.layout_radius);
        self.emit(FlowEvent::PositionsChanged);
    }

    // --- Commands ---

    /// Hand over the result of a fetch
    ///
    /// A failure is logged and returned without touching any state.
    pub fn apply_fetch(
        &mut self,
        wallet: &str,
        result: Result<RawPayload, DataFetchError>,
    ) -> Result<(), DataFetchError> {
        match result {
            Ok(payload) => {
                self.load_payload(wallet, &payload);
                Ok(())
            }
            Err(e) => {
                log::error!("Error fetching transactions: {}", e);
                Err(e)
            }
        }
    }

    /// Replace the timeline with a new payload centred on `wallet`
    pub fn load_payload(&mut self, wallet: &str, payload: &RawPayload) {
        let timeline = normalize(payload);
        if timeline.is_empty() {
            log::info!("No transfers for {}", wallet);
        }

        self.central_wallet = wallet.trim().to_lowercase();
        self.filters = FilterState::for_timeline(&timeline, self.filters.dollar_threshold);
        for token in &timeline.tokens {
            self.prices.token_prices.entry(token.clone()).or_insert(1.0);
        }
        self.timeline = timeline;

        self.emit(FlowEvent::DataLoaded {
            records: self.timeline.len(),
            addresses: self.timeline.universe.len(),
        });
        self.relayout();
        self.recompute();
    }

    pub fn on_filter_changed(&mut self, filters: FilterState) {
        self.filters = filters;
        self.recompute();
    }

    pub fn set_time_window(&mut self, min_ms: i64, max_ms: i64) {
        self.filters.time_window = (min_ms.min(max_ms), min_ms.max(max_ms));
        self.recompute();
    }

    pub fn set_threshold(&mut self, dollar_threshold: f64) {
        self.filters.dollar_threshold = dollar_threshold.max(0.0);
        self.recompute();
    }

    pub fn set_active_types(&mut self, types: BTreeSet<TxType>) {
        self.filters.active_types = types;
        self.recompute();
    }

    pub fn set_active_tokens(&mut self, tokens: BTreeSet<String>) {
        self.filters.active_tokens = tokens;
        self.recompute();
    }

    /// Set or clear (empty string) a nickname
    pub fn set_nickname(&mut self, address: &str, nickname: &str) {
        let address = address.to_lowercase();
        let nickname = nickname.trim();
        if nickname.is_empty() {
            self.nicknames.remove(&address);
        } else {
            self.nicknames.insert(address, nickname.to_string());
        }
        self.recompute();
    }

    pub fn set_color(&mut self, address: &str, color: &str) {
        self.colors.insert(address.to_lowercase(), color.to_string());
        self.recompute();
    }

    /// Flip an address's hidden state; returns whether it is now hidden
    pub fn toggle_hidden(&mut self, address: &str) -> bool {
        let address = address.to_lowercase();
        let hidden = if self.hidden.remove(&address) {
            false
        } else {
            self.hidden.insert(address.clone());
            true
        };
        log::debug!("Address {} hidden: {}", address, hidden);
        self.recompute();
        hidden
    }

    pub fn set_token_price(&mut self, symbol: &str, price: f64) {
        self.prices.set_token_price(symbol, price);
        self.recompute();
    }

    pub fn set_native_price(&mut self, price: f64) {
        self.prices.native_price = price;
        log::debug!("{} price updated: {}", self.prices.native_symbol, price);
        self.recompute();
    }

    /// Drag one bubble to the angle under a canvas-space pointer
    pub fn on_drag_move(&mut self, address: &str, pointer: Point) -> bool {
        let address = address.to_lowercase();
        let angle = self.layout.angle_from_pointer(pointer);
        let moved = self.layout.set_manual(&address, angle, self.layout_radius);
        if moved {
            self.emit(FlowEvent::PositionChanged(address));
        }
        moved
    }

    /// Drop every manual angle and lay the universe out from scratch
    pub fn on_reset_requested(&mut self) {
        self.layout.reset();
        self.relayout();
    }

    pub fn set_layout_radius(&mut self, radius: f64) {
        self.layout_radius = radius;
        self.relayout();
    }

    pub fn on_zoom(&mut self, view: ViewTransform) {
        self.view = view;
        self.emit(FlowEvent::ViewChanged);
    }

    // --- Queries ---

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn central_wallet(&self) -> &str {
        &self.central_wallet
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn prices(&self) -> &PriceBook {
        &self.prices
    }

    pub fn hidden(&self) -> &HashSet<String> {
        &self.hidden
    }

    pub fn nicknames(&self) -> &HashMap<String, String> {
        &self.nicknames
    }

    pub fn layout(&self) -> &LayoutManager {
        &self.layout
    }

    pub fn layout_radius(&self) -> f64 {
        self.layout_radius
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn position(&self, address: &str) -> Position {
        self.layout.get(address)
    }

    fn node_view(&self, node: &FlowNode) -> NodeView {
        NodeView {
            id: node.id.clone(),
            net: node.net,
            volume: node.volume,
            radius: self.graph.radius_scale.radius(node.volume),
            color: node_color(&self.colors, &node.id).to_string(),
            position: self.layout.get(&node.id),
        }
    }

    pub fn node_views(&self) -> Vec<NodeView> {
        self.graph.nodes.iter().map(|n| self.node_view(n)).collect()
    }

    /// Screen-space link geometry under the current view
    pub fn link_views(&self) -> Vec<LinkView> {
        self.graph
            .links
            .iter()
            .map(|link| {
                let geometry = LinkGeometry::screen(
                    &self.view,
                    self.layout.get(&link.source).point(),
                    self.layout.get(&link.target).point(),
                    self.graph.node_radius(&link.source),
                    self.graph.node_radius(&link.target),
                    link.token_offset,
                );
                LinkView {
                    source: link.source.clone(),
                    target: link.target.clone(),
                    token: link.token.clone(),
                    width: self.graph.link_width(link),
                    label: link_label(link),
                    geometry,
                }
            })
            .collect()
    }

    /// Non-scaling node labels under the current view
    pub fn node_labels(&self) -> Vec<NodeLabel> {
        self.graph
            .nodes
            .iter()
            .map(|node| NodeLabel {
                id: node.id.clone(),
                name: display_name(&self.nicknames, &node.id),
                net_text: net_label(node.net),
                color: node_color(&self.colors, &node.id).to_string(),
                anchor: node_label_anchor(&self.view, self.layout.get(&node.id).point()),
            })
            .collect()
    }

    /// Token breakdown for the node detail view
    pub fn node_summary(&self, address: &str) -> NodeFlowSummary {
        let priced = apply_filters(&self.timeline, &self.filters, &self.prices);
        node_flow_summary(&priced, &address.to_lowercase(), &self.prices)
    }

    pub fn address_list(&self) -> Vec<AddressEntry> {
        address_list(
            &self.timeline.universe,
            &self.graph.candidates,
            &self.hidden,
            &self.colors,
        )
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        let positions = self
            .graph
            .nodes
            .iter()
            .map(|n| (n.id.clone(), self.layout.get(&n.id)))
            .collect();

        GraphSnapshot {
            central_wallet: self.central_wallet.clone(),
            time_extent: self.timeline.time_extent,
            filters: self.filters.clone(),
            view: self.view,
            nodes: self.node_views(),
            links: self.link_views(),
            labels: self.node_labels(),
            positions,
            addresses: self.address_list(),
        }
    }
}
