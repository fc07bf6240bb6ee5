//! Fixed radial layout
//!
//! Positions are keyed by address and independent of which nodes currently
//! survive filtering. Only `compute_all`, `set_manual` and `reset` mutate them.

use super::{Canvas, Point};
use serde::Serialize;
use std::collections::BTreeMap;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    /// Angle on the layout circle; `None` for the central wallet
    pub angle: Option<f64>,
}

impl Position {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn at_center(canvas: &Canvas) -> Self {
        let c = canvas.center();
        Self { x: c.x, y: c.y, angle: None }
    }

    fn on_circle(canvas: &Canvas, angle: f64, radius: f64) -> Self {
        let c = canvas.center();
        Self {
            x: c.x + radius * angle.cos(),
            y: c.y + radius * angle.sin(),
            angle: Some(angle),
        }
    }
}

/// Address → stable position store
#[derive(Debug, Clone)]
pub struct LayoutManager {
    canvas: Canvas,
    positions: BTreeMap<String, Position>,
    central_wallet: Option<String>,
}

impl LayoutManager {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            positions: BTreeMap::new(),
            central_wallet: None,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Assign positions for the whole address universe
    ///
    /// Addresses are indexed in lexicographic order; an address without a
    /// recorded angle gets `2π·i/n`, one with a recorded angle keeps it and is
    /// re-projected at `radius`. Idempotent.
    pub fn compute_all<'a, I>(&mut self, addresses: I, central_wallet: &str, radius: f64)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut sorted: Vec<&String> = addresses.into_iter().collect();
        sorted.sort();
        sorted.dedup();
        let n = sorted.len();

        for (i, addr) in sorted.iter().enumerate() {
            if addr.as_str() == central_wallet {
                continue;
            }
            let angle = match self.positions.get(addr.as_str()).and_then(|p| p.angle) {
                Some(recorded) => recorded,
                None => 2.0 * PI * i as f64 / n as f64,
            };
            self.positions
                .insert((*addr).clone(), Position::on_circle(&self.canvas, angle, radius));
        }

        if !central_wallet.is_empty() {
            self.positions
                .insert(central_wallet.to_string(), Position::at_center(&self.canvas));
            self.central_wallet = Some(central_wallet.to_string());
        }

        log::debug!(
            "Computed positions for {} addresses at radius {}",
            n,
            radius
        );
    }

    /// Stored position, or the canvas centre when the address was never laid out
    pub fn get(&self, address: &str) -> Position {
        match self.positions.get(address) {
            Some(pos) => *pos,
            None => {
                log::warn!(
                    "Fixed position missing for {}; falling back to canvas centre",
                    address
                );
                Position::at_center(&self.canvas)
            }
        }
    }

    pub fn contains(&self, address: &str) -> bool {
        self.positions.contains_key(address)
    }

    /// Move one address to `angle` on a circle of `radius`
    ///
    /// Returns `false` (and changes nothing) for the central wallet.
    pub fn set_manual(&mut self, address: &str, angle: f64, radius: f64) -> bool {
        if self.central_wallet.as_deref() == Some(address) {
            log::warn!("Ignoring manual position for central wallet {}", address);
            return false;
        }
        self.positions
            .insert(address.to_string(), Position::on_circle(&self.canvas, angle, radius));
        true
    }

    /// Angle of a canvas-space pointer around the canvas centre
    pub fn angle_from_pointer(&self, pointer: Point) -> f64 {
        let c = self.canvas.center();
        (pointer.y - c.y).atan2(pointer.x - c.x)
    }

    /// Forget every position; the next `compute_all` regenerates defaults
    pub fn reset(&mut self) {
        log::info!("Resetting {} fixed positions", self.positions.len());
        self.positions.clear();
    }

    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn universe(addrs: &[&str]) -> BTreeSet<String> {
        addrs.iter().map(|a| a.to_string()).collect()
    }

    fn manager() -> LayoutManager {
        LayoutManager::new(Canvas::new(800.0, 600.0))
    }

    #[test]
    fn test_default_angles_and_center() {
        let mut layout = manager();
        layout.compute_all(&universe(&["0xa", "0xb", "0xc", "0xd"]), "0xa", 200.0);

        let central = layout.get("0xa");
        assert_eq!((central.x, central.y, central.angle), (400.0, 300.0, None));

        let b = layout.get("0xb");
        assert_eq!(b.angle, Some(PI / 2.0));
        assert!((b.x - 400.0).abs() < 1e-9);
        assert!((b.y - 500.0).abs() < 1e-9);
        assert_eq!(layout.get("0xc").angle, Some(PI));
    }

    #[test]
    fn test_compute_all_is_stable() {
        let mut layout = manager();
        let addrs = universe(&["0x3", "0x1", "0x2"]);
        layout.compute_all(&addrs, "0x1", 150.0);
        let first = layout.positions().clone();

        layout.compute_all(&addrs, "0x1", 150.0);
        assert_eq!(&first, layout.positions());
    }

    #[test]
    fn test_universe_growth_keeps_recorded_angles() {
        let mut layout = manager();
        layout.compute_all(&universe(&["0xa", "0xb", "0xc"]), "0xa", 100.0);
        layout.set_manual("0xc", 1.234, 100.0);
        let b_before = layout.get("0xb");

        layout.compute_all(&universe(&["0xa", "0xb", "0xc", "0xaa", "0xd"]), "0xa", 100.0);

        assert_eq!(layout.get("0xc").angle, Some(1.234));
        assert_eq!(layout.get("0xb"), b_before);
        assert!(layout.get("0xd").angle.is_some());
    }

    #[test]
    fn test_radius_change_keeps_angles() {
        let mut layout = manager();
        let addrs = universe(&["0xa", "0xb"]);
        layout.compute_all(&addrs, "0xa", 100.0);
        let angle = layout.get("0xb").angle;

        layout.compute_all(&addrs, "0xa", 250.0);
        let b = layout.get("0xb");
        assert_eq!(b.angle, angle);
        let c = layout.canvas().center();
        assert!(((b.x - c.x).hypot(b.y - c.y) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_manual_drag_touches_one_address() {
        let mut layout = manager();
        layout.compute_all(&universe(&["0xa", "0xb", "0xc", "0xd"]), "0xa", 200.0);
        let before = layout.positions().clone();

        let angle = layout.angle_from_pointer(Point::new(400.0, 100.0));
        assert!(layout.set_manual("0xc", angle, 200.0));

        for (addr, pos) in layout.positions() {
            if addr == "0xc" {
                assert_eq!(pos.angle, Some(-PI / 2.0));
            } else {
                assert_eq!(pos, &before[addr]);
            }
        }
    }

    #[test]
    fn test_central_wallet_refuses_manual_angle() {
        let mut layout = manager();
        layout.compute_all(&universe(&["0xa", "0xb"]), "0xa", 200.0);

        assert!(!layout.set_manual("0xa", 0.5, 200.0));
        assert_eq!(layout.get("0xa").angle, None);
    }

    #[test]
    fn test_missing_position_falls_back_to_center() {
        let layout = manager();
        let pos = layout.get("0xnever");
        assert_eq!(pos.point(), Point::new(400.0, 300.0));
        assert!(!layout.contains("0xnever"));
    }

    #[test]
    fn test_reset_regenerates_defaults() {
        let mut layout = manager();
        let addrs = universe(&["0xa", "0xb"]);
        layout.compute_all(&addrs, "0xa", 100.0);
        let default_b = layout.get("0xb");
        layout.set_manual("0xb", 2.0, 100.0);

        layout.reset();
        assert!(layout.is_empty());

        layout.compute_all(&addrs, "0xa", 100.0);
        assert_eq!(layout.get("0xb"), default_b);
    }
}
