//! Linear scales handed to render consumers as plain values

use serde::{Deserialize, Serialize};

pub const MIN_NODE_RADIUS: f64 = 15.0;
pub const MAX_NODE_RADIUS: f64 = 40.0;
/// Radius used for every node when all volumes are equal
pub const FALLBACK_NODE_RADIUS: f64 = 20.0;

pub const MIN_LINK_WIDTH: f64 = 1.0;
pub const MAX_LINK_WIDTH: f64 = 8.0;

/// Maps a numeric domain onto an output range, or to one constant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LinearScale {
    Linear {
        domain: (f64, f64),
        range: (f64, f64),
    },
    Constant(f64),
}

impl LinearScale {
    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            LinearScale::Linear { domain, range } => {
                let t = (value - domain.0) / (domain.1 - domain.0);
                range.0 + t * (range.1 - range.0)
            }
            LinearScale::Constant(c) => c,
        }
    }

    /// Scale over the extent of `values`, or `fallback` for a zero-width (or empty) domain
    fn fit<I>(values: I, range: (f64, f64), fallback: f64) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let extent = values.into_iter().fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((min, max)) => Some((min.min(v), max.max(v))),
            None => Some((v, v)),
        });

        match extent {
            Some((min, max)) if min < max => LinearScale::Linear {
                domain: (min, max),
                range,
            },
            _ => LinearScale::Constant(fallback),
        }
    }
}

/// Node volume to bubble radius (px)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusScale(pub LinearScale);

impl RadiusScale {
    pub fn from_volumes<I>(volumes: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let scale = LinearScale::fit(volumes, (MIN_NODE_RADIUS, MAX_NODE_RADIUS), FALLBACK_NODE_RADIUS);
        if let LinearScale::Constant(radius) = scale {
            log::warn!(
                "Degenerate volume domain; using constant node radius {}",
                radius
            );
        }
        Self(scale)
    }

    pub fn radius(&self, volume: f64) -> f64 {
        self.0.apply(volume)
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.0, LinearScale::Constant(_))
    }
}

impl Default for RadiusScale {
    fn default() -> Self {
        Self(LinearScale::Constant(FALLBACK_NODE_RADIUS))
    }
}

/// Link dollar value to stroke width (px)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidthScale(pub LinearScale);

impl WidthScale {
    pub fn from_dollar_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self(LinearScale::fit(
            values,
            (MIN_LINK_WIDTH, MAX_LINK_WIDTH),
            (MIN_LINK_WIDTH + MAX_LINK_WIDTH) / 2.0,
        ))
    }

    pub fn width(&self, dollar_value: f64) -> f64 {
        self.0.apply(dollar_value)
    }
}

impl Default for WidthScale {
    fn default() -> Self {
        Self(LinearScale::Constant((MIN_LINK_WIDTH + MAX_LINK_WIDTH) / 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_scale_linear() {
        let scale = RadiusScale::from_volumes([0.0, 50.0, 100.0]);
        assert!(!scale.is_constant());
        assert_eq!(scale.radius(0.0), 15.0);
        assert_eq!(scale.radius(50.0), 27.5);
        assert_eq!(scale.radius(100.0), 40.0);
    }

    #[test]
    fn test_degenerate_volumes_use_constant_radius() {
        let scale = RadiusScale::from_volumes([7.0, 7.0, 7.0]);
        assert!(scale.is_constant());
        for v in [7.0, 0.0, 1e9] {
            assert_eq!(scale.radius(v), FALLBACK_NODE_RADIUS);
        }

        assert!(RadiusScale::from_volumes([3.0]).is_constant());
        assert!(RadiusScale::from_volumes(Vec::<f64>::new()).is_constant());
    }

    #[test]
    fn test_width_scale() {
        let scale = WidthScale::from_dollar_values([10.0, 110.0]);
        assert_eq!(scale.width(10.0), 1.0);
        assert_eq!(scale.width(110.0), 8.0);

        let flat = WidthScale::from_dollar_values([5.0, 5.0]);
        assert_eq!(flat.width(5.0), 4.5);
    }
}
