//! Label text and colours for the non-scaling text layer

use super::Point;
use crate::flow_core::FlowLink;
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_NODE_COLOR: &str = "#69b3a2";

/// Screen-space label of one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLabel {
    pub id: String,
    /// Nickname or shortened address
    pub name: String,
    pub net_text: String,
    pub color: String,
    pub anchor: Point,
}

/// User colour for an address, or the default bubble colour
pub fn node_color<'a>(colors: &'a HashMap<String, String>, id: &str) -> &'a str {
    colors.get(id).map(String::as_str).unwrap_or(DEFAULT_NODE_COLOR)
}

/// `0x1234…abcd` for long addresses, unchanged otherwise
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

pub fn display_name(nicknames: &HashMap<String, String>, id: &str) -> String {
    match nicknames.get(id) {
        Some(nick) => nick.clone(),
        None => short_address(id),
    }
}

/// Two decimals with thousands separators
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.');
    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}

pub fn net_label(net: f64) -> String {
    format!("Net: ${}", format_amount(net))
}

pub fn link_label(link: &FlowLink) -> String {
    format!(
        "{}: {} (${})",
        link.token,
        format_amount(link.amount),
        format_amount(link.dollar_value)
    )
}
