use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::pricing::FareBreakdown;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub label: String,
    pub amount: f64,
}

impl LineItem {
    pub fn new(label: impl Into<String>, amount: f64) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// Non-zero items in display order. The discount is shown negative.
pub fn line_items(breakdown: &FareBreakdown) -> Vec<LineItem> {
    [
        ("Base fare", breakdown.base_price),
        ("Return leg", breakdown.round_trip_price),
        ("Mileage", breakdown.distance_price),
        ("Multi-county surcharge", breakdown.county_price),
        ("Weekend/after-hours", breakdown.weekend_after_hours_surcharge),
        ("Emergency", breakdown.emergency_fee),
        ("Wheelchair rental", breakdown.wheelchair_price),
        ("Veteran discount", -breakdown.veteran_discount),
    ]
    .into_iter()
    .filter(|(_, amount)| *amount != 0.0)
    .map(|(label, amount)| LineItem::new(label, amount))
    .collect()
}

/// US-dollar display string, e.g. `$1,234.50` or `-$16.00`.
pub fn format_usd(amount: f64) -> String {
    let cents = (Decimal::from_str(&amount.to_string()).unwrap_or_default()
        * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default();
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();

    let dollars = (cents / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

#[test]
fn formats_currency() {
    assert_eq!(format_usd(0.0), "$0.00");
    assert_eq!(format_usd(80.0), "$80.00");
    assert_eq!(format_usd(170.5), "$170.50");
    assert_eq!(format_usd(1234.567), "$1,234.57");
    assert_eq!(format_usd(1.005), "$1.01");
    assert_eq!(format_usd(1_000_000.0), "$1,000,000.00");
    assert_eq!(format_usd(-16.0), "-$16.00");
}

#[test]
fn omits_zero_items_and_negates_discount() {
    let breakdown = FareBreakdown {
        base_price: 50.0,
        distance_price: 30.0,
        veteran_discount: 16.0,
        total: 64.0,
        ..Default::default()
    };

    assert_eq!(
        line_items(&breakdown),
        vec![
            LineItem::new("Base fare", 50.0),
            LineItem::new("Mileage", 30.0),
            LineItem::new("Veteran discount", -16.0),
        ]
    );
}
