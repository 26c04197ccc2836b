//! Purchase order lines and totals

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// One material line of a purchase order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub material: String,
    pub quantity: f64,
    pub unit_cost: f64,
    /// Tax percentage; none means the line is tax-exempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_percent: Option<f64>,
}

/// How a line's tax is presented
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum TaxLabel {
    Exempt,
    Taxed(f64),
}

impl fmt::Display for TaxLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxLabel::Exempt => write!(f, "exempt"),
            TaxLabel::Taxed(pct) => write!(f, "{}%", pct),
        }
    }
}

impl OrderLine {
    pub fn new(material: impl Into<String>, quantity: f64, unit_cost: f64) -> Self {
        Self {
            material: material.into(),
            quantity,
            unit_cost,
            tax_percent: None,
        }
    }

    pub fn taxed(mut self, percent: f64) -> Self {
        self.tax_percent = Some(percent);
        self
    }

    /// Quantity times unit cost
    pub fn subtotal(&self) -> f64 {
        self.quantity * self.unit_cost
    }

    pub fn tax(&self) -> f64 {
        compute_line_tax(self.quantity, self.unit_cost, self.tax_percent)
    }

    /// Exempt and 0% produce the same amount but are labelled differently
    pub fn tax_label(&self) -> TaxLabel {
        match self.tax_percent {
            None => TaxLabel::Exempt,
            Some(pct) => TaxLabel::Taxed(pct),
        }
    }
}

/// Tax amount for one line: `quantity * unit_cost * pct / 100`, or 0 when exempt
pub fn compute_line_tax(quantity: f64, unit_cost: f64, tax_percent: Option<f64>) -> f64 {
    match tax_percent {
        Some(pct) => quantity * unit_cost * pct / 100.0,
        None => 0.0,
    }
}

/// Totals of a purchase order
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub total_taxes: f64,
    pub total: f64,
}

/// Sum subtotals and taxes over all lines
pub fn order_totals(lines: &[OrderLine]) -> OrderTotals {
    let mut totals = OrderTotals::default();

    for line in lines {
        let tax = line.tax();
        trace!(material = %line.material, subtotal = line.subtotal(), tax, "order line");
        totals.subtotal += line.subtotal();
        totals.total_taxes += tax;
    }

    totals.total = totals.subtotal + totals.total_taxes;
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_line_tax() {
        assert_eq!(compute_line_tax(2.0, 100.0, Some(13.0)), 26.0);
        assert_eq!(compute_line_tax(2.0, 100.0, Some(0.0)), 0.0);
        assert_eq!(compute_line_tax(2.0, 100.0, None), 0.0);
    }

    #[test]
    fn test_exempt_and_zero_are_labelled_apart() {
        let exempt = OrderLine::new("Cement", 2.0, 100.0);
        let zero = OrderLine::new("Cement", 2.0, 100.0).taxed(0.0);

        assert_eq!(exempt.tax(), zero.tax());
        assert_eq!(exempt.tax_label(), TaxLabel::Exempt);
        assert_eq!(zero.tax_label(), TaxLabel::Taxed(0.0));
        assert_eq!(exempt.tax_label().to_string(), "exempt");
        assert_eq!(zero.tax_label().to_string(), "0%");
    }

    #[test]
    fn test_order_totals() {
        let lines = vec![
            OrderLine::new("Cement", 2.0, 100.0).taxed(13.0),
            OrderLine::new("Rebar", 10.0, 5.0),
        ];

        let totals = order_totals(&lines);
        assert_eq!(totals.subtotal, 250.0);
        assert_eq!(totals.total_taxes, 26.0);
        assert_eq!(totals.total, 276.0);
    }

    #[test]
    fn test_empty_order() {
        assert_eq!(order_totals(&[]), OrderTotals::default());
    }

    #[test]
    fn test_order_line_from_json() {
        let line: OrderLine =
            serde_json::from_str(r#"{"material": "Sand", "quantity": 3, "unit_cost": 20}"#).unwrap();
        assert_eq!(line.tax_percent, None);
        assert_eq!(line.subtotal(), 60.0);
    }
}
