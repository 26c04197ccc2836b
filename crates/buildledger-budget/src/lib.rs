//! BuildLedger budget arithmetic
//!
//! Pure aggregation over budget records, budget activities and purchase
//! orders. Inputs are never modified.
//!
//! ```rust
//! use buildledger_budget::{aggregate_single, CostBreakdown};
//!
//! let costs = CostBreakdown::new(1000.0, 500.0, 0.0, 0.0);
//! let totals = aggregate_single(&costs, 12.0, Some(500.0)).unwrap();
//! assert_eq!(totals.local.grand_total, 1680.0);
//! ```

pub mod aggregate;
pub mod error;
pub mod orders;

pub use aggregate::{
    aggregate_across_activities, aggregate_single, Activity, ActivityRollup, BudgetRecord,
    BudgetTotals, CostBreakdown, CurrencyTotals,
};
pub use error::{AggregationError, Result};
pub use orders::{compute_line_tax, order_totals, OrderLine, OrderTotals, TaxLabel};
