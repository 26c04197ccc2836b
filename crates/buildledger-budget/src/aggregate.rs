//! Budget and activity totals
//!
//! Two conversion policies coexist and must not be unified:
//!
//! - [`aggregate_single`] converts one record's totals at one shared rate.
//! - [`aggregate_across_activities`] sums categories in local currency, and
//!   sums each activity's own conversion (at its own rate) for the foreign
//!   figures.
//!
//! With differing rates the two give different foreign totals.

use serde::{Deserialize, Serialize};
use std::ops::Add;
use tracing::debug;

use crate::error::{checked_rate, Result};

/// Itemized cost categories of a budget or activity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CostBreakdown {
    pub materials: f64,
    pub labor: f64,
    pub subcontracts: f64,
    pub other: f64,
}

impl CostBreakdown {
    pub fn new(materials: f64, labor: f64, subcontracts: f64, other: f64) -> Self {
        Self {
            materials,
            labor,
            subcontracts,
            other,
        }
    }

    /// Sum of all categories, before admin fee
    pub fn direct_cost(&self) -> f64 {
        self.materials + self.labor + self.subcontracts + self.other
    }

    /// Every category divided by `rate`
    pub fn converted(&self, rate: f64) -> Self {
        Self {
            materials: self.materials / rate,
            labor: self.labor / rate,
            subcontracts: self.subcontracts / rate,
            other: self.other / rate,
        }
    }
}

impl Add for CostBreakdown {
    type Output = CostBreakdown;

    fn add(self, rhs: CostBreakdown) -> CostBreakdown {
        CostBreakdown {
            materials: self.materials + rhs.materials,
            labor: self.labor + rhs.labor,
            subcontracts: self.subcontracts + rhs.subcontracts,
            other: self.other + rhs.other,
        }
    }
}

impl std::iter::Sum for CostBreakdown {
    fn sum<I: Iterator<Item = CostBreakdown>>(iter: I) -> Self {
        iter.fold(CostBreakdown::default(), |acc, c| acc + c)
    }
}

/// Direct cost, admin fee and grand total in one currency
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrencyTotals {
    pub direct_cost: f64,
    pub admin_fee_amount: f64,
    pub grand_total: f64,
}

impl CurrencyTotals {
    fn from_direct(direct_cost: f64, admin_fee_percent: f64) -> Self {
        let admin_fee_amount = direct_cost * admin_fee_percent / 100.0;
        Self {
            direct_cost,
            admin_fee_amount,
            grand_total: direct_cost + admin_fee_amount,
        }
    }

    fn converted(&self, rate: f64) -> Self {
        Self {
            direct_cost: self.direct_cost / rate,
            admin_fee_amount: self.admin_fee_amount / rate,
            grand_total: self.grand_total / rate,
        }
    }
}

impl Add for CurrencyTotals {
    type Output = CurrencyTotals;

    fn add(self, rhs: CurrencyTotals) -> CurrencyTotals {
        CurrencyTotals {
            direct_cost: self.direct_cost + rhs.direct_cost,
            admin_fee_amount: self.admin_fee_amount + rhs.admin_fee_amount,
            grand_total: self.grand_total + rhs.grand_total,
        }
    }
}

/// Totals of a single record in local and foreign currency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetTotals {
    pub local: CurrencyTotals,
    pub foreign: CurrencyTotals,
    pub exchange_rate: f64,
}

/// Fold one record's categories into totals, converting at a shared rate
///
/// `exchange_rate` must be > 0; zero or `None` is a `DivisionByZero`.
pub fn aggregate_single(
    costs: &CostBreakdown,
    admin_fee_percent: f64,
    exchange_rate: Option<f64>,
) -> Result<BudgetTotals> {
    let rate = checked_rate(exchange_rate, "budget")?;
    let local = CurrencyTotals::from_direct(costs.direct_cost(), admin_fee_percent);

    Ok(BudgetTotals {
        local,
        foreign: local.converted(rate),
        exchange_rate: rate,
    })
}

/// A budget line item with its own categories and, optionally, its own rate
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    #[serde(default)]
    pub costs: CostBreakdown,
    /// Admin fee applied to this activity; none means no fee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_fee_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
}

impl Activity {
    pub fn new(name: impl Into<String>, costs: CostBreakdown) -> Self {
        Self {
            name: name.into(),
            costs,
            admin_fee_percent: None,
            exchange_rate: None,
        }
    }

    pub fn with_admin_fee(mut self, percent: f64) -> Self {
        self.admin_fee_percent = Some(percent);
        self
    }

    pub fn with_exchange_rate(mut self, rate: f64) -> Self {
        self.exchange_rate = Some(rate);
        self
    }

    /// Local-currency totals of this activity alone
    pub fn local_totals(&self) -> CurrencyTotals {
        CurrencyTotals::from_direct(self.costs.direct_cost(), self.admin_fee_percent.unwrap_or(0.0))
    }
}

/// Totals across activities
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityRollup {
    /// Categories summed in local currency
    pub local_costs: CostBreakdown,
    /// Sum of each activity's categories converted at its own rate
    pub foreign_costs: CostBreakdown,
    pub local: CurrencyTotals,
    pub foreign: CurrencyTotals,
    pub activity_count: usize,
}

/// Sum activities, converting each one at its own exchange rate
///
/// Every activity must carry a usable rate.
pub fn aggregate_across_activities(activities: &[Activity]) -> Result<ActivityRollup> {
    let mut rollup = ActivityRollup::default();

    for activity in activities {
        let rate = checked_rate(activity.exchange_rate, &format!("activity '{}'", activity.name))?;
        let local = activity.local_totals();

        rollup.local_costs = rollup.local_costs + activity.costs;
        rollup.foreign_costs = rollup.foreign_costs + activity.costs.converted(rate);
        rollup.local = rollup.local + local;
        rollup.foreign = rollup.foreign + local.converted(rate);
        rollup.activity_count += 1;
    }

    Ok(rollup)
}

/// A persisted budget with its activities
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub name: String,
    #[serde(default)]
    pub admin_fee_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl BudgetRecord {
    /// Categories summed over all activities
    pub fn total_costs(&self) -> CostBreakdown {
        self.activities.iter().map(|a| a.costs).sum()
    }

    /// Single-budget view: summed categories, budget fee, one shared rate
    pub fn single_view(&self) -> Result<BudgetTotals> {
        aggregate_single(&self.total_costs(), self.admin_fee_percent, self.exchange_rate)
    }

    /// Multi-activity view: per-activity conversion
    ///
    /// Activities without their own rate or fee inherit the budget's.
    pub fn activity_view(&self) -> Result<ActivityRollup> {
        let resolved: Vec<Activity> = self
            .activities
            .iter()
            .map(|activity| {
                let mut activity = activity.clone();
                if activity.exchange_rate.is_none() {
                    debug!(activity = %activity.name, "activity inherits budget exchange rate");
                    activity.exchange_rate = self.exchange_rate;
                }
                activity.admin_fee_percent = activity.admin_fee_percent.or(Some(self.admin_fee_percent));
                activity
            })
            .collect();

        aggregate_across_activities(&resolved)
    }
}
