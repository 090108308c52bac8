//! Monthly commission and cash-flow reports over the order list.

use chrono::{DateTime, Datelike, Utc};
use lp_protocol::{OrderStatus, ServiceOrder, Technician};
use serde::Serialize;

/// A calendar month (1-12) in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(at: DateTime<Utc>) -> Self {
        Self::new(at.year(), at.month())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at.year() == self.year && at.month() == self.month
    }
}

/// Technician share of one order's profit. Zero when the order lost money.
pub fn commission(order: &ServiceOrder, rate: f64) -> f64 {
    let profit = order.profit();
    if profit > 0.0 { profit * rate / 100.0 } else { 0.0 }
}

/// One technician's paid work in a period.
#[derive(Debug, Clone, Serialize)]
pub struct TechnicianReport {
    pub technician: Technician,
    pub orders: Vec<ServiceOrder>,
    pub total_commission: f64,
}

impl TechnicianReport {
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

/// Per-technician report; only paid orders created in `period` count.
pub fn technician_report(
    orders: &[ServiceOrder],
    technicians: &[Technician],
    period: Period,
) -> Vec<TechnicianReport> {
    technicians
        .iter()
        .map(|technician| {
            let paid: Vec<ServiceOrder> = orders
                .iter()
                .filter(|o| period.contains(o.created_at))
                .filter(|o| o.status == OrderStatus::Paid)
                .filter(|o| o.technician_id.as_deref() == Some(technician.id.as_str()))
                .cloned()
                .collect();
            let total_commission: f64 = paid
                .iter()
                .map(|o| commission(o, technician.commission_rate))
                .sum();
            TechnicianReport {
                technician: technician.clone(),
                orders: paid,
                total_commission,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialSummary {
    pub period: Period,
    /// Charged amounts of orders not yet paid.
    pub receivable: f64,
    /// Charged amounts of paid orders.
    pub received: f64,
    /// Orders of the period, newest first.
    pub orders: Vec<ServiceOrder>,
}

pub fn financial_summary(orders: &[ServiceOrder], period: Period) -> FinancialSummary {
    let mut in_period: Vec<ServiceOrder> = orders
        .iter()
        .filter(|o| period.contains(o.created_at))
        .cloned()
        .collect();
    in_period.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let (received, receivable) = in_period.iter().fold((0.0, 0.0), |(paid, open), o| {
        if o.status == OrderStatus::Paid {
            (paid + o.charged, open)
        } else {
            (paid, open + o.charged)
        }
    });

    FinancialSummary {
        period,
        receivable,
        received,
        orders: in_period,
    }
}
