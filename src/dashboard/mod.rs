//! Dashboard statistics: a stateless, read-only rollup across quotations,
//! expenses and active projects for the current period.

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{Datelike, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::projects::{classify_health, spent_percentage, Expense, Project};
use crate::quotations::Quotation;
use crate::shared::schema::{expenses, projects, quotations};
use crate::shared::state::AppState;
use crate::shared::utils::bd_to_f64;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub financials: FinancialStats,
    pub pipeline: PipelineStats,
    pub projects: Vec<ProjectHealth>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct FinancialStats {
    #[serde(rename = "revenueYTD")]
    pub revenue_ytd: f64,
    #[serde(rename = "revenueMonth")]
    pub revenue_month: f64,
    #[serde(rename = "expensesMonth")]
    pub expenses_month: f64,
}

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub pending_count: i64,
    pub pending_value: f64,
    pub won_month_count: i64,
    pub won_month_value: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHealth {
    pub id: Uuid,
    pub name: String,
    pub budget: f64,
    pub total_spent: f64,
    pub spent_pct: f64,
    pub health: &'static str,
}

/// Revenue and pipeline figures from the quotation list. Won revenue is
/// attributed to the period in which the quotation was last updated, i.e.
/// when it moved to approved.
fn rollup_quotations(rows: &[Quotation], year: i32, month: u32) -> (FinancialStats, PipelineStats) {
    let mut financials = FinancialStats::default();
    let mut pipeline = PipelineStats::default();

    for q in rows {
        let amount = bd_to_f64(&q.total_amount);
        match q.status.as_str() {
            "approved" => {
                let updated = q.updated_at.date_naive();
                if updated.year() == year {
                    financials.revenue_ytd += amount;
                    if updated.month() == month {
                        financials.revenue_month += amount;
                        pipeline.won_month_count += 1;
                        pipeline.won_month_value += amount;
                    }
                }
            }
            "pending" => {
                pipeline.pending_count += 1;
                pipeline.pending_value += amount;
            }
            _ => {}
        }
    }

    (financials, pipeline)
}

fn sum_expenses_in_month(rows: &[Expense], year: i32, month: u32) -> f64 {
    rows.iter()
        .filter(|e| e.expense_date.year() == year && e.expense_date.month() == month)
        .map(|e| bd_to_f64(&e.amount))
        .sum()
}

pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let today = Utc::now().date_naive();

    let quotation_rows: Vec<Quotation> = quotations::table
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    let expense_rows: Vec<Expense> = expenses::table
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    let (mut financials, pipeline) =
        rollup_quotations(&quotation_rows, today.year(), today.month());
    financials.expenses_month = sum_expenses_in_month(&expense_rows, today.year(), today.month());

    let active: Vec<Project> = projects::table
        .filter(projects::status.eq("in_progress"))
        .order(projects::created_at.desc())
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    let mut spent_by_project: HashMap<Uuid, f64> = HashMap::new();
    for expense in &expense_rows {
        *spent_by_project.entry(expense.project_id).or_default() += bd_to_f64(&expense.amount);
    }

    let project_health = active
        .into_iter()
        .map(|p| {
            let budget = bd_to_f64(&p.budget);
            let total_spent = spent_by_project.get(&p.id).copied().unwrap_or(0.0);
            ProjectHealth {
                id: p.id,
                name: p.name,
                budget,
                total_spent,
                spent_pct: spent_percentage(total_spent, budget),
                health: classify_health(total_spent, budget),
            }
        })
        .collect();

    Ok(Json(DashboardStats {
        financials,
        pipeline,
        projects: project_health,
    }))
}

pub fn configure_dashboard_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard/stats", get(dashboard_stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::{NaiveDate, TimeZone};

    fn quotation(status: &str, amount: i64, updated: &str) -> Quotation {
        let updated_at = Utc
            .from_utc_datetime(
                &NaiveDate::parse_from_str(updated, "%Y-%m-%d")
                    .expect("bad date literal")
                    .and_hms_opt(12, 0, 0)
                    .expect("bad time"),
            );
        Quotation {
            id: Uuid::new_v4(),
            client_id: None,
            client_name: None,
            title: "Test estimate".to_string(),
            status: status.to_string(),
            total_amount: BigDecimal::from(amount),
            labor_cost: BigDecimal::from(0),
            design_fee_type: "percentage".to_string(),
            design_fee_value: BigDecimal::from(0),
            tax_percentage: BigDecimal::from(18),
            notes: None,
            created_at: updated_at,
            updated_at,
        }
    }

    fn expense(amount: i64, date: &str) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            description: "Site material".to_string(),
            amount: BigDecimal::from(amount),
            category: "general".to_string(),
            expense_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("bad date literal"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn approved_quotations_roll_into_revenue() {
        let rows = vec![
            quotation("approved", 10000, "2026-08-02"),
            quotation("approved", 5000, "2026-03-15"),
            quotation("approved", 7000, "2025-12-20"),
            quotation("rejected", 9000, "2026-08-01"),
        ];

        let (financials, pipeline) = rollup_quotations(&rows, 2026, 8);

        assert_eq!(financials.revenue_ytd, 15000.0);
        assert_eq!(financials.revenue_month, 10000.0);
        assert_eq!(pipeline.won_month_count, 1);
        assert_eq!(pipeline.won_month_value, 10000.0);
    }

    #[test]
    fn pending_quotations_feed_the_pipeline() {
        let rows = vec![
            quotation("pending", 4000, "2026-08-02"),
            quotation("pending", 2500, "2026-01-10"),
            quotation("draft", 99999, "2026-08-02"),
        ];

        let (financials, pipeline) = rollup_quotations(&rows, 2026, 8);

        assert_eq!(pipeline.pending_count, 2);
        assert_eq!(pipeline.pending_value, 6500.0);
        assert_eq!(financials.revenue_ytd, 0.0);
    }

    #[test]
    fn expense_sum_is_scoped_to_the_month() {
        let rows = vec![
            expense(1200, "2026-08-01"),
            expense(800, "2026-08-30"),
            expense(500, "2026-07-31"),
            expense(300, "2025-08-15"),
        ];

        assert_eq!(sum_expenses_in_month(&rows, 2026, 8), 2000.0);
    }
}
