//! Finalized pricing: materials + labor + design fee + tax.
//!
//! The saved grand total is written onto the quotation's `total_amount`
//! only on an explicit save; it is unrelated to the live ledger sum the
//! aggregation engine maintains between saves.

use axum::{
    extract::{Path, State},
    Json,
};
use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::dsl::sum;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::schema::{quotations, rooms};
use crate::shared::state::AppState;

use super::error::QuotationsError;
use super::Quotation;

pub const DESIGN_FEE_TYPES: [&str; 2] = ["flat", "percentage"];

#[derive(Debug, Clone, Serialize)]
pub struct PricingBreakdown {
    pub materials_total: BigDecimal,
    pub labor_cost: BigDecimal,
    pub design_fee: BigDecimal,
    pub taxable_amount: BigDecimal,
    pub tax_percentage: BigDecimal,
    pub tax_amount: BigDecimal,
    pub grand_total: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct QuotationSummary {
    pub quotation_id: Uuid,
    pub title: String,
    pub status: String,
    #[serde(flatten)]
    pub pricing: PricingBreakdown,
}

#[derive(Debug, Deserialize)]
pub struct SaveTotalRequest {
    pub total_amount: BigDecimal,
    pub labor_cost: BigDecimal,
    pub design_fee_type: String,
    pub design_fee_value: BigDecimal,
}

pub fn compute_breakdown(
    materials_total: BigDecimal,
    labor_cost: BigDecimal,
    design_fee_type: &str,
    design_fee_value: BigDecimal,
    tax_percentage: BigDecimal,
) -> Result<PricingBreakdown, QuotationsError> {
    let hundred = BigDecimal::from(100);

    let design_fee = match design_fee_type {
        "flat" => design_fee_value,
        "percentage" => (&materials_total + &labor_cost) * design_fee_value / &hundred,
        other => {
            return Err(QuotationsError::Validation(format!(
                "Unknown design fee type: {other}"
            )))
        }
    };

    let taxable_amount = &materials_total + &labor_cost + &design_fee;
    let tax_amount = &taxable_amount * &tax_percentage / &hundred;
    let grand_total = &taxable_amount + &tax_amount;

    Ok(PricingBreakdown {
        materials_total,
        labor_cost,
        design_fee,
        taxable_amount,
        tax_percentage,
        tax_amount,
        grand_total,
    })
}

/// Preview the full price calculation for a quotation. The materials total
/// is re-summed from the rooms here rather than read back from
/// `total_amount`, which may hold a previously saved grand total.
pub async fn quotation_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuotationSummary>, QuotationsError> {
    let mut conn = state.conn.get()?;

    let quotation: Quotation = quotations::table
        .filter(quotations::id.eq(id))
        .first(&mut conn)
        .map_err(|_| QuotationsError::NotFound("Quotation not found".to_string()))?;

    let materials_total: BigDecimal = rooms::table
        .filter(rooms::quotation_id.eq(id))
        .select(sum(rooms::room_total))
        .first::<Option<BigDecimal>>(&mut conn)?
        .unwrap_or_else(|| BigDecimal::from(0));

    let pricing = compute_breakdown(
        materials_total,
        quotation.labor_cost.clone(),
        &quotation.design_fee_type,
        quotation.design_fee_value.clone(),
        quotation.tax_percentage.clone(),
    )?;

    Ok(Json(QuotationSummary {
        quotation_id: quotation.id,
        title: quotation.title,
        status: quotation.status,
        pricing,
    }))
}

/// Persist the finalized grand total and its pricing inputs. Explicit user
/// action; overwrites the live aggregation sum in `total_amount`.
pub async fn save_final_total(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SaveTotalRequest>,
) -> Result<Json<Quotation>, QuotationsError> {
    if !DESIGN_FEE_TYPES.contains(&req.design_fee_type.as_str()) {
        return Err(QuotationsError::Validation(format!(
            "Unknown design fee type: {}",
            req.design_fee_type
        )));
    }
    if req.total_amount < BigDecimal::from(0) || req.labor_cost < BigDecimal::from(0) {
        return Err(QuotationsError::Validation(
            "Amounts must not be negative".to_string(),
        ));
    }

    let mut conn = state.conn.get()?;

    let updated: Quotation = diesel::update(quotations::table.filter(quotations::id.eq(id)))
        .set((
            quotations::total_amount.eq(&req.total_amount),
            quotations::labor_cost.eq(&req.labor_cost),
            quotations::design_fee_type.eq(&req.design_fee_type),
            quotations::design_fee_value.eq(&req.design_fee_value),
            quotations::updated_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => {
                QuotationsError::NotFound("Quotation not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn bd(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("bad decimal literal")
    }

    #[test]
    fn percentage_fee_breakdown() {
        let breakdown = compute_breakdown(
            bd("10000"),
            bd("2000"),
            "percentage",
            bd("10"),
            bd("18"),
        )
        .expect("compute failed");

        assert_eq!(breakdown.design_fee, bd("1200"));
        assert_eq!(breakdown.taxable_amount, bd("13200"));
        assert_eq!(breakdown.tax_amount, bd("2376"));
        assert_eq!(breakdown.grand_total, bd("15576"));
    }

    #[test]
    fn flat_fee_is_taken_verbatim() {
        let breakdown =
            compute_breakdown(bd("5000"), bd("0"), "flat", bd("750"), bd("18")).expect("compute failed");

        assert_eq!(breakdown.design_fee, bd("750"));
        assert_eq!(breakdown.taxable_amount, bd("5750"));
        assert_eq!(breakdown.grand_total, bd("6785"));
    }

    #[test]
    fn empty_quotation_prices_to_zero() {
        let breakdown =
            compute_breakdown(bd("0"), bd("0"), "percentage", bd("10"), bd("18")).expect("compute failed");

        assert_eq!(breakdown.design_fee, bd("0"));
        assert_eq!(breakdown.grand_total, bd("0"));
    }

    #[test]
    fn unknown_fee_type_is_a_validation_error() {
        let result = compute_breakdown(bd("100"), bd("0"), "hourly", bd("10"), bd("18"));
        assert!(matches!(result, Err(QuotationsError::Validation(_))));
    }

    #[test]
    fn fractional_tax_keeps_exact_decimals() {
        let breakdown =
            compute_breakdown(bd("999.99"), bd("0.01"), "flat", bd("0"), bd("5")).expect("compute failed");

        assert_eq!(breakdown.taxable_amount, bd("1000"));
        assert_eq!(breakdown.tax_amount, bd("50"));
        assert_eq!(breakdown.grand_total, bd("1050"));
    }
}
