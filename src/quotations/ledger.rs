//! Room item ledger and the total-aggregation engine.
//!
//! Every mutation of a room's line items re-derives the room total and the
//! parent quotation total by a full re-sum of the ledger, inside the same
//! transaction as the mutation. Re-summing (rather than applying deltas)
//! keeps concurrent edits convergent: whichever request commits last has
//! summed the table as it actually is.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::dsl::sum;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::schema::{catalog_items, quotations, room_line_items, rooms};
use crate::shared::state::AppState;

use super::error::QuotationsError;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = room_line_items)]
pub struct RoomLineItem {
    pub id: Uuid,
    pub room_id: Uuid,
    /// Traceability back to the catalog only. Pricing fields below are a
    /// snapshot taken at insertion time; catalog edits never flow back.
    pub catalog_item_id: Option<Uuid>,
    pub description: String,
    pub specification: Option<String>,
    pub unit: String,
    pub rate: BigDecimal,
    pub quantity: BigDecimal,
    pub total: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire shape for room materials.
#[derive(Debug, Serialize)]
pub struct RoomMaterial {
    pub id: Uuid,
    pub material_id: Option<Uuid>,
    pub name: String,
    pub specification: Option<String>,
    pub unit: String,
    pub price: BigDecimal,
    pub quantity: BigDecimal,
    pub total: BigDecimal,
}

impl From<RoomLineItem> for RoomMaterial {
    fn from(item: RoomLineItem) -> Self {
        Self {
            id: item.id,
            material_id: item.catalog_item_id,
            name: item.description,
            specification: item.specification,
            unit: item.unit,
            price: item.rate,
            quantity: item.quantity,
            total: item.total,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddLineItemRequest {
    pub material_id: Option<Uuid>,
    pub quantity: BigDecimal,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub rate: Option<BigDecimal>,
    pub specification: Option<String>,
    #[serde(rename = "saveToCatalog", default)]
    pub save_to_catalog: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLineItemRequest {
    pub quantity: Option<BigDecimal>,
    pub rate: Option<BigDecimal>,
    pub description: Option<String>,
    pub specification: Option<String>,
}

pub fn line_total(rate: &BigDecimal, quantity: &BigDecimal) -> BigDecimal {
    rate * quantity
}

fn ensure_positive_quantity(quantity: &BigDecimal) -> Result<(), QuotationsError> {
    if *quantity <= BigDecimal::from(0) {
        return Err(QuotationsError::Validation(
            "Quantity must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Pull the required fields for a custom (non-catalog) item out of the
/// request, rejecting the add when any of them is missing.
fn custom_item_fields(
    req: &AddLineItemRequest,
) -> Result<(String, String, BigDecimal), QuotationsError> {
    match (&req.description, &req.unit, &req.rate) {
        (Some(description), Some(unit), Some(rate))
            if !description.trim().is_empty() && !unit.trim().is_empty() =>
        {
            Ok((description.clone(), unit.clone(), rate.clone()))
        }
        _ => Err(QuotationsError::Validation(
            "Custom items require description, unit and rate".to_string(),
        )),
    }
}

/// Re-derive `rooms.room_total` from the ledger, then the parent
/// quotation's `total_amount` from its rooms. Full re-sum on purpose.
pub fn recompute_room_totals(
    conn: &mut PgConnection,
    room_id: Uuid,
) -> Result<BigDecimal, QuotationsError> {
    let room_total: BigDecimal = room_line_items::table
        .filter(room_line_items::room_id.eq(room_id))
        .select(sum(room_line_items::total))
        .first::<Option<BigDecimal>>(conn)?
        .unwrap_or_else(|| BigDecimal::from(0));

    diesel::update(rooms::table.filter(rooms::id.eq(room_id)))
        .set((
            rooms::room_total.eq(&room_total),
            rooms::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;

    let quotation_id: Uuid = rooms::table
        .filter(rooms::id.eq(room_id))
        .select(rooms::quotation_id)
        .first(conn)?;

    recompute_quotation_total(conn, quotation_id)?;

    Ok(room_total)
}

/// Re-derive a quotation's live `total_amount` as the sum of its room
/// totals. Zero when the quotation has no rooms.
pub fn recompute_quotation_total(
    conn: &mut PgConnection,
    quotation_id: Uuid,
) -> Result<BigDecimal, QuotationsError> {
    let total: BigDecimal = rooms::table
        .filter(rooms::quotation_id.eq(quotation_id))
        .select(sum(rooms::room_total))
        .first::<Option<BigDecimal>>(conn)?
        .unwrap_or_else(|| BigDecimal::from(0));

    diesel::update(quotations::table.filter(quotations::id.eq(quotation_id)))
        .set((
            quotations::total_amount.eq(&total),
            quotations::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;

    Ok(total)
}

pub async fn list_room_materials(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<RoomMaterial>>, QuotationsError> {
    let mut conn = state.conn.get()?;

    let exists: i64 = rooms::table
        .filter(rooms::id.eq(room_id))
        .count()
        .get_result(&mut conn)?;
    if exists == 0 {
        return Err(QuotationsError::NotFound("Room not found".to_string()));
    }

    let items: Vec<RoomLineItem> = room_line_items::table
        .filter(room_line_items::room_id.eq(room_id))
        .order(room_line_items::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(items.into_iter().map(RoomMaterial::from).collect()))
}

pub async fn add_line_item(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
    Json(req): Json<AddLineItemRequest>,
) -> Result<(StatusCode, Json<RoomMaterial>), QuotationsError> {
    ensure_positive_quantity(&req.quantity)?;

    let mut conn = state.conn.get()?;

    let item = conn.transaction::<RoomLineItem, QuotationsError, _>(|conn| {
        let room_exists: i64 = rooms::table
            .filter(rooms::id.eq(room_id))
            .count()
            .get_result(conn)?;
        if room_exists == 0 {
            return Err(QuotationsError::NotFound("Room not found".to_string()));
        }

        let now = Utc::now();
        let item = if let Some(material_id) = req.material_id {
            // Catalog add: at most one line item per catalog entry per room,
            // and the pricing fields are copied out of the catalog row now.
            let duplicate: i64 = room_line_items::table
                .filter(room_line_items::room_id.eq(room_id))
                .filter(room_line_items::catalog_item_id.eq(material_id))
                .count()
                .get_result(conn)?;
            if duplicate > 0 {
                return Err(QuotationsError::Conflict(
                    "Material already added to this room".to_string(),
                ));
            }

            let (name, unit, default_rate, default_description): (
                String,
                String,
                BigDecimal,
                Option<String>,
            ) = catalog_items::table
                .filter(catalog_items::id.eq(material_id))
                .select((
                    catalog_items::name,
                    catalog_items::unit,
                    catalog_items::default_rate,
                    catalog_items::default_description,
                ))
                .first(conn)
                .map_err(|_| {
                    QuotationsError::NotFound("Catalog item not found".to_string())
                })?;

            RoomLineItem {
                id: Uuid::new_v4(),
                room_id,
                catalog_item_id: Some(material_id),
                description: name,
                specification: default_description,
                unit,
                total: line_total(&default_rate, &req.quantity),
                rate: default_rate,
                quantity: req.quantity.clone(),
                created_at: now,
                updated_at: now,
            }
        } else {
            let (description, unit, rate) = custom_item_fields(&req)?;

            let catalog_item_id = if req.save_to_catalog {
                let catalog_id = Uuid::new_v4();
                diesel::insert_into(catalog_items::table)
                    .values((
                        catalog_items::id.eq(catalog_id),
                        catalog_items::name.eq(&description),
                        catalog_items::category.eq("custom"),
                        catalog_items::unit.eq(&unit),
                        catalog_items::default_rate.eq(&rate),
                        catalog_items::default_description.eq(req.specification.clone()),
                        catalog_items::is_active.eq(true),
                        catalog_items::created_at.eq(now),
                        catalog_items::updated_at.eq(now),
                    ))
                    .execute(conn)?;
                Some(catalog_id)
            } else {
                None
            };

            RoomLineItem {
                id: Uuid::new_v4(),
                room_id,
                catalog_item_id,
                description,
                specification: req.specification.clone(),
                unit,
                total: line_total(&rate, &req.quantity),
                rate,
                quantity: req.quantity.clone(),
                created_at: now,
                updated_at: now,
            }
        };

        diesel::insert_into(room_line_items::table)
            .values(&item)
            .execute(conn)?;

        recompute_room_totals(conn, room_id)?;

        Ok(item)
    })?;

    Ok((StatusCode::CREATED, Json(RoomMaterial::from(item))))
}

pub async fn update_line_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLineItemRequest>,
) -> Result<Json<RoomMaterial>, QuotationsError> {
    let mut conn = state.conn.get()?;

    let item = conn.transaction::<RoomLineItem, QuotationsError, _>(|conn| {
        let existing: RoomLineItem = room_line_items::table
            .filter(room_line_items::id.eq(id))
            .first(conn)
            .map_err(|_| QuotationsError::NotFound("Line item not found".to_string()))?;

        let quantity = req.quantity.unwrap_or(existing.quantity);
        ensure_positive_quantity(&quantity)?;
        let rate = req.rate.unwrap_or(existing.rate);
        let description = req.description.unwrap_or(existing.description);
        let specification = req.specification.or(existing.specification);
        let total = line_total(&rate, &quantity);

        let updated: RoomLineItem =
            diesel::update(room_line_items::table.filter(room_line_items::id.eq(id)))
                .set((
                    room_line_items::description.eq(description),
                    room_line_items::specification.eq(specification),
                    room_line_items::rate.eq(rate),
                    room_line_items::quantity.eq(quantity),
                    room_line_items::total.eq(total),
                    room_line_items::updated_at.eq(Utc::now()),
                ))
                .get_result(conn)?;

        recompute_room_totals(conn, existing.room_id)?;

        Ok(updated)
    })?;

    Ok(Json(RoomMaterial::from(item)))
}

pub async fn delete_line_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, QuotationsError> {
    let mut conn = state.conn.get()?;

    conn.transaction::<_, QuotationsError, _>(|conn| {
        let room_id: Uuid = room_line_items::table
            .filter(room_line_items::id.eq(id))
            .select(room_line_items::room_id)
            .first(conn)
            .map_err(|_| QuotationsError::NotFound("Line item not found".to_string()))?;

        diesel::delete(room_line_items::table.filter(room_line_items::id.eq(id)))
            .execute(conn)?;

        recompute_room_totals(conn, room_id)?;
        Ok(())
    })?;

    Ok(Json(serde_json::json!({ "message": "Material removed" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn bd(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("bad decimal literal")
    }

    #[test]
    fn line_total_is_rate_times_quantity() {
        assert_eq!(line_total(&bd("500"), &bd("3")), bd("1500"));
        assert_eq!(line_total(&bd("99.50"), &bd("2.5")), bd("248.750"));
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        assert!(ensure_positive_quantity(&bd("0")).is_err());
        assert!(ensure_positive_quantity(&bd("-2")).is_err());
        assert!(ensure_positive_quantity(&bd("0.01")).is_ok());
    }

    #[test]
    fn custom_items_require_all_fields() {
        let req = AddLineItemRequest {
            material_id: None,
            quantity: bd("1"),
            description: Some("Teak panelling".to_string()),
            unit: None,
            rate: Some(bd("750")),
            specification: None,
            save_to_catalog: false,
        };
        assert!(matches!(
            custom_item_fields(&req),
            Err(QuotationsError::Validation(_))
        ));
    }

    #[test]
    fn custom_items_reject_blank_description() {
        let req = AddLineItemRequest {
            material_id: None,
            quantity: bd("1"),
            description: Some("   ".to_string()),
            unit: Some("sqft".to_string()),
            rate: Some(bd("120")),
            specification: None,
            save_to_catalog: false,
        };
        assert!(custom_item_fields(&req).is_err());
    }

    #[test]
    fn custom_item_fields_pass_through() {
        let req = AddLineItemRequest {
            material_id: None,
            quantity: bd("4"),
            description: Some("False ceiling".to_string()),
            unit: Some("sqft".to_string()),
            rate: Some(bd("85")),
            specification: Some("Gypsum board, 2x2 grid".to_string()),
            save_to_catalog: true,
        };
        let (description, unit, rate) = custom_item_fields(&req).expect("fields rejected");
        assert_eq!(description, "False ceiling");
        assert_eq!(unit, "sqft");
        assert_eq!(rate, bd("85"));
    }

    #[test]
    fn wire_view_maps_ledger_names() {
        let now = Utc::now();
        let item = RoomLineItem {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            catalog_item_id: None,
            description: "Wall paint".to_string(),
            specification: Some("Two coats, matte".to_string()),
            unit: "sqft".to_string(),
            rate: bd("12"),
            quantity: bd("300"),
            total: bd("3600"),
            created_at: now,
            updated_at: now,
        };
        let material = RoomMaterial::from(item);
        assert_eq!(material.name, "Wall paint");
        assert_eq!(material.price, bd("12"));
        assert_eq!(material.total, bd("3600"));
        assert!(material.material_id.is_none());
    }
}
