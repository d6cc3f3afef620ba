//! Quotations: estimate records, their rooms, the room item ledger and the
//! pricing engine that keeps every derived total consistent.

pub mod error;
pub mod ledger;
pub mod pricing;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::schema::{projects, quotations, rooms};
use crate::shared::state::AppState;

pub use error::QuotationsError;

pub const QUOTATION_STATUSES: [&str; 4] = ["draft", "pending", "approved", "rejected"];

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = quotations)]
pub struct Quotation {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub title: String,
    pub status: String,
    /// Live materials sum maintained by the ledger recompute, until an
    /// explicit save of the finalized grand total overwrites it. The next
    /// ledger mutation reverts it to the live sum.
    pub total_amount: BigDecimal,
    pub labor_cost: BigDecimal,
    pub design_fee_type: String,
    pub design_fee_value: BigDecimal,
    pub tax_percentage: BigDecimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = rooms)]
pub struct Room {
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub name: String,
    pub length: Option<BigDecimal>,
    pub width: Option<BigDecimal>,
    pub height: Option<BigDecimal>,
    pub notes: Option<String>,
    /// Derived: sum of the room's line item totals. Engine-owned, never
    /// accepted from a request body.
    pub room_total: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateQuotationRequest {
    pub title: String,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub tax_percentage: Option<BigDecimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, AsChangeset)]
#[diesel(table_name = quotations)]
pub struct UpdateQuotationRequest {
    pub title: Option<String>,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub tax_percentage: Option<BigDecimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub length: Option<BigDecimal>,
    pub width: Option<BigDecimal>,
    pub height: Option<BigDecimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, AsChangeset)]
#[diesel(table_name = rooms)]
pub struct UpdateRoomRequest {
    pub name: Option<String>,
    pub length: Option<BigDecimal>,
    pub width: Option<BigDecimal>,
    pub height: Option<BigDecimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub client_id: Option<Uuid>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_quotations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Quotation>>, QuotationsError> {
    let mut conn = state.conn.get()?;

    let mut q = quotations::table.into_boxed();

    if let Some(status) = query.status {
        q = q.filter(quotations::status.eq(status));
    }
    if let Some(client_id) = query.client_id {
        q = q.filter(quotations::client_id.eq(client_id));
    }
    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            quotations::title
                .ilike(pattern.clone())
                .or(quotations::client_name.ilike(pattern)),
        );
    }

    let records: Vec<Quotation> = q
        .order(quotations::created_at.desc())
        .limit(query.limit.unwrap_or(50))
        .offset(query.offset.unwrap_or(0))
        .load(&mut conn)?;

    Ok(Json(records))
}

pub async fn create_quotation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateQuotationRequest>,
) -> Result<(StatusCode, Json<Quotation>), QuotationsError> {
    if req.title.trim().is_empty() {
        return Err(QuotationsError::Validation("Title is required".to_string()));
    }

    let mut conn = state.conn.get()?;
    let now = Utc::now();

    let quotation = Quotation {
        id: Uuid::new_v4(),
        client_id: req.client_id,
        client_name: req.client_name,
        title: req.title,
        status: "draft".to_string(),
        total_amount: BigDecimal::from(0),
        labor_cost: BigDecimal::from(0),
        design_fee_type: "percentage".to_string(),
        design_fee_value: BigDecimal::from(0),
        tax_percentage: req.tax_percentage.unwrap_or_else(|| BigDecimal::from(18)),
        notes: req.notes,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(quotations::table)
        .values(&quotation)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(quotation)))
}

pub async fn get_quotation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Quotation>, QuotationsError> {
    let mut conn = state.conn.get()?;

    let quotation: Quotation = quotations::table
        .filter(quotations::id.eq(id))
        .first(&mut conn)
        .map_err(|_| QuotationsError::NotFound("Quotation not found".to_string()))?;

    Ok(Json(quotation))
}

pub async fn update_quotation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateQuotationRequest>,
) -> Result<Json<Quotation>, QuotationsError> {
    let mut conn = state.conn.get()?;

    let updated: Quotation = diesel::update(quotations::table.filter(quotations::id.eq(id)))
        .set((&req, quotations::updated_at.eq(Utc::now())))
        .get_result(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => {
                QuotationsError::NotFound("Quotation not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(updated))
}

pub async fn change_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<Quotation>, QuotationsError> {
    if !QUOTATION_STATUSES.contains(&req.status.as_str()) {
        return Err(QuotationsError::Validation(format!(
            "Unknown status: {}",
            req.status
        )));
    }

    let mut conn = state.conn.get()?;

    let updated: Quotation = diesel::update(quotations::table.filter(quotations::id.eq(id)))
        .set((
            quotations::status.eq(&req.status),
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

pub async fn delete_quotation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, QuotationsError> {
    let mut conn = state.conn.get()?;

    let linked_projects: i64 = projects::table
        .filter(projects::quotation_id.eq(id))
        .count()
        .get_result(&mut conn)?;
    if linked_projects > 0 {
        return Err(QuotationsError::Conflict(
            "Quotation has been converted to a project".to_string(),
        ));
    }

    let deleted = diesel::delete(quotations::table.filter(quotations::id.eq(id)))
        .execute(&mut conn)?;
    if deleted == 0 {
        return Err(QuotationsError::NotFound("Quotation not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Quotation deleted" })))
}

pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Room>>, QuotationsError> {
    let mut conn = state.conn.get()?;

    let exists: i64 = quotations::table
        .filter(quotations::id.eq(id))
        .count()
        .get_result(&mut conn)?;
    if exists == 0 {
        return Err(QuotationsError::NotFound("Quotation not found".to_string()));
    }

    let records: Vec<Room> = rooms::table
        .filter(rooms::quotation_id.eq(id))
        .order(rooms::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(records))
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Room>), QuotationsError> {
    if req.name.trim().is_empty() {
        return Err(QuotationsError::Validation("Room name is required".to_string()));
    }

    let mut conn = state.conn.get()?;

    let exists: i64 = quotations::table
        .filter(quotations::id.eq(id))
        .count()
        .get_result(&mut conn)?;
    if exists == 0 {
        return Err(QuotationsError::NotFound("Quotation not found".to_string()));
    }

    let now = Utc::now();
    let room = Room {
        id: Uuid::new_v4(),
        quotation_id: id,
        name: req.name,
        length: req.length,
        width: req.width,
        height: req.height,
        notes: req.notes,
        room_total: BigDecimal::from(0),
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(rooms::table)
        .values(&room)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn update_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoomRequest>,
) -> Result<Json<Room>, QuotationsError> {
    let mut conn = state.conn.get()?;

    let updated: Room = diesel::update(rooms::table.filter(rooms::id.eq(id)))
        .set((&req, rooms::updated_at.eq(Utc::now())))
        .get_result(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => {
                QuotationsError::NotFound("Room not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(updated))
}

/// Deleting a room removes its ledger rows (cascade) and therefore must
/// re-derive the parent quotation total in the same transaction.
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, QuotationsError> {
    let mut conn = state.conn.get()?;

    conn.transaction::<_, QuotationsError, _>(|conn| {
        let quotation_id: Uuid = rooms::table
            .filter(rooms::id.eq(id))
            .select(rooms::quotation_id)
            .first(conn)
            .map_err(|_| QuotationsError::NotFound("Room not found".to_string()))?;

        diesel::delete(rooms::table.filter(rooms::id.eq(id))).execute(conn)?;
        ledger::recompute_quotation_total(conn, quotation_id)?;
        Ok(())
    })?;

    Ok(Json(serde_json::json!({ "message": "Room deleted" })))
}

pub fn configure_quotations_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/quotations", get(list_quotations).post(create_quotation))
        .route(
            "/api/quotations/:id",
            get(get_quotation).put(update_quotation).delete(delete_quotation),
        )
        .route("/api/quotations/:id/status", put(change_status))
        .route("/api/quotations/:id/rooms", get(list_rooms).post(create_room))
        .route("/api/quotations/:id/summary", get(pricing::quotation_summary))
        .route("/api/quotations/:id/total", put(pricing::save_final_total))
        .route("/api/rooms/:id", put(update_room).delete(delete_room))
        .route(
            "/api/rooms/:id/materials",
            get(ledger::list_room_materials).post(ledger::add_line_item),
        )
        .route(
            "/api/room-materials/:id",
            put(ledger::update_line_item).delete(ledger::delete_line_item),
        )
}
