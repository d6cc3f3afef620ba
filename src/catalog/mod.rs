//! Master materials catalog. Reference data only: the room ledger copies
//! pricing out of here at insertion time and never reads it back.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::schema::catalog_items;
use crate::shared::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = catalog_items)]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub default_rate: BigDecimal,
    pub default_description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCatalogItemRequest {
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub default_rate: BigDecimal,
    pub default_description: Option<String>,
}

#[derive(Debug, Deserialize, AsChangeset)]
#[diesel(table_name = catalog_items)]
pub struct UpdateCatalogItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub default_rate: Option<BigDecimal>,
    pub default_description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub include_inactive: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CatalogItem>>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let mut q = catalog_items::table.into_boxed();

    if !query.include_inactive.unwrap_or(false) {
        q = q.filter(catalog_items::is_active.eq(true));
    }
    if let Some(category) = query.category {
        q = q.filter(catalog_items::category.eq(category));
    }
    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            catalog_items::name
                .ilike(pattern.clone())
                .or(catalog_items::default_description.ilike(pattern)),
        );
    }

    let records: Vec<CatalogItem> = q
        .order(catalog_items::name.asc())
        .limit(query.limit.unwrap_or(100))
        .offset(query.offset.unwrap_or(0))
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    Ok(Json(records))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCatalogItemRequest>,
) -> Result<(StatusCode, Json<CatalogItem>), (StatusCode, String)> {
    if req.name.trim().is_empty() || req.unit.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Name and unit are required".to_string(),
        ));
    }
    if req.default_rate < BigDecimal::from(0) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Rate must not be negative".to_string(),
        ));
    }

    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let now = Utc::now();
    let item = CatalogItem {
        id: Uuid::new_v4(),
        name: req.name,
        category: req.category.unwrap_or_else(|| "material".to_string()),
        unit: req.unit,
        default_rate: req.default_rate,
        default_description: req.default_description,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(catalog_items::table)
        .values(&item)
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Insert error: {e}")))?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CatalogItem>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let item: CatalogItem = catalog_items::table
        .filter(catalog_items::id.eq(id))
        .first(&mut conn)
        .map_err(|_| (StatusCode::NOT_FOUND, "Catalog item not found".to_string()))?;

    Ok(Json(item))
}

/// Editing a catalog item changes defaults for FUTURE adds only; existing
/// room line items keep the snapshot taken when they were created.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCatalogItemRequest>,
) -> Result<Json<CatalogItem>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let updated: CatalogItem = diesel::update(catalog_items::table.filter(catalog_items::id.eq(id)))
        .set((&req, catalog_items::updated_at.eq(Utc::now())))
        .get_result(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => {
                (StatusCode::NOT_FOUND, "Catalog item not found".to_string())
            }
            other => (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {other}")),
        })?;

    Ok(Json(updated))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let deleted = diesel::delete(catalog_items::table.filter(catalog_items::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Delete error: {e}")))?;

    if deleted == 0 {
        return Err((StatusCode::NOT_FOUND, "Catalog item not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Catalog item deleted" })))
}

pub fn configure_catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/materials", get(list_items).post(create_item))
        .route(
            "/api/materials/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
}
