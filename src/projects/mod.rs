//! Projects converted from approved quotations, plus their tasks, notes
//! and expenses.

pub mod error;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::dsl::sum;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::schema::{expenses, project_notes, project_tasks, projects, quotations};
use crate::shared::state::AppState;
use crate::shared::utils::bd_to_f64;

pub use error::ProjectsError;

pub const PROJECT_STATUSES: [&str; 4] = ["planning", "in_progress", "on_hold", "completed"];
pub const TASK_STATUSES: [&str; 3] = ["pending", "in_progress", "done"];

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = projects)]
pub struct Project {
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub name: String,
    pub status: String,
    /// Copied from the quotation's total at conversion time; later ledger
    /// or pricing changes on the quotation do not flow into it.
    pub budget: BigDecimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = project_tasks)]
pub struct ProjectTask {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = project_notes)]
pub struct ProjectNote {
    pub id: Uuid,
    pub project_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = expenses)]
pub struct Expense {
    pub id: Uuid,
    pub project_id: Uuid,
    pub description: String,
    pub amount: BigDecimal,
    pub category: String,
    pub expense_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub quotation_id: Uuid,
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, AsChangeset)]
#[diesel(table_name = projects)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub status: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, AsChangeset)]
#[diesel(table_name = project_tasks)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub description: String,
    pub amount: BigDecimal,
    pub category: Option<String>,
    pub expense_date: NaiveDate,
}

#[derive(Debug, Deserialize, AsChangeset)]
#[diesel(table_name = expenses)]
pub struct UpdateExpenseRequest {
    pub description: Option<String>,
    pub amount: Option<BigDecimal>,
    pub category: Option<String>,
    pub expense_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProjectFinancials {
    pub project_id: Uuid,
    pub budget: f64,
    pub total_spent: f64,
    pub spent_pct: f64,
    pub health: &'static str,
}

pub fn spent_percentage(total_spent: f64, budget: f64) -> f64 {
    if budget <= 0.0 {
        return 0.0;
    }
    total_spent / budget * 100.0
}

/// Budget health for an active project. A project with no budget but real
/// spend is treated as over budget.
pub fn classify_health(total_spent: f64, budget: f64) -> &'static str {
    if budget <= 0.0 {
        return if total_spent > 0.0 { "Critical" } else { "On-Track" };
    }
    let spent_pct = spent_percentage(total_spent, budget);
    if spent_pct > 100.0 {
        "Critical"
    } else if spent_pct > 80.0 {
        "At-Risk"
    } else {
        "On-Track"
    }
}

fn ensure_project_exists(conn: &mut PgConnection, id: Uuid) -> Result<(), ProjectsError> {
    let found: i64 = projects::table
        .filter(projects::id.eq(id))
        .count()
        .get_result(conn)?;
    if found == 0 {
        return Err(ProjectsError::NotFound("Project not found".to_string()));
    }
    Ok(())
}

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Project>>, ProjectsError> {
    let mut conn = state.conn.get()?;

    let mut q = projects::table.into_boxed();

    if let Some(status) = query.status {
        q = q.filter(projects::status.eq(status));
    }
    if let Some(search) = query.search {
        q = q.filter(projects::name.ilike(format!("%{search}%")));
    }

    let records: Vec<Project> = q
        .order(projects::created_at.desc())
        .limit(query.limit.unwrap_or(50))
        .offset(query.offset.unwrap_or(0))
        .load(&mut conn)?;

    Ok(Json(records))
}

/// Convert an approved quotation into a project. At most one project may
/// exist per quotation, and the budget is captured from the quotation's
/// total at this moment.
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ProjectsError> {
    let mut conn = state.conn.get()?;

    let (status, title, total_amount): (String, String, BigDecimal) = quotations::table
        .filter(quotations::id.eq(req.quotation_id))
        .select((
            quotations::status,
            quotations::title,
            quotations::total_amount,
        ))
        .first(&mut conn)
        .map_err(|_| ProjectsError::NotFound("Quotation not found".to_string()))?;

    if status != "approved" {
        return Err(ProjectsError::Validation(
            "Only approved quotations can be converted to projects".to_string(),
        ));
    }

    let existing: i64 = projects::table
        .filter(projects::quotation_id.eq(req.quotation_id))
        .count()
        .get_result(&mut conn)?;
    if existing > 0 {
        return Err(ProjectsError::Conflict(
            "A project already exists for this quotation".to_string(),
        ));
    }

    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4(),
        quotation_id: req.quotation_id,
        name: req.name.unwrap_or(title),
        status: "planning".to_string(),
        budget: total_amount,
        start_date: req.start_date,
        end_date: req.end_date,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(projects::table)
        .values(&project)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ProjectsError> {
    let mut conn = state.conn.get()?;

    let project: Project = projects::table
        .filter(projects::id.eq(id))
        .first(&mut conn)
        .map_err(|_| ProjectsError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, ProjectsError> {
    if let Some(status) = &req.status {
        if !PROJECT_STATUSES.contains(&status.as_str()) {
            return Err(ProjectsError::Validation(format!(
                "Unknown status: {status}"
            )));
        }
    }

    let mut conn = state.conn.get()?;

    let updated: Project = diesel::update(projects::table.filter(projects::id.eq(id)))
        .set((&req, projects::updated_at.eq(Utc::now())))
        .get_result(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => {
                ProjectsError::NotFound("Project not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(updated))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ProjectsError> {
    let mut conn = state.conn.get()?;

    let deleted = diesel::delete(projects::table.filter(projects::id.eq(id)))
        .execute(&mut conn)?;
    if deleted == 0 {
        return Err(ProjectsError::NotFound("Project not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Project deleted" })))
}

pub async fn project_financials(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectFinancials>, ProjectsError> {
    let mut conn = state.conn.get()?;

    let budget: BigDecimal = projects::table
        .filter(projects::id.eq(id))
        .select(projects::budget)
        .first(&mut conn)
        .map_err(|_| ProjectsError::NotFound("Project not found".to_string()))?;

    let total_spent: BigDecimal = expenses::table
        .filter(expenses::project_id.eq(id))
        .select(sum(expenses::amount))
        .first::<Option<BigDecimal>>(&mut conn)?
        .unwrap_or_else(|| BigDecimal::from(0));

    let budget = bd_to_f64(&budget);
    let total_spent = bd_to_f64(&total_spent);

    Ok(Json(ProjectFinancials {
        project_id: id,
        budget,
        total_spent,
        spent_pct: spent_percentage(total_spent, budget),
        health: classify_health(total_spent, budget),
    }))
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProjectTask>>, ProjectsError> {
    let mut conn = state.conn.get()?;
    ensure_project_exists(&mut conn, id)?;

    let records: Vec<ProjectTask> = project_tasks::table
        .filter(project_tasks::project_id.eq(id))
        .order(project_tasks::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(records))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<ProjectTask>), ProjectsError> {
    if req.title.trim().is_empty() {
        return Err(ProjectsError::Validation("Task title is required".to_string()));
    }
    let status = req.status.unwrap_or_else(|| "pending".to_string());
    if !TASK_STATUSES.contains(&status.as_str()) {
        return Err(ProjectsError::Validation(format!("Unknown status: {status}")));
    }

    let mut conn = state.conn.get()?;
    ensure_project_exists(&mut conn, id)?;

    let now = Utc::now();
    let task = ProjectTask {
        id: Uuid::new_v4(),
        project_id: id,
        title: req.title,
        status,
        due_date: req.due_date,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(project_tasks::table)
        .values(&task)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<ProjectTask>, ProjectsError> {
    if let Some(status) = &req.status {
        if !TASK_STATUSES.contains(&status.as_str()) {
            return Err(ProjectsError::Validation(format!("Unknown status: {status}")));
        }
    }

    let mut conn = state.conn.get()?;

    let updated: ProjectTask = diesel::update(project_tasks::table.filter(project_tasks::id.eq(id)))
        .set((&req, project_tasks::updated_at.eq(Utc::now())))
        .get_result(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => {
                ProjectsError::NotFound("Task not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(updated))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ProjectsError> {
    let mut conn = state.conn.get()?;

    let deleted = diesel::delete(project_tasks::table.filter(project_tasks::id.eq(id)))
        .execute(&mut conn)?;
    if deleted == 0 {
        return Err(ProjectsError::NotFound("Task not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Task deleted" })))
}

pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProjectNote>>, ProjectsError> {
    let mut conn = state.conn.get()?;
    ensure_project_exists(&mut conn, id)?;

    let records: Vec<ProjectNote> = project_notes::table
        .filter(project_notes::project_id.eq(id))
        .order(project_notes::created_at.desc())
        .load(&mut conn)?;

    Ok(Json(records))
}

pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<ProjectNote>), ProjectsError> {
    if req.content.trim().is_empty() {
        return Err(ProjectsError::Validation("Note content is required".to_string()));
    }

    let mut conn = state.conn.get()?;
    ensure_project_exists(&mut conn, id)?;

    let note = ProjectNote {
        id: Uuid::new_v4(),
        project_id: id,
        content: req.content,
        created_at: Utc::now(),
    };

    diesel::insert_into(project_notes::table)
        .values(&note)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ProjectsError> {
    let mut conn = state.conn.get()?;

    let deleted = diesel::delete(project_notes::table.filter(project_notes::id.eq(id)))
        .execute(&mut conn)?;
    if deleted == 0 {
        return Err(ProjectsError::NotFound("Note not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Note deleted" })))
}

pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Expense>>, ProjectsError> {
    let mut conn = state.conn.get()?;
    ensure_project_exists(&mut conn, id)?;

    let records: Vec<Expense> = expenses::table
        .filter(expenses::project_id.eq(id))
        .order(expenses::expense_date.desc())
        .load(&mut conn)?;

    Ok(Json(records))
}

pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ProjectsError> {
    if req.description.trim().is_empty() {
        return Err(ProjectsError::Validation(
            "Expense description is required".to_string(),
        ));
    }
    if req.amount <= BigDecimal::from(0) {
        return Err(ProjectsError::Validation(
            "Expense amount must be greater than zero".to_string(),
        ));
    }

    let mut conn = state.conn.get()?;
    ensure_project_exists(&mut conn, id)?;

    let expense = Expense {
        id: Uuid::new_v4(),
        project_id: id,
        description: req.description,
        amount: req.amount,
        category: req.category.unwrap_or_else(|| "general".to_string()),
        expense_date: req.expense_date,
        created_at: Utc::now(),
    };

    diesel::insert_into(expenses::table)
        .values(&expense)
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, ProjectsError> {
    if let Some(amount) = &req.amount {
        if *amount <= BigDecimal::from(0) {
            return Err(ProjectsError::Validation(
                "Expense amount must be greater than zero".to_string(),
            ));
        }
    }

    let mut conn = state.conn.get()?;

    if req.description.is_none()
        && req.amount.is_none()
        && req.category.is_none()
        && req.expense_date.is_none()
    {
        let current: Expense = expenses::table
            .filter(expenses::id.eq(id))
            .first(&mut conn)
            .map_err(|_| ProjectsError::NotFound("Expense not found".to_string()))?;
        return Ok(Json(current));
    }

    let updated: Expense = diesel::update(expenses::table.filter(expenses::id.eq(id)))
        .set(&req)
        .get_result(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => {
                ProjectsError::NotFound("Expense not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(updated))
}

pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ProjectsError> {
    let mut conn = state.conn.get()?;

    let deleted = diesel::delete(expenses::table.filter(expenses::id.eq(id)))
        .execute(&mut conn)?;
    if deleted == 0 {
        return Err(ProjectsError::NotFound("Expense not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Expense deleted" })))
}

pub fn configure_projects_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/projects/:id/financials", get(project_financials))
        .route("/api/projects/:id/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/project-tasks/:id",
            axum::routing::put(update_task).delete(delete_task),
        )
        .route("/api/projects/:id/notes", get(list_notes).post(create_note))
        .route("/api/project-notes/:id", delete(delete_note))
        .route(
            "/api/projects/:id/expenses",
            get(list_expenses).post(create_expense),
        )
        .route(
            "/api/expenses/:id",
            axum::routing::put(update_expense).delete(delete_expense),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_thresholds() {
        assert_eq!(classify_health(0.0, 10000.0), "On-Track");
        assert_eq!(classify_health(8000.0, 10000.0), "On-Track");
        assert_eq!(classify_health(8000.01, 10000.0), "At-Risk");
        assert_eq!(classify_health(10000.0, 10000.0), "At-Risk");
        assert_eq!(classify_health(10000.01, 10000.0), "Critical");
    }

    #[test]
    fn zero_budget_projects() {
        assert_eq!(classify_health(0.0, 0.0), "On-Track");
        assert_eq!(classify_health(1.0, 0.0), "Critical");
    }

    #[test]
    fn spent_percentage_guards_zero_budget() {
        assert_eq!(spent_percentage(500.0, 0.0), 0.0);
        assert_eq!(spent_percentage(2500.0, 10000.0), 25.0);
    }
}
