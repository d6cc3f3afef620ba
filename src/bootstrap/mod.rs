//! Startup tasks: schema creation and first-run seeding.

use anyhow::Context;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use tracing::info;

use crate::shared::utils::DbPool;

const SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE TABLE IF NOT EXISTS clients (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        address TEXT,
        city TEXT,
        notes TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE TABLE IF NOT EXISTS catalog_items (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT 'material',
        unit TEXT NOT NULL,
        default_rate NUMERIC(12,2) NOT NULL DEFAULT 0,
        default_description TEXT,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE TABLE IF NOT EXISTS quotations (
        id UUID PRIMARY KEY,
        client_id UUID REFERENCES clients(id) ON DELETE SET NULL,
        client_name TEXT,
        title TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'draft',
        total_amount NUMERIC(14,2) NOT NULL DEFAULT 0,
        labor_cost NUMERIC(14,2) NOT NULL DEFAULT 0,
        design_fee_type TEXT NOT NULL DEFAULT 'percentage',
        design_fee_value NUMERIC(12,2) NOT NULL DEFAULT 0,
        tax_percentage NUMERIC(5,2) NOT NULL DEFAULT 18,
        notes TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE TABLE IF NOT EXISTS rooms (
        id UUID PRIMARY KEY,
        quotation_id UUID NOT NULL REFERENCES quotations(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        length NUMERIC(8,2),
        width NUMERIC(8,2),
        height NUMERIC(8,2),
        notes TEXT,
        room_total NUMERIC(14,2) NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE TABLE IF NOT EXISTS room_line_items (
        id UUID PRIMARY KEY,
        room_id UUID NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
        catalog_item_id UUID REFERENCES catalog_items(id) ON DELETE SET NULL,
        description TEXT NOT NULL,
        specification TEXT,
        unit TEXT NOT NULL,
        rate NUMERIC(12,2) NOT NULL,
        quantity NUMERIC(10,2) NOT NULL,
        total NUMERIC(14,2) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE TABLE IF NOT EXISTS projects (
        id UUID PRIMARY KEY,
        quotation_id UUID NOT NULL UNIQUE REFERENCES quotations(id),
        name TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'planning',
        budget NUMERIC(14,2) NOT NULL DEFAULT 0,
        start_date DATE,
        end_date DATE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE TABLE IF NOT EXISTS project_tasks (
        id UUID PRIMARY KEY,
        project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        due_date DATE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE TABLE IF NOT EXISTS project_notes (
        id UUID PRIMARY KEY,
        project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE TABLE IF NOT EXISTS expenses (
        id UUID PRIMARY KEY,
        project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        description TEXT NOT NULL,
        amount NUMERIC(14,2) NOT NULL,
        category TEXT NOT NULL DEFAULT 'general',
        expense_date DATE NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE INDEX IF NOT EXISTS idx_rooms_quotation ON rooms(quotation_id);
    CREATE INDEX IF NOT EXISTS idx_line_items_room ON room_line_items(room_id);
    CREATE INDEX IF NOT EXISTS idx_expenses_project ON expenses(project_id);
    CREATE INDEX IF NOT EXISTS idx_quotations_status ON quotations(status);
"#;

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let mut conn = pool.get().context("failed to get connection for migrations")?;
    conn.batch_execute(SCHEMA_SQL)
        .context("failed to apply schema")?;
    info!("database schema up to date");
    Ok(())
}

/// Seed an admin account on a fresh install so the API is reachable at all.
/// Controlled by ADMIN_EMAIL / ADMIN_PASSWORD; skipped when users exist.
pub fn seed_admin_user(pool: &DbPool) -> anyhow::Result<()> {
    use crate::shared::schema::users;

    let (email, password) = match (
        std::env::var("ADMIN_EMAIL"),
        std::env::var("ADMIN_PASSWORD"),
    ) {
        (Ok(e), Ok(p)) => (e, p),
        _ => return Ok(()),
    };

    let mut conn = pool.get().context("failed to get connection for seeding")?;

    let existing: i64 = users::table.count().get_result(&mut conn)?;
    if existing > 0 {
        return Ok(());
    }

    let hash = crate::auth::hash_password(&password)?;
    let now = chrono::Utc::now();

    diesel::insert_into(users::table)
        .values((
            users::id.eq(uuid::Uuid::new_v4()),
            users::email.eq(&email),
            users::display_name.eq("Administrator"),
            users::password_hash.eq(hash),
            users::is_active.eq(true),
            users::created_at.eq(now),
            users::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    info!(email = %email, "seeded admin user");
    Ok(())
}
