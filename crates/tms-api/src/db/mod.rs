//! # Durability Mirror
//!
//! Postgres persistence for committed workflow state. The in-memory
//! stores stay authoritative for reads; this layer exists so offers,
//! shipments, actors, and the audit chain survive restarts.
//!
//! The pool is optional: without `DATABASE_URL` the API runs in
//! in-memory-only mode, which is also how the integration tests run.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub mod actors;
pub mod audit;
pub mod shipments;

/// Create the connection pool from `DATABASE_URL`, if set, and ensure
/// the schema exists. Returns `Ok(None)` when no database is configured.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            tracing::warn!("DATABASE_URL not set — running without a durability mirror");
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await?;
    ensure_schema(&pool).await?;
    tracing::info!("durability mirror connected");
    Ok(Some(pool))
}

/// Idempotently create the mirror tables.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS shipments (
            id UUID PRIMARY KEY,
            tenant_id UUID NOT NULL,
            reference TEXT NOT NULL,
            origin TEXT NOT NULL,
            destination TEXT NOT NULL,
            status TEXT NOT NULL,
            assigned_carrier UUID,
            assigned_driver UUID,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS offers (
            id UUID PRIMARY KEY,
            shipment_id UUID NOT NULL REFERENCES shipments(id),
            tenant_id UUID NOT NULL,
            kind TEXT NOT NULL,
            actor_id UUID NOT NULL,
            state TEXT NOT NULL,
            amount_cents BIGINT,
            message TEXT,
            expires_at TIMESTAMPTZ,
            responded_at TIMESTAMPTZ,
            responded_by TEXT,
            response_note TEXT,
            audit_trail JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS carriers (
            id UUID PRIMARY KEY,
            tenant_id UUID NOT NULL,
            name TEXT NOT NULL,
            status TEXT NOT NULL,
            contact TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS drivers (
            id UUID PRIMARY KEY,
            tenant_id UUID NOT NULL,
            name TEXT NOT NULL,
            active BOOLEAN NOT NULL,
            status TEXT NOT NULL,
            contact TEXT NOT NULL,
            license_expires_at TIMESTAMPTZ NOT NULL,
            medical_cert_expires_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS audit_events (
            id UUID PRIMARY KEY,
            event_type TEXT NOT NULL,
            actor TEXT,
            resource_type TEXT NOT NULL,
            resource_id UUID NOT NULL,
            action TEXT NOT NULL,
            metadata JSONB NOT NULL,
            previous_hash TEXT,
            event_hash TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}
