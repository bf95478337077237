//! Carrier and driver persistence.
//!
//! Actor registries back the eligibility gate and inbound correlation,
//! so they hydrate on startup alongside shipments. Contact numbers are
//! re-validated on load; a row that fails validation is logged and
//! skipped rather than admitted with an unmatchable number.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tms_core::{CarrierId, ContactNumber, DriverId, TenantId};
use tms_workflow::{Carrier, CarrierStatus, Driver, DriverStatus};

/// Upsert a carrier.
pub async fn upsert_carrier(pool: &PgPool, carrier: &Carrier) -> Result<(), sqlx::Error> {
    let status = status_name(serde_json::to_value(carrier.status))?;
    sqlx::query(
        "INSERT INTO carriers (id, tenant_id, name, status, contact, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            status = EXCLUDED.status,
            contact = EXCLUDED.contact",
    )
    .bind(carrier.id.as_uuid())
    .bind(carrier.tenant_id.as_uuid())
    .bind(&carrier.name)
    .bind(&status)
    .bind(carrier.contact.as_str())
    .bind(carrier.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Upsert a driver.
pub async fn upsert_driver(pool: &PgPool, driver: &Driver) -> Result<(), sqlx::Error> {
    let status = status_name(serde_json::to_value(driver.status))?;
    sqlx::query(
        "INSERT INTO drivers
            (id, tenant_id, name, active, status, contact,
             license_expires_at, medical_cert_expires_at, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            active = EXCLUDED.active,
            status = EXCLUDED.status,
            contact = EXCLUDED.contact,
            license_expires_at = EXCLUDED.license_expires_at,
            medical_cert_expires_at = EXCLUDED.medical_cert_expires_at",
    )
    .bind(driver.id.as_uuid())
    .bind(driver.tenant_id.as_uuid())
    .bind(&driver.name)
    .bind(driver.active)
    .bind(&status)
    .bind(driver.contact.as_str())
    .bind(driver.license_expires_at)
    .bind(driver.medical_cert_expires_at)
    .bind(driver.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Load all carriers for startup hydration.
pub async fn load_carriers(pool: &PgPool) -> Result<Vec<Carrier>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CarrierRow>(
        "SELECT id, tenant_id, name, status, contact, created_at
         FROM carriers ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().filter_map(CarrierRow::into_carrier).collect())
}

/// Load all drivers for startup hydration.
pub async fn load_drivers(pool: &PgPool) -> Result<Vec<Driver>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DriverRow>(
        "SELECT id, tenant_id, name, active, status, contact,
                license_expires_at, medical_cert_expires_at, created_at
         FROM drivers ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().filter_map(DriverRow::into_driver).collect())
}

/// Extract the canonical string from a serde-serialized status enum.
fn status_name(
    value: Result<serde_json::Value, serde_json::Error>,
) -> Result<String, sqlx::Error> {
    match value {
        Ok(serde_json::Value::String(s)) => Ok(s),
        Ok(other) => Err(sqlx::Error::Encode(
            format!("status did not serialize to a string: {other}").into(),
        )),
        Err(e) => Err(sqlx::Error::Encode(e.to_string().into())),
    }
}

#[derive(sqlx::FromRow)]
struct CarrierRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    status: String,
    contact: String,
    created_at: DateTime<Utc>,
}

impl CarrierRow {
    fn into_carrier(self) -> Option<Carrier> {
        let status: CarrierStatus =
            match serde_json::from_value(serde_json::Value::String(self.status.clone())) {
                Ok(status) => status,
                Err(e) => {
                    tracing::error!(id = %self.id, status = %self.status, error = %e,
                        "unknown carrier status — skipping row");
                    return None;
                }
            };
        let contact = match ContactNumber::new(&self.contact) {
            Ok(contact) => contact,
            Err(e) => {
                tracing::error!(id = %self.id, error = %e, "invalid carrier contact — skipping row");
                return None;
            }
        };
        Some(Carrier {
            id: CarrierId::from_uuid(self.id),
            tenant_id: TenantId::from_uuid(self.tenant_id),
            name: self.name,
            status,
            contact,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DriverRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    active: bool,
    status: String,
    contact: String,
    license_expires_at: DateTime<Utc>,
    medical_cert_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl DriverRow {
    fn into_driver(self) -> Option<Driver> {
        let status: DriverStatus =
            match serde_json::from_value(serde_json::Value::String(self.status.clone())) {
                Ok(status) => status,
                Err(e) => {
                    tracing::error!(id = %self.id, status = %self.status, error = %e,
                        "unknown driver status — skipping row");
                    return None;
                }
            };
        let contact = match ContactNumber::new(&self.contact) {
            Ok(contact) => contact,
            Err(e) => {
                tracing::error!(id = %self.id, error = %e, "invalid driver contact — skipping row");
                return None;
            }
        };
        Some(Driver {
            id: DriverId::from_uuid(self.id),
            tenant_id: TenantId::from_uuid(self.tenant_id),
            name: self.name,
            active: self.active,
            status,
            contact,
            license_expires_at: self.license_expires_at,
            medical_cert_expires_at: self.medical_cert_expires_at,
            created_at: self.created_at,
        })
    }
}
