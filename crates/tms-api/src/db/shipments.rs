//! Shipment and offer persistence.
//!
//! One shipment aggregate persists as a `shipments` row plus one
//! `offers` row per offer. Writes happen in a single transaction so the
//! mirror never holds a shipment whose cascade landed but whose winning
//! offer did not. State names are serialized through their canonical
//! string form; a row that fails to deserialize on load is logged and
//! skipped rather than silently defaulted, since a defaulted offer
//! state would corrupt the workflow on restart.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tms_core::{CarrierId, DriverId, Money, OfferId, ShipmentId, TenantId};
use tms_workflow::{AuditEntry, Offer, OfferDetails, OfferState, ShipmentStatus};

use crate::state::ShipmentRecord;

/// Upsert a shipment aggregate: the shipment row and all of its offers,
/// in one transaction.
pub async fn persist(pool: &PgPool, record: &ShipmentRecord) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO shipments
            (id, tenant_id, reference, origin, destination, status,
             assigned_carrier, assigned_driver, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         ON CONFLICT (id) DO UPDATE SET
            status = EXCLUDED.status,
            assigned_carrier = EXCLUDED.assigned_carrier,
            assigned_driver = EXCLUDED.assigned_driver,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id.as_uuid())
    .bind(record.tenant_id.as_uuid())
    .bind(&record.reference)
    .bind(&record.origin)
    .bind(&record.destination)
    .bind(record.status.name())
    .bind(record.assigned_carrier.as_ref().map(CarrierId::as_uuid))
    .bind(record.assigned_driver.as_ref().map(DriverId::as_uuid))
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(&mut *tx)
    .await?;

    for offer in &record.offers {
        let audit_trail = serde_json::to_value(&offer.audit_trail).map_err(|e| {
            tracing::error!(offer = %offer.id, error = %e, "failed to serialize audit trail");
            sqlx::Error::Encode(Box::new(e))
        })?;

        let (amount_cents, message, expires_at) = match &offer.details {
            OfferDetails::Tender {
                amount, expires_at, ..
            } => (Some(amount.cents()), None, Some(*expires_at)),
            OfferDetails::Dispatch { message, .. } => (None, Some(message.clone()), None),
        };

        sqlx::query(
            "INSERT INTO offers
                (id, shipment_id, tenant_id, kind, actor_id, state, amount_cents,
                 message, expires_at, responded_at, responded_by, response_note,
                 audit_trail, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             ON CONFLICT (id) DO UPDATE SET
                state = EXCLUDED.state,
                responded_at = EXCLUDED.responded_at,
                responded_by = EXCLUDED.responded_by,
                response_note = EXCLUDED.response_note,
                audit_trail = EXCLUDED.audit_trail",
        )
        .bind(offer.id.as_uuid())
        .bind(offer.shipment_id.as_uuid())
        .bind(offer.tenant_id.as_uuid())
        .bind(offer.kind().name())
        .bind(offer.details.actor_uuid())
        .bind(offer.state.name())
        .bind(amount_cents)
        .bind(message)
        .bind(expires_at)
        .bind(offer.responded_at)
        .bind(&offer.responded_by)
        .bind(&offer.response_note)
        .bind(&audit_trail)
        .bind(offer.created_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

/// Load every shipment aggregate for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<ShipmentRecord>, sqlx::Error> {
    let shipment_rows = sqlx::query_as::<_, ShipmentRow>(
        "SELECT id, tenant_id, reference, origin, destination, status,
                assigned_carrier, assigned_driver, created_at, updated_at
         FROM shipments ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let offer_rows = sqlx::query_as::<_, OfferRow>(
        "SELECT id, shipment_id, tenant_id, kind, actor_id, state, amount_cents,
                message, expires_at, responded_at, responded_by, response_note,
                audit_trail, created_at
         FROM offers ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records: Vec<ShipmentRecord> = shipment_rows
        .into_iter()
        .filter_map(ShipmentRow::into_record)
        .collect();

    for offer_row in offer_rows {
        let shipment_id = offer_row.shipment_id;
        let Some(offer) = offer_row.into_offer() else {
            continue;
        };
        if let Some(record) = records
            .iter_mut()
            .find(|r| *r.id.as_uuid() == shipment_id)
        {
            record.offers.push(offer);
        }
    }

    Ok(records)
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ShipmentRow {
    id: Uuid,
    tenant_id: Uuid,
    reference: String,
    origin: String,
    destination: String,
    status: String,
    assigned_carrier: Option<Uuid>,
    assigned_driver: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ShipmentRow {
    fn into_record(self) -> Option<ShipmentRecord> {
        let status: ShipmentStatus =
            match serde_json::from_value(serde_json::Value::String(self.status.clone())) {
                Ok(status) => status,
                Err(e) => {
                    tracing::error!(
                        id = %self.id,
                        status = %self.status,
                        error = %e,
                        "unknown shipment status in database — skipping row; investigate"
                    );
                    return None;
                }
            };

        Some(ShipmentRecord {
            id: ShipmentId::from_uuid(self.id),
            tenant_id: TenantId::from_uuid(self.tenant_id),
            reference: self.reference,
            origin: self.origin,
            destination: self.destination,
            status,
            assigned_carrier: self.assigned_carrier.map(CarrierId::from_uuid),
            assigned_driver: self.assigned_driver.map(DriverId::from_uuid),
            offers: Vec::new(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct OfferRow {
    id: Uuid,
    shipment_id: Uuid,
    tenant_id: Uuid,
    kind: String,
    actor_id: Uuid,
    state: String,
    amount_cents: Option<i64>,
    message: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    responded_at: Option<DateTime<Utc>>,
    responded_by: Option<String>,
    response_note: Option<String>,
    audit_trail: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl OfferRow {
    fn into_offer(self) -> Option<Offer> {
        let details = match self.kind.as_str() {
            "TENDER" => {
                let amount = self
                    .amount_cents
                    .and_then(|cents| Money::from_cents(cents).ok());
                match (amount, self.expires_at) {
                    (Some(amount), Some(expires_at)) => OfferDetails::Tender {
                        carrier_id: CarrierId::from_uuid(self.actor_id),
                        amount,
                        expires_at,
                    },
                    _ => {
                        tracing::error!(
                            id = %self.id,
                            "tender row missing amount or expiry — skipping; investigate"
                        );
                        return None;
                    }
                }
            }
            "DISPATCH" => OfferDetails::Dispatch {
                driver_id: DriverId::from_uuid(self.actor_id),
                message: self.message.unwrap_or_default(),
            },
            other => {
                tracing::error!(id = %self.id, kind = other, "unknown offer kind — skipping");
                return None;
            }
        };

        let state: OfferState =
            match serde_json::from_value(serde_json::Value::String(self.state.clone())) {
                Ok(state) => state,
                Err(e) => {
                    tracing::error!(
                        id = %self.id,
                        state = %self.state,
                        error = %e,
                        "unknown offer state in database — skipping row; investigate"
                    );
                    return None;
                }
            };

        let audit_trail: Vec<AuditEntry> = serde_json::from_value(self.audit_trail)
            .unwrap_or_else(|e| {
                tracing::error!(
                    id = %self.id,
                    error = %e,
                    "failed to deserialize offer audit trail — defaulting to empty; investigate"
                );
                Vec::new()
            });

        Some(Offer {
            id: OfferId::from_uuid(self.id),
            shipment_id: ShipmentId::from_uuid(self.shipment_id),
            tenant_id: TenantId::from_uuid(self.tenant_id),
            details,
            state,
            responded_at: self.responded_at,
            responded_by: self.responded_by,
            response_note: self.response_note,
            audit_trail,
            created_at: self.created_at,
        })
    }
}
