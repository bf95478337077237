//! Audit event persistence — immutable hash chain.
//!
//! Every offer transition (including automatic expiry and cascade
//! cancellation) appends an audit event whose SHA-256 hash chains to
//! the previous event, forming a tamper-evident log suitable for
//! compliance export. Events are only ever appended; nothing edits or
//! removes them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tms_workflow::Offer;

/// An audit event to be persisted.
pub struct AuditEvent {
    /// Event classification (e.g., "OFFER_TRANSITION").
    pub event_type: String,
    /// Who caused it — actor id, operator, or "system".
    pub actor: Option<String>,
    /// The resource type ("offer", "shipment").
    pub resource_type: String,
    /// The resource id.
    pub resource_id: Uuid,
    /// The action recorded ("CREATED", "ACCEPTED", …).
    pub action: String,
    /// Structured context for the event.
    pub metadata: serde_json::Value,
}

/// Append an audit event to the immutable log.
///
/// The event hash chains to the most recent event's hash; the chain
/// starts from a zero hash.
pub async fn append(pool: &PgPool, event: AuditEvent) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();

    let previous_hash: Option<String> =
        sqlx::query_scalar("SELECT event_hash FROM audit_events ORDER BY created_at DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    let prev = previous_hash
        .as_deref()
        .unwrap_or("0000000000000000000000000000000000000000000000000000000000000000");

    let hash_input = format!(
        "{}{}{}{}{}",
        prev, event.event_type, event.resource_type, event.resource_id, event.action,
    );
    let event_hash = sha256_hex(&hash_input);

    sqlx::query(
        "INSERT INTO audit_events (id, event_type, actor, resource_type, resource_id,
         action, metadata, previous_hash, event_hash, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())",
    )
    .bind(id)
    .bind(&event.event_type)
    .bind(&event.actor)
    .bind(&event.resource_type)
    .bind(event.resource_id)
    .bind(&event.action)
    .bind(&event.metadata)
    .bind(prev)
    .bind(&event_hash)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Append the audit event for an offer's most recent transition.
pub async fn append_offer_transition(pool: &PgPool, offer: &Offer) -> Result<Uuid, sqlx::Error> {
    let Some(entry) = offer.audit_trail.last() else {
        // An offer without audit entries cannot exist through the state
        // machine; nothing to record.
        return Ok(Uuid::nil());
    };

    append(
        pool,
        AuditEvent {
            event_type: "OFFER_TRANSITION".to_string(),
            actor: Some(entry.actor.clone()),
            resource_type: "offer".to_string(),
            resource_id: *offer.id.as_uuid(),
            action: entry.action.name().to_string(),
            metadata: serde_json::json!({
                "shipment_id": offer.shipment_id,
                "tenant_id": offer.tenant_id,
                "kind": offer.kind().name(),
                "state": offer.state.name(),
                "note": entry.note,
                "at": entry.timestamp,
            }),
        },
    )
    .await
}

/// Query audit events for a specific resource, oldest first.
pub async fn events_for_resource(
    pool: &PgPool,
    resource_type: &str,
    resource_id: Uuid,
) -> Result<Vec<AuditEventRow>, sqlx::Error> {
    sqlx::query_as::<_, AuditEventRow>(
        "SELECT id, event_type, actor, resource_type, resource_id,
         action, metadata, previous_hash, event_hash, created_at
         FROM audit_events
         WHERE resource_type = $1 AND resource_id = $2
         ORDER BY created_at ASC",
    )
    .bind(resource_type)
    .bind(resource_id)
    .fetch_all(pool)
    .await
}

/// Verify audit chain integrity by checking hash continuity.
pub async fn verify_chain_integrity(
    pool: &PgPool,
    limit: i64,
) -> Result<ChainIntegrityResult, sqlx::Error> {
    let events = sqlx::query_as::<_, AuditEventRow>(
        "SELECT id, event_type, actor, resource_type, resource_id,
         action, metadata, previous_hash, event_hash, created_at
         FROM audit_events ORDER BY created_at ASC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let total = events.len();
    let mut broken_links = 0;
    let mut last_hash: Option<&str> = None;

    for event in &events {
        if let Some(expected_prev) = last_hash {
            if event.previous_hash.as_deref() != Some(expected_prev) {
                broken_links += 1;
            }
        }
        last_hash = Some(&event.event_hash);
    }

    Ok(ChainIntegrityResult {
        total_events: total,
        broken_links,
        chain_valid: broken_links == 0,
    })
}

/// Result of chain integrity verification.
pub struct ChainIntegrityResult {
    /// Events inspected.
    pub total_events: usize,
    /// Hash-chain discontinuities found.
    pub broken_links: usize,
    /// Whether the inspected chain is unbroken.
    pub chain_valid: bool,
}

/// Database row for audit events.
#[derive(sqlx::FromRow)]
pub struct AuditEventRow {
    pub id: Uuid,
    pub event_type: String,
    pub actor: Option<String>,
    pub resource_type: String,
    pub resource_id: Uuid,
    pub action: String,
    pub metadata: serde_json::Value,
    pub previous_hash: Option<String>,
    pub event_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Compute the SHA-256 hex digest of an input string.
fn sha256_hex(input: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    result.iter().map(|b| format!("{b:02x}")).collect()
}
