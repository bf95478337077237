//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Storage model
//!
//! The in-memory stores are authoritative. Each [`Store`] serializes
//! writers behind a single `parking_lot::RwLock` that is never held
//! across an `.await` point, and [`Store::try_update`] runs
//! read-validate-mutate as one critical section — the in-memory
//! equivalent of `SELECT … FOR UPDATE`. A shipment record owns its
//! offers, so an offer transition, its cascade, and the shipment status
//! write are one atomic update on one record.
//!
//! When a `PgPool` is configured, committed state is mirrored to
//! Postgres for durability and reloaded on startup via
//! [`AppState::hydrate_from_db`]. Mirror failures never un-commit
//! in-memory state; they are logged and surfaced as response warnings.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use tms_core::{CarrierId, DriverId, ShipmentId, TenantId};
use tms_workflow::{Carrier, Driver, Offer, ShipmentStatus};

use crate::auth::SecretToken;
use crate::notify::{LogNotifier, Notifier};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// Operations are synchronous (`parking_lot`, not `tokio::sync`) because
/// the lock is never held across `.await` points, and `parking_lot`
/// locks do not poison — a panicking writer cannot wedge the store.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by id.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// Snapshot all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Update a record in place. Returns the updated record, or `None`
    /// if the key is absent.
    pub fn update(&self, id: &Uuid, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(id) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Atomically read-validate-mutate a record.
    ///
    /// The closure may inspect current state, validate preconditions,
    /// mutate the record, and return `Ok(R)` or `Err(E)`. The whole
    /// operation runs under one write lock, so no concurrent writer can
    /// interleave between the validation and the mutation.
    ///
    /// Mutations made before an `Err` return are kept — lazy expiry
    /// relies on this: a failed acceptance that observed an elapsed
    /// window leaves the offer EXPIRED.
    ///
    /// Returns `None` if the record does not exist.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Records ------------------------------------------------------------------

/// A shipment aggregate: brokerage metadata, workflow status, actor
/// assignments, and every offer ever extended for it.
///
/// Offers live inside the shipment record so that a response, its
/// cascade, and the coupled status write commit as one `try_update`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShipmentRecord {
    /// Unique shipment identifier.
    #[schema(value_type = Uuid)]
    pub id: ShipmentId,
    /// Owning tenant.
    #[schema(value_type = Uuid)]
    pub tenant_id: TenantId,
    /// Customer-facing reference (e.g., "S-100234").
    pub reference: String,
    /// Origin location label.
    pub origin: String,
    /// Destination location label.
    pub destination: String,
    /// Current status on the fixed progression.
    #[schema(value_type = String)]
    pub status: ShipmentStatus,
    /// Carrier booked via an accepted tender, if any.
    #[schema(value_type = Option<Uuid>)]
    pub assigned_carrier: Option<CarrierId>,
    /// Driver currently assigned via dispatch, if any.
    #[schema(value_type = Option<Uuid>)]
    pub assigned_driver: Option<DriverId>,
    /// Every offer extended for this shipment, oldest first. Never
    /// pruned — resolved offers stay for audit and analytics.
    #[schema(value_type = Vec<Object>)]
    pub offers: Vec<Offer>,
    /// When the shipment was created.
    pub created_at: DateTime<Utc>,
    /// When the shipment was last mutated by the workflow.
    pub updated_at: DateTime<Utc>,
}

impl ShipmentRecord {
    /// Find an offer on this shipment by id.
    pub fn offer(&self, id: &tms_core::OfferId) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id == *id)
    }
}

/// An inbound message that could not be applied automatically, parked
/// for an operator to resolve by hand. Never silently discarded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewItem {
    /// Unique review item id.
    pub id: Uuid,
    /// When the message was received.
    pub received_at: DateTime<Utc>,
    /// Inbound source address, as delivered by the provider.
    pub from: String,
    /// Raw message body.
    pub body: String,
    /// Provider-assigned message id, if any.
    pub provider_message_id: Option<String>,
    /// Why automatic resolution failed.
    pub reason: String,
}

// -- Application State --------------------------------------------------------

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token. If `None`, authentication is disabled.
    pub auth_token: Option<SecretToken>,
    /// Interval for the optional expiry sweeper. `None` disables it and
    /// leaves expiry fully lazy.
    pub sweep_interval_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            sweep_interval_secs: None,
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly via `Arc` internals in each store.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Shipments, each owning its offers.
    pub shipments: Store<ShipmentRecord>,
    /// Registered carriers.
    pub carriers: Store<Carrier>,
    /// Registered drivers.
    pub drivers: Store<Driver>,
    /// Inbound messages awaiting manual review.
    pub review_queue: Store<ReviewItem>,
    /// Offer id → owning shipment id. Maintained on offer creation so
    /// direct responses resolve without scanning every shipment.
    pub offer_index: Store<Uuid>,
    /// Postgres pool for the durability mirror. `None` means in-memory
    /// only.
    pub db_pool: Option<PgPool>,
    /// Post-commit notification seam.
    pub notifier: Arc<dyn Notifier>,
    /// Configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Create application state with default configuration, a logging
    /// notifier, and no database mirror.
    pub fn new() -> Self {
        Self::with_parts(AppConfig::default(), Arc::new(LogNotifier), None)
    }

    /// Create application state with the given configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self::with_parts(config, Arc::new(LogNotifier), None)
    }

    /// Create application state from explicit parts.
    pub fn with_parts(
        config: AppConfig,
        notifier: Arc<dyn Notifier>,
        db_pool: Option<PgPool>,
    ) -> Self {
        Self {
            shipments: Store::new(),
            carriers: Store::new(),
            drivers: Store::new(),
            review_queue: Store::new(),
            offer_index: Store::new(),
            db_pool,
            notifier,
            config,
        }
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a pool is configured. Loads
    /// shipments (with their offers), carriers, and drivers so reads
    /// stay fast and synchronous afterwards.
    pub async fn hydrate_from_db(&self) -> Result<(), sqlx::Error> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let shipments = crate::db::shipments::load_all(pool).await?;
        let shipment_count = shipments.len();
        for record in shipments {
            for offer in &record.offers {
                self.offer_index
                    .insert(*offer.id.as_uuid(), *record.id.as_uuid());
            }
            self.shipments.insert(*record.id.as_uuid(), record);
        }

        let carriers = crate::db::actors::load_carriers(pool).await?;
        let carrier_count = carriers.len();
        for carrier in carriers {
            self.carriers.insert(*carrier.id.as_uuid(), carrier);
        }

        let drivers = crate::db::actors::load_drivers(pool).await?;
        let driver_count = drivers.len();
        for driver in drivers {
            self.drivers.insert(*driver.id.as_uuid(), driver);
        }

        tracing::info!(
            shipments = shipment_count,
            carriers = carrier_count,
            drivers = driver_count,
            "hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
