//! # Actor Eligibility Gate
//!
//! Pre-creation checks that the target actor currently qualifies to
//! receive an offer. Eligibility is a pure function of actor attributes,
//! evaluated synchronously at offer-creation time and never cached: an
//! offer created for an eligible actor stays valid even if the actor
//! later becomes ineligible, and response-time validation is the state
//! machine's job, not this gate's.
//!
//! Rules are checked in order and the first failure is reported, so the
//! caller always gets a single concrete reason ("license expired
//! 2026-01-04"), not a boolean.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tms_core::{CarrierId, ContactNumber, DriverId, TenantId};

// ─── Carrier ─────────────────────────────────────────────────────────

/// The operating status of a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarrierStatus {
    /// Approved and operating — the only tender-eligible status.
    Active,
    /// Onboarding paperwork incomplete.
    Pending,
    /// Suspended for compliance or safety reasons.
    Suspended,
    /// No longer doing business with this brokerage.
    Inactive,
}

/// A carrier registered with the brokerage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    /// Unique carrier identifier.
    pub id: CarrierId,
    /// The tenant this carrier belongs to.
    pub tenant_id: TenantId,
    /// Legal name.
    pub name: String,
    /// Operating status.
    pub status: CarrierStatus,
    /// Dispatch-desk contact number.
    pub contact: ContactNumber,
    /// When the carrier was registered.
    pub created_at: DateTime<Utc>,
}

// ─── Driver ──────────────────────────────────────────────────────────

/// The duty status of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    /// On duty and available.
    Active,
    /// Off duty but reachable — still dispatch-eligible.
    OffDuty,
    /// Currently driving another load.
    Driving,
    /// Suspended from dispatch.
    Suspended,
}

/// A driver registered with the brokerage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    /// Unique driver identifier.
    pub id: DriverId,
    /// The tenant this driver belongs to.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Whether the driver record is active at all.
    pub active: bool,
    /// Duty status.
    pub status: DriverStatus,
    /// Registered mobile number — the correlation key for inbound SMS
    /// responses.
    pub contact: ContactNumber,
    /// CDL expiration date.
    pub license_expires_at: DateTime<Utc>,
    /// DOT medical certificate expiration, if one is on file.
    pub medical_cert_expires_at: Option<DateTime<Utc>>,
    /// When the driver was registered.
    pub created_at: DateTime<Utc>,
}

// ─── Eligibility ─────────────────────────────────────────────────────

/// The outcome of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    /// Whether the actor may receive an offer right now.
    pub eligible: bool,
    /// The first failing rule, when ineligible.
    pub reason: Option<String>,
}

impl Eligibility {
    fn ok() -> Self {
        Self {
            eligible: true,
            reason: None,
        }
    }

    fn blocked(reason: String) -> Self {
        Self {
            eligible: false,
            reason: Some(reason),
        }
    }
}

/// Check whether a carrier may receive a tender.
pub fn check_carrier(carrier: &Carrier) -> Eligibility {
    match carrier.status {
        CarrierStatus::Active => Eligibility::ok(),
        other => Eligibility::blocked(format!(
            "carrier status is {other:?}, tenders require ACTIVE"
        )),
    }
}

/// Check whether a driver may receive a dispatch assignment.
pub fn check_driver(driver: &Driver, now: DateTime<Utc>) -> Eligibility {
    if !driver.active {
        return Eligibility::blocked("driver record is inactive".to_string());
    }
    if !matches!(driver.status, DriverStatus::Active | DriverStatus::OffDuty) {
        return Eligibility::blocked(format!(
            "driver status is {:?}, dispatch requires ACTIVE or OFF_DUTY",
            driver.status
        ));
    }
    if driver.license_expires_at < now {
        return Eligibility::blocked(format!(
            "license expired {}",
            driver.license_expires_at.format("%Y-%m-%d")
        ));
    }
    if let Some(med) = driver.medical_cert_expires_at {
        if med < now {
            return Eligibility::blocked(format!(
                "medical certificate expired {}",
                med.format("%Y-%m-%d")
            ));
        }
    }
    Eligibility::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn carrier(status: CarrierStatus) -> Carrier {
        Carrier {
            id: CarrierId::new(),
            tenant_id: TenantId::new(),
            name: "Overland Freight LLC".to_string(),
            status,
            contact: ContactNumber::new("+15550100001").unwrap(),
            created_at: now(),
        }
    }

    fn driver() -> Driver {
        Driver {
            id: DriverId::new(),
            tenant_id: TenantId::new(),
            name: "R. Alvarez".to_string(),
            active: true,
            status: DriverStatus::Active,
            contact: ContactNumber::new("+15550102222").unwrap(),
            license_expires_at: now() + Duration::days(200),
            medical_cert_expires_at: Some(now() + Duration::days(90)),
            created_at: now(),
        }
    }

    // ── Carriers ─────────────────────────────────────────────────────

    #[test]
    fn test_active_carrier_is_eligible() {
        let result = check_carrier(&carrier(CarrierStatus::Active));
        assert!(result.eligible);
        assert!(result.reason.is_none());
    }

    #[test]
    fn test_non_active_carrier_is_ineligible() {
        for status in [
            CarrierStatus::Pending,
            CarrierStatus::Suspended,
            CarrierStatus::Inactive,
        ] {
            let result = check_carrier(&carrier(status));
            assert!(!result.eligible, "{status:?} should block tendering");
            assert!(result.reason.is_some());
        }
    }

    // ── Drivers ──────────────────────────────────────────────────────

    #[test]
    fn test_healthy_driver_is_eligible() {
        assert!(check_driver(&driver(), now()).eligible);
    }

    #[test]
    fn test_off_duty_driver_is_eligible() {
        let mut d = driver();
        d.status = DriverStatus::OffDuty;
        assert!(check_driver(&d, now()).eligible);
    }

    #[test]
    fn test_inactive_record_blocks() {
        let mut d = driver();
        d.active = false;
        let result = check_driver(&d, now());
        assert!(!result.eligible);
        assert!(result.reason.unwrap().contains("inactive"));
    }

    #[test]
    fn test_driving_and_suspended_block() {
        for status in [DriverStatus::Driving, DriverStatus::Suspended] {
            let mut d = driver();
            d.status = status;
            assert!(!check_driver(&d, now()).eligible);
        }
    }

    #[test]
    fn test_expired_license_blocks() {
        let mut d = driver();
        d.license_expires_at = now() - Duration::days(1);
        let result = check_driver(&d, now());
        assert!(!result.eligible);
        assert!(result.reason.unwrap().contains("license expired"));
    }

    #[test]
    fn test_expired_medical_cert_blocks() {
        let mut d = driver();
        d.medical_cert_expires_at = Some(now() - Duration::days(1));
        let result = check_driver(&d, now());
        assert!(!result.eligible);
        assert!(result.reason.unwrap().contains("medical certificate"));
    }

    #[test]
    fn test_missing_medical_cert_is_not_checked() {
        let mut d = driver();
        d.medical_cert_expires_at = None;
        assert!(check_driver(&d, now()).eligible);
    }

    #[test]
    fn test_first_failing_rule_wins() {
        // Inactive AND expired license: the inactive rule is reported.
        let mut d = driver();
        d.active = false;
        d.license_expires_at = now() - Duration::days(1);
        let result = check_driver(&d, now());
        assert!(result.reason.unwrap().contains("inactive"));
    }
}
