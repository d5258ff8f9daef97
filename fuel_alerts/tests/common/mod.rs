#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use fuel_alerts::notify::{DeliveryError, Notifier};
use fuel_alerts::source::FacilityApi;
use parking_lot::Mutex;
use reqwest::StatusCode;
use shared::esi::{AccessToken, EsiError, SsoError, StructureDto};
use std::collections::HashMap;
use std::time::Duration;

pub const CORPORATION_ID: i64 = 98_000_001;
pub const JITA: i64 = 30_000_142;
pub const PERIMETER: i64 = 30_000_144;
pub const FORTIZAR: i64 = 35833;
pub const ASTRAHUS: i64 = 35832;

/// 2024-05-01 13:00:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
}

pub fn structure(id: i64, name: &str, system: i64, type_id: i64, left: Option<TimeDelta>) -> StructureDto {
    StructureDto {
        structure_id: id,
        name: Some(name.to_string()),
        type_id: Some(type_id),
        solar_system_id: Some(system),
        fuel_expires: left.map(|d| (fixed_now() + d).to_rfc3339()),
    }
}

/// In-memory stand-in for SSO + ESI.
pub struct FakeApi {
    pub structures: Vec<StructureDto>,
    pub systems: HashMap<i64, String>,
    pub types: HashMap<i64, String>,
    pub reject_credentials: bool,
    pub fail_listing: bool,
    pub listing_delay: Duration,
    pub lookups: Mutex<Vec<String>>,
    pub authentications: Mutex<usize>,
}

impl FakeApi {
    pub fn new(structures: Vec<StructureDto>) -> Self {
        Self {
            structures,
            systems: HashMap::from([
                (JITA, "Jita".to_string()),
                (PERIMETER, "Perimeter".to_string()),
            ]),
            types: HashMap::from([
                (FORTIZAR, "Fortizar".to_string()),
                (ASTRAHUS, "Astrahus".to_string()),
            ]),
            reject_credentials: false,
            fail_listing: false,
            listing_delay: Duration::ZERO,
            lookups: Mutex::new(Vec::new()),
            authentications: Mutex::new(0),
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().len()
    }

    /// One per started run.
    pub fn authentication_count(&self) -> usize {
        *self.authentications.lock()
    }
}

fn not_found(path: String) -> EsiError {
    EsiError::Status {
        status: StatusCode::NOT_FOUND,
        url: format!("https://esi.test{path}"),
        body: r#"{"error":"not found"}"#.to_string(),
    }
}

impl FacilityApi for FakeApi {
    async fn authenticate(&self) -> Result<AccessToken, SsoError> {
        *self.authentications.lock() += 1;
        if self.reject_credentials {
            return Err(SsoError::Rejected {
                status: StatusCode::BAD_REQUEST,
                body: r#"{"error":"invalid_grant"}"#.to_string(),
            });
        }
        Ok(AccessToken::new("test-token"))
    }

    async fn organization_id(&self, _token: &AccessToken) -> Result<i64, EsiError> {
        Ok(CORPORATION_ID)
    }

    async fn facilities(&self, _token: &AccessToken, organization_id: i64) -> Result<Vec<StructureDto>, EsiError> {
        if !self.listing_delay.is_zero() {
            tokio::time::sleep(self.listing_delay).await;
        }
        if self.fail_listing {
            return Err(EsiError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                url: format!("https://esi.test/corporations/{organization_id}/structures/"),
                body: "upstream down".to_string(),
            });
        }
        Ok(self.structures.clone())
    }

    async fn location_name(&self, _token: &AccessToken, location_id: i64) -> Result<String, EsiError> {
        self.lookups.lock().push(format!("system:{location_id}"));
        self.systems
            .get(&location_id)
            .cloned()
            .ok_or_else(|| not_found(format!("/universe/systems/{location_id}/")))
    }

    async fn type_name(&self, _token: &AccessToken, type_id: i64) -> Result<String, EsiError> {
        self.lookups.lock().push(format!("type:{type_id}"));
        self.types
            .get(&type_id)
            .cloned()
            .ok_or_else(|| not_found(format!("/universe/types/{type_id}/")))
    }
}

/// Records every delivered message; rejects those containing `reject_containing`.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    pub reject_containing: Option<&'static str>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn deliver(&self, content: &str) -> Result<(), DeliveryError> {
        if self
            .reject_containing
            .is_some_and(|needle| content.contains(needle))
        {
            return Err(DeliveryError::Rejected {
                status: 403,
                code: 50013,
                message: "Missing Permissions".to_string(),
            });
        }
        self.sent.lock().push(content.to_string());
        Ok(())
    }
}
