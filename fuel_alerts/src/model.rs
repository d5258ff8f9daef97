use crate::source::FacilityApi;
use chrono::{DateTime, Utc};
use shared::esi::{AccessToken, StructureDto};
use std::collections::HashMap;
use tracing::{debug, warn};

pub const UNKNOWN_SYSTEM: &str = "Unknown System";
pub const UNKNOWN_TYPE: &str = "Unknown Type";

/// A structure as seen by one run. Rebuilt from the API every time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facility {
    pub id: i64,
    pub display_name: Option<String>,
    pub type_id: Option<i64>,
    pub location_id: Option<i64>,
    /// `None` means untracked, not unlimited.
    pub fuel_expires_at: Option<DateTime<Utc>>,
}

impl Facility {
    /// A timestamp that fails to parse leaves the facility untracked.
    pub fn from_dto(dto: StructureDto) -> Self {
        let fuel_expires_at = dto.fuel_expires.as_deref().and_then(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .inspect_err(|e| {
                    warn!(
                        structure_id = dto.structure_id,
                        fuel_expires = raw,
                        error = %e,
                        "skipping structure with malformed fuel expiry"
                    );
                })
                .ok()
        });

        Self {
            id: dto.structure_id,
            display_name: dto.name.filter(|n| !n.trim().is_empty()),
            type_id: dto.type_id,
            location_id: dto.solar_system_id,
            fuel_expires_at,
        }
    }

    pub fn display_name(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| format!("Structure {}", self.id))
    }

    pub fn is_tracked(&self) -> bool {
        self.fuel_expires_at.is_some()
    }
}

/// Location and type names resolved during a single run.
///
/// Each id is looked up at most once; failed lookups are remembered as unknown so the
/// rest of the run doesn't retry them.
#[derive(Debug, Clone, Default)]
pub struct NameBook {
    locations: HashMap<i64, Option<String>>,
    types: HashMap<i64, Option<String>>,
}

impl NameBook {
    pub fn location(&self, id: Option<i64>) -> &str {
        lookup(&self.locations, id).unwrap_or(UNKNOWN_SYSTEM)
    }

    pub fn type_name(&self, id: Option<i64>) -> &str {
        lookup(&self.types, id).unwrap_or(UNKNOWN_TYPE)
    }

    pub fn insert_location(&mut self, id: i64, name: impl Into<String>) {
        self.locations.insert(id, Some(name.into()));
    }

    pub fn insert_type(&mut self, id: i64, name: impl Into<String>) {
        self.types.insert(id, Some(name.into()));
    }

    /// Resolves names for `facilities` one lookup at a time. Never fails: a lookup
    /// error degrades to the fallback label.
    pub async fn resolve<'a, A, I>(api: &A, token: &AccessToken, facilities: I) -> Self
    where
        A: FacilityApi,
        I: IntoIterator<Item = &'a Facility>,
    {
        let mut book = Self::default();

        for facility in facilities {
            if let Some(id) = facility.location_id
                && !book.locations.contains_key(&id)
            {
                let name = api
                    .location_name(token, id)
                    .await
                    .inspect_err(|e| warn!(location_id = id, error = %e, "failed to resolve system name"))
                    .ok();
                book.locations.insert(id, name);
            }

            if let Some(id) = facility.type_id
                && !book.types.contains_key(&id)
            {
                let name = api
                    .type_name(token, id)
                    .await
                    .inspect_err(|e| warn!(type_id = id, error = %e, "failed to resolve type name"))
                    .ok();
                book.types.insert(id, name);
            }
        }

        debug!(
            locations = book.locations.len(),
            types = book.types.len(),
            "resolved facility names"
        );
        book
    }
}

fn lookup(names: &HashMap<i64, Option<String>>, id: Option<i64>) -> Option<&str> {
    names.get(&id?)?.as_deref()
}
