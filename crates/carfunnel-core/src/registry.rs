//! # Stage Registry
//!
//! Static, ordered description of the six funnel stages.
//!
//! | # | Stage | Depends on | Endpoint | Param | Placeholder |
//! |---|-------|------------|----------|-------|-------------|
//! | 1 | make | - | `/get_car_makes/` | - | Select Manufacturer |
//! | 2 | model | make | `/get_car_models/` | `make` | Select Model |
//! | 3 | year | model | `/get_car_years/` | `model` | Select Year |
//! | 4 | car_type | year | `/get_car_types/` | `year` | Select Car Type |
//! | 5 | fuel_type | car_type | `/get_fuel_types/` | `car_type` | Select Fuel Type |
//! | 6 | location | fuel_type | `/get_car_locations/` | `fuel_type` | Select Location |
//!
//! The table is compiled in and never mutated.

use crate::{FunnelError, StageId};
use std::str::FromStr;

// =============================================================================
// STAGE DESCRIPTOR
// =============================================================================

/// Read-only metadata for one stage.
#[derive(Debug, PartialEq, Eq)]
pub struct StageDescriptor {
    /// Stage identity.
    pub id: StageId,
    /// The stage whose selection parameterizes this stage's lookup.
    pub depends_on: Option<StageId>,
    /// Lookup path on the backend.
    pub endpoint: &'static str,
    /// Query parameter carrying the parent's value. `None` for the first stage.
    pub request_param: Option<&'static str>,
    /// Label of the always-first "nothing chosen" entry.
    pub placeholder: &'static str,
    /// Id of the select control on the search page.
    pub control_id: &'static str,
    /// Parameter name for this stage's value on the listing page.
    pub search_param: &'static str,
}

/// The six stages in funnel order. `STAGES[i].id.index() == i`.
pub static STAGES: [StageDescriptor; 6] = [
    StageDescriptor {
        id: StageId::Make,
        depends_on: None,
        endpoint: "/get_car_makes/",
        request_param: None,
        placeholder: "Select Manufacturer",
        control_id: "car_make",
        search_param: "make",
    },
    StageDescriptor {
        id: StageId::Model,
        depends_on: Some(StageId::Make),
        endpoint: "/get_car_models/",
        request_param: Some("make"),
        placeholder: "Select Model",
        control_id: "car_model",
        search_param: "model",
    },
    StageDescriptor {
        id: StageId::Year,
        depends_on: Some(StageId::Model),
        endpoint: "/get_car_years/",
        request_param: Some("model"),
        placeholder: "Select Year",
        control_id: "car_year",
        search_param: "year",
    },
    StageDescriptor {
        id: StageId::CarType,
        depends_on: Some(StageId::Year),
        endpoint: "/get_car_types/",
        request_param: Some("year"),
        placeholder: "Select Car Type",
        control_id: "car_type",
        search_param: "car_type",
    },
    StageDescriptor {
        id: StageId::FuelType,
        depends_on: Some(StageId::CarType),
        endpoint: "/get_fuel_types/",
        request_param: Some("car_type"),
        placeholder: "Select Fuel Type",
        control_id: "fuel_type",
        search_param: "fuel_type",
    },
    StageDescriptor {
        id: StageId::Location,
        depends_on: Some(StageId::FuelType),
        endpoint: "/get_car_locations/",
        request_param: Some("fuel_type"),
        placeholder: "Select Location",
        control_id: "car_location",
        search_param: "location",
    },
];

// =============================================================================
// LOOKUPS
// =============================================================================

/// Get the descriptor for a stage.
#[must_use]
pub fn descriptor(id: StageId) -> &'static StageDescriptor {
    // `StageId` discriminants are the table positions.
    &STAGES[id.index()]
}

/// The stage that follows `id`, or `None` for the last stage.
#[must_use]
pub fn next(id: StageId) -> Option<&'static StageDescriptor> {
    id.next().map(descriptor)
}

/// The first stage, loaded eagerly without a parameter.
#[must_use]
pub fn first() -> &'static StageDescriptor {
    &STAGES[0]
}

/// All descriptors in funnel order.
pub fn iter() -> impl Iterator<Item = &'static StageDescriptor> {
    STAGES.iter()
}

/// Resolve a stage reference.
///
/// Accepts the stage name (`car_type`), its 1-based position (`4`)
/// or its control id (`car_make`). Matching is case-insensitive and
/// treats `-` like `_`.
pub fn resolve(reference: &str) -> Result<StageId, FunnelError> {
    let normalized = reference.trim().to_ascii_lowercase().replace('-', "_");

    if let Ok(position) = normalized.parse::<usize>() {
        return position
            .checked_sub(1)
            .and_then(|i| StageId::ALL.get(i).copied())
            .ok_or_else(|| FunnelError::UnknownStage(reference.to_string()));
    }

    iter()
        .find(|d| d.id.name() == normalized || d.control_id == normalized)
        .map(|d| d.id)
        .ok_or_else(|| FunnelError::UnknownStage(reference.to_string()))
}

impl FromStr for StageId {
    type Err = FunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s)
    }
}

// =============================================================================
// TESTS
// =============================================================================
