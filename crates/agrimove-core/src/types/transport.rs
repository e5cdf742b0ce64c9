use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationErrors};

pub const REQUEST_ID_PREFIX: &str = "REQ-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
}

/// A submission as received from a client, before the ledger accepts it.
///
/// Every field defaults when absent so that missing fields surface as
/// validation errors alongside the other offending fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTransportRequest {
    #[serde(default)]
    pub farmer_name: String,
    #[serde(default)]
    pub produce: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub pickup: String,
    #[serde(default)]
    pub destination: String,
}

impl NewTransportRequest {
    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        for (field, value) in [
            ("farmer_name", &self.farmer_name),
            ("produce", &self.produce),
            ("pickup", &self.pickup),
            ("destination", &self.destination),
        ] {
            if value.trim().is_empty() {
                errors.add(field, "is required");
            }
        }
        if self.quantity <= 0 {
            errors.add("quantity", "must be greater than 0");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportRequest {
    pub request_id: String,
    pub farmer_name: String,
    pub produce: String,
    pub quantity: u64,
    pub pickup: String,
    pub destination: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl TransportRequest {
    /// Builds the stored record. Callers must have validated `new` first.
    pub fn from_submission(sequence: u64, new: NewTransportRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            request_id: format!("{}{}", REQUEST_ID_PREFIX, sequence),
            farmer_name: new.farmer_name.trim().to_string(),
            produce: new.produce.trim().to_string(),
            quantity: new.quantity.max(0) as u64,
            pickup: new.pickup.trim().to_string(),
            destination: new.destination.trim().to_string(),
            status: RequestStatus::Pending,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truck {
    pub id: String,
    pub location: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruckList {
    pub trucks: Vec<Truck>,
}
