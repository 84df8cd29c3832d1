use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{disallowed_wheelchair_error, Error};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelchairType {
    #[default]
    None,
    Manual,
    Power,
    AgencyProvided,
    /// Offered by the booking form but not bookable.
    Transport,
}

/// What a caller asks to have priced. `scheduled_at` is the wall-clock time
/// in the service area.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FareRequest {
    pub origin_address: String,
    pub destination_address: String,
    #[serde(default)]
    pub is_round_trip: bool,
    #[serde(default)]
    pub scheduled_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub wheelchair_type: WheelchairType,
    #[serde(default)]
    pub agency_provides_wheelchair: bool,
    // carried through to the trip record, not priced
    #[serde(default)]
    pub additional_passengers: u32,
    #[serde(default)]
    pub is_emergency: bool,
    #[serde(default)]
    pub is_veteran: bool,
}

impl FareRequest {
    /// Booking-boundary checks. Pricing itself never rejects a request.
    pub fn validate(&self) -> Result<(), Error> {
        if self.wheelchair_type == WheelchairType::Transport {
            return Err(disallowed_wheelchair_error());
        }

        Ok(())
    }
}

#[test]
fn transport_wheelchair_is_rejected() {
    let request = FareRequest {
        wheelchair_type: WheelchairType::Transport,
        ..Default::default()
    };

    assert_eq!(request.validate().unwrap_err().code, 102);

    for allowed in [
        WheelchairType::None,
        WheelchairType::Manual,
        WheelchairType::Power,
        WheelchairType::AgencyProvided,
    ] {
        let request = FareRequest {
            wheelchair_type: allowed,
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }
}

#[test]
fn deserializes_with_defaults() {
    let request: FareRequest = serde_json::from_str(
        r#"{"origin_address": "1 Main St", "destination_address": "2 High St", "wheelchair_type": "agency_provided"}"#,
    )
    .unwrap();

    assert!(!request.is_round_trip);
    assert!(request.scheduled_at.is_none());
    assert_eq!(request.wheelchair_type, WheelchairType::AgencyProvided);
    assert_eq!(request.additional_passengers, 0);
}

#[test]
fn negative_passenger_count_does_not_deserialize() {
    let result: Result<FareRequest, _> = serde_json::from_str(
        r#"{"origin_address": "a", "destination_address": "b", "additional_passengers": -1}"#,
    );

    assert!(result.is_err());
}
