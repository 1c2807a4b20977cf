//! Request and response bodies for the `/api` routes.
//!
//! Requests are parsed from loose JSON with `TryFrom<serde_json::Value>` so
//! that every malformed body maps to [`ProgressError::InvalidInput`] instead
//! of a framework-specific rejection.

use crate::{Player, ProgressError, TOTAL_UNITS, truthy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROGRESS_PATH: &str = "/api/progress";
pub const CREATE_USER_PATH: &str = "/api/create-user";
pub const TOGGLE_UNIT_PATH: &str = "/api/toggle-unit";
pub const UPDATE_PLAYER_PATH: &str = "/api/update-player";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub player: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CreateUserResponse {
    pub success: bool,
    pub exists: bool,
    pub data: Player,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ToggleUnitRequest {
    pub player: String,
    pub index: usize,
    pub value: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ToggleUnitResponse {
    pub success: bool,
    pub index: usize,
    pub value: bool,
    pub completed: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UpdatePlayerRequest {
    pub player: String,
    pub units: [bool; TOTAL_UNITS],
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UpdatePlayerResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

fn player_field(body: &Value) -> Result<String, ProgressError> {
    match body.get("player") {
        Some(Value::String(name)) if !name.is_empty() => Ok(name.clone()),
        _ => Err(ProgressError::InvalidInput(
            "Valid player name required.".to_string(),
        )),
    }
}

/// A non-negative integer, written either as `3` or as `3.0`.
fn index_field(value: &Value) -> Option<usize> {
    if let Some(index) = value.as_u64() {
        return usize::try_from(index).ok();
    }
    let index = value.as_f64()?;
    let whole = index >= 0.0 && index.fract() == 0.0 && index < usize::MAX as f64;
    whole.then_some(index as usize)
}

impl TryFrom<Value> for CreateUserRequest {
    type Error = ProgressError;

    fn try_from(body: Value) -> Result<Self, Self::Error> {
        Ok(Self {
            player: player_field(&body)?,
        })
    }
}

impl TryFrom<Value> for ToggleUnitRequest {
    type Error = ProgressError;

    fn try_from(body: Value) -> Result<Self, Self::Error> {
        let player = player_field(&body)?;
        let index = body
            .get("index")
            .and_then(index_field)
            .filter(|index| *index < TOTAL_UNITS)
            .ok_or_else(|| {
                ProgressError::InvalidInput(format!(
                    "Invalid toggle request: index must be an integer in 0..{TOTAL_UNITS}."
                ))
            })?;
        let value = body.get("value").is_some_and(truthy);
        Ok(Self {
            player,
            index,
            value,
        })
    }
}

impl TryFrom<Value> for UpdatePlayerRequest {
    type Error = ProgressError;

    fn try_from(body: Value) -> Result<Self, Self::Error> {
        let player = player_field(&body)?;
        let invalid = || {
            ProgressError::InvalidInput(format!(
                "Invalid update payload: units must be an array of {TOTAL_UNITS} values."
            ))
        };
        let raw = body.get("units").and_then(Value::as_array).ok_or_else(invalid)?;
        if raw.len() != TOTAL_UNITS {
            return Err(invalid());
        }
        let mut units = [false; TOTAL_UNITS];
        for (slot, value) in units.iter_mut().zip(raw) {
            *slot = truthy(value);
        }
        Ok(Self { player, units })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_user_requires_string_name() {
        assert_eq!(
            CreateUserRequest::try_from(json!({ "player": "Ada" })).unwrap(),
            CreateUserRequest {
                player: "Ada".to_string()
            }
        );
        for body in [
            json!({}),
            json!({ "player": "" }),
            json!({ "player": 7 }),
            json!({ "player": null }),
            json!("Ada"),
        ] {
            assert!(
                matches!(
                    CreateUserRequest::try_from(body.clone()),
                    Err(ProgressError::InvalidInput(_))
                ),
                "{body} should be rejected"
            );
        }
    }

    #[test]
    fn test_toggle_index_bounds() {
        let ok = ToggleUnitRequest::try_from(json!({ "player": "Ada", "index": 29, "value": true }))
            .unwrap();
        assert_eq!(ok.index, 29);
        assert!(ok.value);

        for index in [json!(30), json!(-1), json!(1.5), json!("3"), json!(null)] {
            let body = json!({ "player": "Ada", "index": index, "value": true });
            assert!(
                matches!(
                    ToggleUnitRequest::try_from(body),
                    Err(ProgressError::InvalidInput(_))
                ),
                "index {index} should be rejected"
            );
        }
    }

    #[test]
    fn test_toggle_index_accepts_integral_floats() {
        let request =
            ToggleUnitRequest::try_from(json!({ "player": "Ada", "index": 3.0, "value": true }))
                .unwrap();
        assert_eq!(request.index, 3);

        for index in [json!(30.0), json!(-1.0), json!(2.5)] {
            let body = json!({ "player": "Ada", "index": index, "value": true });
            assert!(ToggleUnitRequest::try_from(body).is_err(), "index {index}");
        }
    }

    #[test]
    fn test_toggle_value_is_coerced() {
        let request = ToggleUnitRequest::try_from(json!({ "player": "Ada", "index": 0, "value": 1 }))
            .unwrap();
        assert!(request.value);
        let request = ToggleUnitRequest::try_from(json!({ "player": "Ada", "index": 0 })).unwrap();
        assert!(!request.value);
    }

    #[test]
    fn test_update_player_coerces_mixed_values() {
        let mut raw: Vec<Value> = vec![json!(false); TOTAL_UNITS];
        raw[0] = json!(1);
        raw[1] = json!("yes");
        raw[2] = json!(0);
        raw[3] = json!(null);
        raw[4] = json!(true);
        raw[5] = json!({});

        let request =
            UpdatePlayerRequest::try_from(json!({ "player": "Ada", "units": raw })).unwrap();
        let mut expected = [false; TOTAL_UNITS];
        expected[0] = true;
        expected[1] = true;
        expected[4] = true;
        expected[5] = true;
        assert_eq!(request.units, expected);
    }

    #[test]
    fn test_update_player_wrong_length() {
        for len in [0, TOTAL_UNITS - 1, TOTAL_UNITS + 1] {
            let body = json!({ "player": "Ada", "units": vec![true; len] });
            assert!(matches!(
                UpdatePlayerRequest::try_from(body),
                Err(ProgressError::InvalidInput(_))
            ));
        }
        let body = json!({ "player": "Ada", "units": "all" });
        assert!(UpdatePlayerRequest::try_from(body).is_err());
    }

    #[test]
    fn test_typed_request_serializes_to_wire_shape() {
        let request = ToggleUnitRequest {
            player: "Ada".to_string(),
            index: 4,
            value: true,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "player": "Ada", "index": 4, "value": true })
        );
    }
}
