//! Request body schemas.
//!
//! Bodies are parsed into a JSON value first and then checked field by field,
//! so every problem is reported as [`ServiceError::InvalidInput`] in the
//! standard envelope rather than as a framework rejection.

use crate::error::{ServiceError, ServiceResult};
use crate::model::{BloodType, LedgerStatus};
use hemolink_store::DocumentRef;
use serde_json::{Map, Value};

/// Parses a request body as a JSON object. An empty body is an empty object.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidInput`] for malformed JSON or a non-object.
pub fn parse_body(bytes: &[u8]) -> ServiceResult<Map<String, Value>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid("request body must be a JSON object")),
        Err(e) => Err(invalid(format!("malformed JSON body: {e}"))),
    }
}

/// Body of `POST /api/create-request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequestInput {
    /// Requesting hospital.
    pub hospital_name: String,
    /// Blood type needed.
    pub blood_type: BloodType,
    /// Units needed.
    pub units_needed: u64,
    /// Urgency flag.
    pub is_urgent: bool,
}

impl CreateRequestInput {
    /// Validates a body.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] naming the first bad field.
    pub fn from_body(body: &Map<String, Value>) -> ServiceResult<Self> {
        Ok(Self {
            hospital_name: required_text(body, "hospitalName")?,
            blood_type: required_parsed(body, "bloodType")?,
            units_needed: required_count(body, "unitsNeeded")?,
            is_urgent: required_bool(body, "isUrgent")?,
        })
    }
}

/// Body of `POST /api/register-donation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDonationInput {
    /// Donor uid in the identity system.
    pub donor_uid: String,
    /// Where the donation was taken.
    pub location: String,
    /// Blood type of the unit.
    pub blood_type: BloodType,
    /// Caller-supplied unit id.
    pub blood_unit_id: String,
}

impl RegisterDonationInput {
    /// Validates a body.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] naming the first bad field.
    pub fn from_body(body: &Map<String, Value>) -> ServiceResult<Self> {
        Ok(Self {
            donor_uid: required_id(body, "donorUID")?,
            location: required_text(body, "location")?,
            blood_type: required_parsed(body, "bloodType")?,
            blood_unit_id: required_id(body, "bloodUnitID")?,
        })
    }
}

/// Body of `POST /api/update-status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatusInput {
    /// Unit to update.
    pub blood_unit_id: String,
    /// Status to append.
    pub new_status: LedgerStatus,
    /// Location at the time of the change.
    pub location: String,
}

impl UpdateStatusInput {
    /// Validates a body.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] naming the first bad field.
    pub fn from_body(body: &Map<String, Value>) -> ServiceResult<Self> {
        Ok(Self {
            blood_unit_id: required_id(body, "bloodUnitID")?,
            new_status: required_parsed(body, "newStatus")?,
            location: required_text(body, "location")?,
        })
    }
}

/// Body of `POST /api/handle-new-user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserInput {
    /// Uid of the user that just signed up.
    pub uid: String,
}

impl NewUserInput {
    /// Validates a body.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] if `uid` is missing.
    pub fn from_body(body: &Map<String, Value>) -> ServiceResult<Self> {
        Ok(Self {
            uid: required_id(body, "uid")?,
        })
    }
}

/// Checks that `id` can address a document.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidInput`] if it cannot.
fn document_id(field: &str, id: &str) -> ServiceResult<String> {
    DocumentRef::validate_id(id)
        .map(|()| id.to_string())
        .map_err(|e| invalid(format!("{field} is not a valid id: {e}")))
}

fn invalid(message: impl Into<String>) -> ServiceError {
    ServiceError::InvalidInput(message.into())
}

fn missing(field: &str) -> ServiceError {
    invalid(format!("missing required field: {field}"))
}

fn required_text(body: &Map<String, Value>, field: &str) -> ServiceResult<String> {
    match body.get(field) {
        None | Some(Value::Null) => Err(missing(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(missing(field)),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(invalid(format!("{field} must be a string"))),
    }
}

fn required_id(body: &Map<String, Value>, field: &str) -> ServiceResult<String> {
    let id = required_text(body, field)?;
    document_id(field, &id)
}

fn required_parsed<T>(body: &Map<String, Value>, field: &str) -> ServiceResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    required_text(body, field)?
        .parse()
        .map_err(|e: String| invalid(format!("{field}: {e}")))
}

fn required_count(body: &Map<String, Value>, field: &str) -> ServiceResult<u64> {
    match body.get(field) {
        None | Some(Value::Null) => Err(missing(field)),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| invalid(format!("{field} must be a non-negative integer"))),
        Some(_) => Err(invalid(format!("{field} must be a non-negative integer"))),
    }
}

fn required_bool(body: &Map<String, Value>, field: &str) -> ServiceResult<bool> {
    match body.get(field) {
        None | Some(Value::Null) => Err(missing(field)),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(invalid(format!("{field} must be a boolean"))),
    }
}
