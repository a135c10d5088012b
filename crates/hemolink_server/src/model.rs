//! Domain model and persisted document layout.
//!
//! | Collection | Key | Document |
//! |---|---|---|
//! | `user_roles` | caller uid | [`RoleRecord`] |
//! | `blood_requests` | store-generated | [`BloodRequest`] |
//! | `blockchain_ledger` | blood unit id | [`LedgerEntry`] |
//! | `user_profiles/{uid}/donation_history` | blood unit id | [`DonationRecord`] |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role records, keyed by caller uid.
pub const USER_ROLES: &str = "user_roles";
/// Blood requests, keyed by store-generated id.
pub const BLOOD_REQUESTS: &str = "blood_requests";
/// Public donation ledger, keyed by blood unit id.
pub const BLOCKCHAIN_LEDGER: &str = "blockchain_ledger";
/// Per-user profile documents; parent of the donation history mirror.
pub const USER_PROFILES: &str = "user_profiles";
/// Sub-collection under a profile mirroring the owner's ledger entries.
pub const DONATION_HISTORY: &str = "donation_history";

/// Name of the custom claim carrying the caller's role.
pub const ROLE_CLAIM: &str = "role";

/// Authorization role of a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Donors and other members of the public.
    RegularUser,
    /// Hospital and blood bank staff.
    MedicalStaff,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::RegularUser => "regular_user",
            Role::MedicalStaff => "medical_staff",
        }
    }

    fn rank(self) -> u8 {
        match self {
            Role::RegularUser => 0,
            Role::MedicalStaff => 1,
        }
    }

    /// Returns true if this role grants everything `required` grants.
    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular_user" => Ok(Role::RegularUser),
            "medical_staff" => Ok(Role::MedicalStaff),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Stored role of one caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Raw role name. Unknown names grant nothing.
    pub role: String,
}

/// ABO/Rh blood group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodType {
    /// A positive.
    #[serde(rename = "A+")]
    APositive,
    /// A negative.
    #[serde(rename = "A-")]
    ANegative,
    /// B positive.
    #[serde(rename = "B+")]
    BPositive,
    /// B negative.
    #[serde(rename = "B-")]
    BNegative,
    /// AB positive.
    #[serde(rename = "AB+")]
    AbPositive,
    /// AB negative.
    #[serde(rename = "AB-")]
    AbNegative,
    /// O positive.
    #[serde(rename = "O+")]
    OPositive,
    /// O negative.
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodType {
    /// Every blood type, in display order.
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
        BloodType::OPositive,
        BloodType::ONegative,
    ];

    /// Wire name of the blood type.
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BloodType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown blood type: {s}"))
    }
}

/// Lifecycle status of a blood unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerStatus {
    /// Collected and verified at donation.
    Verified,
    /// Held in storage.
    Stored,
    /// Being moved between sites.
    InTransit,
    /// Received at the requesting site.
    Delivered,
    /// Given to a patient.
    Transfused,
    /// Past its shelf life.
    Expired,
    /// Removed from use.
    Discarded,
}

impl LedgerStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [LedgerStatus; 7] = [
        LedgerStatus::Verified,
        LedgerStatus::Stored,
        LedgerStatus::InTransit,
        LedgerStatus::Delivered,
        LedgerStatus::Transfused,
        LedgerStatus::Expired,
        LedgerStatus::Discarded,
    ];

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStatus::Verified => "Verified",
            LedgerStatus::Stored => "Stored",
            LedgerStatus::InTransit => "InTransit",
            LedgerStatus::Delivered => "Delivered",
            LedgerStatus::Transfused => "Transfused",
            LedgerStatus::Expired => "Expired",
            LedgerStatus::Discarded => "Discarded",
        }
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LedgerStatus::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown status: {s}"))
    }
}

/// One step in a blood unit's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Status entered at this step.
    pub status: LedgerStatus,
    /// Where the unit was.
    pub location: String,
    /// When the step was recorded (RFC 3339).
    pub timestamp: String,
}

/// A blood request raised by staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    /// Requesting hospital.
    pub hospital_name: String,
    /// Blood type needed.
    pub blood_type: BloodType,
    /// Number of units needed.
    pub units_needed: u64,
    /// Whether the request is urgent.
    pub is_urgent: bool,
    /// Uid of the staff member who raised it.
    pub requested_by: String,
    /// Request state; always `open` at creation.
    pub status: String,
    /// Server-assigned creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Public ledger entry for one blood unit.
///
/// `history` is append-only; `current_status` and `current_location`
/// mirror its latest element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Unit id; also the document id.
    #[serde(rename = "bloodUnitID")]
    pub blood_unit_id: String,
    /// Donor uid.
    #[serde(rename = "donorUID")]
    pub donor_uid: String,
    /// Blood type of the unit.
    pub blood_type: BloodType,
    /// Latest status.
    pub current_status: LedgerStatus,
    /// Latest location.
    pub current_location: String,
    /// Uid of the staff member who registered the unit.
    pub registered_by: String,
    /// Every status change, oldest first.
    pub history: Vec<HistoryEntry>,
    /// Server-assigned registration time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Server-assigned time of the last change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// A donor's private copy of a ledger registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    /// Unit id; also the document id.
    #[serde(rename = "bloodUnitID")]
    pub blood_unit_id: String,
    /// Blood type of the unit.
    pub blood_type: BloodType,
    /// Where the donation was taken.
    pub location: String,
    /// Status at registration.
    pub status: LedgerStatus,
    /// Server-assigned donation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donated_at: Option<String>,
}
