//! The write workflows behind each route.
//!
//! Every staff-only operation takes a [`Grant`], so it can only run after the
//! gate has passed. Inputs arrive already validated; the orchestrator maps
//! store outcomes that mean "bad request" (a duplicate unit, a missing unit)
//! to [`ServiceError::InvalidInput`] and lets everything else collapse to
//! [`ServiceError::Internal`].

use crate::error::{ServiceError, ServiceResult};
use crate::gate::{authorize, Grant};
use crate::input::{CreateRequestInput, RegisterDonationInput, UpdateStatusInput};
use crate::model::{
    BloodRequest, DonationRecord, HistoryEntry, LedgerEntry, LedgerStatus, Role,
    BLOCKCHAIN_LEDGER, BLOOD_REQUESTS, DONATION_HISTORY, ROLE_CLAIM, USER_PROFILES,
};
use crate::roles::RoleStore;
use chrono::{SecondsFormat, Utc};
use hemolink_identity::{CallerIdentity, IdentityVerifier};
use hemolink_store::{
    to_fields, DocumentRef, DocumentStore, FieldValue, Fields, StoreError, WriteBatch,
};
use serde_json::Value;
use std::sync::Arc;

/// Status every newly registered unit starts in.
const INITIAL_STATUS: LedgerStatus = LedgerStatus::Verified;

/// Performs the authorized writes against the document store.
#[derive(Clone)]
pub struct WriteOrchestrator {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityVerifier>,
    roles: RoleStore,
}

impl WriteOrchestrator {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityVerifier>) -> Self {
        let roles = RoleStore::new(store.clone());
        Self {
            store,
            identity,
            roles,
        }
    }

    /// Returns the role store.
    pub fn roles(&self) -> &RoleStore {
        &self.roles
    }

    /// Looks up the caller's stored role and requires `medical_staff`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] if the caller is not staff.
    pub async fn authorize_staff(&self, caller: &CallerIdentity) -> ServiceResult<Grant> {
        let role = self.roles.get_role(&caller.uid).await?;
        authorize(caller, role, Role::MedicalStaff)
    }

    /// Gives `uid` the `regular_user` role unless it already has one, then
    /// brings the user's `role` claim in line with the stored role.
    ///
    /// Idempotent. Returns the role now in effect.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownOwner`] if the identity system has no
    /// such user.
    pub async fn assign_default_role(&self, uid: &str) -> ServiceResult<Option<Role>> {
        let user = self
            .identity
            .lookup_user(uid)
            .await?
            .ok_or_else(|| ServiceError::UnknownOwner(format!("no such user: {uid}")))?;

        let role = self.roles.ensure_role(uid, Role::RegularUser).await?;
        if let Some(role) = role {
            let current = user.claims.get(ROLE_CLAIM).and_then(Value::as_str);
            if current != Some(role.as_str()) {
                let mut claims = user.claims;
                claims.insert(ROLE_CLAIM.to_string(), Value::from(role.as_str()));
                self.identity.set_custom_claims(uid, claims).await?;
            }
        }
        Ok(role)
    }

    /// Stores a new open blood request and returns its address.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Internal`] if the store fails.
    pub async fn create_request(
        &self,
        grant: &Grant,
        input: CreateRequestInput,
    ) -> ServiceResult<DocumentRef> {
        let request = BloodRequest {
            hospital_name: input.hospital_name,
            blood_type: input.blood_type,
            units_needed: input.units_needed,
            is_urgent: input.is_urgent,
            requested_by: grant.uid().to_string(),
            status: "open".to_string(),
            created_at: None,
        };
        let mut fields = to_fields(&request)?;
        fields.insert("createdAt".into(), FieldValue::ServerTimestamp);

        let doc = self.store.add(BLOOD_REQUESTS, fields).await?;
        tracing::info!(id = doc.id(), by = grant.uid(), "blood request created");
        Ok(doc)
    }

    /// Removes a blood request. Removing a missing request succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] if `id` is not a document id.
    pub async fn delete_request(&self, grant: &Grant, id: &str) -> ServiceResult<()> {
        let doc = DocumentRef::new(BLOOD_REQUESTS, id)
            .map_err(|e| ServiceError::InvalidInput(format!("invalid request id: {e}")))?;
        self.store.delete(&doc).await?;
        tracing::info!(id, by = grant.uid(), "blood request deleted");
        Ok(())
    }

    /// Registers a donated unit.
    ///
    /// Writes the public ledger entry and the donor's private mirror in one
    /// batch, so either both are visible or neither is.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::UnknownOwner`] if the donor does not exist
    /// - [`ServiceError::InvalidInput`] if the unit is already registered
    /// - [`ServiceError::Internal`] if the store fails
    pub async fn register_donation(
        &self,
        grant: &Grant,
        input: RegisterDonationInput,
    ) -> ServiceResult<DocumentRef> {
        if self.identity.lookup_user(&input.donor_uid).await?.is_none() {
            return Err(ServiceError::UnknownOwner(format!(
                "no such donor: {}",
                input.donor_uid
            )));
        }

        let ledger_ref = DocumentRef::new(BLOCKCHAIN_LEDGER, input.blood_unit_id.as_str())?;
        let mirror_ref = DocumentRef::new(
            DocumentRef::new(USER_PROFILES, input.donor_uid.as_str())?
                .subcollection(DONATION_HISTORY)?,
            input.blood_unit_id.as_str(),
        )?;

        let entry = LedgerEntry {
            blood_unit_id: input.blood_unit_id.clone(),
            donor_uid: input.donor_uid.clone(),
            blood_type: input.blood_type,
            current_status: INITIAL_STATUS,
            current_location: input.location.clone(),
            registered_by: grant.uid().to_string(),
            history: vec![HistoryEntry {
                status: INITIAL_STATUS,
                location: input.location.clone(),
                timestamp: now(),
            }],
            created_at: None,
            last_updated: None,
        };
        let mut ledger_fields = to_fields(&entry)?;
        ledger_fields.insert("createdAt".into(), FieldValue::ServerTimestamp);
        ledger_fields.insert("lastUpdated".into(), FieldValue::ServerTimestamp);

        let record = DonationRecord {
            blood_unit_id: input.blood_unit_id.clone(),
            blood_type: input.blood_type,
            location: input.location,
            status: INITIAL_STATUS,
            donated_at: None,
        };
        let mut mirror_fields = to_fields(&record)?;
        mirror_fields.insert("donatedAt".into(), FieldValue::ServerTimestamp);

        let mut batch = WriteBatch::new();
        batch
            .create(ledger_ref.clone(), ledger_fields)
            .set(mirror_ref, mirror_fields);

        match self.store.commit(batch).await {
            Ok(_) => {
                tracing::info!(
                    unit = %input.blood_unit_id,
                    donor = %input.donor_uid,
                    by = grant.uid(),
                    "donation registered"
                );
                Ok(ledger_ref)
            }
            Err(StoreError::AlreadyExists(_)) => Err(ServiceError::InvalidInput(format!(
                "blood unit already registered: {}",
                input.blood_unit_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Appends a status change to a unit's history and updates its current
    /// status and location.
    ///
    /// The history is extended with an append transform rather than rewritten,
    /// so concurrent updates to the same unit are all kept.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] if the unit is not registered.
    pub async fn update_status(&self, grant: &Grant, input: UpdateStatusInput) -> ServiceResult<()> {
        let doc = DocumentRef::new(BLOCKCHAIN_LEDGER, input.blood_unit_id.as_str())?;
        let step = HistoryEntry {
            status: input.new_status,
            location: input.location.clone(),
            timestamp: now(),
        };
        let step = serde_json::to_value(&step).map_err(StoreError::from)?;

        let mut fields = Fields::new();
        fields.insert("history".into(), FieldValue::ArrayAppend(vec![step]));
        fields.insert("currentStatus".into(), input.new_status.as_str().into());
        fields.insert("currentLocation".into(), input.location.into());
        fields.insert("lastUpdated".into(), FieldValue::ServerTimestamp);

        match self.store.update(&doc, fields).await {
            Ok(_) => {
                tracing::info!(
                    unit = %input.blood_unit_id,
                    status = %input.new_status,
                    by = grant.uid(),
                    "status updated"
                );
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Err(ServiceError::InvalidInput(format!(
                "unknown blood unit: {}",
                input.blood_unit_id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BloodType;
    use hemolink_identity::{AuthConfig, Claims, LocalIdentityService, UserRecord};
    use hemolink_store::{FaultPlan, MemoryStore};

    struct Fixture {
        store: Arc<MemoryStore>,
        identity: Arc<LocalIdentityService>,
        orchestrator: WriteOrchestrator,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(LocalIdentityService::new(AuthConfig::new(
            b"orchestrator-test".to_vec(),
        )));
        identity.directory().insert(UserRecord::new("nurse"));
        identity.directory().insert(UserRecord::new("donor"));
        let orchestrator = WriteOrchestrator::new(store.clone(), identity.clone());
        Fixture {
            store,
            identity,
            orchestrator,
        }
    }

    fn staff_grant() -> Grant {
        let caller = CallerIdentity {
            uid: "nurse".into(),
            claims: Claims::new(),
        };
        authorize(&caller, Some(Role::MedicalStaff), Role::MedicalStaff).unwrap()
    }

    fn donation(unit: &str) -> RegisterDonationInput {
        RegisterDonationInput {
            donor_uid: "donor".into(),
            location: "Central".into(),
            blood_type: BloodType::ONegative,
            blood_unit_id: unit.into(),
        }
    }

    fn mirror(unit: &str) -> DocumentRef {
        DocumentRef::new("user_profiles/donor/donation_history", unit).unwrap()
    }

    fn ledger(unit: &str) -> DocumentRef {
        DocumentRef::new(BLOCKCHAIN_LEDGER, unit).unwrap()
    }

    #[tokio::test]
    async fn default_role_syncs_claim() {
        let f = fixture();
        let role = f.orchestrator.assign_default_role("donor").await.unwrap();
        assert_eq!(role, Some(Role::RegularUser));

        let user = f.identity.directory().get("donor").unwrap();
        assert_eq!(user.claims[ROLE_CLAIM], "regular_user");
    }

    #[tokio::test]
    async fn default_role_keeps_staff() {
        let f = fixture();
        f.orchestrator
            .roles()
            .set_role("nurse", Role::MedicalStaff)
            .await
            .unwrap();

        let role = f.orchestrator.assign_default_role("nurse").await.unwrap();
        assert_eq!(role, Some(Role::MedicalStaff));
        let user = f.identity.directory().get("nurse").unwrap();
        assert_eq!(user.claims[ROLE_CLAIM], "medical_staff");
    }

    #[tokio::test]
    async fn default_role_for_unknown_user() {
        let f = fixture();
        let err = f.orchestrator.assign_default_role("ghost").await.unwrap_err();
        assert!(matches!(err, ServiceError::UnknownOwner(_)));
        assert_eq!(f.store.document_count(crate::model::USER_ROLES), 0);
    }

    #[tokio::test]
    async fn authorize_staff_reads_store() {
        let f = fixture();
        let caller = CallerIdentity {
            uid: "nurse".into(),
            claims: Claims::new(),
        };
        assert!(f.orchestrator.authorize_staff(&caller).await.is_err());

        f.orchestrator
            .roles()
            .set_role("nurse", Role::MedicalStaff)
            .await
            .unwrap();
        assert!(f.orchestrator.authorize_staff(&caller).await.is_ok());
    }

    #[tokio::test]
    async fn create_request_stores_open_request() {
        let f = fixture();
        let doc = f
            .orchestrator
            .create_request(
                &staff_grant(),
                CreateRequestInput {
                    hospital_name: "St. Mary".into(),
                    blood_type: BloodType::ONegative,
                    units_needed: 3,
                    is_urgent: true,
                },
            )
            .await
            .unwrap();

        let stored = f.store.read(&doc).unwrap();
        let request: BloodRequest = stored.decode().unwrap();
        assert_eq!(request.units_needed, 3);
        assert_eq!(request.status, "open");
        assert_eq!(request.requested_by, "nurse");
        assert!(request.created_at.is_some());
    }

    #[tokio::test]
    async fn delete_request_is_idempotent() {
        let f = fixture();
        let grant = staff_grant();
        f.orchestrator.delete_request(&grant, "missing").await.unwrap();

        let err = f.orchestrator.delete_request(&grant, "a/b").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn register_writes_ledger_and_mirror() {
        let f = fixture();
        f.orchestrator
            .register_donation(&staff_grant(), donation("BU-1"))
            .await
            .unwrap();

        let entry: LedgerEntry = f.store.read(&ledger("BU-1")).unwrap().decode().unwrap();
        assert_eq!(entry.donor_uid, "donor");
        assert_eq!(entry.registered_by, "nurse");
        assert_eq!(entry.current_status, LedgerStatus::Verified);
        assert_eq!(entry.history.len(), 1);
        assert_eq!(entry.history[0].location, "Central");

        let record: DonationRecord = f.store.read(&mirror("BU-1")).unwrap().decode().unwrap();
        assert_eq!(record.status, LedgerStatus::Verified);
        assert!(record.donated_at.is_some());
    }

    #[tokio::test]
    async fn register_unknown_donor() {
        let f = fixture();
        let mut input = donation("BU-1");
        input.donor_uid = "ghost".into();
        let err = f
            .orchestrator
            .register_donation(&staff_grant(), input)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnknownOwner(_)));
        assert_eq!(f.store.document_count(BLOCKCHAIN_LEDGER), 0);
    }

    #[tokio::test]
    async fn register_twice_is_rejected() {
        let f = fixture();
        let grant = staff_grant();
        f.orchestrator
            .register_donation(&grant, donation("BU-1"))
            .await
            .unwrap();
        let err = f
            .orchestrator
            .register_donation(&grant, donation("BU-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn register_fault_leaves_nothing() {
        let f = fixture();
        f.store.inject(FaultPlan::fail_commit_after(1));
        let err = f
            .orchestrator
            .register_donation(&staff_grant(), donation("BU-1"))
            .await
            .unwrap_err();
        assert!(err.is_server_error());
        assert!(!f.store.contains(&ledger("BU-1")));
        assert!(!f.store.contains(&mirror("BU-1")));
    }

    #[tokio::test]
    async fn update_appends_history() {
        let f = fixture();
        let grant = staff_grant();
        f.orchestrator
            .register_donation(&grant, donation("BU-1"))
            .await
            .unwrap();
        f.orchestrator
            .update_status(
                &grant,
                UpdateStatusInput {
                    blood_unit_id: "BU-1".into(),
                    new_status: LedgerStatus::InTransit,
                    location: "Ward 3".into(),
                },
            )
            .await
            .unwrap();

        let doc = f.store.read(&ledger("BU-1")).unwrap();
        let entry: LedgerEntry = doc.decode().unwrap();
        assert_eq!(entry.current_status, LedgerStatus::InTransit);
        assert_eq!(entry.current_location, "Ward 3");
        let statuses: Vec<_> = entry.history.iter().map(|h| h.status).collect();
        assert_eq!(statuses, [LedgerStatus::Verified, LedgerStatus::InTransit]);
        assert!(doc.get("lastUpdated").is_some_and(Value::is_string));
    }

    #[tokio::test]
    async fn update_unknown_unit() {
        let f = fixture();
        let err = f
            .orchestrator
            .update_status(
                &staff_grant(),
                UpdateStatusInput {
                    blood_unit_id: "BU-404".into(),
                    new_status: LedgerStatus::Stored,
                    location: "Fridge".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(f.store.document_count(BLOCKCHAIN_LEDGER), 0);
    }
}
