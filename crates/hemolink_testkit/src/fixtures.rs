//! In-process application fixture.
//!
//! [`TestApp`] wires the real router to a [`MemoryStore`] and a
//! [`LocalIdentityService`], so tests drive the HTTP surface without a socket
//! and can inspect or fault the store directly.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use hemolink_identity::{AuthConfig, LocalIdentityService, UserRecord};
use hemolink_server::{
    DonationRecord, HemolinkServer, LedgerEntry, Role, RoleStore, ServerConfig,
    BLOCKCHAIN_LEDGER, DONATION_HISTORY, USER_PROFILES, USER_ROLES, WEBHOOK_SECRET_HEADER,
};
use hemolink_store::{DocumentRef, MemoryStore};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

/// Token signing secret used by every [`TestApp`].
pub const TEST_AUTH_SECRET: &[u8] = b"hemolink-test-secret";

/// Webhook secret configured on [`TestApp::new`].
pub const TEST_WEBHOOK_SECRET: &str = "hemolink-test-webhook";

/// A response captured by [`TestApp::send`].
#[derive(Debug, Clone)]
pub struct TestResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Parsed JSON body, or `Null` when the body is empty or not JSON.
    pub body: Value,
}

impl TestResponse {
    /// Returns the error envelope's `kind`, if present.
    pub fn kind(&self) -> Option<&str> {
        self.body.get("kind").and_then(Value::as_str)
    }

    /// Returns the `message` field, if present.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// Returns the `id` field, if present.
    pub fn id(&self) -> Option<&str> {
        self.body.get("id").and_then(Value::as_str)
    }
}

/// The server under test with its collaborators exposed.
#[derive(Clone)]
pub struct TestApp {
    /// The backing store.
    pub store: Arc<MemoryStore>,
    /// The identity service.
    pub identity: Arc<LocalIdentityService>,
    roles: RoleStore,
    router: Router,
}

impl TestApp {
    /// Creates an app with the webhook enabled.
    pub fn new() -> Self {
        Self::with_config(
            ServerConfig::default().with_webhook_secret(TEST_WEBHOOK_SECRET.as_bytes().to_vec()),
        )
    }

    /// Creates an app with a custom server configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(LocalIdentityService::new(AuthConfig::new(
            TEST_AUTH_SECRET.to_vec(),
        )));
        let server = HemolinkServer::new(config, store.clone(), identity.clone());
        Self {
            roles: server.orchestrator().roles().clone(),
            router: server.router(),
            store,
            identity,
        }
    }

    /// Registers a user with no role and returns a token for them.
    pub fn add_user(&self, uid: &str) -> String {
        self.identity.directory().insert(UserRecord::new(uid));
        self.token(uid)
    }

    /// Registers a user with the `medical_staff` role record.
    pub async fn add_staff(&self, uid: &str) -> String {
        self.add_with_role(uid, Role::MedicalStaff).await
    }

    /// Registers a user with the `regular_user` role record.
    pub async fn add_regular(&self, uid: &str) -> String {
        self.add_with_role(uid, Role::RegularUser).await
    }

    async fn add_with_role(&self, uid: &str, role: Role) -> String {
        let token = self.add_user(uid);
        self.roles
            .set_role(uid, role)
            .await
            .expect("failed to seed role");
        token
    }

    /// Issues a fresh token for a registered user.
    pub fn token(&self, uid: &str) -> String {
        self.identity
            .issue_token(uid)
            .expect("user must be registered before issuing a token")
    }

    /// Returns the role store.
    pub fn roles(&self) -> &RoleStore {
        &self.roles
    }

    /// Sends a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body }
    }

    /// Sends a JSON `POST`.
    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.post_raw(path, token, body.to_string()).await
    }

    /// Sends a `POST` with a raw body.
    pub async fn post_raw(
        &self,
        path: &str,
        token: Option<&str>,
        body: impl Into<String>,
    ) -> TestResponse {
        let request = builder(Method::POST, path, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.into()))
            .expect("invalid request");
        self.send(request).await
    }

    /// Sends a `DELETE`.
    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        let request = builder(Method::DELETE, path, token)
            .body(Body::empty())
            .expect("invalid request");
        self.send(request).await
    }

    /// Sends a `GET`.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = builder(Method::GET, path, None)
            .body(Body::empty())
            .expect("invalid request");
        self.send(request).await
    }

    /// Calls the new-user webhook with the given secret header.
    pub async fn webhook(&self, secret: Option<&str>, body: Value) -> TestResponse {
        let mut request = builder(Method::POST, "/api/handle-new-user", None)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(secret) = secret {
            request = request.header(WEBHOOK_SECRET_HEADER, secret);
        }
        let request = request
            .body(Body::from(body.to_string()))
            .expect("invalid request");
        self.send(request).await
    }

    /// Returns the raw role record for `uid`.
    pub fn role_record(&self, uid: &str) -> Option<Map<String, Value>> {
        self.read(USER_ROLES, uid)
    }

    /// Returns the ledger entry for a unit.
    pub fn ledger_entry(&self, unit: &str) -> Option<LedgerEntry> {
        let doc = DocumentRef::new(BLOCKCHAIN_LEDGER, unit).ok()?;
        self.store
            .read(&doc)
            .map(|d| d.decode().expect("ledger entry does not decode"))
    }

    /// Returns the donor's mirror of a unit.
    pub fn mirror_entry(&self, donor: &str, unit: &str) -> Option<DonationRecord> {
        let collection = format!("{USER_PROFILES}/{donor}/{DONATION_HISTORY}");
        let doc = DocumentRef::new(collection, unit).ok()?;
        self.store
            .read(&doc)
            .map(|d| d.decode().expect("mirror entry does not decode"))
    }

    /// Returns every stored document keyed by path.
    pub fn snapshot(&self) -> BTreeMap<String, Map<String, Value>> {
        self.store.snapshot()
    }

    fn read(&self, collection: &str, id: &str) -> Option<Map<String, Value>> {
        let doc = DocumentRef::new(collection, id).ok()?;
        self.store.read(&doc).map(|d| d.data().clone())
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats an `Authorization` header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

fn builder(method: Method, path: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(path);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, bearer(token)),
        None => builder,
    }
}
