//! Concurrent requests against one server.

use hemolink_server::{LedgerStatus, USER_ROLES};
use hemolink_testkit::prelude::*;
use serde_json::json;
use std::collections::HashSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_status_updates_are_all_kept() {
    const UPDATES: usize = 40;

    let app = TestApp::new();
    let staff = app.add_staff("nurse-1").await;
    app.add_user("donor-1");
    let response = app
        .post(
            "/api/register-donation",
            Some(&staff),
            json!({
                "donorUID": "donor-1",
                "location": "Central",
                "bloodType": "B-",
                "bloodUnitID": "BU-1",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let mut handles = Vec::with_capacity(UPDATES);
    for i in 0..UPDATES {
        let app = app.clone();
        let staff = staff.clone();
        handles.push(tokio::spawn(async move {
            let status = LedgerStatus::ALL[i % LedgerStatus::ALL.len()];
            app.post(
                "/api/update-status",
                Some(&staff),
                json!({
                    "bloodUnitID": "BU-1",
                    "newStatus": status.as_str(),
                    "location": format!("stop-{i}"),
                }),
            )
            .await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().status, StatusCode::OK);
    }

    let entry = app.ledger_entry("BU-1").unwrap();
    assert_eq!(entry.history.len(), UPDATES + 1);
    assert_eq!(entry.history[0].status, LedgerStatus::Verified);
    assert_eq!(entry.history[0].location, "Central");

    let locations: HashSet<_> = entry.history[1..]
        .iter()
        .map(|h| h.location.as_str())
        .collect();
    assert_eq!(locations.len(), UPDATES);

    let last = entry.history.last().unwrap();
    assert_eq!(entry.current_location, last.location);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_self_assignment_creates_one_record() {
    let app = TestApp::new();
    let token = app.add_user("donor-1");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let app = app.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            app.post("/api/assign-role", Some(&token), json!({})).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().status, StatusCode::OK);
    }

    assert_eq!(app.store.document_ids(USER_ROLES), ["donor-1"]);
    assert_eq!(
        app.role_record("donor-1").unwrap()["role"],
        json!("regular_user")
    );
}
