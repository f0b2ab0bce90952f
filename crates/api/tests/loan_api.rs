//! HTTP-level tests for the loan endpoints over the in-memory store.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bibliotech_core::library::{BorrowerStanding, CopyStatus};
use bibliotech_core::loan::LoanStatus;
use serde_json::json;

use common::{date, TestApp};

// ---------------------------------------------------------------------------
// Health and auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_public_and_reports_in_memory_store() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, json) = t.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "not_configured");
    assert_eq!(json["observers"], 2);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(t.app.clone(), request)
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/loans")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "borrower_id": t.borrower_id, "copy_id": t.copy_id }).to_string(),
        ))
        .unwrap();

    let (status, json) = t.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert!(t.store.loans().await.is_empty());
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    let request = Request::builder()
        .uri("/api/v1/loans/1")
        .header("authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();

    let (status, json) = t.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid or expired token");
}

#[tokio::test]
async fn token_for_unknown_staff_member_is_rejected() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/loans")
        .header("authorization", format!("Bearer {}", t.token_for(999)))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "borrower_id": t.borrower_id, "copy_id": t.copy_id }).to_string(),
        ))
        .unwrap();

    let (status, json) = t.send(request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "User with id 999 not found");
    assert!(t.store.loans().await.is_empty());
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_returns_pending_loan_and_sends_receipt() {
    let t = TestApp::new(date(2025, 3, 1)).await;

    let (status, json) = t
        .post(
            "/api/v1/loans",
            json!({ "borrower_id": t.borrower_id, "copy_id": t.copy_id }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["message"], "Loan created successfully.");
    assert_eq!(json["data"]["loan"]["status"], "pending");
    assert_eq!(json["data"]["loan"]["due_date"], "2025-03-08");
    assert_eq!(json["data"]["loan"]["created_by"], t.staff_id);

    let borrower = t.store.borrower(t.borrower_id).await.unwrap();
    assert_eq!(borrower.standing, BorrowerStanding::Indebted);
    assert_eq!(
        t.outbox.subjects(),
        vec!["Loan confirmed - Test Library".to_string()]
    );
}

#[tokio::test]
async fn second_loan_of_same_copy_is_rejected() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    t.create_loan().await;
    let other = t.store.add_borrower("Bruno", None, None).await;

    let (status, json) = t
        .post(
            "/api/v1/loans",
            json!({ "borrower_id": other.id, "copy_id": t.copy_id }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(t.store.loans().await.len(), 1);
}

#[tokio::test]
async fn get_returns_loan_and_unknown_id_is_not_found() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    let id = t.create_loan().await;

    let (status, json) = t.get(&format!("/api/v1/loans/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], id);

    let (status, json) = t.get("/api/v1/loans/4242").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Loan with id 4242 not found");
}

#[tokio::test]
async fn cancel_then_cancel_again_conflicts() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    let id = t.create_loan().await;

    let (status, json) = t.post(&format!("/api/v1/loans/{id}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["message"], "Loan cancelled successfully.");
    assert_eq!(json["data"]["loan"]["status"], "cancelled");

    let (status, json) = t.post(&format!("/api/v1/loans/{id}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "INVALID_STATE");

    let copy = t.store.copy(t.copy_id).await.unwrap();
    assert_eq!(copy.status, CopyStatus::Available);
}

#[tokio::test]
async fn complete_with_observation_returns_the_copy() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    let id = t.create_loan().await;

    let (status, json) = t
        .post(
            &format!("/api/v1/loans/{id}/complete"),
            json!({ "observation": "  cover torn  " }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["message"], "Loan completed successfully.");
    assert_eq!(json["data"]["loan"]["status"], "returned");
    assert_eq!(json["data"]["loan"]["observation"], "cover torn");
    assert_eq!(json["data"]["loan"]["completion_date"], "2025-03-01");
}

#[tokio::test]
async fn complete_as_lost_marks_copy_lost() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    let id = t.create_loan().await;

    let (status, json) = t
        .post(&format!("/api/v1/loans/{id}/complete"), json!({ "lost": true }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["message"], "Loan closed as lost successfully.");
    assert_eq!(json["data"]["loan"]["status"], "lost");
    assert_eq!(
        t.store.copy(t.copy_id).await.unwrap().status,
        CopyStatus::Lost
    );
    assert_eq!(
        t.store.borrower(t.borrower_id).await.unwrap().standing,
        BorrowerStanding::Irregular
    );
}

#[tokio::test]
async fn overlong_observation_is_a_validation_error() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    let id = t.create_loan().await;

    let (status, json) = t
        .post(
            &format!("/api/v1/loans/{id}/complete"),
            json!({ "observation": "x".repeat(501) }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(
        t.store.loan(id).await.unwrap().status,
        LoanStatus::Pending
    );
}

#[tokio::test]
async fn renew_extends_due_date() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    let id = t.create_loan().await;

    let (status, json) = t.post(&format!("/api/v1/loans/{id}/renew"), json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["message"], "Loan renewed successfully.");
    assert_eq!(json["data"]["loan"]["due_date"], "2025-03-15");
    assert_eq!(json["data"]["loan"]["renewal_count"], 1);
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_endpoint_marks_overdue_and_notifies_once_per_day() {
    let t = TestApp::new(date(2025, 3, 1)).await;
    let id = t.create_loan().await;
    t.outbox.clear();

    let (status, json) = t.post("/api/v1/loans/overdue-sweep", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["transitioned"], 0);
    assert_eq!(json["data"]["notified"], 0);
    assert!(t.outbox.subjects().is_empty());

    t.clock.set(date(2025, 3, 8));
    let (status, json) = t.post("/api/v1/loans/overdue-sweep", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["transitioned"], 1);
    assert_eq!(json["data"]["notified"], 1);
    assert_eq!(json["data"]["unnotified"], json!([]));
    assert_eq!(
        t.outbox.subjects(),
        vec!["Overdue loan - Test Library".to_string()]
    );
    assert_eq!(t.store.loan(id).await.unwrap().status, LoanStatus::Overdue);

    let (_, json) = t.post("/api/v1/loans/overdue-sweep", json!({})).await;
    assert_eq!(json["data"]["notified"], 0);
    assert_eq!(json["data"]["skipped"], 1);
    assert_eq!(t.outbox.subjects().len(), 1);
}
