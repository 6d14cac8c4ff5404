use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn project_without_requirements_cannot_be_submitted() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("pwf1").await;

    let resp = app
        .auth_post(
            &format!("/api/project/{}/submit_for_review", facility.project_id),
            &facility.owner.access_token,
        )
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "invalid_transition");
}

#[tokio::test]
async fn submit_review_and_approve() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("pwf2").await;

    app.create_requirement(
        &facility.owner.access_token,
        &facility.service_id,
        &facility.cpu_id,
        4,
    )
    .await;

    let resp = app
        .auth_post(
            &format!("/api/project/{}/submit_for_review", facility.project_id),
            &facility.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "under_review");

    // Submitting again is an invalid transition
    let resp = app
        .auth_post(
            &format!("/api/project/{}/submit_for_review", facility.project_id),
            &facility.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // The owner cannot approve their own project
    let resp = app
        .auth_post(
            &format!("/api/project/{}/approve", facility.project_id),
            &facility.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // The consortium manager can
    let resp = app
        .auth_post(
            &format!("/api/project/{}/approve", facility.project_id),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "approved");
}

#[tokio::test]
async fn request_changes_returns_project_to_editable() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("pwf3").await;

    app.create_requirement(
        &facility.owner.access_token,
        &facility.service_id,
        &facility.cpu_id,
        4,
    )
    .await;

    app.auth_post(
        &format!("/api/project/{}/submit_for_review", facility.project_id),
        &facility.owner.access_token,
    )
    .send()
    .await
    .unwrap();

    let resp = app
        .auth_post(
            &format!("/api/project/{}/request_changes", facility.project_id),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "editable");

    // Requesting changes again is an invalid transition
    let resp = app
        .auth_post(
            &format!("/api/project/{}/request_changes", facility.project_id),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn approve_requires_review_state() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("pwf4").await;

    let resp = app
        .auth_post(
            &format!("/api/project/{}/approve", facility.project_id),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "invalid_transition");
}

#[tokio::test]
async fn projects_under_review_are_not_editable() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("pwf5").await;

    app.create_requirement(
        &facility.owner.access_token,
        &facility.service_id,
        &facility.cpu_id,
        1,
    )
    .await;

    app.auth_post(
        &format!("/api/project/{}/submit_for_review", facility.project_id),
        &facility.owner.access_token,
    )
    .send()
    .await
    .unwrap();

    // No detail edits
    let resp = app
        .auth_put(
            &format!("/api/project/{}", facility.project_id),
            &facility.owner.access_token,
        )
        .json(&serde_json::json!({ "description": "new words" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // No new services
    let resp = app
        .auth_post(
            &format!("/api/project/{}/service", facility.project_id),
            &facility.owner.access_token,
        )
        .json(&serde_json::json!({
            "name": "pwf5-extra",
            "category_id": facility.category_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn only_owners_submit_for_review() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("pwf6").await;

    app.create_requirement(
        &facility.owner.access_token,
        &facility.service_id,
        &facility.cpu_id,
        1,
    )
    .await;

    // The manager is not a collaborator, let alone an owner
    let resp = app
        .auth_post(
            &format!("/api/project/{}/submit_for_review", facility.project_id),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}
