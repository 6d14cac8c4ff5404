use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn quota_scenario_approvals_stop_at_the_ceiling() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("rwf1").await;

    // The consortium quota for CPU is 8
    let first = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.cpu_id,
            8,
        )
        .await;
    let second = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.cpu_id,
            1,
        )
        .await;

    let resp = app
        .auth_post(
            &format!("/api/requirement/{first}/approve"),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "approved");

    let resp = app
        .auth_post(
            &format!("/api/requirement/{second}/approve"),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "quota_exceeded");
    assert_eq!(json["detail"]["requested"], 1);
    assert_eq!(json["detail"]["available"], 0);
}

#[tokio::test]
async fn missing_quota_means_zero_available() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("rwf2").await;

    // A resource in the category but with no quota document for the consortium
    let tape = app
        .create_resource(&facility.staff.access_token, "rwf2 Tape", "TB", 50)
        .await;
    let resp = app
        .auth_put(
            &format!("/api/category/{}", facility.category_id),
            &facility.staff.access_token,
        )
        .json(&serde_json::json!({
            "resource_ids": [facility.cpu_id, facility.disk_id, tape],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let requirement = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &tape,
            1,
        )
        .await;

    let resp = app
        .auth_post(
            &format!("/api/requirement/{requirement}/approve"),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "quota_exceeded");
    assert_eq!(json["detail"]["available"], 0);
}

#[tokio::test]
async fn no_jump_from_requested_to_provisioned() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("rwf3").await;

    let requirement = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.cpu_id,
            1,
        )
        .await;

    let resp = app
        .auth_post(
            &format!("/api/requirement/{requirement}/provision"),
            &facility.staff.access_token,
        )
        .json(&serde_json::json!({ "location": "rack-42" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "invalid_transition");
}

#[tokio::test]
async fn provisioned_is_terminal() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("rwf4").await;

    let requirement = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.cpu_id,
            2,
        )
        .await;

    app.auth_post(
        &format!("/api/requirement/{requirement}/approve"),
        &facility.manager.access_token,
    )
    .send()
    .await
    .unwrap();

    let resp = app
        .auth_post(
            &format!("/api/requirement/{requirement}/provision"),
            &facility.staff.access_token,
        )
        .json(&serde_json::json!({ "location": "panasas://vol1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "provisioned");
    assert_eq!(json["location"], "panasas://vol1");

    // No way out of provisioned
    let resp = app
        .auth_post(
            &format!("/api/requirement/{requirement}/decline"),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    let resp = app
        .auth_post(
            &format!("/api/requirement/{requirement}/approve"),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn decline_is_terminal_and_not_repeatable() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("rwf5").await;

    let requirement = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.cpu_id,
            2,
        )
        .await;

    let resp = app
        .auth_post(
            &format!("/api/requirement/{requirement}/decline"),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "declined");

    // The second decline is an invalid transition
    let resp = app
        .auth_post(
            &format!("/api/requirement/{requirement}/decline"),
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
async fn declined_requirements_release_their_claim() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("rwf6").await;

    let first = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.cpu_id,
            8,
        )
        .await;
    let second = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.cpu_id,
            8,
        )
        .await;

    app.auth_post(
        &format!("/api/requirement/{first}/approve"),
        &facility.manager.access_token,
    )
    .send()
    .await
    .unwrap();

    // Quota is full, the second cannot be approved...
    let resp = app
        .auth_post(
            &format!("/api/requirement/{second}/approve"),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // ...until the first is declined
    let resp = app
        .auth_post(
            &format!("/api/requirement/{first}/decline"),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_post(
            &format!("/api/requirement/{second}/approve"),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn amend_only_while_requested() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("rwf7").await;

    let requirement = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.cpu_id,
            2,
        )
        .await;

    // Amending a requested requirement works, even past the quota (the
    // quota check only happens at approval)
    let resp = app
        .auth_put(
            &format!("/api/requirement/{requirement}"),
            &facility.owner.access_token,
        )
        .json(&serde_json::json!({ "amount": 500 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["amount"], 500);

    // An amount that large can then never be approved
    let resp = app
        .auth_post(
            &format!("/api/requirement/{requirement}/approve"),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "quota_exceeded");

    // Bring it back into range, approve, and amendment is now refused
    app.auth_put(
        &format!("/api/requirement/{requirement}"),
        &facility.owner.access_token,
    )
    .json(&serde_json::json!({ "amount": 3 }))
    .send()
    .await
    .unwrap();

    app.auth_post(
        &format!("/api/requirement/{requirement}/approve"),
        &facility.manager.access_token,
    )
    .send()
    .await
    .unwrap();

    let resp = app
        .auth_put(
            &format!("/api/requirement/{requirement}"),
            &facility.owner.access_token,
        )
        .json(&serde_json::json!({ "amount": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "invalid_transition");
}

#[tokio::test]
async fn only_the_manager_approves() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("rwf8").await;

    let requirement = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.cpu_id,
            1,
        )
        .await;

    let resp = app
        .auth_post(
            &format!("/api/requirement/{requirement}/approve"),
            &facility.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // Provisioning is staff-only, even for the manager
    app.auth_post(
        &format!("/api/requirement/{requirement}/approve"),
        &facility.manager.access_token,
    )
    .send()
    .await
    .unwrap();

    let resp = app
        .auth_post(
            &format!("/api/requirement/{requirement}/provision"),
            &facility.manager.access_token,
        )
        .json(&serde_json::json!({ "location": "rack-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

/// Two simultaneous approvals that would jointly exceed the quota: exactly
/// one must succeed; the other fails with quota_exceeded or the transient
/// conflict error.
#[tokio::test]
async fn concurrent_approvals_cannot_jointly_exceed_quota() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("rwf9").await;

    // Quota is 8; each requirement alone fits, together they do not
    let first = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.cpu_id,
            5,
        )
        .await;
    let second = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.cpu_id,
            5,
        )
        .await;

    let approve_first = app
        .auth_post(
            &format!("/api/requirement/{first}/approve"),
            &facility.manager.access_token,
        )
        .send();
    let approve_second = app
        .auth_post(
            &format!("/api/requirement/{second}/approve"),
            &facility.manager.access_token,
        )
        .send();

    let (first_resp, second_resp) = futures::join!(approve_first, approve_second);
    let statuses = [
        first_resp.unwrap().status().as_u16(),
        second_resp.unwrap().status().as_u16(),
    ];

    let successes = statuses.iter().filter(|s| **s == 200).count();
    let refusals = statuses.iter().filter(|s| **s == 409).count();
    assert_eq!(successes, 1, "exactly one approval must win: {statuses:?}");
    assert_eq!(refusals, 1, "the loser must be told to back off: {statuses:?}");

    // The invariant holds: consumption never exceeded the quota
    let resp = app
        .auth_get(
            &format!("/api/consortium/{}/quota", facility.consortium_id),
            &facility.manager.access_token,
        )
        .send()
        .await
        .unwrap();
    let report: Vec<Value> = resp.json().await.unwrap();
    let cpu = report
        .iter()
        .find(|r| r["resource_id"] == facility.cpu_id.as_str())
        .unwrap();
    assert_eq!(cpu["consumed"], 5);
    assert_eq!(cpu["available"], 3);
}

#[tokio::test]
async fn delete_only_while_requested() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("rwf10").await;

    let requirement = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.cpu_id,
            1,
        )
        .await;

    app.auth_post(
        &format!("/api/requirement/{requirement}/approve"),
        &facility.manager.access_token,
    )
    .send()
    .await
    .unwrap();

    let resp = app
        .auth_delete(
            &format!("/api/requirement/{requirement}"),
            &facility.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}
