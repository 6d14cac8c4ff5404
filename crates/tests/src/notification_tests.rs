use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn manager_is_notified_on_submit_for_review() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("ntf1").await;

    app.create_requirement(
        &facility.owner.access_token,
        &facility.service_id,
        &facility.cpu_id,
        2,
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

    let resp = app
        .auth_get("/api/notification", &facility.manager.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let events: Vec<&str> = json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["event"].as_str().unwrap())
        .collect();
    assert!(events.contains(&"project.submitted_for_review"));

    // The acting owner does not hear about their own submission
    let resp = app
        .auth_get("/api/notification", &facility.owner.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn collaborators_hear_about_provisioning() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("ntf2").await;

    let requirement = app
        .create_requirement(
            &facility.owner.access_token,
            &facility.service_id,
            &facility.disk_id,
            40,
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
        .json(&serde_json::json!({ "location": "quobyte://vol7" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_get("/api/notification", &facility.owner.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    let events: Vec<&str> = json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["event"].as_str().unwrap())
        .collect();
    assert!(events.contains(&"requirement.approved"));
    assert!(events.contains(&"requirement.provisioned"));
}

#[tokio::test]
async fn invitee_notification_and_mark_read() {
    let app = TestApp::spawn().await;
    let facility = app.seed_facility("ntf3").await;

    let invitee = app
        .register_user("ntf3-new@example.org", "ntf3_new", "Newcomer", "sup3r-secret-pw")
        .await;

    app.auth_post(
        &format!("/api/project/{}/invitation", facility.project_id),
        &facility.owner.access_token,
    )
    .json(&serde_json::json!({ "email": "ntf3-new@example.org" }))
    .send()
    .await
    .unwrap();

    let resp = app
        .auth_get("/api/notification?unread_only=true", &invitee.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 1);
    let notification = &json["items"][0];
    assert_eq!(notification["event"], "invitation.created");
    let notification_id = notification["id"].as_str().unwrap();

    let resp = app
        .auth_put(
            &format!("/api/notification/{notification_id}/read"),
            &invitee.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["is_read"], true);

    let resp = app
        .auth_get("/api/notification?unread_only=true", &invitee.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 0);

    // Nobody else can mark it read
    let resp = app
        .auth_put(
            &format!("/api/notification/{notification_id}/read"),
            &facility.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
