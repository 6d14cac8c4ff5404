use bson::{doc, oid::ObjectId};
use serde_json::Value;

use super::test_app::TestApp;

/// Result of seeding a full facility: users, catalog, a consortium with
/// quotas, and a project with one service.
pub struct SeededFacility {
    pub staff: SeededUser,
    pub manager: SeededUser,
    pub owner: SeededUser,
    pub consortium_id: String,
    pub category_id: String,
    /// Unitless resource with a consortium quota of 8.
    pub cpu_id: String,
    /// "GB" resource with a consortium quota of 100.
    pub disk_id: String,
    pub project_id: String,
    pub service_id: String,
}

pub struct SeededUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestApp {
    /// Register a user and return their auth info.
    pub async fn register_user(
        &self,
        email: &str,
        username: &str,
        display_name: &str,
        password: &str,
    ) -> SeededUser {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "email": email,
                "username": username,
                "display_name": display_name,
                "password": password,
            }))
            .send()
            .await
            .expect("Register request failed");

        let status = resp.status().as_u16();
        let json: Value = resp.json().await.expect("Failed to parse register response");
        assert_eq!(status, 201, "Register failed: {json}");

        SeededUser {
            id: json["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            username: username.to_string(),
            access_token: json["access_token"].as_str().unwrap().to_string(),
            refresh_token: json["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> SeededUser {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Login request failed");

        let status = resp.status().as_u16();
        let json: Value = resp.json().await.expect("Failed to parse login response");
        assert_eq!(status, 200, "Login failed: {json}");

        SeededUser {
            id: json["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            username: json["user"]["username"].as_str().unwrap().to_string(),
            access_token: json["access_token"].as_str().unwrap().to_string(),
            refresh_token: json["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Flip the staff flag directly in the database and log in again so the
    /// new claims take effect.
    pub async fn make_staff(&self, user: &SeededUser, password: &str) -> SeededUser {
        let user_id = ObjectId::parse_str(&user.id).unwrap();
        self.db
            .collection::<bson::Document>("users")
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": { "is_staff": true } },
            )
            .await
            .expect("Failed to set staff flag");

        self.login_user(&user.email, password).await
    }

    /// Seed a complete facility under a (lowercase) prefix: a staff user,
    /// a consortium with a manager and quotas (CPU = 8, Disk = 100), and a
    /// project owned by a third user with one service.
    pub async fn seed_facility(&self, prefix: &str) -> SeededFacility {
        let password = "sup3r-secret-pw";

        let staff = self
            .register_user(
                &format!("{prefix}-staff@example.org"),
                &format!("{prefix}_staff"),
                "Staff User",
                password,
            )
            .await;
        let staff = self.make_staff(&staff, password).await;

        let manager = self
            .register_user(
                &format!("{prefix}-manager@example.org"),
                &format!("{prefix}_manager"),
                "Consortium Manager",
                password,
            )
            .await;

        let owner = self
            .register_user(
                &format!("{prefix}-owner@example.org"),
                &format!("{prefix}_owner"),
                "Project Owner",
                password,
            )
            .await;

        let cpu_id = self
            .create_resource(&staff.access_token, &format!("{prefix} CPU"), "", 100)
            .await;
        let disk_id = self
            .create_resource(&staff.access_token, &format!("{prefix} Disk"), "GB", 1000)
            .await;

        let resp = self
            .auth_post("/api/category", &staff.access_token)
            .json(&serde_json::json!({
                "name": format!("{prefix} Group Workspace"),
                "is_public": true,
                "resource_ids": [cpu_id, disk_id],
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let category: Value = resp.json().await.unwrap();
        let category_id = category["id"].as_str().unwrap().to_string();

        let resp = self
            .auth_post("/api/consortium", &staff.access_token)
            .json(&serde_json::json!({
                "name": format!("{prefix} consortium"),
                "description": "Seeded consortium",
                "manager_id": manager.id,
                "is_public": true,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let consortium: Value = resp.json().await.unwrap();
        let consortium_id = consortium["id"].as_str().unwrap().to_string();

        self.set_quota(&staff.access_token, &consortium_id, &cpu_id, 8)
            .await;
        self.set_quota(&staff.access_token, &consortium_id, &disk_id, 100)
            .await;

        let resp = self
            .auth_post("/api/project", &owner.access_token)
            .json(&serde_json::json!({
                "name": format!("{prefix}-project"),
                "description": "Seeded project",
                "consortium_id": consortium_id,
                "tags": ["seeded"],
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let project: Value = resp.json().await.unwrap();
        let project_id = project["id"].as_str().unwrap().to_string();

        let resp = self
            .auth_post(
                &format!("/api/project/{project_id}/service"),
                &owner.access_token,
            )
            .json(&serde_json::json!({
                "name": format!("{prefix}-svc"),
                "category_id": category_id,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let service: Value = resp.json().await.unwrap();
        let service_id = service["id"].as_str().unwrap().to_string();

        SeededFacility {
            staff,
            manager,
            owner,
            consortium_id,
            category_id,
            cpu_id,
            disk_id,
            project_id,
            service_id,
        }
    }

    pub async fn create_resource(
        &self,
        token: &str,
        name: &str,
        units: &str,
        total_available: i64,
    ) -> String {
        let resp = self
            .auth_post("/api/resource", token)
            .json(&serde_json::json!({
                "name": name,
                "units": units,
                "total_available": total_available,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let json: Value = resp.json().await.unwrap();
        json["id"].as_str().unwrap().to_string()
    }

    pub async fn set_quota(&self, token: &str, consortium_id: &str, resource_id: &str, amount: i64) {
        let resp = self
            .auth_put(&format!("/api/consortium/{consortium_id}/quota"), token)
            .json(&serde_json::json!({
                "resource_id": resource_id,
                "amount": amount,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    /// Create a requirement on a service and return its id.
    pub async fn create_requirement(
        &self,
        token: &str,
        service_id: &str,
        resource_id: &str,
        amount: i64,
    ) -> String {
        let resp = self
            .auth_post(&format!("/api/service/{service_id}/requirement"), token)
            .json(&serde_json::json!({
                "resource_id": resource_id,
                "amount": amount,
            }))
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        let json: Value = resp.json().await.unwrap();
        assert_eq!(status, 200, "Requirement creation failed: {json}");
        json["id"].as_str().unwrap().to_string()
    }
}
