use arion_core::{
    InviteRequest, InviteResponse, ListUsersResponse, OkResponse, UpdateProfileRequest,
    UserResponse,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use uuid::Uuid;

use super::{json_body, AppState};
use crate::acl::Caller;
use crate::error::ApiError;

pub async fn invite(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<InviteRequest>, JsonRejection>,
) -> Result<Json<InviteResponse>, ApiError> {
    let request = json_body(payload)?;

    let response = state.account_service.invite(&caller, &request).await?;

    Ok(Json(response))
}

pub async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ListUsersResponse>, ApiError> {
    let users = state.account_service.list_users(&caller).await?;

    Ok(Json(ListUsersResponse { ok: true, users }))
}

pub async fn update_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<Uuid>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let request = json_body(payload)?;

    let user = state
        .account_service
        .update_user(&caller, &user_id, &request)
        .await?;

    Ok(Json(UserResponse { ok: true, user }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<Uuid>,
) -> Result<Json<OkResponse>, ApiError> {
    state.account_service.delete_user(&caller, &user_id).await?;

    Ok(Json(OkResponse { ok: true }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.account_service.get_profile(&caller).await?;

    Ok(Json(UserResponse { ok: true, user }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let request = json_body(payload)?;

    let user = state
        .account_service
        .update_profile(&caller, &request)
        .await?;

    Ok(Json(UserResponse { ok: true, user }))
}

#[cfg(test)]
mod tests {
    use arion_core::Role;
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::tests::TestApp;
    use crate::runpod::mock::MockBehavior;

    #[tokio::test]
    async fn test_invite_then_invitee_signs_in() {
        let app = TestApp::new(MockBehavior::default()).await;
        let (_, admin_token) = app.user("admin@example.com", Role::OrgAdmin).await;

        let (status, invited) = app
            .call(
                "POST",
                "/api/invite",
                Some(&admin_token),
                Some(json!({
                    "email": "Grace@Example.com",
                    "first_name": "Grace",
                    "role": "workspace_user"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(invited["organizationId"], app.organization.id.to_string());

        let (status, users) = app
            .call("GET", "/api/admin/users", Some(&admin_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let emails: Vec<&str> = users["users"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|user| user["email"].as_str())
            .collect();
        assert!(emails.contains(&"grace@example.com"));
    }

    #[tokio::test]
    async fn test_workspace_user_cannot_invite() {
        let app = TestApp::new(MockBehavior::default()).await;
        let (_, token) = app.user("ada@example.com", Role::WorkspaceUser).await;

        let (status, body) = app
            .call(
                "POST",
                "/api/invite",
                Some(&token),
                Some(json!({ "email": "someone@example.com" })),
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn test_profile_update_cannot_change_role() {
        let app = TestApp::new(MockBehavior::default()).await;
        let (_, token) = app.user("ada@example.com", Role::WorkspaceUser).await;

        let (status, _) = app
            .call(
                "PATCH",
                "/api/profile",
                Some(&token),
                Some(json!({ "role": "org_admin" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, profile) = app
            .call(
                "PATCH",
                "/api/profile",
                Some(&token),
                Some(json!({ "job_title": "Engineer" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["user"]["job_title"], "Engineer");
        assert_eq!(profile["user"]["role"], "workspace_user");
    }

    #[tokio::test]
    async fn test_admin_deletes_user() {
        let app = TestApp::new(MockBehavior::default()).await;
        let (admin_id, admin_token) = app.user("admin@example.com", Role::OrgAdmin).await;
        let (user_id, _) = app.user("ada@example.com", Role::WorkspaceUser).await;

        let (status, _) = app
            .call(
                "DELETE",
                &format!("/api/admin/users/{admin_id}"),
                Some(&admin_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .call(
                "DELETE",
                &format!("/api/admin/users/{user_id}"),
                Some(&admin_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }
}
