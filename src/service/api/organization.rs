use arion_core::{
    CreateOrganizationRequest, ListOrganizationsResponse, ListRolesResponse, OrganizationResponse,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use super::{json_body, AppState};
use crate::acl::Caller;
use crate::error::ApiError;

pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ListOrganizationsResponse>, ApiError> {
    let organizations = state.organization_service.list(&caller).await?;

    Ok(Json(ListOrganizationsResponse {
        ok: true,
        organizations: organizations.into_iter().map(Into::into).collect(),
    }))
}

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CreateOrganizationRequest>, JsonRejection>,
) -> Result<Json<OrganizationResponse>, ApiError> {
    let request = json_body(payload)?;

    let organization = state
        .organization_service
        .create(&caller, &request.name)
        .await?;

    Ok(Json(OrganizationResponse {
        ok: true,
        organization: organization.into(),
    }))
}

pub async fn list_roles(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ListRolesResponse>, ApiError> {
    let roles = state.organization_service.list_roles(&caller).await?;

    Ok(Json(ListRolesResponse {
        ok: true,
        roles: roles.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use arion_core::Role;
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::tests::TestApp;
    use crate::runpod::mock::MockBehavior;

    #[tokio::test]
    async fn test_only_platform_admins_create_organizations() {
        let app = TestApp::new(MockBehavior::default()).await;
        let (_, org_admin) = app.user("admin@example.com", Role::OrgAdmin).await;
        let (_, platform_admin) = app.user("root@example.com", Role::ArionAdmin).await;

        let (status, _) = app
            .call(
                "POST",
                "/api/admin/organizations",
                Some(&org_admin),
                Some(json!({ "name": "Initech" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, created) = app
            .call(
                "POST",
                "/api/admin/organizations",
                Some(&platform_admin),
                Some(json!({ "name": "Initech" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["organization"]["name"], "Initech");

        let (status, _) = app
            .call(
                "POST",
                "/api/admin/organizations",
                Some(&platform_admin),
                Some(json!({ "name": "Initech" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, listed) = app
            .call("GET", "/api/admin/organizations", Some(&platform_admin), None)
            .await;
        assert_eq!(listed["organizations"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_roles_are_listed_for_admins() {
        let app = TestApp::new(MockBehavior::default()).await;
        let (_, admin) = app.user("admin@example.com", Role::OrgAdmin).await;

        let (status, body) = app.call("GET", "/api/admin/roles", Some(&admin), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roles"].as_array().unwrap().len(), 3);
    }
}
