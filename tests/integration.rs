use axum::http::{HeaderMap, HeaderValue};
use std::sync::Arc;
use std::time::Duration;

use arion::{
    acl::{Authenticator, Caller},
    config::ProvisioningConfig,
    models::Profile,
    persistence::{
        memory::{
            MembershipMemoryPersistence, OrderMemoryPersistence, OrganizationMemoryPersistence,
            ProfileMemoryPersistence,
        },
        Persistence,
    },
    runpod::mock::{MockBehavior, MockGpuCloud},
    services::{AccountService, OrderService},
    supabase::mock::MockIdentityProvider,
};
use arion_core::{test::get_create_order_fixture, InviteRequest, OrderStatus, Role};

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

#[tokio::test]
async fn test_e2e() {
    let identity = Arc::new(MockIdentityProvider::default());
    let cloud = Arc::new(MockGpuCloud::new(MockBehavior {
        polls_until_ready: 2,
        ..Default::default()
    }));
    let profiles = Arc::new(ProfileMemoryPersistence::default());
    let organizations = Arc::new(OrganizationMemoryPersistence::default());
    let memberships = Arc::new(MembershipMemoryPersistence::default());

    let authenticator = Authenticator {
        identity: identity.clone(),
        profiles: profiles.clone(),
        memberships: memberships.clone(),
    };

    let account_service = AccountService {
        profiles: profiles.clone(),
        organizations: organizations.clone(),
        memberships: memberships.clone(),
        identity: identity.clone(),
        invite_redirect_url: Some("https://app.arionflow.example/welcome".to_owned()),
    };

    let order_service = OrderService {
        persistence: Box::<OrderMemoryPersistence>::default(),
        cloud: cloud.clone(),
        provisioning: ProvisioningConfig {
            poll_interval: Duration::ZERO,
            ..Default::default()
        },
    };

    // seed a platform administrator
    let (root_id, root_token) = identity.sign_in("root@arionflow.example");
    let mut root_profile = Profile::new(root_id, "root@arionflow.example", Role::ArionAdmin);
    root_profile.authorized = true;
    profiles.upsert(&root_profile).await.unwrap();

    let root: Caller = authenticator.authenticate(&bearer(&root_token)).await.unwrap();
    assert!(root.organization_ids.is_empty());

    // onboard a customer organization with its administrator
    let invited_admin = account_service
        .invite(
            &root,
            &InviteRequest {
                email: "admin@initech.example".to_owned(),
                role: Some(Role::OrgAdmin),
                organization_name: Some("Initech".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(identity.invited(), vec!["admin@initech.example".to_owned()]);

    let admin_token = identity.issue_token(&invited_admin.user_id).unwrap();
    let admin = authenticator.authenticate(&bearer(&admin_token)).await.unwrap();
    assert_eq!(admin.role, Role::OrgAdmin);
    assert_eq!(admin.organization_ids, vec![invited_admin.organization_id]);

    // the organization admin adds a workspace user to their own organization
    let invited_user = account_service
        .invite(
            &admin,
            &InviteRequest {
                email: "milton@initech.example".to_owned(),
                role: Some(Role::WorkspaceUser),
                password: Some("red-stapler".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(invited_user.organization_id, invited_admin.organization_id);

    let user_token = identity.issue_token(&invited_user.user_id).unwrap();
    let user = authenticator.authenticate(&bearer(&user_token)).await.unwrap();

    // provision a workspace
    let mut request = get_create_order_fixture(Some("fine-tune"));
    request.gpu_type = "Performance".to_owned();

    let provisioned = order_service.provision(&user, &request).await.unwrap();
    assert!(provisioned.pod_ready);
    assert_eq!(
        provisioned.workspace_url,
        format!("https://{}-8888.proxy.runpod.net", provisioned.pod_id)
    );

    // the admin shares the organization and sees the order
    let visible = order_service.list(&admin).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].status, OrderStatus::Running);

    let telemetry = order_service
        .telemetry(&user, &provisioned.order_id)
        .await
        .unwrap();
    assert_eq!(telemetry.runtime_status, "RUNNING");
    assert_eq!(telemetry.volume_size_gb, Some(100));

    let stored = order_service
        .get_by_id(&admin, &provisioned.order_id)
        .await
        .unwrap();
    assert_eq!(stored.runtime_status.as_deref(), Some("RUNNING"));
    assert_eq!(stored.uptime_seconds, Some(telemetry.uptime_seconds));

    // tear it down, including the workspace volume
    let terminated = order_service
        .terminate(&user, &provisioned.order_id, true)
        .await
        .unwrap();
    assert!(terminated.volume_deleted);
    assert!(!cloud.pod_exists(&provisioned.pod_id));
    assert!(!cloud.volume_exists(&provisioned.volume_id));

    let deleted = order_service
        .get_by_id(&user, &provisioned.order_id)
        .await
        .unwrap();
    assert_eq!(deleted.status, OrderStatus::Deleted);
    assert!(deleted.pod_id.is_none());
    assert!(deleted.volume_id.is_none());

    // offboarding removes the account and its access
    account_service
        .delete_user(&admin, &invited_user.user_id)
        .await
        .unwrap();
    assert!(authenticator.authenticate(&bearer(&user_token)).await.is_err());
}
