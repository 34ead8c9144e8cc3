use arion_core::{
    InviteRequest, InviteResponse, MemberRole, ProfileMessage, Role, UpdateProfileRequest,
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use super::saga::{Compensation, Compensator, Saga};
use crate::acl::Caller;
use crate::error::ApiError;
use crate::models::{Organization, OrganizationUser, Profile};
use crate::persistence::{
    MembershipPersistence, OrganizationPersistence, Persistence, ProfilePersistence,
};
use crate::supabase::{IdentityProvider, UserMetadata};

/// User administration: invites, the admin user list and self-service profile edits.
pub struct AccountService {
    pub profiles: Arc<dyn ProfilePersistence>,
    pub organizations: Arc<dyn OrganizationPersistence>,
    pub memberships: Arc<dyn MembershipPersistence>,
    pub identity: Arc<dyn IdentityProvider>,
    pub invite_redirect_url: Option<String>,
}

#[async_trait]
impl Compensator for AccountService {
    async fn compensate(&self, step: &Compensation) -> anyhow::Result<()> {
        match step {
            Compensation::DeleteAuthUser(user_id) => {
                self.identity.delete_user(user_id).await?;
                // profiles follow their auth user
                self.profiles.delete(user_id).await?;
            }
            Compensation::DeleteOrganization(organization_id) => {
                self.organizations.delete(organization_id).await?;
            }
            other => anyhow::bail!("account workflow cannot compensate '{other}'"),
        }

        Ok(())
    }
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl AccountService {
    async fn organization_ids_of(&self, user_id: &Uuid) -> anyhow::Result<Vec<Uuid>> {
        let organization_ids = self
            .memberships
            .get_by_user_id(user_id)
            .await?
            .into_iter()
            .map(|membership| membership.organization_id)
            .collect();

        Ok(organization_ids)
    }

    /// Loads a profile the caller is allowed to administer.
    async fn managed_profile(&self, caller: &Caller, user_id: &Uuid) -> Result<Profile, ApiError> {
        caller.require_admin()?;

        let profile = match self.profiles.get_by_id(user_id).await? {
            Some(profile) => profile,
            None => return Err(ApiError::NotFound(format!("user {user_id} not found"))),
        };

        if caller.is_arion_admin() {
            return Ok(profile);
        }

        let shares_organization = self
            .organization_ids_of(user_id)
            .await?
            .iter()
            .any(|organization_id| caller.is_member_of(organization_id));

        if !shares_organization {
            return Err(ApiError::Forbidden(format!(
                "user {user_id} is outside your organizations"
            )));
        }

        if profile.role == Role::ArionAdmin {
            return Err(ApiError::Forbidden(
                "platform administrators can only be managed by platform administrators"
                    .to_string(),
            ));
        }

        Ok(profile)
    }

    async fn invite_organization(
        &self,
        caller: &Caller,
        request: &InviteRequest,
        saga: &mut Saga,
    ) -> Result<Uuid, ApiError> {
        if let Some(name) = clean(&request.organization_name) {
            caller.require_arion_admin()?;

            if self.organizations.get_by_name(&name).await?.is_some() {
                return Err(ApiError::Conflict(format!(
                    "organization '{name}' already exists"
                )));
            }

            let organization = Organization::new(&name);
            self.organizations.upsert(&organization).await?;
            saga.record(Compensation::DeleteOrganization(organization.id));

            tracing::info!(organization_id = %organization.id, "organization created for invite");

            return Ok(organization.id);
        }

        match request.organization_id {
            Some(organization_id) => {
                if !caller.can_access_organization(&organization_id) {
                    return Err(ApiError::Forbidden(format!(
                        "not a member of organization {organization_id}"
                    )));
                }

                if self.organizations.get_by_id(&organization_id).await?.is_none() {
                    return Err(ApiError::NotFound(format!(
                        "organization {organization_id} not found"
                    )));
                }

                Ok(organization_id)
            }
            None if caller.is_arion_admin() => Err(ApiError::Validation(
                "organization_id or organization_name is required".to_string(),
            )),
            None => caller.organization_ids.first().copied().ok_or_else(|| {
                ApiError::Forbidden("caller does not belong to an organization".to_string())
            }),
        }
    }

    #[tracing::instrument(name = "service::account::invite", skip_all, fields(caller = %caller.user_id))]
    pub async fn invite(
        &self,
        caller: &Caller,
        request: &InviteRequest,
    ) -> Result<InviteResponse, ApiError> {
        caller.require_admin()?;

        let email = request.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::Validation("a valid email is required".to_string()));
        }

        let role = request.role.unwrap_or(Role::WorkspaceUser);
        if role == Role::ArionAdmin && !caller.is_arion_admin() {
            return Err(ApiError::Forbidden(
                "only platform administrators can grant arion_admin".to_string(),
            ));
        }

        let mut saga = Saga::new("invite");
        let organization_id = self.invite_organization(caller, request, &mut saga).await?;

        let metadata = UserMetadata {
            first_name: clean(&request.first_name),
            last_name: clean(&request.last_name),
            role: role.as_str().to_string(),
            organization_id: Some(organization_id),
        };

        let created = match clean(&request.password) {
            Some(password) => self.identity.create_user(&email, &password, &metadata).await,
            None => {
                self.identity
                    .invite_user_by_email(&email, self.invite_redirect_url.as_deref(), &metadata)
                    .await
            }
        };

        let user = match created {
            Ok(user) => user,
            Err(err) => {
                saga.unwind(self).await;
                return Err(err.into());
            }
        };
        saga.record(Compensation::DeleteAuthUser(user.id));

        let mut profile = Profile::new(user.id, &email, role);
        profile.first_name = metadata.first_name.clone();
        profile.last_name = metadata.last_name.clone();
        profile.job_title = clean(&request.job_title);
        profile.phone = clean(&request.phone);
        profile.authorized = true;

        if let Err(err) = self.profiles.upsert(&profile).await {
            saga.unwind(self).await;
            return Err(ApiError::Internal(err.context("profile upsert failed")));
        }

        let membership = OrganizationUser {
            user_id: user.id,
            organization_id,
            role: if role == Role::OrgAdmin {
                MemberRole::Admin
            } else {
                MemberRole::Member
            },
        };

        if let Err(err) = self.memberships.add(&membership).await {
            saga.unwind(self).await;
            return Err(ApiError::Internal(err.context("organization link failed")));
        }

        saga.commit();

        tracing::info!(user_id = %user.id, %organization_id, "user invited");

        Ok(InviteResponse {
            ok: true,
            user_id: user.id,
            organization_id,
        })
    }

    #[tracing::instrument(name = "service::account::list_users", skip_all)]
    pub async fn list_users(&self, caller: &Caller) -> Result<Vec<ProfileMessage>, ApiError> {
        caller.require_admin()?;

        let profiles = if caller.is_arion_admin() {
            self.profiles.list().await?
        } else {
            let user_ids: BTreeSet<Uuid> = self
                .memberships
                .get_by_organization_ids(&caller.organization_ids)
                .await?
                .into_iter()
                .map(|membership| membership.user_id)
                .collect();
            let user_ids: Vec<Uuid> = user_ids.into_iter().collect();

            self.profiles.get_by_ids(&user_ids).await?
        };

        let mut users = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let mut organization_ids = self.organization_ids_of(&profile.id).await?;
            if !caller.is_arion_admin() {
                organization_ids.retain(|organization_id| caller.is_member_of(organization_id));
            }

            users.push(profile.into_message(organization_ids));
        }

        Ok(users)
    }

    #[tracing::instrument(name = "service::account::update_user", skip(self, caller, request))]
    pub async fn update_user(
        &self,
        caller: &Caller,
        user_id: &Uuid,
        request: &UpdateProfileRequest,
    ) -> Result<ProfileMessage, ApiError> {
        let mut profile = self.managed_profile(caller, user_id).await?;

        if request.role == Some(Role::ArionAdmin) && !caller.is_arion_admin() {
            return Err(ApiError::Forbidden(
                "only platform administrators can grant arion_admin".to_string(),
            ));
        }

        apply_contact_fields(&mut profile, request);
        if let Some(authorized) = request.authorized {
            profile.authorized = authorized;
        }
        if let Some(role) = request.role {
            profile.role = role;
        }

        self.profiles.upsert(&profile).await?;

        tracing::info!(user_id = %profile.id, "user updated");

        let organization_ids = self.organization_ids_of(&profile.id).await?;

        Ok(profile.into_message(organization_ids))
    }

    #[tracing::instrument(name = "service::account::delete_user", skip(self, caller))]
    pub async fn delete_user(&self, caller: &Caller, user_id: &Uuid) -> Result<(), ApiError> {
        if *user_id == caller.user_id {
            return Err(ApiError::Validation("you cannot delete yourself".to_string()));
        }

        let profile = self.managed_profile(caller, user_id).await?;

        self.memberships.remove_all_for_user(&profile.id).await?;
        self.profiles.delete_user_and_profile(&profile.id).await?;

        tracing::info!(user_id = %profile.id, "user deleted");

        Ok(())
    }

    #[tracing::instrument(name = "service::account::get_profile", skip_all)]
    pub async fn get_profile(&self, caller: &Caller) -> Result<ProfileMessage, ApiError> {
        let profile = match self.profiles.get_by_id(&caller.user_id).await? {
            Some(profile) => profile,
            None => return Err(ApiError::NotFound("profile not found".to_string())),
        };

        Ok(profile.into_message(caller.organization_ids.clone()))
    }

    #[tracing::instrument(name = "service::account::update_profile", skip_all)]
    pub async fn update_profile(
        &self,
        caller: &Caller,
        request: &UpdateProfileRequest,
    ) -> Result<ProfileMessage, ApiError> {
        if request.authorized.is_some() || request.role.is_some() {
            return Err(ApiError::Forbidden(
                "authorization and role are managed by administrators".to_string(),
            ));
        }

        let mut profile = match self.profiles.get_by_id(&caller.user_id).await? {
            Some(profile) => profile,
            None => return Err(ApiError::NotFound("profile not found".to_string())),
        };

        apply_contact_fields(&mut profile, request);
        self.profiles.upsert(&profile).await?;

        Ok(profile.into_message(caller.organization_ids.clone()))
    }
}

fn apply_contact_fields(profile: &mut Profile, request: &UpdateProfileRequest) {
    if request.first_name.is_some() {
        profile.first_name = clean(&request.first_name);
    }
    if request.last_name.is_some() {
        profile.last_name = clean(&request.last_name);
    }
    if request.job_title.is_some() {
        profile.job_title = clean(&request.job_title);
    }
    if request.phone.is_some() {
        profile.phone = clean(&request.phone);
    }
}

#[cfg(test)]
mod tests {
    use arion_core::test::get_invite_fixture;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::persistence::memory::{
        MembershipMemoryPersistence, OrganizationMemoryPersistence, ProfileMemoryPersistence,
    };
    use crate::supabase::mock::{MockIdentityBehavior, MockIdentityProvider};

    /// Profile store whose writes always fail.
    #[derive(Default)]
    struct BrokenProfiles {
        inner: ProfileMemoryPersistence,
    }

    #[async_trait]
    impl Persistence<Profile> for BrokenProfiles {
        async fn upsert(&self, _profile: &Profile) -> anyhow::Result<u64> {
            anyhow::bail!("database unavailable")
        }

        async fn delete(&self, profile_id: &Uuid) -> anyhow::Result<u64> {
            self.inner.delete(profile_id).await
        }

        async fn get_by_id(&self, profile_id: &Uuid) -> anyhow::Result<Option<Profile>> {
            self.inner.get_by_id(profile_id).await
        }

        async fn list(&self) -> anyhow::Result<Vec<Profile>> {
            self.inner.list().await
        }
    }

    #[async_trait]
    impl ProfilePersistence for BrokenProfiles {
        async fn get_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Profile>> {
            self.inner.get_by_ids(ids).await
        }

        async fn touch_last_login(&self, user_id: &Uuid, at: DateTime<Utc>) -> anyhow::Result<u64> {
            self.inner.touch_last_login(user_id, at).await
        }

        async fn delete_user_and_profile(&self, user_id: &Uuid) -> anyhow::Result<u64> {
            self.inner.delete_user_and_profile(user_id).await
        }
    }

    /// Membership store whose inserts always fail.
    #[derive(Default)]
    struct BrokenMemberships {
        inner: MembershipMemoryPersistence,
    }

    #[async_trait]
    impl MembershipPersistence for BrokenMemberships {
        async fn add(&self, _membership: &OrganizationUser) -> anyhow::Result<u64> {
            anyhow::bail!("database unavailable")
        }

        async fn remove_all_for_user(&self, user_id: &Uuid) -> anyhow::Result<u64> {
            self.inner.remove_all_for_user(user_id).await
        }

        async fn get_by_user_id(&self, user_id: &Uuid) -> anyhow::Result<Vec<OrganizationUser>> {
            self.inner.get_by_user_id(user_id).await
        }

        async fn get_by_organization_ids(
            &self,
            organization_ids: &[Uuid],
        ) -> anyhow::Result<Vec<OrganizationUser>> {
            self.inner.get_by_organization_ids(organization_ids).await
        }
    }

    struct Fixture {
        service: AccountService,
        identity: Arc<MockIdentityProvider>,
        organization: Organization,
    }

    async fn fixture_with(
        profiles: Arc<dyn ProfilePersistence>,
        memberships: Arc<dyn MembershipPersistence>,
    ) -> Fixture {
        let identity = Arc::new(MockIdentityProvider::new(MockIdentityBehavior::default()));
        let organizations = Arc::new(OrganizationMemoryPersistence::default());

        let organization = Organization::new("Acme");
        organizations.upsert(&organization).await.unwrap();

        let service = AccountService {
            profiles,
            organizations,
            memberships,
            identity: identity.clone(),
            invite_redirect_url: None,
        };

        Fixture {
            service,
            identity,
            organization,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(
            Arc::new(ProfileMemoryPersistence::default()),
            Arc::new(MembershipMemoryPersistence::default()),
        )
        .await
    }

    fn arion_admin() -> Caller {
        Caller {
            user_id: Uuid::new_v4(),
            email: Some("root@example.com".into()),
            role: Role::ArionAdmin,
            organization_ids: Vec::new(),
        }
    }

    fn org_admin(organization_id: Uuid) -> Caller {
        Caller {
            user_id: Uuid::new_v4(),
            email: Some("lead@example.com".into()),
            role: Role::OrgAdmin,
            organization_ids: vec![organization_id],
        }
    }

    #[tokio::test]
    async fn test_invite_into_existing_organization() {
        let fixture = fixture().await;
        let caller = org_admin(fixture.organization.id);

        let response = fixture
            .service
            .invite(&caller, &get_invite_fixture(None))
            .await
            .unwrap();

        assert_eq!(response.organization_id, fixture.organization.id);
        assert_eq!(fixture.identity.invited(), vec!["invitee@example.com"]);

        let profile = fixture
            .service
            .profiles
            .get_by_id(&response.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.role, Role::WorkspaceUser);
        assert_eq!(profile.first_name.as_deref(), Some("Grace"));

        let memberships = fixture
            .service
            .memberships
            .get_by_user_id(&response.user_id)
            .await
            .unwrap();
        assert_eq!(memberships[0].role, MemberRole::Member);
    }

    #[tokio::test]
    async fn test_invite_with_new_organization_and_password() {
        let fixture = fixture().await;

        let mut request = get_invite_fixture(Some("lead@newco.example"));
        request.organization_name = Some("NewCo".into());
        request.password = Some("correct horse".into());
        request.role = Some(Role::OrgAdmin);

        let response = fixture
            .service
            .invite(&arion_admin(), &request)
            .await
            .unwrap();

        let organization = fixture
            .service
            .organizations
            .get_by_name("NewCo")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.organization_id, organization.id);
        assert!(fixture.identity.invited().is_empty());

        let memberships = fixture
            .service
            .memberships
            .get_by_user_id(&response.user_id)
            .await
            .unwrap();
        assert_eq!(memberships[0].role, MemberRole::Admin);
    }

    #[tokio::test]
    async fn test_org_admin_role_guards() {
        let fixture = fixture().await;
        let caller = org_admin(fixture.organization.id);

        let mut request = get_invite_fixture(None);
        request.role = Some(Role::ArionAdmin);
        let err = fixture.service.invite(&caller, &request).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        let mut request = get_invite_fixture(None);
        request.organization_id = Some(Uuid::new_v4());
        let err = fixture.service.invite(&caller, &request).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        let mut request = get_invite_fixture(None);
        request.organization_name = Some("Shadow Org".into());
        let err = fixture.service.invite(&caller, &request).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        let workspace_user = Caller {
            role: Role::WorkspaceUser,
            ..caller
        };
        let err = fixture
            .service
            .invite(&workspace_user, &get_invite_fixture(None))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let fixture = fixture().await;
        let caller = org_admin(fixture.organization.id);

        fixture
            .service
            .invite(&caller, &get_invite_fixture(None))
            .await
            .unwrap();
        let err = fixture
            .service
            .invite(&caller, &get_invite_fixture(None))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_profile_failure_deletes_auth_user() {
        let fixture = fixture_with(
            Arc::new(BrokenProfiles::default()),
            Arc::new(MembershipMemoryPersistence::default()),
        )
        .await;
        let caller = org_admin(fixture.organization.id);

        let err = fixture
            .service
            .invite(&caller, &get_invite_fixture(None))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);

        let deleted = fixture.identity.deleted();
        assert_eq!(deleted.len(), 1);
        assert!(!fixture.identity.user_exists(&deleted[0]));
    }

    #[tokio::test]
    async fn test_link_failure_deletes_auth_user_and_new_organization() {
        let fixture = fixture_with(
            Arc::new(ProfileMemoryPersistence::default()),
            Arc::new(BrokenMemberships::default()),
        )
        .await;

        let mut request = get_invite_fixture(None);
        request.organization_name = Some("Doomed".into());

        let err = fixture
            .service
            .invite(&arion_admin(), &request)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);

        assert_eq!(fixture.identity.deleted().len(), 1);
        assert!(fixture
            .service
            .organizations
            .get_by_name("Doomed")
            .await
            .unwrap()
            .is_none());
        assert!(fixture.service.profiles.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_org_admin_sees_only_their_members() {
        let fixture = fixture().await;
        let caller = org_admin(fixture.organization.id);

        let mine = fixture
            .service
            .invite(&caller, &get_invite_fixture(Some("mine@example.com")))
            .await
            .unwrap();

        let mut elsewhere = get_invite_fixture(Some("other@example.com"));
        elsewhere.organization_name = Some("Elsewhere".into());
        fixture
            .service
            .invite(&arion_admin(), &elsewhere)
            .await
            .unwrap();

        let users = fixture.service.list_users(&caller).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, mine.user_id);

        let users = fixture.service.list_users(&arion_admin()).await.unwrap();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_user() {
        let fixture = fixture().await;
        let caller = org_admin(fixture.organization.id);

        let invited = fixture
            .service
            .invite(&caller, &get_invite_fixture(None))
            .await
            .unwrap();

        let elevate = UpdateProfileRequest {
            role: Some(Role::ArionAdmin),
            ..Default::default()
        };
        let err = fixture
            .service
            .update_user(&caller, &invited.user_id, &elevate)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);

        let update = UpdateProfileRequest {
            job_title: Some("Lead Researcher".into()),
            authorized: Some(false),
            ..Default::default()
        };
        let updated = fixture
            .service
            .update_user(&caller, &invited.user_id, &update)
            .await
            .unwrap();
        assert_eq!(updated.job_title.as_deref(), Some("Lead Researcher"));
        assert!(!updated.authorized);

        let err = fixture
            .service
            .update_user(&caller, &Uuid::new_v4(), &update)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);

        let err = fixture
            .service
            .delete_user(&caller, &caller.user_id)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        fixture
            .service
            .delete_user(&caller, &invited.user_id)
            .await
            .unwrap();
        assert!(fixture
            .service
            .profiles
            .get_by_id(&invited.user_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_self_service_profile() {
        let fixture = fixture().await;
        let admin = org_admin(fixture.organization.id);

        let invited = fixture
            .service
            .invite(&admin, &get_invite_fixture(None))
            .await
            .unwrap();
        let me = Caller {
            user_id: invited.user_id,
            email: Some("invitee@example.com".into()),
            role: Role::WorkspaceUser,
            organization_ids: vec![fixture.organization.id],
        };

        let update = UpdateProfileRequest {
            phone: Some(" +1 555 0100 ".into()),
            ..Default::default()
        };
        let profile = fixture.service.update_profile(&me, &update).await.unwrap();
        assert_eq!(profile.phone.as_deref(), Some("+1 555 0100"));
        assert_eq!(profile.organization_ids, vec![fixture.organization.id]);

        let sneaky = UpdateProfileRequest {
            role: Some(Role::OrgAdmin),
            ..Default::default()
        };
        let err = fixture.service.update_profile(&me, &sneaky).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
