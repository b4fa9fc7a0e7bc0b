use crate::error::{AuthError, Result};
use todo_authz::RoleService;
use todo_database::{Database, DatabaseError, OrganizationRepository, UserRepository};
use todo_models::organization_member::{roles, AddOrganizationMember, OrganizationMember};
use todo_models::role::permissions;
use todo_models::organization::suffixed_slug;
use todo_models::{CreateOrganization, Organization};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct OrganizationService {
    org_repo: OrganizationRepository,
    user_repo: UserRepository,
    roles: RoleService,
}

impl OrganizationService {
    pub fn new(db: &Database, roles: RoleService) -> Self {
        let pool = db.pool().clone();

        Self {
            org_repo: OrganizationRepository::new(pool.clone()),
            user_repo: UserRepository::new(pool),
            roles,
        }
    }

    /// Create an organization owned by `user_id`. Requires `org:create`.
    pub async fn create(&self, user_id: Uuid, request: CreateOrganization) -> Result<Organization> {
        request.validate()?;

        self.roles
            .require_permission(user_id, permissions::ORG_CREATE)
            .await?;

        let name = request.name.trim();
        let slug = request.effective_slug();
        let org = match self.org_repo.create(name, &slug, user_id).await {
            // Explicit slugs stay strict; derived ones get a suffix on collision
            Err(DatabaseError::DuplicateEntry(_)) if request.slug.is_none() => {
                self.org_repo
                    .create(name, &suffixed_slug(&slug), user_id)
                    .await?
            }
            result => result?,
        };

        tracing::info!(org_id = %org.id, slug = %org.slug, owner = %user_id, "Organization created");

        Ok(org)
    }

    pub async fn get_user_orgs(&self, user_id: Uuid) -> Result<Vec<Organization>> {
        Ok(self.org_repo.list_for_user(user_id).await?)
    }

    /// Ids of the user's organizations, in the form todo documents store them
    pub async fn org_ids_for_user(&self, user_id: Uuid) -> Result<Vec<String>> {
        let orgs = self.get_user_orgs(user_id).await?;
        Ok(orgs.into_iter().map(|o| o.id.to_string()).collect())
    }

    pub async fn is_member(&self, user_id: Uuid, organization_id: Uuid) -> Result<bool> {
        Ok(self.org_repo.is_member(user_id, organization_id).await?)
    }

    /// Add the user named by `request.login` (username or email) as a member.
    /// Only owners may add members.
    pub async fn add_member(
        &self,
        actor_id: Uuid,
        organization_id: Uuid,
        request: AddOrganizationMember,
    ) -> Result<OrganizationMember> {
        request.validate()?;

        self.org_repo.find_by_id(organization_id).await?;

        let is_owner = self
            .org_repo
            .get_member(actor_id, organization_id)
            .await?
            .is_some_and(|m| m.role == roles::OWNER);

        if !is_owner {
            return Err(AuthError::Forbidden(
                "Only organization owners can add members".to_string(),
            ));
        }

        let target = self
            .user_repo
            .find_by_login(request.login.trim())
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

        if self.org_repo.is_member(target.id, organization_id).await? {
            return Err(AuthError::AlreadyExists(
                "User is already a member of this organization".to_string(),
            ));
        }

        let member = self
            .org_repo
            .add_member(target.id, organization_id, roles::MEMBER)
            .await?;

        tracing::info!(%organization_id, user_id = %target.id, added_by = %actor_id, "Member added");

        Ok(member)
    }
}
