use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    NewProject, NewUser, ProfileChanges, Project, ProjectChanges, ProjectUpdate, RevokedToken, User,
};

/// Persistence boundary shared by every handler.
///
/// All project operations are scoped by `owner`: a project belonging to another
/// user behaves exactly like a missing one.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;
    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> Result<bool, DatabaseError>;
    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, DatabaseError>;
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<User, DatabaseError>;
    async fn reward_points(&self, id: Uuid) -> Result<i32, DatabaseError>;

    async fn create_project(&self, owner: Uuid, project: NewProject) -> Result<Project, DatabaseError>;
    /// Owner's projects, newest first
    async fn list_projects(&self, owner: Uuid) -> Result<Vec<Project>, DatabaseError>;
    async fn find_project(&self, owner: Uuid, id: Uuid) -> Result<Option<Project>, DatabaseError>;
    /// Returns false when nothing matched (id, owner)
    async fn delete_project(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
    /// Apply `changes` and, on an open → completed transition, credit the owner
    /// with the completion reward in the same atomic unit.
    async fn update_project(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<ProjectUpdate>, DatabaseError>;

    /// Returns false when the token was already revoked
    async fn revoke_token(&self, token: RevokedToken) -> Result<bool, DatabaseError>;
    async fn is_token_revoked(&self, jti: Uuid) -> Result<bool, DatabaseError>;
    /// Drop revocation records whose token has expired anyway. Returns rows removed.
    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
