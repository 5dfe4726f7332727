use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    NewProject, NewUser, ProfileChanges, Project, ProjectChanges, ProjectUpdate, RevokedToken, User,
    COMPLETION_REWARD,
};
use crate::database::store::Store;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, reward, \
                            profile_picture, created_at, updated_at";

const PROJECT_COLUMNS: &str = "id, user_id, title, description, due_date, priority, completed, \
                               completed_at, created_at, updated_at";

/// Postgres-backed store
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let user = user.into_user(Utc::now());
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_hash)
            .bind(user.reward)
            .bind(&user.profile_picture)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseManager::classify)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> Result<bool, DatabaseError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, DatabaseError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<User, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE");
        let mut user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))?;

        changes.apply(&mut user, Utc::now());

        let sql = format!(
            "UPDATE users SET username = $2, email = $3, first_name = $4, last_name = $5, \
             profile_picture = $6, updated_at = $7 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.profile_picture)
            .bind(user.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(DatabaseManager::classify)?;

        tx.commit().await?;
        Ok(user)
    }

    async fn reward_points(&self, id: Uuid) -> Result<i32, DatabaseError> {
        sqlx::query_scalar::<_, i32>("SELECT reward FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))
    }

    async fn create_project(&self, owner: Uuid, project: NewProject) -> Result<Project, DatabaseError> {
        let project = project.into_project(owner, Utc::now());
        let sql = format!(
            "INSERT INTO projects ({PROJECT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {PROJECT_COLUMNS}"
        );

        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(project.id)
            .bind(project.user_id)
            .bind(&project.title)
            .bind(&project.description)
            .bind(project.due_date)
            .bind(project.priority)
            .bind(project.completed)
            .bind(project.completed_at)
            .bind(project.created_at)
            .bind(project.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_projects(&self, owner: Uuid) -> Result<Vec<Project>, DatabaseError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_project(&self, owner: Uuid, id: Uuid) -> Result<Option<Project>, DatabaseError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND user_id = $2");
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_project(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_project(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<ProjectUpdate>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent completions of the same project
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND user_id = $2 FOR UPDATE"
        );
        let Some(mut project) = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let reward_awarded = changes.apply(&mut project, Utc::now());

        let reward: i32 = if reward_awarded {
            sqlx::query_scalar(
                "UPDATE users SET reward = reward + $2, updated_at = now() WHERE id = $1 RETURNING reward",
            )
            .bind(owner)
            .bind(COMPLETION_REWARD)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_scalar("SELECT reward FROM users WHERE id = $1")
                .bind(owner)
                .fetch_one(&mut *tx)
                .await?
        };

        let sql = format!(
            "UPDATE projects SET title = $3, description = $4, due_date = $5, priority = $6, \
             completed = $7, completed_at = $8, updated_at = $9 \
             WHERE id = $1 AND user_id = $2 RETURNING {PROJECT_COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(owner)
            .bind(&project.title)
            .bind(&project.description)
            .bind(project.due_date)
            .bind(project.priority)
            .bind(project.completed)
            .bind(project.completed_at)
            .bind(project.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(project_id = %id, reward_awarded, "Project update committed");
        Ok(Some(ProjectUpdate { project, reward_awarded, reward }))
    }

    async fn revoke_token(&self, token: RevokedToken) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO revoked_tokens (jti, user_id, fingerprint, expires_at, revoked_at) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (jti) DO NOTHING",
        )
        .bind(token.jti)
        .bind(token.user_id)
        .bind(&token.fingerprint)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn is_token_revoked(&self, jti: Uuid) -> Result<bool, DatabaseError> {
        let revoked: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1)")
            .bind(jti)
            .fetch_one(&self.pool)
            .await?;
        Ok(revoked)
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
