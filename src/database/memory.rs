use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    NewProject, NewUser, ProfileChanges, Project, ProjectChanges, ProjectUpdate, RevokedToken, User,
    COMPLETION_REWARD,
};
use crate::database::store::Store;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    /// Insertion order; newest last
    projects: Vec<Project>,
    revoked: HashMap<Uuid, RevokedToken>,
}

impl State {
    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn project_mut(&mut self, owner: Uuid, id: Uuid) -> Option<&mut Project> {
        self.projects
            .iter_mut()
            .find(|p| p.id == id && p.user_id == owner)
    }
}

/// Process-local store used in development without `DATABASE_URL` and by tests.
///
/// Every mutation holds the write lock for its whole read-modify-write, which
/// gives the same atomicity the Postgres store gets from transactions.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        if state.username_taken(&user.username, None) {
            return Err(DatabaseError::Conflict { field: "username" });
        }
        if state.email_taken(&user.email, None) {
            return Err(DatabaseError::Conflict { field: "email" });
        }

        let user = user.into_user(Utc::now());
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> Result<bool, DatabaseError> {
        Ok(self.state.read().await.username_taken(username, except))
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, DatabaseError> {
        Ok(self.state.read().await.email_taken(email, except))
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        if let Some(username) = &changes.username {
            if state.username_taken(username, Some(id)) {
                return Err(DatabaseError::Conflict { field: "username" });
            }
        }
        if let Some(email) = &changes.email {
            if state.email_taken(email, Some(id)) {
                return Err(DatabaseError::Conflict { field: "email" });
            }
        }

        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))?;
        changes.apply(user, Utc::now());
        Ok(user.clone())
    }

    async fn reward_points(&self, id: Uuid) -> Result<i32, DatabaseError> {
        self.state
            .read()
            .await
            .users
            .get(&id)
            .map(|u| u.reward)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))
    }

    async fn create_project(&self, owner: Uuid, project: NewProject) -> Result<Project, DatabaseError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&owner) {
            return Err(DatabaseError::NotFound(format!("user {}", owner)));
        }

        let project = project.into_project(owner, Utc::now());
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn list_projects(&self, owner: Uuid) -> Result<Vec<Project>, DatabaseError> {
        let state = self.state.read().await;
        let mut projects: Vec<Project> = state
            .projects
            .iter()
            .rev()
            .filter(|p| p.user_id == owner)
            .cloned()
            .collect();
        // Stable sort keeps later insertions first among equal timestamps
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn find_project(&self, owner: Uuid, id: Uuid) -> Result<Option<Project>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .iter()
            .find(|p| p.id == id && p.user_id == owner)
            .cloned())
    }

    async fn delete_project(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        let before = state.projects.len();
        state.projects.retain(|p| !(p.id == id && p.user_id == owner));
        Ok(state.projects.len() < before)
    }

    async fn update_project(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<ProjectUpdate>, DatabaseError> {
        let mut state = self.state.write().await;

        let Some(project) = state.project_mut(owner, id) else {
            return Ok(None);
        };
        let reward_awarded = changes.apply(project, Utc::now());
        let project = project.clone();

        let user = state
            .users
            .get_mut(&owner)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", owner)))?;
        if reward_awarded {
            user.reward += COMPLETION_REWARD;
            user.updated_at = Utc::now();
        }

        Ok(Some(ProjectUpdate {
            project,
            reward_awarded,
            reward: user.reward,
        }))
    }

    async fn revoke_token(&self, token: RevokedToken) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        if state.revoked.contains_key(&token.jti) {
            return Ok(false);
        }
        state.revoked.insert(token.jti, token);
        Ok(true)
    }

    async fn is_token_revoked(&self, jti: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.state.read().await.revoked.contains_key(&jti))
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let mut state = self.state.write().await;
        let before = state.revoked.len();
        state.revoked.retain(|_, t| t.expires_at >= now);
        Ok((before - state.revoked.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Priority;
    use chrono::Duration;
    use std::sync::Arc;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "hash".to_string(),
            profile_picture: None,
        }
    }

    fn new_project(title: &str) -> NewProject {
        NewProject {
            title: title.to_string(),
            description: None,
            due_date: None,
            priority: Priority::Medium,
            completed: false,
        }
    }

    fn complete() -> ProjectChanges {
        ProjectChanges { completed: Some(true), ..Default::default() }
    }

    #[tokio::test]
    async fn duplicate_username_and_email_conflict() {
        let store = MemoryStore::new();
        store.create_user(new_user("ada")).await.unwrap();

        let err = store.create_user(new_user("ada")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict { field: "username" }));

        let mut other = new_user("grace");
        other.email = "ada@example.com".to_string();
        let err = store.create_user(other).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict { field: "email" }));
    }

    #[tokio::test]
    async fn projects_are_scoped_to_their_owner() {
        let store = MemoryStore::new();
        let ada = store.create_user(new_user("ada")).await.unwrap();
        let eve = store.create_user(new_user("eve")).await.unwrap();
        let project = store.create_project(ada.id, new_project("mine")).await.unwrap();

        assert!(store.find_project(eve.id, project.id).await.unwrap().is_none());
        assert!(store.update_project(eve.id, project.id, complete()).await.unwrap().is_none());
        assert!(!store.delete_project(eve.id, project.id).await.unwrap());
        assert!(store.list_projects(eve.id).await.unwrap().is_empty());

        assert!(store.find_project(ada.id, project.id).await.unwrap().is_some());
        assert_eq!(store.reward_points(ada.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryStore::new();
        let ada = store.create_user(new_user("ada")).await.unwrap();
        for title in ["first", "second", "third"] {
            store.create_project(ada.id, new_project(title)).await.unwrap();
        }

        let titles: Vec<String> = store
            .list_projects(ada.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn completion_reward_is_awarded_once() {
        let store = MemoryStore::new();
        let ada = store.create_user(new_user("ada")).await.unwrap();
        let project = store.create_project(ada.id, new_project("p")).await.unwrap();

        let first = store.update_project(ada.id, project.id, complete()).await.unwrap().unwrap();
        assert!(first.reward_awarded);
        assert_eq!(first.reward, COMPLETION_REWARD);

        let second = store.update_project(ada.id, project.id, complete()).await.unwrap().unwrap();
        assert!(!second.reward_awarded);
        assert_eq!(store.reward_points(ada.id).await.unwrap(), COMPLETION_REWARD);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_completions_do_not_lose_updates() {
        let store = Arc::new(MemoryStore::new());
        let ada = store.create_user(new_user("ada")).await.unwrap();

        let mut ids = Vec::new();
        for i in 0..10 {
            ids.push(store.create_project(ada.id, new_project(&format!("p{i}"))).await.unwrap().id);
        }

        // Each project completed from several tasks at once
        let mut handles = Vec::new();
        for id in ids {
            for _ in 0..4 {
                let store = store.clone();
                handles.push(tokio::spawn(async move {
                    store.update_project(ada.id, id, complete()).await.unwrap()
                }));
            }
        }
        let mut awarded = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().reward_awarded {
                awarded += 1;
            }
        }

        assert_eq!(awarded, 10);
        assert_eq!(store.reward_points(ada.id).await.unwrap(), 10 * COMPLETION_REWARD);
    }

    #[tokio::test]
    async fn revocation_is_idempotent_and_purgeable() {
        let store = MemoryStore::new();
        let ada = store.create_user(new_user("ada")).await.unwrap();
        let jti = Uuid::new_v4();
        let expired = RevokedToken::new(jti, ada.id, "t", Utc::now() - Duration::hours(1));

        assert!(store.revoke_token(expired.clone()).await.unwrap());
        assert!(!store.revoke_token(expired).await.unwrap());
        assert!(store.is_token_revoked(jti).await.unwrap());

        assert_eq!(store.purge_expired_tokens(Utc::now()).await.unwrap(), 1);
        assert!(!store.is_token_revoked(jti).await.unwrap());
    }
}
