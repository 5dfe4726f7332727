use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::notification::{Notification, NotificationKind};

/// Points credited to the owner when a project first becomes completed
pub const COMPLETION_REWARD: i32 = 3;

/// Days ahead of the due date at which a `due_soon` notification starts
pub const DUE_SOON_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "project_priority", rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Notifications this project currently warrants, relative to `today`.
    pub fn check_for_notifications(&self, today: NaiveDate) -> Vec<Notification> {
        if self.completed {
            return vec![];
        }
        let Some(due) = self.due_date else {
            return vec![];
        };

        let days_left = (due - today).num_days();
        let (kind, message) = match days_left {
            d if d < 0 => (
                NotificationKind::Overdue,
                format!("'{}' is overdue by {} day(s)", self.title, -d),
            ),
            0 => (
                NotificationKind::DueToday,
                format!("'{}' is due today", self.title),
            ),
            d if d <= DUE_SOON_WINDOW_DAYS => (
                NotificationKind::DueSoon,
                format!("'{}' is due in {} day(s)", self.title, d),
            ),
            _ => return vec![],
        };

        vec![Notification {
            project_id: self.id,
            project_title: self.title.clone(),
            kind,
            message,
            due_date: due,
        }]
    }
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub completed: bool,
}

impl NewProject {
    pub fn into_project(self, owner: Uuid, now: DateTime<Utc>) -> Project {
        Project {
            id: Uuid::new_v4(),
            user_id: owner,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            priority: self.priority,
            completed: self.completed,
            completed_at: self.completed.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial project update. Nullable columns use `Option<Option<_>>` so that
/// an explicit `null` clears the value while an absent key leaves it alone.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl ProjectChanges {
    /// True when applying these changes moves `project` from open to completed.
    pub fn completes(&self, project: &Project) -> bool {
        self.completed == Some(true) && !project.completed
    }

    /// Apply the changes in place and report whether a completion transition happened.
    pub fn apply(&self, project: &mut Project, now: DateTime<Utc>) -> bool {
        let completes = self.completes(project);

        if let Some(title) = &self.title {
            project.title = title.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(due_date) = self.due_date {
            project.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            project.priority = priority;
        }
        match self.completed {
            Some(true) if completes => {
                project.completed = true;
                project.completed_at = Some(now);
            }
            Some(false) => {
                project.completed = false;
                project.completed_at = None;
            }
            _ => {}
        }
        project.updated_at = now;

        completes
    }
}

/// Outcome of an ownership-scoped project update
#[derive(Debug, Clone)]
pub struct ProjectUpdate {
    pub project: Project,
    pub reward_awarded: bool,
    /// Owner's reward balance after the update
    pub reward: i32,
}
