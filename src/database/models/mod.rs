pub mod notification;
pub mod project;
pub mod revoked_token;
pub mod user;

pub use notification::{Notification, NotificationKind};
pub use project::{NewProject, Priority, Project, ProjectChanges, ProjectUpdate, COMPLETION_REWARD};
pub use revoked_token::RevokedToken;
pub use user::{NewUser, ProfileChanges, User, UserProfile};
