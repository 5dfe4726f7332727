// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Middleware: jwt_auth_middleware (AuthUser) then validate_user_middleware (CurrentUser)

pub mod auth; // Session management
pub mod notifications; // Due-date reminders
pub mod profile; // Account details
pub mod projects; // Owner-scoped project CRUD
pub mod reward; // Completion points

pub use notifications::notifications_get;
pub use profile::{profile_get, profile_put};
pub use reward::reward_get;
