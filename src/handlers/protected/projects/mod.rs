// Owner-scoped project endpoints. Every lookup is keyed by (owner, id);
// another user's project is indistinguishable from a missing one.

pub mod collection; // GET/POST /api/projects
pub mod record; // GET/PATCH/DELETE /api/projects/:id

pub use collection::{create as project_create, list as project_list};
pub use record::{delete as project_delete, get as project_get, patch as project_patch};
