// Token acquisition endpoints that do not require authentication.

pub mod login; // POST /api/auth/login - authenticate and get a token pair
pub mod refresh; // POST /api/auth/token/refresh - new access token from a refresh token
pub mod register; // POST /api/auth/register - create new account

pub use login::login as session_login;
pub use refresh::refresh as session_refresh;
pub use register::register as user_register;
