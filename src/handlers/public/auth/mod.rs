// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition and account recovery endpoints that do not require authentication.

pub mod password; // POST /auth/forgot-password, POST /auth/reset-password
pub mod register; // POST /auth/register
pub mod session;  // POST /auth/login

pub use password::{forgot_password, reset_password};
pub use register::register;
pub use session::login;
