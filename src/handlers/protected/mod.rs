// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: valid bearer token; admin routes additionally pass the role gate
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware (+ require_admin_middleware)

pub mod auth;
pub mod comments;
pub mod posts;
pub mod tags;
pub mod users;
