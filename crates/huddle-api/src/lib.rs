pub mod auth;
pub mod error;
pub mod hello;
pub mod messages;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod session;
pub mod tokens;
pub mod validation;
pub mod views;
