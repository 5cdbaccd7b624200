//! SQLite storage for the Folio auth server.
//!
//! Provides persistence for users (the credential store), pending
//! registrations, password reset requests and refresh tokens.

mod db;
mod models;
mod queries_staging;
mod queries_tokens;
mod queries_users;


pub use db::{AuthDatabase, DatabaseError};
pub use models::*;
