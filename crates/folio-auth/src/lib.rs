//! Folio Auth Server Library
//!
//! Credential and session lifecycle for Folio:
//! - OTP-gated registration and password reset
//! - Password login with argon2id hashes
//! - JWT access tokens and single-use rotating refresh tokens
//! - SQLite storage for users, staging records and refresh tokens
//! - HTTP API (axum) and background housekeeping

pub mod api;
pub mod auth;
pub mod housekeeping;
pub mod mail;
pub mod service;
pub mod storage;
