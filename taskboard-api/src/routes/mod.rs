/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token refresh and profile endpoints
/// - `tasks`: Task CRUD, board, listing and statistics endpoints

pub mod auth;
pub mod health;
pub mod tasks;
