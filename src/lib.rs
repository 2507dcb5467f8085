//! Opsie RBAC - role-based authorization for the developer portal scaffolder
//!
//! Resolves portal identities to roles, decides permission checks, and
//! filters the scaffolder's template catalog per role.

pub mod authz;
pub mod settings;
pub mod web;
