//! `ledgerdesk-authz` — pure authorization boundary (zero-trust).
//!
//! Statement registry, role grant tables, and the permission evaluator.
//! This crate is intentionally decoupled from HTTP and storage: membership
//! resolution goes through the [`MembershipDirectory`] contract.

pub mod evaluate;
pub mod membership;
pub mod nav;
pub mod roles;
pub mod statements;

pub use evaluate::{AccessPolicy, Evaluator};
pub use membership::{Membership, MembershipDirectory};
pub use nav::{NavItem, filter_nav};
pub use roles::{RoleName, RoleTable, personal_grants};
pub use statements::{Action, PermissionSet, Resource, StatementError, StatementRegistry};
