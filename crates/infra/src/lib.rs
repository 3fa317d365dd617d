//! Infrastructure layer: stores, data-access adapters, audited repositories.

pub mod audited;
pub mod collection;
pub mod membership_admin;
pub mod membership_store;

pub use audited::Audited;
pub use collection::{Collection, EntityRecord, InMemoryCollection};
pub use membership_admin::MembershipAdmin;
pub use membership_store::{InMemoryMembershipStore, MembershipStore};
