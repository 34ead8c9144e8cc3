mod contact;
mod generic;
mod membership;
mod order;
mod organization;
mod profile;
mod role;

pub use contact::ContactMemoryPersistence;
pub use generic::MemoryPersistence;
pub use membership::MembershipMemoryPersistence;
pub use order::OrderMemoryPersistence;
pub use organization::OrganizationMemoryPersistence;
pub use profile::ProfileMemoryPersistence;
pub use role::RoleMemoryPersistence;
