mod contact;
mod membership;
mod order;
mod organization;
mod profile;
mod role;

pub use contact::ContactRelationalPersistence;
pub use membership::MembershipRelationalPersistence;
pub use order::OrderRelationalPersistence;
pub use organization::OrganizationRelationalPersistence;
pub use profile::ProfileRelationalPersistence;
pub use role::RoleRelationalPersistence;
