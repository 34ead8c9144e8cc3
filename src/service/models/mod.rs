mod contact;
mod order;
mod organization;
mod profile;
mod role;

pub use contact::ContactRequest;
pub use order::Order;
pub use organization::{Organization, OrganizationUser};
pub use profile::Profile;
pub use role::RoleDescriptor;
