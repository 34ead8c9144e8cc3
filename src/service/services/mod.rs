mod account;
mod contact;
mod gpu;
mod order;
mod organization;
pub mod saga;
mod workspace;

pub use account::AccountService;
pub use contact::ContactService;
pub use gpu::GpuService;
pub use order::{OrderService, MAX_STORAGE_GB, MIN_STORAGE_GB};
pub use organization::OrganizationService;
pub use workspace::WorkspaceService;
