//! Authentication service models

pub mod role;
pub mod session;
pub mod user;

// Re-export for convenience
pub use role::{ROLE_ADMIN, ROLE_DOCTOR, ROLE_MEMBER, Role};
pub use session::{NewUserToken, UserToken};
pub use user::{
    AssignRolesRequest, DEFAULT_USER_STATUS, LoginCredentials, LoginResponse, NewUser,
    RegisterRequest, UpdateUser, User,
};
