pub mod leave_request;
pub mod punch;
pub mod role;
pub mod user;
