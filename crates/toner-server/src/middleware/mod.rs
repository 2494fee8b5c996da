pub mod rate_limit;
pub mod user;

pub use rate_limit::WriteLimiter;
pub use user::CurrentUser;
