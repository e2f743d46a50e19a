// Authentication: credential storage, bearer-token sessions, and the
// register/login/logout endpoints.

pub mod credentials;
pub mod handlers;
pub mod session;
