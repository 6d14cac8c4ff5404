pub mod auth;
pub mod dao;
pub mod notify;
pub mod workflow;

pub use auth::AuthService;
pub use dao::*;
pub use notify::NotificationService;
pub use workflow::{WorkflowError, WorkflowService, WorkflowSettings};
