pub mod category;
pub mod collaborator;
pub mod comment;
pub mod consortium;
pub mod invitation;
pub mod notification;
pub mod project;
pub mod quota;
pub mod requirement;
pub mod resource;
pub mod service;
pub mod user;

pub use category::Category;
pub use collaborator::{Collaborator, CollaboratorRole};
pub use comment::Comment;
pub use consortium::Consortium;
pub use invitation::Invitation;
pub use notification::{Notification, NotificationSource};
pub use project::{Project, ProjectStatus};
pub use quota::Quota;
pub use requirement::{Requirement, RequirementStatus};
pub use resource::Resource;
pub use service::Service;
pub use user::User;
