pub mod base;
pub mod category;
pub mod consortium;
pub mod notification;
pub mod project;
pub mod resource;
pub mod service;
pub mod user;

pub use base::BaseDao;
