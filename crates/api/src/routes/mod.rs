pub mod auth;
pub mod category;
pub mod collaborator;
pub mod comment;
pub mod consortium;
pub mod invitation;
pub mod notification;
pub mod project;
pub mod requirement;
pub mod resource;
pub mod service;

use bson::oid::ObjectId;

use crate::error::ApiError;

pub(crate) fn parse_id(value: &str, field: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value).map_err(|_| ApiError::BadRequest(format!("Invalid {field}")))
}
