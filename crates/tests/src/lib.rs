pub mod fixtures;

#[cfg(test)]
mod auth_tests;
#[cfg(test)]
mod project_workflow_tests;
#[cfg(test)]
mod requirement_workflow_tests;
#[cfg(test)]
mod notification_tests;
