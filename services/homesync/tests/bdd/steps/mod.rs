//! BDD step definitions for homesync service

pub mod alert_steps;
pub mod command_steps;
pub mod dashboard_steps;
pub mod sync_steps;
