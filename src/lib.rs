//! Project Tracker
//!
//! Projects, tasks and subtasks in SQLite behind a JSON REST API, with each
//! project's progress rolled up from subtask completion.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod report;
pub mod server;
pub mod types;
