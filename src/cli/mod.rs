//! Terminal commands

pub mod history;
pub mod report;
pub mod setup;
pub mod ui;
