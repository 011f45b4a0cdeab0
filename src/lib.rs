pub mod config;
pub mod event;
pub mod git;
pub mod hooks;
pub mod logging;
pub mod process;
pub mod rules;
pub mod tweet;
