pub mod api;
pub mod capabilities;
pub mod cli;
pub mod config;
pub mod llm;
pub mod report;
pub mod session;
