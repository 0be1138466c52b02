pub mod briefing;
pub mod config;
pub mod gateway;
pub mod lifecycle;
pub mod llm;
pub mod memory;
pub mod poller;
pub mod speech;
pub mod terminal;
