pub mod executor;
pub mod logger;
pub mod poller;
pub mod token;
pub mod tool_executor;
