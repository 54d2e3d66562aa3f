/// One-shot run command
pub mod run;

/// HTTP trigger server
pub mod serve;

/// Version command handlers
pub mod version;
