pub mod clarify;
pub mod config;
pub mod entities;
pub mod errors;
pub mod executor;
pub mod oracle;
pub mod orchestrator;
pub mod plan;
pub mod planner;
pub mod report;
pub mod search;
pub mod state;
pub mod supervisor;

#[cfg(test)]
pub mod test_support;
