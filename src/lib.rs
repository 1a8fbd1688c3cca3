pub mod aggregate;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod gate;
pub mod github;
pub mod ingest;
pub mod model;
pub mod parsers;
pub mod report;
pub mod runner;
pub mod severity;
