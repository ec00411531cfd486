//! Persisted store: current-stats cache, stats history, milestone cursor and
//! audit log, subscriber registry (read-only here)

pub mod init;
pub mod milestones;
pub mod stats;
pub mod subscribers;

pub use init::init_database;
