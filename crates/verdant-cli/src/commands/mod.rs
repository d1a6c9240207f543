pub mod archetype;
pub mod completions;
pub mod config;
pub mod dashboard;
pub mod log;
pub mod plant;
pub mod room;
