pub mod absence;
pub mod attendance;
pub mod export;
pub mod report;
pub mod schedule;
