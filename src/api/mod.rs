pub mod attendance;
pub mod clock;
pub mod correction;
pub mod employee;
pub mod report;
pub mod store;
