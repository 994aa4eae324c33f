pub mod correction;
pub mod employee;
pub mod role;
pub mod status;
