pub mod rules;
pub mod time;
pub mod totals;
pub mod validate;
