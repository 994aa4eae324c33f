pub mod name_cache;
pub mod username_filter;
