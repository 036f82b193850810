pub mod search;
pub mod status;
pub mod tables;
