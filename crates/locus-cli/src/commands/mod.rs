pub mod catalog;
pub mod resolve;
pub mod search;
