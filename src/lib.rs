pub mod book;
pub mod common;
pub mod event;
pub mod order;
pub mod store;
