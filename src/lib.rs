pub mod backend;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod reveal;
pub mod session;
pub mod store;
pub mod wishlist;
