pub mod auth;
pub mod cart;
pub mod category;
pub mod dish;
pub mod media;
pub mod menu;
pub mod notification;
pub mod order;
pub mod restaurant;
pub mod storage;
pub mod user;

mod router;
pub use router::get_router;
