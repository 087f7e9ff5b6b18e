#![warn(clippy::all, rust_2018_idioms)]

mod app;
pub use app::App;
pub mod area;
pub mod area_list;
pub mod form;
pub mod map;
pub mod modal;
pub mod store;
