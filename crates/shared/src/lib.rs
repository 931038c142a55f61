pub mod config;
pub mod controller;
pub mod geo;
pub mod i18n;
pub mod models;
pub mod permission;
pub mod routing;
pub mod store;
