pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod geo;
pub mod messages;
pub mod orders;
pub mod pricing;
