pub mod anime_search;
pub mod catalog;
pub mod recommendations;
pub mod scorer;
pub mod seeds;
pub mod stats;
pub mod trending;
pub mod validation;

pub use catalog::{CatalogClient, CatalogStore, JikanClient};
