//! Window cache, fetch pipeline, and series assembly

pub mod cache;
pub mod fetch;
pub mod series;
pub mod worker;
