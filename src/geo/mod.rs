pub mod catalog;
pub mod sampler;

pub use catalog::{City, Location, Region, CITY_CATALOG, REGION_WEIGHTS};
pub use sampler::GeoSampler;
