use crate::geo::catalog::{City, Region, CITY_CATALOG, REGION_WEIGHTS};
use rand::Rng;

/// Weighted city sampler: picks a region with probability proportional to
/// its configured weight, then a city uniformly within that region.
///
/// Sampling cannot fail. When floating-point accumulation leaves the drawn
/// value uncovered, or the selected region has no cities, it falls back to
/// a uniform pick over the whole catalog.
#[derive(Debug, Clone, Copy)]
pub struct GeoSampler {
    catalog: &'static [City],
    weights: &'static [(Region, f64)],
}

impl Default for GeoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoSampler {
    pub fn new() -> Self {
        Self::with_tables(CITY_CATALOG, REGION_WEIGHTS)
    }

    pub fn with_tables(catalog: &'static [City], weights: &'static [(Region, f64)]) -> Self {
        assert!(!catalog.is_empty(), "city catalog must not be empty");
        Self { catalog, weights }
    }

    pub fn sample(&self) -> &'static City {
        self.sample_with(&mut rand::thread_rng())
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static City {
        let roll: f64 = rng.gen();

        let mut cumulative = 0.0;
        for &(region, weight) in self.weights {
            cumulative += weight;
            if roll <= cumulative {
                let matching = self
                    .catalog
                    .iter()
                    .filter(|city| city.region == region)
                    .count();
                if matching == 0 {
                    break;
                }
                let index = rng.gen_range(0..matching);
                return self
                    .catalog
                    .iter()
                    .filter(|city| city.region == region)
                    .nth(index)
                    .unwrap_or(&self.catalog[0]);
            }
        }

        // Residual probability mass, or a region with no catalog entries.
        &self.catalog[rng.gen_range(0..self.catalog.len())]
    }
}
