use serde::{Deserialize, Serialize};

/// Japanese regions used to bucket the city catalog. The wire format carries
/// these as plain lowercase strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Hokkaido,
    Tohoku,
    Kanto,
    Chubu,
    Kansai,
    Chugoku,
    Shikoku,
    Kyushu,
    Okinawa,
}

impl Region {
    pub fn parse_str(value: &str) -> Result<Self, crate::error::AppError> {
        match value {
            "hokkaido" => Ok(Self::Hokkaido),
            "tohoku" => Ok(Self::Tohoku),
            "kanto" => Ok(Self::Kanto),
            "chubu" => Ok(Self::Chubu),
            "kansai" => Ok(Self::Kansai),
            "chugoku" => Ok(Self::Chugoku),
            "shikoku" => Ok(Self::Shikoku),
            "kyushu" => Ok(Self::Kyushu),
            "okinawa" => Ok(Self::Okinawa),
            other => Err(crate::error::AppError::InvalidArgument(format!(
                "unknown region '{other}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hokkaido => "hokkaido",
            Self::Tohoku => "tohoku",
            Self::Kanto => "kanto",
            Self::Chubu => "chubu",
            Self::Kansai => "kansai",
            Self::Chugoku => "chugoku",
            Self::Shikoku => "shikoku",
            Self::Kyushu => "kyushu",
            Self::Okinawa => "okinawa",
        }
    }
}

/// One catalog entry. The catalog is process-wide constant data; membership
/// and region assignment never change at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub region: Region,
}

/// Owned location payload as it travels on the wire (purchase requests,
/// inbound `newOrder` fields, marker placements).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub region: Region,
}

impl From<&City> for Location {
    fn from(city: &City) -> Self {
        Self {
            name: city.name.to_string(),
            lat: city.lat,
            lng: city.lng,
            region: city.region,
        }
    }
}

/// Region selection weights, roughly proportional to population density.
/// The order is load-bearing: the sampler walks this table accumulating
/// weights, so it must stay stable across calls. Okinawa carries no weight
/// and is only ever selected through the uniform fallback.
pub const REGION_WEIGHTS: &[(Region, f64)] = &[
    (Region::Kanto, 0.35),
    (Region::Kansai, 0.20),
    (Region::Chubu, 0.15),
    (Region::Kyushu, 0.12),
    (Region::Tohoku, 0.08),
    (Region::Chugoku, 0.05),
    (Region::Shikoku, 0.03),
    (Region::Hokkaido, 0.02),
];

pub const CITY_CATALOG: &[City] = &[
    // Hokkaido / Tohoku
    City { name: "Sapporo", lat: 43.0642, lng: 141.3469, region: Region::Hokkaido },
    City { name: "Sendai", lat: 38.2682, lng: 140.8694, region: Region::Tohoku },
    City { name: "Aomori", lat: 40.8244, lng: 140.7400, region: Region::Tohoku },
    City { name: "Morioka", lat: 39.7036, lng: 141.1527, region: Region::Tohoku },
    City { name: "Akita", lat: 39.7186, lng: 140.1024, region: Region::Tohoku },
    City { name: "Yamagata", lat: 38.2404, lng: 140.3633, region: Region::Tohoku },
    City { name: "Fukushima", lat: 37.7503, lng: 140.4676, region: Region::Tohoku },
    // Kanto
    City { name: "Tokyo", lat: 35.6762, lng: 139.6503, region: Region::Kanto },
    City { name: "Yokohama", lat: 35.4437, lng: 139.6380, region: Region::Kanto },
    City { name: "Chiba", lat: 35.6074, lng: 140.1065, region: Region::Kanto },
    City { name: "Saitama", lat: 35.8617, lng: 139.6455, region: Region::Kanto },
    City { name: "Utsunomiya", lat: 36.5658, lng: 139.8836, region: Region::Kanto },
    City { name: "Maebashi", lat: 36.3911, lng: 139.0608, region: Region::Kanto },
    City { name: "Mito", lat: 36.3418, lng: 140.4468, region: Region::Kanto },
    // Chubu
    City { name: "Nagoya", lat: 35.1815, lng: 136.9066, region: Region::Chubu },
    City { name: "Shizuoka", lat: 34.9756, lng: 138.3828, region: Region::Chubu },
    City { name: "Niigata", lat: 37.9026, lng: 139.0232, region: Region::Chubu },
    City { name: "Toyama", lat: 36.6959, lng: 137.2139, region: Region::Chubu },
    City { name: "Kanazawa", lat: 36.5944, lng: 136.6256, region: Region::Chubu },
    City { name: "Fukui", lat: 36.0652, lng: 136.2217, region: Region::Chubu },
    City { name: "Kofu", lat: 35.6642, lng: 138.5684, region: Region::Chubu },
    City { name: "Nagano", lat: 36.6513, lng: 138.1810, region: Region::Chubu },
    City { name: "Gifu", lat: 35.3912, lng: 136.7223, region: Region::Chubu },
    // Kansai
    City { name: "Osaka", lat: 34.6937, lng: 135.5023, region: Region::Kansai },
    City { name: "Kyoto", lat: 35.0116, lng: 135.7681, region: Region::Kansai },
    City { name: "Kobe", lat: 34.6901, lng: 135.1956, region: Region::Kansai },
    City { name: "Nara", lat: 34.6851, lng: 135.8048, region: Region::Kansai },
    City { name: "Otsu", lat: 35.0045, lng: 135.8686, region: Region::Kansai },
    City { name: "Wakayama", lat: 34.2261, lng: 135.1675, region: Region::Kansai },
    // Chugoku / Shikoku
    City { name: "Hiroshima", lat: 34.3853, lng: 132.4553, region: Region::Chugoku },
    City { name: "Okayama", lat: 34.6617, lng: 133.9341, region: Region::Chugoku },
    City { name: "Yamaguchi", lat: 34.1858, lng: 131.4706, region: Region::Chugoku },
    City { name: "Tottori", lat: 35.5038, lng: 134.2380, region: Region::Chugoku },
    City { name: "Matsue", lat: 35.4723, lng: 133.0505, region: Region::Chugoku },
    City { name: "Takamatsu", lat: 34.3402, lng: 134.0434, region: Region::Shikoku },
    City { name: "Matsuyama", lat: 33.8416, lng: 132.7657, region: Region::Shikoku },
    City { name: "Kochi", lat: 33.5597, lng: 133.5311, region: Region::Shikoku },
    City { name: "Tokushima", lat: 34.0658, lng: 134.5594, region: Region::Shikoku },
    // Kyushu / Okinawa
    City { name: "Fukuoka", lat: 33.5904, lng: 130.4017, region: Region::Kyushu },
    City { name: "Kitakyushu", lat: 33.8834, lng: 130.8751, region: Region::Kyushu },
    City { name: "Saga", lat: 33.2494, lng: 130.2989, region: Region::Kyushu },
    City { name: "Nagasaki", lat: 32.7503, lng: 129.8779, region: Region::Kyushu },
    City { name: "Kumamoto", lat: 32.7898, lng: 130.7417, region: Region::Kyushu },
    City { name: "Oita", lat: 33.2382, lng: 131.6126, region: Region::Kyushu },
    City { name: "Miyazaki", lat: 31.9077, lng: 131.4202, region: Region::Kyushu },
    City { name: "Kagoshima", lat: 31.5966, lng: 130.5571, region: Region::Kyushu },
    City { name: "Naha", lat: 26.2124, lng: 127.6792, region: Region::Okinawa },
];
