//! Coordinate Reference System handling

use std::fmt;
use std::str::FromStr;

/// A coordinate reference system identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    /// An EPSG-registered system
    Epsg(u32),
    /// No geo-referencing information available
    Unknown,
}

impl Crs {
    /// WGS 84 geographic (EPSG:4326)
    pub const WGS84: Crs = Crs::Epsg(4326);
    /// Spherical Web Mercator (EPSG:3857)
    pub const WEB_MERCATOR: Crs = Crs::Epsg(3857);

    /// Get the EPSG code, if any
    pub fn epsg_code(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            Crs::Unknown => None,
        }
    }

    /// Whether coordinates are longitude/latitude degrees
    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Epsg(4326) | Crs::Epsg(4269) | Crs::Epsg(4258))
    }

    /// Get a description of this coordinate system
    pub fn description(&self) -> String {
        match self {
            Crs::Epsg(4326) => "WGS 84 (EPSG:4326)".to_string(),
            Crs::Epsg(3857) => "Web Mercator (EPSG:3857)".to_string(),
            Crs::Epsg(code @ 32601..=32660) => {
                format!("WGS 84 / UTM zone {}N (EPSG:{})", code - 32600, code)
            }
            Crs::Epsg(code @ 32701..=32760) => {
                format!("WGS 84 / UTM zone {}S (EPSG:{})", code - 32700, code)
            }
            Crs::Epsg(code) => format!("EPSG:{}", code),
            Crs::Unknown => "unknown CRS".to_string(),
        }
    }

    /// Name used in the GeoJSON `crs` member
    pub fn ogc_urn(&self) -> Option<String> {
        self.epsg_code()
            .map(|code| format!("urn:ogc:def:crs:EPSG::{}", code))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for Crs {
    type Err = String;

    /// Accepts `EPSG:4326`, `4326`, `urn:ogc:def:crs:EPSG::4326` and the
    /// OGC `CRS84` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_uppercase();

        if upper.ends_with("CRS84") {
            return Ok(Crs::WGS84);
        }

        let code = if let Some(rest) = upper.strip_prefix("EPSG:") {
            rest
        } else if upper.starts_with("URN:OGC:DEF:CRS:EPSG:") {
            upper.rsplit(':').next().unwrap_or("")
        } else {
            upper.as_str()
        };

        code.trim()
            .parse::<u32>()
            .map(Crs::Epsg)
            .map_err(|_| format!("Unsupported CRS format: {}", trimmed))
    }
}
