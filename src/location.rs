//! Coordinate resolution for report location fields.
//!
//! An extracted location string is tried as an MGRS grid first, then as a
//! decimal latitude/longitude pair. Circular error encodes which path
//! produced the fix: 10 m for a grid, 100 m for a decimal pair, and the
//! 9999999 sentinel when nothing resolved.

use std::f64::consts::PI;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::pipeline::phonetic;

/// Circular/linear error assigned to an MGRS-derived fix, meters.
pub const GRID_ERROR_M: f64 = 10.0;
/// Error assigned to a spoken decimal pair, meters.
pub const DECIMAL_ERROR_M: f64 = 100.0;
/// CoT convention for "no idea".
pub const UNKNOWN_ERROR_M: f64 = 9_999_999.0;

// WGS84.
const WGS84_A: f64 = 6_378_137.0;
const WGS84_E2: f64 = 0.006_694_379_990_14;
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_S: f64 = 10_000_000.0;

/// Latitude bands C..X south to north, I and O skipped.
const BAND_LETTERS: &str = "CDEFGHJKLMNPQRSTUVWX";
/// 100 km row letters cycle with period 20.
const ROW_LETTERS: &str = "ABCDEFGHJKLMNPQRSTUV";
/// 100 km column letter sets, repeating every three zones.
const COLUMN_SETS: [&str; 3] = ["ABCDEFGH", "JKLMNPQR", "STUVWXYZ"];

static MGRS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2})([C-HJ-NP-X])([A-HJ-NP-Z]{2})([0-9]{2,10})$").unwrap()
});

static LABELED_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)lat(?:itude)?[:\s]+(-?\d+(?:\.\d+)?)[,\s]+lon(?:g|gitude)?[:\s]+(-?\d+(?:\.\d+)?)")
        .unwrap()
});

static BARE_PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\d+\.\d+)\s*,\s*(-?\d+\.\d+)").unwrap());

/// A resolved position in the CoT point shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub hae: f64,
    pub ce: f64,
    pub le: f64,
}

impl GeoPoint {
    pub fn unknown() -> Self {
        GeoPoint {
            lat: 0.0,
            lon: 0.0,
            hae: 0.0,
            ce: UNKNOWN_ERROR_M,
            le: UNKNOWN_ERROR_M,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.ce >= UNKNOWN_ERROR_M
    }
}

/// Resolve a location field to a point. Never fails: text that parses as
/// neither a grid nor a decimal pair yields the unknown sentinel.
pub fn resolve(location_text: &str) -> GeoPoint {
    let candidate = phonetic::splice_grid(location_text);
    if let Some(caps) = MGRS_RE.captures(&candidate) {
        let zone: u32 = match caps[1].parse() {
            Ok(z) => z,
            Err(_) => return GeoPoint::unknown(),
        };
        let band = caps[2].chars().next().unwrap_or('N');
        if let Some((lat, lon)) = mgrs_to_latlon(zone, band, &caps[3], &caps[4]) {
            debug!(grid = %candidate, lat, lon, "resolved MGRS grid");
            return GeoPoint {
                lat,
                lon,
                hae: 0.0,
                ce: GRID_ERROR_M,
                le: GRID_ERROR_M,
            };
        }
    }

    if let Some((lat, lon)) = decimal_pair(location_text) {
        debug!(lat, lon, "resolved decimal pair");
        return GeoPoint {
            lat,
            lon,
            hae: 0.0,
            ce: DECIMAL_ERROR_M,
            le: DECIMAL_ERROR_M,
        };
    }

    GeoPoint::unknown()
}

fn decimal_pair(text: &str) -> Option<(f64, f64)> {
    let caps = LABELED_PAIR_RE
        .captures(text)
        .or_else(|| BARE_PAIR_RE.captures(text))?;
    let lat: f64 = caps[1].parse().ok()?;
    let lon: f64 = caps[2].parse().ok()?;
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        Some((lat, lon))
    } else {
        None
    }
}

/// Reformat a compact grid string into the conventional spaced form,
/// "35VNF61105197" -> "35V NF 6110 5197". Text that is not grid-shaped is
/// returned unchanged.
pub fn format_mgrs(grid: &str) -> String {
    let compact: String = grid
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let Some(caps) = MGRS_RE.captures(&compact) else {
        return grid.to_string();
    };
    let digits = &caps[4];
    if digits.len() % 2 != 0 {
        return grid.to_string();
    }
    let half = digits.len() / 2;
    format!(
        "{}{} {} {} {}",
        &caps[1],
        &caps[2],
        &caps[3],
        &digits[..half],
        &digits[half..]
    )
}

fn mgrs_to_latlon(zone: u32, band: char, square: &str, digits: &str) -> Option<(f64, f64)> {
    if !(1..=60).contains(&zone) {
        return None;
    }
    let mut sq = square.chars();
    let col_letter = sq.next()?;
    let row_letter = sq.next()?;

    let col_set = COLUMN_SETS[((zone - 1) % 3) as usize];
    let col_index = col_set.find(col_letter)? as f64;
    let easting_100k = (col_index + 1.0) * 100_000.0;

    // Even zones shift the row cycle by five letters.
    let row_offset = if zone % 2 == 0 { 5 } else { 0 };
    let row_pos = ROW_LETTERS.find(row_letter)?;
    let row_index = (row_pos + 20 - row_offset) % 20;
    let northing_100k = row_index as f64 * 100_000.0;

    // Odd precision grids imply a trailing zero on the northing half.
    let mut digits = digits.to_string();
    if digits.len() % 2 != 0 {
        digits.push('0');
    }
    let half = digits.len() / 2;
    let scale = 10f64.powi(5 - half as i32);
    let easting_in: f64 = digits[..half].parse::<f64>().ok()? * scale;
    let northing_in: f64 = digits[half..].parse::<f64>().ok()? * scale;

    let easting = easting_100k + easting_in;
    let mut northing = northing_100k + northing_in;

    // The row letter only fixes the northing modulo 2,000 km; bump it until
    // it sits at or above the bottom of the latitude band.
    let band_index = BAND_LETTERS.find(band)?;
    let north = band >= 'N';
    let band_bottom_lat = (band_index as f64) * 8.0 - 80.0;
    let band_bottom_northing = if north {
        UTM_K0 * meridian_arc(band_bottom_lat.to_radians())
    } else {
        UTM_FALSE_NORTHING_S + UTM_K0 * meridian_arc(band_bottom_lat.to_radians())
    };
    while northing < band_bottom_northing - 1.0 {
        northing += 2_000_000.0;
    }

    Some(utm_to_latlon(zone, north, easting, northing))
}

/// Meridian arc length from the equator, meters. Positive north.
fn meridian_arc(lat: f64) -> f64 {
    let e2 = WGS84_E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

/// Inverse transverse Mercator on the WGS84 ellipsoid.
fn utm_to_latlon(zone: u32, north: bool, easting: f64, northing: f64) -> (f64, f64) {
    let e2 = WGS84_E2;
    let x = easting - UTM_FALSE_EASTING;
    let y = if north {
        northing
    } else {
        northing - UTM_FALSE_NORTHING_S
    };

    let m = y / UTM_K0;
    let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let ep2 = e2 / (1.0 - e2);
    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let c1 = ep2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let n1 = WGS84_A / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
    let r1 = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
    let d = x / (n1 * UTM_K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let lon0 = ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0) * PI / 180.0;
    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    (lat.to_degrees(), lon.to_degrees())
}
