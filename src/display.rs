//! Pure view models for the summary panel and the map.

use chrono::{DateTime, FixedOffset, Utc};

use crate::data::LookupResult;

pub const ISP_PLACEHOLDER: &str = "Unknown ISP";

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryPanel {
    pub ip: String,
    pub city: String,
    pub timezone: String,
    pub isp: String,
}

impl SummaryPanel {
    pub fn render(result: Option<&LookupResult>) -> Option<SummaryPanel> {
        let result = result?;
        let isp = if result.isp.trim().is_empty() {
            ISP_PLACEHOLDER.to_string()
        } else {
            result.isp.clone()
        };

        Some(SummaryPanel {
            ip: result.ip.clone(),
            city: result.city.clone(),
            timezone: format!("UTC{}", result.timezone),
            isp,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub lat: f64,
    pub lng: f64,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: f64,
    pub marker: MarkerSpec,
}

impl MapView {
    pub fn render(result: Option<&LookupResult>, zoom: f64) -> Option<MapView> {
        let result = result?;
        Some(MapView {
            center: (result.lat, result.lng),
            zoom,
            marker: MarkerSpec {
                lat: result.lat,
                lng: result.lng,
                popup: format!("IP: {}\nLocation: {}", result.ip, result.city),
            },
        })
    }

    pub fn osm_link(&self) -> String {
        format!(
            "https://www.openstreetmap.org/?mlat={lat}&mlon={lng}#map={zoom}/{lat}/{lng}",
            lat = self.center.0,
            lng = self.center.1,
            zoom = self.zoom.round() as i64
        )
    }
}

/// Parses an offset like `-08:00` or `+05:30`.
pub fn parse_utc_offset(offset: &str) -> Option<FixedOffset> {
    let offset = offset.trim();
    let (sign, rest) = match offset.as_bytes().first()? {
        b'+' => (1, &offset[1..]),
        b'-' => (-1, &offset[1..]),
        _ => (1, offset),
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours = offset_field(hours, 23)?;
    let minutes = offset_field(minutes, 59)?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Digits only, at most two of them, no greater than `max`.
fn offset_field(field: &str, max: i32) -> Option<i32> {
    if field.is_empty() || field.len() > 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i32 = field.parse().ok()?;
    (value <= max).then_some(value)
}

/// Wall-clock time at the result's location, `None` if the offset is unusable.
pub fn local_time_at(offset: &str, now: DateTime<Utc>) -> Option<String> {
    let offset = parse_utc_offset(offset)?;
    Some(now.with_timezone(&offset).format("%H:%M:%S").to_string())
}
