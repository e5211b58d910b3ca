use serde::Deserialize;

pub const APP_ID: &str = "com.toasterrepair.IpTracker";
pub const IPIFY_API_URL: &str = "https://geo.ipify.org/api/v2/country,city";
pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const SEED_QUERY: &str = "8.8.8.8";
pub const DEFAULT_ZOOM: f64 = 13.0;

/// Geolocation for one resolved query.
///
/// Always built whole from a single response and swapped in as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub ip: String,
    /// UTC offset as reported by the API, e.g. `-05:00`.
    pub timezone: String,
    pub city: String,
    pub isp: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeoLocation {
    pub city: String,
    pub timezone: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeoResponse {
    pub ip: String,
    #[serde(default)]
    pub isp: Option<String>,
    pub location: GeoLocation,
}

/// Body ipify sends alongside a non-2xx status.
#[derive(Debug, Deserialize)]
pub struct IpifyErrorBody {
    #[serde(default)]
    pub messages: String,
}

impl From<GeoResponse> for LookupResult {
    fn from(response: GeoResponse) -> Self {
        LookupResult {
            ip: response.ip,
            timezone: response.location.timezone,
            city: response.location.city,
            isp: response.isp.unwrap_or_default(),
            lat: response.location.lat,
            lng: response.location.lng,
        }
    }
}
