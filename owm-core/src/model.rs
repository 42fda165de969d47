use std::{fmt, str::FromStr};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Where a forecast is requested for.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Coordinates { lat: f64, lon: f64 },
    CityName(String),
    CityId(u32),
}

impl Location {
    /// Query-string fragment identifying this location.
    pub fn query_param(&self) -> String {
        match self {
            Location::Coordinates { lat, lon } => format!("lat={lat}&lon={lon}"),
            Location::CityName(name) => {
                let encoded: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
                format!("q={encoded}")
            }
            Location::CityId(id) => format!("id={id}"),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Coordinates { lat, lon } => write!(f, "{lat},{lon}"),
            Location::CityName(name) => f.write_str(name),
            Location::CityId(id) => write!(f, "#{id}"),
        }
    }
}

/// Accepts `"<lat>,<lon>"`, an all-digit city id, or anything else as a city name
/// (so `"London,uk"` stays a name).
impl FromStr for Location {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Location must not be empty."));
        }

        if let Some((lat, lon)) = s.split_once(',')
            && let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>())
        {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(anyhow!(
                    "Invalid coordinates '{s}': latitude must be -90 to 90, longitude -180 to 180."
                ));
            }
            return Ok(Location::Coordinates { lat, lon });
        }

        if s.bytes().all(|b| b.is_ascii_digit()) {
            let id = s.parse().map_err(|_| anyhow!("City id '{s}' is out of range."))?;
            return Ok(Location::CityId(id));
        }

        Ok(Location::CityName(s.to_string()))
    }
}

/// Unit system requested from the server. Kelvin is the server default and sends no
/// `units` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Imperial,
    Metric,
    #[default]
    Kelvin,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Imperial => "imperial",
            Units::Metric => "metric",
            Units::Kelvin => "kelvin",
        }
    }

    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            Units::Imperial | Units::Metric => Some(self.as_str()),
            Units::Kelvin => None,
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Imperial, Units::Metric, Units::Kelvin]
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "imperial" => Ok(Units::Imperial),
            "metric" => Ok(Units::Metric),
            "kelvin" | "standard" => Ok(Units::Kelvin),
            _ => Err(anyhow!("Unknown units '{s}'. Supported units: imperial, metric, kelvin.")),
        }
    }
}

/// Which endpoint a fetch goes to, and how its payload is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ForecastKind {
    Current,
    Hourly,
    Daily,
}

impl ForecastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastKind::Current => "current",
            ForecastKind::Hourly => "hourly",
            ForecastKind::Daily => "daily",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            ForecastKind::Current => "/data/2.5/weather",
            ForecastKind::Hourly => "/data/2.5/forecast",
            ForecastKind::Daily => "/data/2.5/forecast/daily",
        }
    }

    /// Upper bound on the entry count, where the endpoint has one.
    pub fn max_count(&self) -> Option<u32> {
        match self {
            ForecastKind::Daily => Some(10),
            ForecastKind::Current | ForecastKind::Hourly => None,
        }
    }

    /// Whether the payload is a sequence of `<time>` entries.
    pub fn is_multi_entry(&self) -> bool {
        !matches!(self, ForecastKind::Current)
    }
}

impl fmt::Display for ForecastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of one request. Lives only for the duration of a fetch.
#[derive(Debug, Clone)]
pub struct ForecastQuery<'a> {
    pub kind: ForecastKind,
    pub location: &'a Location,
    /// Entry count; never sent for current conditions.
    pub count: Option<u32>,
    pub units: Units,
    pub api_key: Option<&'a str>,
}

impl ForecastQuery<'_> {
    pub fn validate(&self) -> Result<(), FetchError> {
        if let (Some(max), Some(requested)) = (self.kind.max_count(), self.count)
            && requested > max
        {
            return Err(FetchError::InvalidArgument {
                kind: self.kind,
                requested,
                max,
            });
        }
        Ok(())
    }

    pub fn query_string(&self) -> String {
        let mut query = self.location.query_param();

        if self.kind.is_multi_entry()
            && let Some(count) = self.count
        {
            query.push_str(&format!("&cnt={count}"));
        }

        query.push_str("&mode=xml");

        if let Some(key) = self.api_key {
            query.push_str(&format!("&APPID={key}"));
        }
        if let Some(units) = self.units.query_value() {
            query.push_str(&format!("&units={units}"));
        }

        query
    }

    /// Full HTTP/1.0 request text for `host`.
    pub fn http_request(&self, host: &str) -> String {
        format!(
            "GET {}?{} HTTP/1.0\r\nHost: {}\r\nContent-length: 0\r\n\r\n",
            self.kind.path(),
            self.query_string(),
            host,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(kind: ForecastKind, location: &Location, count: Option<u32>) -> ForecastQuery<'_> {
        ForecastQuery {
            kind,
            location,
            count,
            units: Units::default(),
            api_key: None,
        }
    }

    #[test]
    fn location_from_str_variants() {
        assert_eq!(
            "52.52, 13.405".parse::<Location>().unwrap(),
            Location::Coordinates { lat: 52.52, lon: 13.405 }
        );
        assert_eq!("2950159".parse::<Location>().unwrap(), Location::CityId(2950159));
        assert_eq!(
            "London,uk".parse::<Location>().unwrap(),
            Location::CityName("London,uk".into())
        );
    }

    #[test]
    fn location_from_str_rejects_bad_input() {
        assert!("".parse::<Location>().is_err());
        assert!("91,0".parse::<Location>().is_err());
        assert!("99999999999".parse::<Location>().is_err());
    }

    #[test]
    fn city_names_are_form_encoded() {
        let location = Location::CityName("São Paulo".into());
        assert_eq!(location.query_param(), "q=S%C3%A3o+Paulo");
    }

    #[test]
    fn current_query_has_no_count() {
        let location = Location::CityId(42);
        let q = query(ForecastKind::Current, &location, Some(3));
        assert_eq!(q.query_string(), "id=42&mode=xml");
    }

    #[test]
    fn query_appends_key_and_units() {
        let location = Location::Coordinates { lat: 40.5, lon: -105.25 };
        let q = ForecastQuery {
            api_key: Some("KEY"),
            units: Units::Imperial,
            ..query(ForecastKind::Hourly, &location, Some(4))
        };
        assert_eq!(
            q.query_string(),
            "lat=40.5&lon=-105.25&cnt=4&mode=xml&APPID=KEY&units=imperial"
        );
    }

    #[test]
    fn kelvin_sends_no_units() {
        let location = Location::CityName("Oslo".into());
        let q = query(ForecastKind::Daily, &location, Some(2));
        assert!(!q.query_string().contains("units="));
    }

    #[test]
    fn http_request_layout() {
        let location = Location::CityName("Berlin".into());
        let q = ForecastQuery {
            units: Units::Metric,
            ..query(ForecastKind::Daily, &location, Some(3))
        };
        assert_eq!(
            q.http_request("api.openweathermap.org"),
            "GET /data/2.5/forecast/daily?q=Berlin&cnt=3&mode=xml&units=metric HTTP/1.0\r\n\
             Host: api.openweathermap.org\r\n\
             Content-length: 0\r\n\
             \r\n"
        );
    }

    #[test]
    fn daily_count_is_bounded() {
        let location = Location::CityId(1);
        assert!(query(ForecastKind::Daily, &location, Some(10)).validate().is_ok());

        let err = query(ForecastKind::Daily, &location, Some(11)).validate().unwrap_err();
        assert!(matches!(err, FetchError::InvalidArgument { requested: 11, max: 10, .. }));

        assert!(query(ForecastKind::Hourly, &location, Some(40)).validate().is_ok());
    }

    #[test]
    fn units_parse_and_display() {
        for units in Units::all() {
            assert_eq!(units.as_str().parse::<Units>().unwrap(), *units);
        }
        assert_eq!("standard".parse::<Units>().unwrap(), Units::Kelvin);
        assert!("rankine".parse::<Units>().unwrap_err().to_string().contains("Unknown units"));
    }
}
