use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 5-digit US ZIP code.
///
/// Construction is the only validation point; everything downstream can assume
/// exactly five ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostalCodeError {
    #[error("Zip code must be 5 digits.")]
    InvalidFormat,
}

impl PostalCode {
    pub fn parse(input: &str) -> Result<Self, PostalCodeError> {
        let trimmed = input.trim();
        if trimmed.len() == 5 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(PostalCodeError::InvalidFormat)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Code with a country qualifier appended, e.g. `55021,us`.
    pub fn qualified(&self, country: &str) -> String {
        format!("{},{}", self.0, country)
    }
}

impl FromStr for PostalCode {
    type Err = PostalCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device-reported position in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Units system sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Imperial => "imperial",
            Units::Metric => "metric",
            Units::Standard => "standard",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Units::Imperial => "°F",
            Units::Metric => "°C",
            Units::Standard => "K",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text description plus OpenWeather icon code (`01d`, `10n`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDescriptor {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub pressure: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub deg: u16,
    #[serde(default)]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunTimes {
    pub country: String,
    pub sunrise: i64,
    pub sunset: i64,
}

/// Point-in-time snapshot returned by the `/weather` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub name: String,
    pub main: MainReadings,
    pub weather: Vec<ConditionDescriptor>,
    pub wind: Wind,
    pub sys: SunTimes,
}

impl CurrentConditions {
    /// First condition descriptor; the source always sends at least one.
    pub fn primary_condition(&self) -> Option<&ConditionDescriptor> {
        self.weather.first()
    }

    pub fn sunrise(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.sys.sunrise)
    }

    pub fn sunset(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.sys.sunset)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperature {
    pub day: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub dt: i64,
    pub temp: DailyTemperature,
    pub weather: Vec<ConditionDescriptor>,
}

impl DailyForecast {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.dt)
    }
}

/// Multi-day outlook from `/forecast/daily`.
///
/// `cnt` is whatever the source reported and is not required to match `list.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSet {
    pub city: City,
    pub cnt: u32,
    pub list: Vec<DailyForecast>,
}

pub fn epoch_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}
