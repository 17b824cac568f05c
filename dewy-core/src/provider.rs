use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Coordinates, CurrentConditions, ForecastSet, PostalCode};

pub mod openweather;

pub use openweather::OpenWeatherSource;

/// Everything that can go wrong between sending a request and holding a parsed value.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} responded with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse {endpoint} response: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} returned an empty payload")]
    Empty { endpoint: &'static str },

    #[error("{endpoint} response is missing {what}")]
    Incomplete {
        endpoint: &'static str,
        what: &'static str,
    },

    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

/// External weather data source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_by_postal_code(
        &self,
        code: &PostalCode,
    ) -> Result<CurrentConditions, SourceError>;

    async fn forecast_by_postal_code(&self, code: &PostalCode) -> Result<ForecastSet, SourceError>;

    async fn current_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<CurrentConditions, SourceError>;
}
