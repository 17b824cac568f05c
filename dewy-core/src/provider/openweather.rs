use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    config::Config,
    model::{Coordinates, CurrentConditions, ForecastSet, PostalCode, Units},
};

use super::{SourceError, WeatherSource};

const CURRENT_ENDPOINT: &str = "OpenWeather current weather";
const FORECAST_ENDPOINT: &str = "OpenWeather daily forecast";

/// OpenWeatherMap data API 2.5 over HTTP.
#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_key: String,
    base_url: String,
    units: Units,
    country: String,
    forecast_days: u8,
    http: Client,
}

impl OpenWeatherSource {
    /// Build a source from config. Fails when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?.to_owned();

        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            units: config.units,
            country: config.country.clone(),
            forecast_days: config.forecast_days,
            http,
        })
    }

    pub fn units(&self) -> Units {
        self.units
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, ?query, units = %self.units, "requesting {endpoint}");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str()), ("units", self.units.as_str())])
            .send()
            .await
            .map_err(|source| SourceError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| SourceError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(SourceError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        if body.trim().is_empty() {
            return Err(SourceError::Empty { endpoint });
        }

        // A literal `null` body parses as None.
        let parsed: Option<T> = serde_json::from_str(&body)
            .map_err(|source| SourceError::Parse { endpoint, source })?;

        parsed.ok_or(SourceError::Empty { endpoint })
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    async fn current_by_postal_code(
        &self,
        code: &PostalCode,
    ) -> Result<CurrentConditions, SourceError> {
        let conditions: CurrentConditions = self
            .get_json(
                CURRENT_ENDPOINT,
                "weather",
                &[("q", code.qualified(&self.country))],
            )
            .await?;

        ensure_conditions(conditions)
    }

    async fn forecast_by_postal_code(&self, code: &PostalCode) -> Result<ForecastSet, SourceError> {
        self.get_json(
            FORECAST_ENDPOINT,
            "forecast/daily",
            &[
                ("zip", code.qualified(&self.country)),
                ("cnt", self.forecast_days.to_string()),
            ],
        )
        .await
    }

    async fn current_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<CurrentConditions, SourceError> {
        if !coordinates.is_valid() {
            return Err(SourceError::InvalidCoordinates {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
            });
        }

        let conditions: CurrentConditions = self
            .get_json(
                CURRENT_ENDPOINT,
                "weather",
                &[
                    ("lat", coordinates.latitude.to_string()),
                    ("lon", coordinates.longitude.to_string()),
                ],
            )
            .await?;

        ensure_conditions(conditions)
    }
}

fn ensure_conditions(conditions: CurrentConditions) -> Result<CurrentConditions, SourceError> {
    if conditions.weather.is_empty() {
        return Err(SourceError::Incomplete {
            endpoint: CURRENT_ENDPOINT,
            what: "condition descriptors",
        });
    }
    Ok(conditions)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
