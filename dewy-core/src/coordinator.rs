use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    model::{Coordinates, CurrentConditions, PostalCode},
    provider::{SourceError, WeatherSource},
    state::WeatherState,
};

/// What a fetch was trying to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Current,
    Forecast,
}

impl std::fmt::Display for FetchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchKind::Current => f.write_str("current conditions"),
            FetchKind::Forecast => f.write_str("forecast"),
        }
    }
}

/// Single failure signal for every fetch. The cause is only kept for logs.
#[derive(Debug, Error)]
#[error("couldn't load {kind} for {key}")]
pub struct FetchError {
    pub kind: FetchKind,
    pub key: String,
    #[source]
    source: SourceError,
}

impl FetchError {
    fn new(kind: FetchKind, key: impl Into<String>, source: SourceError) -> Self {
        Self {
            kind,
            key: key.into(),
            source,
        }
    }
}

/// Runs fetches against a [`WeatherSource`] and writes results into [`WeatherState`].
///
/// Calls are independent: nothing is deduplicated, and when two fetches of the
/// same kind overlap the one that completes last wins.
///
/// Failure policy: a failed current-conditions fetch keeps whatever was there
/// before; a failed forecast fetch clears the forecast.
#[derive(Clone)]
pub struct FetchCoordinator {
    source: Arc<dyn WeatherSource>,
    state: Arc<WeatherState>,
}

impl std::fmt::Debug for FetchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCoordinator")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl FetchCoordinator {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self::with_state(source, Arc::new(WeatherState::new()))
    }

    pub fn with_state(source: Arc<dyn WeatherSource>, state: Arc<WeatherState>) -> Self {
        Self { source, state }
    }

    /// Read-only handle for observers.
    pub fn state(&self) -> Arc<WeatherState> {
        Arc::clone(&self.state)
    }

    #[instrument(skip(self, code), fields(code = %code))]
    pub async fn fetch_current_by_postal_code(&self, code: &PostalCode) -> Result<(), FetchError> {
        match self.source.current_by_postal_code(code).await {
            Ok(conditions) => {
                info!(location = %conditions.name, "current conditions updated");
                self.state.replace_current(conditions);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "current conditions fetch failed; keeping previous value");
                Err(FetchError::new(FetchKind::Current, code.as_str(), err))
            }
        }
    }

    #[instrument(skip(self, code), fields(code = %code))]
    pub async fn fetch_forecast_by_postal_code(&self, code: &PostalCode) -> Result<(), FetchError> {
        match self.source.forecast_by_postal_code(code).await {
            Ok(forecast) => {
                info!(
                    location = %forecast.city.name,
                    cnt = forecast.cnt,
                    days = forecast.list.len(),
                    "forecast updated"
                );
                self.state.replace_forecast(forecast);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "forecast fetch failed; clearing forecast");
                self.state.clear_forecast();
                Err(FetchError::new(FetchKind::Forecast, code.as_str(), err))
            }
        }
    }

    /// Returns the conditions this call wrote, which may already have been
    /// superseded in the shared state by a concurrent fetch.
    #[instrument(skip(self))]
    pub async fn fetch_current_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Arc<CurrentConditions>, FetchError> {
        let coordinates = Coordinates::new(lat, lon);
        let key = format!("{lat},{lon}");

        if !coordinates.is_valid() {
            warn!("rejecting coordinates outside the valid range");
            return Err(FetchError::new(
                FetchKind::Current,
                key,
                SourceError::InvalidCoordinates {
                    latitude: lat,
                    longitude: lon,
                },
            ));
        }

        match self.source.current_by_coordinates(coordinates).await {
            Ok(conditions) => {
                info!(location = %conditions.name, "current conditions updated from coordinates");
                Ok(self.state.replace_current(conditions))
            }
            Err(err) => {
                warn!(error = %err, "coordinate fetch failed");
                Err(FetchError::new(FetchKind::Current, key, err))
            }
        }
    }
}
