//! Observable holder for the latest fetched weather.
//!
//! Each field is a `watch` channel holding `Option<Arc<_>>`. Writers replace the
//! whole value, so observers only ever see complete snapshots. Observers
//! subscribe by taking a receiver and unsubscribe by dropping it.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::{CurrentConditions, ForecastSet};

pub type CurrentSnapshot = Option<Arc<CurrentConditions>>;
pub type ForecastSnapshot = Option<Arc<ForecastSet>>;

#[derive(Debug)]
pub struct WeatherState {
    current: watch::Sender<CurrentSnapshot>,
    forecast: watch::Sender<ForecastSnapshot>,
}

impl Default for WeatherState {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherState {
    /// Empty state: no conditions, no forecast.
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        let (forecast, _) = watch::channel(None);
        Self { current, forecast }
    }

    pub fn current(&self) -> CurrentSnapshot {
        self.current.borrow().clone()
    }

    pub fn forecast(&self) -> ForecastSnapshot {
        self.forecast.borrow().clone()
    }

    /// Receiver that is marked changed on every write to current conditions.
    pub fn subscribe_current(&self) -> watch::Receiver<CurrentSnapshot> {
        self.current.subscribe()
    }

    /// Receiver that is marked changed on every write to the forecast.
    pub fn subscribe_forecast(&self) -> watch::Receiver<ForecastSnapshot> {
        self.forecast.subscribe()
    }

    /// Stores `conditions` and hands back the exact value written.
    pub(crate) fn replace_current(&self, conditions: CurrentConditions) -> Arc<CurrentConditions> {
        let stored = Arc::new(conditions);
        self.current.send_replace(Some(Arc::clone(&stored)));
        stored
    }

    pub(crate) fn replace_forecast(&self, forecast: ForecastSet) {
        self.forecast.send_replace(Some(Arc::new(forecast)));
    }

    pub(crate) fn clear_forecast(&self) {
        self.forecast.send_replace(None);
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::*;

    pub fn conditions(name: &str, temp: f64) -> CurrentConditions {
        CurrentConditions {
            name: name.to_string(),
            main: MainReadings {
                temp,
                feels_like: temp - 1.0,
                temp_min: temp - 3.0,
                temp_max: temp + 3.0,
                humidity: 50,
                pressure: 1013,
            },
            weather: vec![ConditionDescriptor {
                description: "clear sky".into(),
                icon: "01d".into(),
            }],
            wind: Wind {
                speed: 5.0,
                deg: 180,
                gust: Some(9.0),
            },
            sys: SunTimes {
                country: "US".into(),
                sunrise: 1_718_100_000,
                sunset: 1_718_155_000,
            },
        }
    }

    pub fn forecast(name: &str, days: u32) -> ForecastSet {
        ForecastSet {
            city: City {
                name: name.to_string(),
                country: "US".into(),
            },
            cnt: days,
            list: (0..days)
                .map(|i| DailyForecast {
                    dt: 1_718_100_000 + i64::from(i) * 86_400,
                    temp: DailyTemperature {
                        day: 70.0,
                        min: 60.0,
                        max: 78.0,
                    },
                    weather: vec![ConditionDescriptor {
                        description: "light rain".into(),
                        icon: "10d".into(),
                    }],
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{conditions, forecast};
    use super::*;

    #[test]
    fn starts_empty() {
        let state = WeatherState::new();
        assert!(state.current().is_none());
        assert!(state.forecast().is_none());
    }

    #[test]
    fn fields_are_replaced_independently() {
        let state = WeatherState::new();

        state.replace_current(conditions("Faribault", 70.0));
        assert!(state.forecast().is_none());

        state.replace_forecast(forecast("Northfield", 3));
        let current = state.current().expect("current");
        assert_eq!(current.name, "Faribault");
        assert_eq!(state.forecast().expect("forecast").city.name, "Northfield");

        state.clear_forecast();
        assert!(state.forecast().is_none());
        assert!(state.current().is_some());
    }

    #[tokio::test]
    async fn subscribers_are_notified_on_write() {
        let state = WeatherState::new();
        let mut rx = state.subscribe_current();
        assert!(!rx.has_changed().expect("sender alive"));

        state.replace_current(conditions("Faribault", 70.0));

        rx.changed().await.expect("sender alive");
        let seen = rx.borrow_and_update().clone().expect("value");
        assert_eq!(seen.name, "Faribault");
    }

    #[test]
    fn dropped_subscriber_does_not_block_writes() {
        let state = WeatherState::new();
        drop(state.subscribe_forecast());

        state.replace_forecast(forecast("Faribault", 16));
        assert_eq!(state.forecast().expect("forecast").list.len(), 16);
    }
}
