//! Core library for `dewy`.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather source abstraction and its OpenWeather implementation
//! - Observable weather state and the fetch coordinator that writes it
//! - The permission-gated location refresh flow and its device collaborators
//!
//! It is used by `dewy-cli`, but any front end that can observe a `watch`
//! channel and implement the device traits can drive it.

pub mod config;
pub mod coordinator;
pub mod device;
pub mod icon;
pub mod location;
pub mod model;
pub mod provider;
pub mod state;

pub use config::Config;
pub use coordinator::{FetchCoordinator, FetchError, FetchKind};
pub use device::{
    DeviceServices, LocationProvider, NotificationSink, OngoingNotification, Permission,
    PermissionGate,
};
pub use icon::WeatherIcon;
pub use location::{FlowState, LocationRefreshFlow, RefreshOutcome};
pub use model::{
    Coordinates, CurrentConditions, DailyForecast, ForecastSet, PostalCode, PostalCodeError, Units,
};
pub use provider::{OpenWeatherSource, SourceError, WeatherSource};
pub use state::WeatherState;
