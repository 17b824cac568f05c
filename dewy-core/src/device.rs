//! Platform collaborators consumed by the location refresh flow.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    icon::WeatherIcon,
    model::{Coordinates, CurrentConditions, Units},
};

/// Notification id used for the location weather notification; re-posting replaces it.
pub const LOCATION_NOTIFICATION_ID: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Location,
    PostNotifications,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionGate: Send + Sync {
    fn is_granted(&self, permission: Permission) -> bool;

    /// Ask the platform for `permission` and wait for the user's answer.
    async fn request(&self, permission: Permission) -> bool;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// One high-accuracy fix, or `None` when the platform has none.
    async fn current_fix(&self) -> Option<Coordinates>;
}

#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    /// Show or update a persistent notification.
    fn show(&self, notification: &OngoingNotification) -> anyhow::Result<()>;
}

/// Content of the persistent location weather notification.
#[derive(Debug, Clone, PartialEq)]
pub struct OngoingNotification {
    pub id: u32,
    pub title: String,
    pub body: String,
    pub icon: WeatherIcon,
    pub ongoing: bool,
}

impl OngoingNotification {
    /// Title is the location name; body is the rounded temperature and the first condition.
    pub fn for_conditions(conditions: &CurrentConditions, units: Units) -> Self {
        let primary = conditions.primary_condition();
        let description = primary.map(|c| c.description.as_str()).unwrap_or("Unknown");

        Self {
            id: LOCATION_NOTIFICATION_ID,
            title: conditions.name.clone(),
            body: format!(
                "{}{}, {}",
                conditions.main.temp.round() as i64,
                units.temperature_suffix(),
                description
            ),
            icon: WeatherIcon::from_code(primary.map(|c| c.icon.as_str())),
            ongoing: true,
        }
    }
}

/// Location, permission and notification access bundled for injection.
#[derive(Clone)]
pub struct DeviceServices {
    pub permissions: Arc<dyn PermissionGate>,
    pub location: Arc<dyn LocationProvider>,
    pub notifications: Arc<dyn NotificationSink>,
}

impl std::fmt::Debug for DeviceServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceServices").finish_non_exhaustive()
    }
}
