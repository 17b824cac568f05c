//! Permission-gated "weather where I am" refresh.
//!
//! `Idle -> PermissionPending -> LocationPending -> NotificationShown -> Idle`.
//! Every exit path, including the trigger future being dropped, lands back in
//! `Idle`. Failures are logged and reported through [`RefreshOutcome`] only.
//!
//! One cycle runs at a time per flow; a trigger that arrives while another is
//! in progress returns [`RefreshOutcome::InProgress`] without touching state.

use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::{
    coordinator::FetchCoordinator,
    device::{DeviceServices, OngoingNotification, Permission},
    model::Units,
};

pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    PermissionPending,
    LocationPending,
    NotificationShown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    InProgress,
    PermissionDenied(Permission),
    NoLocationFix,
    FetchFailed,
    NotificationFailed,
    Shown(OngoingNotification),
}

#[derive(Debug)]
pub struct LocationRefreshFlow {
    coordinator: FetchCoordinator,
    device: DeviceServices,
    units: Units,
    fix_timeout: Duration,
    state: watch::Sender<FlowState>,
    running: Mutex<()>,
}

impl LocationRefreshFlow {
    pub fn new(coordinator: FetchCoordinator, device: DeviceServices) -> Self {
        let (state, _) = watch::channel(FlowState::Idle);
        Self {
            coordinator,
            device,
            units: Units::default(),
            fix_timeout: DEFAULT_FIX_TIMEOUT,
            state,
            running: Mutex::new(()),
        }
    }

    /// Units used to label the notification temperature.
    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn with_fix_timeout(mut self, timeout: Duration) -> Self {
        self.fix_timeout = timeout;
        self
    }

    pub fn state(&self) -> FlowState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<FlowState> {
        self.state.subscribe()
    }

    /// Run one refresh cycle for a user action.
    pub async fn trigger(&self) -> RefreshOutcome {
        let Ok(_running) = self.running.try_lock() else {
            debug!("location refresh already in progress");
            return RefreshOutcome::InProgress;
        };
        // Declared after the lock so Idle is published before the lock is released.
        let _reset = ResetOnExit(&self.state);

        self.enter(FlowState::PermissionPending);
        for permission in [Permission::Location, Permission::PostNotifications] {
            if self.device.permissions.is_granted(permission) {
                continue;
            }
            debug!(?permission, "requesting permission");
            if !self.device.permissions.request(permission).await {
                info!(?permission, "permission denied; abandoning location refresh");
                return RefreshOutcome::PermissionDenied(permission);
            }
        }

        self.enter(FlowState::LocationPending);
        let fix = match tokio::time::timeout(self.fix_timeout, self.device.location.current_fix())
            .await
        {
            Ok(Some(fix)) => fix,
            Ok(None) => {
                info!("no location fix available");
                return RefreshOutcome::NoLocationFix;
            }
            Err(_) => {
                warn!(timeout = ?self.fix_timeout, "timed out waiting for a location fix");
                return RefreshOutcome::NoLocationFix;
            }
        };

        let conditions = match self
            .coordinator
            .fetch_current_by_coordinates(fix.latitude, fix.longitude)
            .await
        {
            Ok(conditions) => conditions,
            Err(err) => {
                debug!(error = %err, "dropping failed coordinate fetch");
                return RefreshOutcome::FetchFailed;
            }
        };

        let notification = OngoingNotification::for_conditions(&conditions, self.units);
        if let Err(err) = self.device.notifications.show(&notification) {
            warn!(error = %err, "failed to post location weather notification");
            return RefreshOutcome::NotificationFailed;
        }

        self.enter(FlowState::NotificationShown);
        info!(
            title = %notification.title,
            body = %notification.body,
            "location weather notification shown"
        );
        RefreshOutcome::Shown(notification)
    }

    fn enter(&self, next: FlowState) {
        debug!(?next, "location refresh state");
        self.state.send_replace(next);
    }
}

struct ResetOnExit<'a>(&'a watch::Sender<FlowState>);

impl Drop for ResetOnExit<'_> {
    fn drop(&mut self) {
        self.0.send_replace(FlowState::Idle);
    }
}
