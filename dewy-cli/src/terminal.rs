//! Terminal stand-ins for the platform's permission, location and notification services.

use std::{collections::HashSet, sync::Mutex};

use async_trait::async_trait;
use dewy_core::{
    Coordinates, LocationProvider, NotificationSink, OngoingNotification, Permission,
    PermissionGate,
};
use inquire::Confirm;

/// Permissions granted for the lifetime of the process, asked for interactively.
#[derive(Debug, Default)]
pub struct PromptPermissions {
    granted: Mutex<HashSet<Permission>>,
}

impl PromptPermissions {
    pub fn pre_granted() -> Self {
        Self {
            granted: Mutex::new(HashSet::from([
                Permission::Location,
                Permission::PostNotifications,
            ])),
        }
    }
}

fn prompt_text(permission: Permission) -> &'static str {
    match permission {
        Permission::Location => "Allow dewy to access this device's location?",
        Permission::PostNotifications => "Allow dewy to post notifications?",
    }
}

#[async_trait]
impl PermissionGate for PromptPermissions {
    fn is_granted(&self, permission: Permission) -> bool {
        self.granted
            .lock()
            .map(|set| set.contains(&permission))
            .unwrap_or(false)
    }

    async fn request(&self, permission: Permission) -> bool {
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new(prompt_text(permission)).with_default(false).prompt()
        })
        .await;

        let granted = matches!(answer, Ok(Ok(true)));
        if granted {
            if let Ok(mut set) = self.granted.lock() {
                set.insert(permission);
            }
        }
        granted
    }
}

/// Location "fix" taken from the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Option<Coordinates>);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_fix(&self) -> Option<Coordinates> {
        self.0
    }
}

/// Prints the ongoing notification instead of posting it.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl NotificationSink for TerminalNotifier {
    fn show(&self, notification: &OngoingNotification) -> anyhow::Result<()> {
        println!(
            "[notification #{}{}] ({}) {} | {}",
            notification.id,
            if notification.ongoing { ", ongoing" } else { "" },
            notification.icon.resource_name(),
            notification.title,
            notification.body
        );
        Ok(())
    }
}
