//! Errors that end a boot cycle.
//!
//! The `Display` text is what the diagnostic screen shows, so keep it short.

use thiserror::Error;

use crate::app::{AppId, DrawError, UpdateError};
use crate::frame::PanelError;
use crate::network::ConnectError;
use crate::power::PowerError;
use crate::secrets::SecretsError;
use crate::state::StateError;
use crate::storage::StorageError;
use crate::time_sync::SyncError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("SD card: {0}")]
    Storage(#[from] StorageError),
    #[error("Secrets: {0}")]
    Secrets(#[from] SecretsError),
    #[error("Saving selection: {0}")]
    State(#[from] StateError),
    #[error("App {0} is not installed")]
    UnknownApp(AppId),
    #[error("Wi-Fi: {0}")]
    Network(#[from] ConnectError),
    #[error("Clock: {0}")]
    TimeSync(#[from] SyncError),
    #[error("Update: {0}")]
    Update(#[from] UpdateError),
    #[error("Draw: {0}")]
    Draw(#[from] DrawError),
    #[error("Display: {0}")]
    Panel(#[from] PanelError),
    #[error("Sleep: {0}")]
    Power(#[from] PowerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_step() {
        let err = CycleError::from(ConnectError::Timeout { attempts: 15 });
        assert_eq!(err.to_string(), "Wi-Fi: no validated connection after 15 attempts");

        let err = CycleError::from(SecretsError::Missing("WIFI_SSID"));
        assert_eq!(err.to_string(), "Secrets: WIFI_SSID missing from secrets");

        let err = CycleError::from(UpdateError::Status(500));
        assert_eq!(err.to_string(), "Update: server answered HTTP 500");
    }
}
