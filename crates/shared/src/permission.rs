use serde::{Deserialize, Serialize};

/// Location authorization as far as this app cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionState {
    Undetermined,
    Authorized,
    Denied,
}

impl PermissionState {
    /// Map a platform status string onto the closed set of states.
    ///
    /// Accepts both browser (`granted`/`prompt`/`denied`) and mobile-style
    /// (`authorizedWhenInUse`, `notDetermined`, `restricted`, ...) names.
    /// Anything unrecognised is treated as `Denied`.
    pub fn from_platform(status: &str) -> Self {
        match status.trim() {
            "granted" | "authorized" | "authorizedAlways" | "authorizedWhenInUse" => {
                PermissionState::Authorized
            }
            "prompt" | "notDetermined" | "undetermined" => PermissionState::Undetermined,
            "denied" | "restricted" => PermissionState::Denied,
            other => {
                tracing::warn!(status = other, "Unknown location permission status, treating as denied");
                PermissionState::Denied
            }
        }
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionState::Undetermined => write!(f, "undetermined"),
            PermissionState::Authorized => write!(f, "authorized"),
            PermissionState::Denied => write!(f, "denied"),
        }
    }
}

/// What the host must do after the controller evaluated a permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAction {
    /// Ask the platform to show its permission prompt.
    RequestPermission,
    /// Start following the device location.
    StartUpdatingLocation,
    Nothing,
}
