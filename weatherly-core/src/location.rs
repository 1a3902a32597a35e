use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::LookupError, model::Coordinates};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Access to the device position.
#[async_trait]
pub trait LocationService: Send + Sync + Debug {
    async fn request_permission(&self) -> Permission;
    async fn current_position(&self) -> Result<Coordinates, LookupError>;
}

/// A device that always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationService for FixedLocation {
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn current_position(&self) -> Result<Coordinates, LookupError> {
        Ok(self.0)
    }
}

/// A device where location access is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationService for NoLocation {
    async fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    async fn current_position(&self) -> Result<Coordinates, LookupError> {
        Err(LookupError::PermissionDenied)
    }
}

/// `FixedLocation` when a position is known, `NoLocation` otherwise.
pub fn location_service(position: Option<Coordinates>) -> Box<dyn LocationService> {
    match position {
        Some(coords) => Box::new(FixedLocation(coords)),
        None => Box::new(NoLocation),
    }
}
