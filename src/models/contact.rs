//! Emergency contact model.

use crate::models::Region;

/// A number to call within a jurisdiction.
#[derive(Debug, Clone, PartialEq)]
pub struct EmergencyContact {
    pub name: String,
    pub number: String,
    pub region: Region,
}
