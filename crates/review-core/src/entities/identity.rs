//! Signed-in vendor identity
//!
//! Authentication happens outside this engine; the caller hands over the
//! identity it established and mutating operations act on its behalf.

use serde::{Deserialize, Serialize};

use crate::value_objects::VendorId;

/// The vendor account performing moderation and replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorIdentity {
    pub vendor_id: VendorId,
    pub vendor_name: String,
}

impl VendorIdentity {
    pub fn new(vendor_id: VendorId, vendor_name: impl Into<String>) -> Self {
        Self {
            vendor_id,
            vendor_name: vendor_name.into(),
        }
    }

    /// Check if this identity owns the given vendor
    #[inline]
    pub fn owns(&self, vendor_id: &VendorId) -> bool {
        &self.vendor_id == vendor_id
    }
}
