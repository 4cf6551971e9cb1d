//! rog-mouse-core: device catalog, settings mirror, connection lifecycle, and
//! registry for ASUS ROG / TUF gaming mice.
//!
//! The crate talks to the mouse firmware through a small HID report protocol
//! ([`protocol`]) over a pluggable transport ([`transport`]). A [`Registry`]
//! tracks which catalog models are connected and ready; a [`DeviceWatcher`]
//! re-runs detection when the host enumeration settles.

pub mod capability;
pub mod catalog;
pub mod comm;
pub mod config;
pub mod connection;
pub mod device;
pub mod dpi;
pub mod energy;
pub mod error;
pub mod lighting;
pub mod notify;
pub mod performance;
pub mod profile;
pub mod protocol;
pub mod registry;
pub mod report_rate;
pub mod safety;
pub mod settings;
pub mod transport;
pub mod watcher;

pub use catalog::{DeviceId, MouseModel};
pub use config::RegistryConfig;
pub use device::Device;
pub use error::{Error, Result};
pub use registry::Registry;
pub use watcher::DeviceWatcher;

/// ASUSTeK USB Vendor ID.
pub const ASUS_VID: u16 = 0x0B05;

/// Known product IDs.
pub mod pids {
    /// ROG Chakram X (2.4 GHz receiver).
    pub const CHAKRAM_X: u16 = 0x1A1A;
    /// ROG Chakram X (USB cable).
    pub const CHAKRAM_X_WIRED: u16 = 0x1A18;
    /// ROG Gladius III Wireless (2.4 GHz receiver).
    pub const GLADIUS_III: u16 = 0x1A70;
    /// ROG Gladius III Wireless (USB cable).
    pub const GLADIUS_III_WIRED: u16 = 0x1A72;
    pub const TUF_M4_WIRELESS: u16 = 0x19F4;
}
