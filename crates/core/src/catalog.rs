//! Supported mouse models: identity descriptors and capability tables.
//!
//! Adding a model means adding a variant here with its descriptor and
//! capability table. Wired variants reuse the wireless table and override
//! the fields that differ.

use crate::capability::{CapabilitySet, RATES_1K, RATES_8K, ROG_LIGHTING};
use crate::{pids, ASUS_VID};
use serde::Serialize;

/// How the mouse is attached to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransportKind {
    Wired,
    Wireless,
}

/// Immutable identity of one physical device model/variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PeripheralDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    /// USB interface carrying the settings reports.
    pub interface: u8,
    pub transport: TransportKind,
}

impl PeripheralDescriptor {
    /// Interface fragment as it appears in Windows device paths (`mi_00`).
    pub fn path_fragment(&self) -> String {
        format!("mi_{:02x}", self.interface)
    }
}

impl std::fmt::Display for PeripheralDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04X}:{:04X} {}",
            self.vendor_id,
            self.product_id,
            self.path_fragment()
        )
    }
}

/// Identity used to deduplicate devices in the registry.
pub type DeviceId = PeripheralDescriptor;

const CHAKRAM_X: CapabilitySet = CapabilitySet {
    max_dpi: 36_000,
    profile_count: 5,
    lighting: ROG_LIGHTING,
    angle_snapping: true,
    angle_tuning: true,
    lift_off: true,
    battery: true,
    dpi_colors: true,
    auto_power_off: true,
    low_battery_warning: true,
    ..CapabilitySet::BASE
};

const CHAKRAM_X_WIRED: CapabilitySet = CapabilitySet {
    polling_rates: RATES_8K,
    ..CHAKRAM_X
};

const GLADIUS_III: CapabilitySet = CapabilitySet {
    max_dpi: 36_000,
    profile_count: 5,
    lighting: ROG_LIGHTING,
    angle_snapping: true,
    angle_tuning: true,
    lift_off: true,
    battery: true,
    dpi_colors: true,
    auto_power_off: true,
    low_battery_warning: true,
    ..CapabilitySet::BASE
};

const GLADIUS_III_WIRED: CapabilitySet = CapabilitySet {
    battery: false,
    ..GLADIUS_III
};

const TUF_M4_WIRELESS: CapabilitySet = CapabilitySet {
    max_dpi: 12_000,
    profile_count: 3,
    polling_rates: RATES_1K,
    battery: true,
    auto_power_off: true,
    low_battery_warning: true,
    ..CapabilitySet::BASE
};

/// Supported mouse models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MouseModel {
    ChakramX,
    ChakramXWired,
    GladiusIII,
    GladiusIIIWired,
    TufM4Wireless,
}

impl MouseModel {
    /// Every model, in detection order.
    pub const ALL: &'static [MouseModel] = &[
        MouseModel::ChakramX,
        MouseModel::ChakramXWired,
        MouseModel::GladiusIII,
        MouseModel::GladiusIIIWired,
        MouseModel::TufM4Wireless,
    ];

    /// Look up model from USB vendor/product ID.
    pub fn from_ids(vid: u16, pid: u16) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.descriptor().vendor_id == vid && m.descriptor().product_id == pid)
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChakramX => "ROG Chakram X (Wireless)",
            Self::ChakramXWired => "ROG Chakram X (Wired)",
            Self::GladiusIII => "ROG Gladius III (Wireless)",
            Self::GladiusIIIWired => "ROG Gladius III (Wired)",
            Self::TufM4Wireless => "TUF Gaming M4 Wireless",
        }
    }

    pub fn descriptor(&self) -> PeripheralDescriptor {
        let (product_id, transport) = match self {
            Self::ChakramX => (pids::CHAKRAM_X, TransportKind::Wireless),
            Self::ChakramXWired => (pids::CHAKRAM_X_WIRED, TransportKind::Wired),
            Self::GladiusIII => (pids::GLADIUS_III, TransportKind::Wireless),
            Self::GladiusIIIWired => (pids::GLADIUS_III_WIRED, TransportKind::Wired),
            Self::TufM4Wireless => (pids::TUF_M4_WIRELESS, TransportKind::Wireless),
        };
        PeripheralDescriptor {
            vendor_id: ASUS_VID,
            product_id,
            interface: 0,
            transport,
        }
    }

    pub fn capabilities(&self) -> &'static CapabilitySet {
        match self {
            Self::ChakramX => &CHAKRAM_X,
            Self::ChakramXWired => &CHAKRAM_X_WIRED,
            Self::GladiusIII => &GLADIUS_III,
            Self::GladiusIIIWired => &GLADIUS_III_WIRED,
            Self::TufM4Wireless => &TUF_M4_WIRELESS,
        }
    }
}

impl std::fmt::Display for MouseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PollingRate;
    use std::collections::HashSet;

    #[test]
    fn model_from_known_ids() {
        assert_eq!(
            MouseModel::from_ids(0x0B05, 0x1A70),
            Some(MouseModel::GladiusIII)
        );
        assert_eq!(
            MouseModel::from_ids(0x0B05, 0x1A18),
            Some(MouseModel::ChakramXWired)
        );
    }

    #[test]
    fn model_from_unknown_ids() {
        assert_eq!(MouseModel::from_ids(0x0B05, 0x1234), None);
        assert_eq!(MouseModel::from_ids(0x046D, 0x1A70), None);
    }

    #[test]
    fn descriptors_are_unique() {
        let ids: HashSet<_> = MouseModel::ALL.iter().map(|m| m.descriptor()).collect();
        assert_eq!(ids.len(), MouseModel::ALL.len());
    }

    #[test]
    fn capability_tables_are_sane() {
        for model in MouseModel::ALL {
            let caps = model.capabilities();
            assert!(caps.min_dpi < caps.max_dpi, "{model}");
            assert!((1..=4).contains(&caps.dpi_profile_count), "{model}");
            assert!(caps.profile_count >= 1, "{model}");
            assert_eq!(caps.min_dpi % caps.dpi_step, 0, "{model}");
            assert_eq!(caps.max_dpi % caps.dpi_step, 0, "{model}");
        }
    }

    #[test]
    fn wired_variants_override_wireless_table() {
        let wireless = MouseModel::GladiusIII.capabilities();
        let wired = MouseModel::GladiusIIIWired.capabilities();
        assert!(wireless.battery);
        assert!(!wired.battery);
        assert_eq!(wired.max_dpi, wireless.max_dpi);
        assert_eq!(wired.lighting, wireless.lighting);

        let chakram_wired = MouseModel::ChakramXWired.capabilities();
        assert!(chakram_wired.polling_rates.contains(&PollingRate::Hz8000));
        assert!(!MouseModel::ChakramX
            .capabilities()
            .polling_rates
            .contains(&PollingRate::Hz8000));
    }

    #[test]
    fn descriptor_display() {
        assert_eq!(
            MouseModel::GladiusIII.descriptor().to_string(),
            "0B05:1A70 mi_00"
        );
    }
}
