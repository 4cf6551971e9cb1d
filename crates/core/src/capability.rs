//! Static per-model capability tables.
//!
//! A model never changes its capabilities at runtime. Everything a front-end
//! needs to decide which settings to expose, and everything the validation
//! layer needs to reject illegal writes, is answered from these tables.

use crate::settings::{LightingMode, PollingRate};

/// Which lighting sub-settings a lighting mode uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightingSupport {
    pub mode: LightingMode,
    pub color: bool,
    pub random_color: bool,
    pub animation_speed: bool,
    pub animation_direction: bool,
}

impl LightingSupport {
    /// Sub-settings used by a mode on the common ROG firmware.
    pub const fn standard(mode: LightingMode) -> Self {
        let (color, random_color, animation_speed, animation_direction) = match mode {
            LightingMode::Static | LightingMode::Breathing | LightingMode::React => {
                (true, false, false, false)
            }
            LightingMode::Comet => (true, true, false, false),
            LightingMode::ColorCycle => (false, false, true, false),
            LightingMode::Rainbow => (false, false, true, true),
            LightingMode::BatteryState | LightingMode::Off => (false, false, false, false),
        };
        Self {
            mode,
            color,
            random_color,
            animation_speed,
            animation_direction,
        }
    }
}

/// Full lighting table of the ROG firmware.
pub const ROG_LIGHTING: &[LightingSupport] = &[
    LightingSupport::standard(LightingMode::Static),
    LightingSupport::standard(LightingMode::Breathing),
    LightingSupport::standard(LightingMode::ColorCycle),
    LightingSupport::standard(LightingMode::Rainbow),
    LightingSupport::standard(LightingMode::React),
    LightingSupport::standard(LightingMode::Comet),
    LightingSupport::standard(LightingMode::BatteryState),
    LightingSupport::standard(LightingMode::Off),
];

/// Up to 1000 Hz.
pub const RATES_1K: &[PollingRate] = &[
    PollingRate::Hz125,
    PollingRate::Hz250,
    PollingRate::Hz500,
    PollingRate::Hz1000,
];

/// Up to 8000 Hz (wired high-rate sensors).
pub const RATES_8K: &[PollingRate] = PollingRate::ALL;

/// Features and numeric bounds of one hardware model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySet {
    pub min_dpi: u16,
    pub max_dpi: u16,
    /// Firmware DPI granularity.
    pub dpi_step: u16,
    /// Number of DPI slots (1..=4).
    pub dpi_profile_count: u8,
    /// Number of firmware setting banks.
    pub profile_count: u8,
    pub polling_rates: &'static [PollingRate],
    /// Supported lighting modes; empty for models without lighting.
    pub lighting: &'static [LightingSupport],
    pub angle_snapping: bool,
    pub angle_tuning: bool,
    pub lift_off: bool,
    pub battery: bool,
    pub dpi_colors: bool,
    pub auto_power_off: bool,
    pub low_battery_warning: bool,
}

impl CapabilitySet {
    /// Baseline of the family: single profile, no optional features.
    pub const BASE: CapabilitySet = CapabilitySet {
        min_dpi: 100,
        max_dpi: 16_000,
        dpi_step: 50,
        dpi_profile_count: 4,
        profile_count: 1,
        polling_rates: RATES_1K,
        lighting: &[],
        angle_snapping: false,
        angle_tuning: false,
        lift_off: false,
        battery: false,
        dpi_colors: false,
        auto_power_off: false,
        low_battery_warning: false,
    };

    pub fn has_rgb(&self) -> bool {
        !self.lighting.is_empty()
    }

    pub fn can_set_polling_rate(&self) -> bool {
        !self.polling_rates.is_empty()
    }

    /// Position of `rate` in the model's polling rate list.
    pub fn polling_rate_index(&self, rate: PollingRate) -> Option<usize> {
        self.polling_rates.iter().position(|r| *r == rate)
    }

    pub fn has_angle_settings(&self) -> bool {
        self.angle_snapping || self.angle_tuning
    }

    pub fn has_energy_settings(&self) -> bool {
        self.auto_power_off || self.low_battery_warning
    }

    fn lighting_support(&self, mode: LightingMode) -> Option<&LightingSupport> {
        self.lighting.iter().find(|l| l.mode == mode)
    }

    pub fn is_lighting_mode_supported(&self, mode: LightingMode) -> bool {
        self.lighting_support(mode).is_some()
    }

    /// Lighting modes in firmware order.
    pub fn lighting_modes(&self) -> impl Iterator<Item = LightingMode> + '_ {
        self.lighting.iter().map(|l| l.mode)
    }

    pub fn supports_color_setting(&self, mode: LightingMode) -> bool {
        self.lighting_support(mode).is_some_and(|l| l.color)
    }

    pub fn supports_random_color(&self, mode: LightingMode) -> bool {
        self.lighting_support(mode).is_some_and(|l| l.random_color)
    }

    pub fn supports_animation_speed(&self, mode: LightingMode) -> bool {
        self.lighting_support(mode).is_some_and(|l| l.animation_speed)
    }

    pub fn supports_animation_direction(&self, mode: LightingMode) -> bool {
        self.lighting_support(mode).is_some_and(|l| l.animation_direction)
    }
}
