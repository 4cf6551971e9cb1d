//! Typed settings values and the per-device settings mirror.
//!
//! Every enum carries its firmware code (see [`crate::protocol`]) so the
//! feature modules can translate without lookup tables of their own.

use serde::{Deserialize, Serialize};

/// USB polling rates offered across the ROG mouse family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum PollingRate {
    Hz125 = 125,
    Hz250 = 250,
    Hz500 = 500,
    Hz1000 = 1000,
    Hz2000 = 2000,
    Hz4000 = 4000,
    Hz8000 = 8000,
}

impl PollingRate {
    /// All known rates, slowest first.
    pub const ALL: &'static [PollingRate] = &[
        PollingRate::Hz125,
        PollingRate::Hz250,
        PollingRate::Hz500,
        PollingRate::Hz1000,
        PollingRate::Hz2000,
        PollingRate::Hz4000,
        PollingRate::Hz8000,
    ];

    /// Convert from raw Hz value.
    pub fn from_hz(hz: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.as_hz() == hz)
    }

    /// Get the Hz value.
    pub fn as_hz(&self) -> u16 {
        *self as u16
    }

    /// Firmware encoding.
    pub fn code(&self) -> u8 {
        match self {
            Self::Hz125 => 0,
            Self::Hz250 => 1,
            Self::Hz500 => 2,
            Self::Hz1000 => 3,
            Self::Hz2000 => 4,
            Self::Hz4000 => 5,
            Self::Hz8000 => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }
}

impl Default for PollingRate {
    fn default() -> Self {
        Self::Hz1000
    }
}

impl std::fmt::Display for PollingRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Hz", self.as_hz())
    }
}

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB` (an optional leading `#` is accepted).
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// One DPI slot.
///
/// `color` is only meaningful on models with per-slot DPI colors; it is kept
/// for every model because the firmware stores it regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpiSetting {
    pub dpi: u16,
    pub color: Rgb,
}

impl DpiSetting {
    pub fn new(dpi: u16, color: Rgb) -> Self {
        Self { dpi, color }
    }
}

/// Lighting effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightingMode {
    Static,
    Breathing,
    ColorCycle,
    Rainbow,
    React,
    Comet,
    BatteryState,
    Off,
}

impl LightingMode {
    pub const ALL: &'static [LightingMode] = &[
        LightingMode::Static,
        LightingMode::Breathing,
        LightingMode::ColorCycle,
        LightingMode::Rainbow,
        LightingMode::React,
        LightingMode::Comet,
        LightingMode::BatteryState,
        LightingMode::Off,
    ];

    pub fn code(&self) -> u8 {
        match self {
            Self::Static => 0x00,
            Self::Breathing => 0x01,
            Self::ColorCycle => 0x02,
            Self::Rainbow => 0x03,
            Self::React => 0x04,
            Self::Comet => 0x05,
            Self::BatteryState => 0x06,
            Self::Off => 0xFF,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.code() == code)
    }

    /// Parse a CLI-friendly name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "static" => Some(Self::Static),
            "breathing" | "breathe" => Some(Self::Breathing),
            "color-cycle" | "colorcycle" | "cycle" => Some(Self::ColorCycle),
            "rainbow" => Some(Self::Rainbow),
            "react" => Some(Self::React),
            "comet" => Some(Self::Comet),
            "battery" | "battery-state" => Some(Self::BatteryState),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Static => "Static",
            Self::Breathing => "Breathing",
            Self::ColorCycle => "Color Cycle",
            Self::Rainbow => "Rainbow",
            Self::React => "React",
            Self::Comet => "Comet",
            Self::BatteryState => "Battery State",
            Self::Off => "Off",
        }
    }
}

/// Animation speed of animated lighting modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationSpeed {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl AnimationSpeed {
    pub fn code(&self) -> u8 {
        match self {
            Self::Slow => 0x09,
            Self::Medium => 0x07,
            Self::Fast => 0x05,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x09 => Some(Self::Slow),
            0x07 => Some(Self::Medium),
            0x05 => Some(Self::Fast),
            _ => None,
        }
    }
}

/// Animation direction of directional lighting modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationDirection {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl AnimationDirection {
    pub fn code(&self) -> u8 {
        match self {
            Self::Clockwise => 0x00,
            Self::CounterClockwise => 0x01,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Clockwise),
            0x01 => Some(Self::CounterClockwise),
            _ => None,
        }
    }
}

/// Lighting configuration.
///
/// Sub-fields that the active mode does not use are still stored and written;
/// the capability table tells a front-end which ones to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightingSetting {
    pub mode: LightingMode,
    /// 0..=100
    pub brightness: u8,
    pub color: Rgb,
    pub random_color: bool,
    pub speed: AnimationSpeed,
    pub direction: AnimationDirection,
}

impl Default for LightingSetting {
    fn default() -> Self {
        Self {
            mode: LightingMode::Static,
            brightness: 100,
            color: Rgb::new(0xFF, 0x00, 0x00),
            random_color: false,
            speed: AnimationSpeed::default(),
            direction: AnimationDirection::default(),
        }
    }
}

/// Sensor lift-off distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiftOffDistance {
    #[default]
    Low,
    High,
}

impl LiftOffDistance {
    pub fn code(&self) -> u8 {
        match self {
            Self::Low => 0x00,
            Self::High => 0x01,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Low),
            0x01 => Some(Self::High),
            _ => None,
        }
    }
}

/// Auto power-off timer of wireless models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerOffTimeout {
    OneMinute,
    TwoMinutes,
    ThreeMinutes,
    FiveMinutes,
    #[default]
    TenMinutes,
    Never,
}

impl PowerOffTimeout {
    pub const ALL: &'static [PowerOffTimeout] = &[
        PowerOffTimeout::OneMinute,
        PowerOffTimeout::TwoMinutes,
        PowerOffTimeout::ThreeMinutes,
        PowerOffTimeout::FiveMinutes,
        PowerOffTimeout::TenMinutes,
        PowerOffTimeout::Never,
    ];

    pub fn code(&self) -> u8 {
        match self {
            Self::OneMinute => 0x00,
            Self::TwoMinutes => 0x01,
            Self::ThreeMinutes => 0x02,
            Self::FiveMinutes => 0x03,
            Self::TenMinutes => 0x04,
            Self::Never => 0xFF,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Timeout in minutes, `None` for [`PowerOffTimeout::Never`].
    pub fn minutes(&self) -> Option<u8> {
        match self {
            Self::OneMinute => Some(1),
            Self::TwoMinutes => Some(2),
            Self::ThreeMinutes => Some(3),
            Self::FiveMinutes => Some(5),
            Self::TenMinutes => Some(10),
            Self::Never => None,
        }
    }
}

/// Last battery reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battery {
    pub percent: u8,
    pub charging: bool,
}

/// In-memory mirror of the firmware settings of one device.
///
/// Only trustworthy right after a successful synchronize or write; the
/// firmware stays authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Active firmware profile (0-based).
    pub profile: u8,
    /// Active DPI slot (1-based).
    pub dpi_slot: u8,
    /// One entry per DPI slot of the model.
    pub dpi: Vec<DpiSetting>,
    pub lighting: LightingSetting,
    pub polling_rate: PollingRate,
    pub angle_snapping: bool,
    /// Angle tuning in degrees.
    pub angle_adjustment: i8,
    pub lift_off: LiftOffDistance,
    /// Low battery warning threshold in percent.
    pub low_battery_warning: u8,
    pub power_off: PowerOffTimeout,
    pub battery: Battery,
    pub ready: bool,
}

impl DeviceState {
    /// DPI setting of a 1-based slot.
    pub fn dpi_setting(&self, slot: u8) -> Option<&DpiSetting> {
        (slot as usize).checked_sub(1).and_then(|i| self.dpi.get(i))
    }

    /// DPI setting of the active slot.
    pub fn active_dpi(&self) -> Option<&DpiSetting> {
        self.dpi_setting(self.dpi_slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polling_rate_codes_are_stable() {
        for (code, rate) in PollingRate::ALL.iter().enumerate() {
            assert_eq!(rate.code() as usize, code);
            assert_eq!(PollingRate::from_code(code as u8), Some(*rate));
        }
        assert_eq!(PollingRate::from_code(7), None);
    }

    #[test]
    fn polling_rate_rejects_invalid_hz() {
        assert_eq!(PollingRate::from_hz(200), None);
        assert_eq!(PollingRate::from_hz(8000), Some(PollingRate::Hz8000));
        assert_eq!(PollingRate::Hz1000.to_string(), "1000 Hz");
    }

    #[test]
    fn lighting_mode_off_uses_ff() {
        assert_eq!(LightingMode::Off.code(), 0xFF);
        assert_eq!(LightingMode::from_code(0xFF), Some(LightingMode::Off));
        assert_eq!(LightingMode::from_code(0x07), None);
    }

    #[test]
    fn lighting_mode_from_name_accepts_variants() {
        assert_eq!(
            LightingMode::from_name("Color-Cycle"),
            Some(LightingMode::ColorCycle)
        );
        assert_eq!(LightingMode::from_name("BREATHE"), Some(LightingMode::Breathing));
        assert_eq!(LightingMode::from_name("strobe"), None);
    }

    #[test]
    fn animation_speed_codes() {
        assert_eq!(AnimationSpeed::Slow.code(), 9);
        assert_eq!(AnimationSpeed::Fast.code(), 5);
        assert_eq!(AnimationSpeed::from_code(7), Some(AnimationSpeed::Medium));
        assert_eq!(AnimationSpeed::from_code(6), None);
    }

    #[test]
    fn power_off_never_has_no_minutes() {
        assert_eq!(PowerOffTimeout::Never.minutes(), None);
        assert_eq!(PowerOffTimeout::FiveMinutes.minutes(), Some(5));
        assert_eq!(
            PowerOffTimeout::from_code(0xFF),
            Some(PowerOffTimeout::Never)
        );
    }

    #[test]
    fn rgb_from_hex() {
        assert_eq!(Rgb::from_hex("#00FF7f"), Some(Rgb::new(0, 255, 127)));
        assert_eq!(Rgb::from_hex("FFF"), None);
        assert_eq!(Rgb::from_hex("GG0000"), None);
        assert_eq!(Rgb::new(1, 2, 3).to_string(), "#010203");
    }

    #[test]
    fn dpi_setting_lookup_is_one_based() {
        let state = DeviceState {
            dpi_slot: 2,
            dpi: vec![
                DpiSetting::new(400, Rgb::default()),
                DpiSetting::new(800, Rgb::default()),
            ],
            ..Default::default()
        };
        assert_eq!(state.dpi_setting(0), None);
        assert_eq!(state.dpi_setting(1).map(|d| d.dpi), Some(400));
        assert_eq!(state.active_dpi().map(|d| d.dpi), Some(800));
        assert_eq!(state.dpi_setting(3), None);
    }
}
