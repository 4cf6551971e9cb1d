//! Safety layer: validates all write parameters against the model's
//! capability table before anything is sent to the device.
//!
//! ## Safety Invariants
//! 1. DPI values are rounded to the model's step and must lie within
//!    `[min_dpi, max_dpi]`
//! 2. DPI slots are 1-based and bounded by the model's DPI-profile count;
//!    firmware profiles are 0-based and bounded by the profile count
//! 3. Polling rates, lighting modes, and optional features must be listed in
//!    the capability table
//! 4. All validation happens BEFORE any HID communication, so a rejected
//!    value never reaches the device and never touches the mirror

use crate::capability::CapabilitySet;
use crate::error::{Error, Result};
use crate::settings::{LightingSetting, PollingRate};

/// Angle tuning bounds in degrees.
pub const ANGLE_MIN: i8 = -20;
pub const ANGLE_MAX: i8 = 20;

/// Upper bound for brightness and percent values.
pub const PERCENT_MAX: u8 = 100;

/// Validate a DPI value and round it to the firmware step.
pub fn validate_dpi(dpi: u16, caps: &CapabilitySet) -> Result<u16> {
    let out_of_range = || Error::OutOfRange {
        field: "dpi",
        value: dpi as i64,
        min: caps.min_dpi as i64,
        max: caps.max_dpi as i64,
    };
    if !(caps.min_dpi..=caps.max_dpi).contains(&dpi) {
        return Err(out_of_range());
    }
    let step = caps.dpi_step.max(1) as u32;
    let rounded = ((dpi as u32 + step / 2) / step) * step;
    Ok((rounded as u16).clamp(caps.min_dpi, caps.max_dpi))
}

/// Validate a 1-based DPI slot.
pub fn validate_dpi_slot(slot: u8, caps: &CapabilitySet) -> Result<()> {
    if slot == 0 || slot > caps.dpi_profile_count {
        return Err(Error::OutOfRange {
            field: "dpi_slot",
            value: slot as i64,
            min: 1,
            max: caps.dpi_profile_count as i64,
        });
    }
    Ok(())
}

/// Validate a 0-based firmware profile index.
pub fn validate_profile(index: u8, caps: &CapabilitySet) -> Result<()> {
    if index >= caps.profile_count {
        return Err(Error::OutOfRange {
            field: "profile",
            value: index as i64,
            min: 0,
            max: caps.profile_count as i64 - 1,
        });
    }
    Ok(())
}

/// Validate that the model accepts this polling rate.
pub fn validate_polling_rate(
    rate: PollingRate,
    caps: &CapabilitySet,
    device: &'static str,
) -> Result<()> {
    if !caps.can_set_polling_rate() {
        return Err(Error::Unsupported {
            device,
            feature: "polling rate",
        });
    }
    if caps.polling_rate_index(rate).is_none() {
        let (min, max) = caps
            .polling_rates
            .iter()
            .fold((u16::MAX, 0), |(lo, hi), r| (lo.min(r.as_hz()), hi.max(r.as_hz())));
        return Err(Error::OutOfRange {
            field: "polling_rate",
            value: rate.as_hz() as i64,
            min: min as i64,
            max: max as i64,
        });
    }
    Ok(())
}

/// Validate a lighting setting.
///
/// Only the mode and brightness are checked. Sub-fields the mode does not use
/// are stored as given.
pub fn validate_lighting(
    setting: &LightingSetting,
    caps: &CapabilitySet,
    device: &'static str,
) -> Result<()> {
    if !caps.has_rgb() {
        return Err(Error::Unsupported {
            device,
            feature: "lighting",
        });
    }
    if !caps.is_lighting_mode_supported(setting.mode) {
        return Err(Error::Unsupported {
            device,
            feature: "this lighting mode",
        });
    }
    validate_percent("brightness", setting.brightness)
}

/// Validate an angle tuning value in degrees.
pub fn validate_angle(degrees: i8, caps: &CapabilitySet, device: &'static str) -> Result<()> {
    require(caps.angle_tuning, device, "angle tuning")?;
    if !(ANGLE_MIN..=ANGLE_MAX).contains(&degrees) {
        return Err(Error::OutOfRange {
            field: "angle_adjustment",
            value: degrees as i64,
            min: ANGLE_MIN as i64,
            max: ANGLE_MAX as i64,
        });
    }
    Ok(())
}

/// Validate a 0..=100 percent value.
pub fn validate_percent(field: &'static str, value: u8) -> Result<()> {
    if value > PERCENT_MAX {
        return Err(Error::OutOfRange {
            field,
            value: value as i64,
            min: 0,
            max: PERCENT_MAX as i64,
        });
    }
    Ok(())
}

/// Reject a write for a feature the model does not have.
pub fn require(supported: bool, device: &'static str, feature: &'static str) -> Result<()> {
    if supported {
        Ok(())
    } else {
        Err(Error::Unsupported { device, feature })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ROG_LIGHTING;
    use crate::settings::LightingMode;

    const CAPS: CapabilitySet = CapabilitySet {
        max_dpi: 36_000,
        lighting: ROG_LIGHTING,
        angle_tuning: true,
        ..CapabilitySet::BASE
    };

    const DEV: &str = "test mouse";

    #[test]
    fn validate_dpi_in_range() {
        assert_eq!(validate_dpi(800, &CAPS).unwrap(), 800);
        assert_eq!(validate_dpi(100, &CAPS).unwrap(), 100);
        assert_eq!(validate_dpi(36_000, &CAPS).unwrap(), 36_000);
    }

    #[test]
    fn validate_dpi_rounds_to_step() {
        assert_eq!(validate_dpi(810, &CAPS).unwrap(), 800);
        assert_eq!(validate_dpi(825, &CAPS).unwrap(), 850);
        assert_eq!(validate_dpi(35_990, &CAPS).unwrap(), 36_000);
    }

    #[test]
    fn validate_dpi_rejects_out_of_range() {
        assert!(validate_dpi(50, &CAPS).is_err());
        assert!(validate_dpi(0, &CAPS).is_err());
        let err = validate_dpi(40_000, &CAPS).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn validate_dpi_slot_is_one_based() {
        assert!(validate_dpi_slot(0, &CAPS).is_err());
        for slot in 1..=4 {
            assert!(validate_dpi_slot(slot, &CAPS).is_ok());
        }
        assert!(validate_dpi_slot(5, &CAPS).is_err());
    }

    #[test]
    fn validate_profile_bounds() {
        assert!(validate_profile(0, &CAPS).is_ok());
        assert!(validate_profile(1, &CAPS).is_err());
    }

    #[test]
    fn validate_polling_rate_against_table() {
        assert!(validate_polling_rate(PollingRate::Hz1000, &CAPS, DEV).is_ok());
        assert!(validate_polling_rate(PollingRate::Hz8000, &CAPS, DEV).is_err());
        let none = CapabilitySet {
            polling_rates: &[],
            ..CAPS
        };
        assert!(matches!(
            validate_polling_rate(PollingRate::Hz1000, &none, DEV),
            Err(Error::Unsupported { .. })
        ));
    }

    #[test]
    fn validate_lighting_checks_mode_and_brightness() {
        let mut ls = LightingSetting::default();
        assert!(validate_lighting(&ls, &CAPS, DEV).is_ok());

        ls.brightness = 101;
        assert!(validate_lighting(&ls, &CAPS, DEV).is_err());

        ls.brightness = 50;
        assert!(matches!(
            validate_lighting(&ls, &CapabilitySet::BASE, DEV),
            Err(Error::Unsupported { .. })
        ));
    }

    #[test]
    fn validate_lighting_accepts_unused_sub_fields() {
        let ls = LightingSetting {
            mode: LightingMode::Static,
            random_color: true,
            ..Default::default()
        };
        assert!(validate_lighting(&ls, &CAPS, DEV).is_ok());
    }

    #[test]
    fn validate_angle_bounds() {
        assert!(validate_angle(-20, &CAPS, DEV).is_ok());
        assert!(validate_angle(20, &CAPS, DEV).is_ok());
        assert!(validate_angle(21, &CAPS, DEV).is_err());
        assert!(validate_angle(0, &CapabilitySet::BASE, DEV).is_err());
    }
}
