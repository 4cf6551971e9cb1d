//! Firmware profile selection via the PROFILE command (0x00).
//!
//! GET PROFILE answers `[profile, dpi_slot]`, both 0-based on the wire.
//! Switching profiles is an ACTION (0x50) rather than a SET: the firmware
//! swaps in the whole settings bank, so every other mirrored field must be
//! re-read afterwards.

use crate::error::Result;
use crate::protocol::{class, commands, Request};
use crate::transport::{request, HidTransport};

/// Active profile (0-based) and active DPI slot (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveProfile {
    pub profile: u8,
    pub dpi_slot: u8,
}

pub fn read_profile(transport: &dyn HidTransport) -> Result<ActiveProfile> {
    let resp = request(transport, &Request::get(commands::PROFILE))?;
    Ok(ActiveProfile {
        profile: resp.param(0),
        dpi_slot: resp.param(1).saturating_add(1),
    })
}

/// Switch the firmware to a 0-based profile.
pub fn switch_profile(transport: &dyn HidTransport, profile: u8) -> Result<()> {
    let req = Request::new(class::ACTION, commands::PROFILE, vec![profile]);
    request(transport, &req)?;
    Ok(())
}
