//! DPI slot read/write via the DPI (0x04) and DPI_SLOT (0x01) commands.
//!
//! GET DPI answers with four 5-byte records, one per slot:
//!   `[dpi_lo, dpi_hi, r, g, b]`
//! SET DPI takes a single record prefixed by the 0-based slot index, so the
//! value and the color of a slot always change together.
//!
//! Callers validate values against the model's capability table first.

use crate::error::Result;
use crate::protocol::{commands, Request};
use crate::settings::{DpiSetting, Rgb};
use crate::transport::{request, HidTransport};

/// Bytes per slot record.
const RECORD_LEN: usize = 5;

/// Read the first `count` DPI slots.
pub fn read_dpi_slots(transport: &dyn HidTransport, count: u8) -> Result<Vec<DpiSetting>> {
    let resp = request(transport, &Request::get(commands::DPI))?;

    let slots = (0..count as usize)
        .map(|slot| {
            let base = slot * RECORD_LEN;
            DpiSetting {
                dpi: resp.param_u16(base),
                color: Rgb::new(
                    resp.param(base + 2),
                    resp.param(base + 3),
                    resp.param(base + 4),
                ),
            }
        })
        .collect();
    Ok(slots)
}

/// Write value and color of a 1-based DPI slot.
pub fn write_dpi_slot(transport: &dyn HidTransport, slot: u8, setting: DpiSetting) -> Result<()> {
    let [lo, hi] = setting.dpi.to_le_bytes();
    let [r, g, b] = setting.color.to_bytes();
    let req = Request::set(commands::DPI, vec![slot - 1, lo, hi, r, g, b]);
    request(transport, &req)?;
    Ok(())
}

/// Make a 1-based DPI slot the active one.
pub fn select_dpi_slot(transport: &dyn HidTransport, slot: u8) -> Result<()> {
    request(transport, &Request::set(commands::DPI_SLOT, vec![slot - 1]))?;
    Ok(())
}
