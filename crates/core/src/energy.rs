//! Power settings (ENERGY, 0x0B) and battery status (BATTERY, 0x07).
//!
//! ENERGY payload: `[power_off_code, low_battery_percent]`
//! BATTERY response: `[percent, charging]`

use crate::error::{Error, Result};
use crate::protocol::{commands, Request};
use crate::settings::{Battery, PowerOffTimeout};
use crate::transport::{request, HidTransport};

/// Auto power-off timer and low battery warning threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnergySettings {
    pub power_off: PowerOffTimeout,
    pub low_battery_warning: u8,
}

pub fn read_energy(transport: &dyn HidTransport) -> Result<EnergySettings> {
    let resp = request(transport, &Request::get(commands::ENERGY))?;
    let power_off = PowerOffTimeout::from_code(resp.param(0)).ok_or(Error::Protocol {
        command: commands::ENERGY,
        code: resp.param(0),
    })?;
    Ok(EnergySettings {
        power_off,
        low_battery_warning: resp.param(1),
    })
}

pub fn write_energy(transport: &dyn HidTransport, energy: EnergySettings) -> Result<()> {
    let params = vec![energy.power_off.code(), energy.low_battery_warning];
    request(transport, &Request::set(commands::ENERGY, params))?;
    Ok(())
}

/// Read battery level and charging state.
pub fn read_battery(transport: &dyn HidTransport) -> Result<Battery> {
    let resp = request(transport, &Request::get(commands::BATTERY))?;
    Ok(Battery {
        percent: resp.param(0).min(100),
        charging: resp.param(1) != 0,
    })
}
