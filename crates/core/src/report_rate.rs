//! Polling rate read/write via the POLLING_RATE command (0x08).
//!
//! Rate encoding: 0=125Hz, 1=250Hz, 2=500Hz, 3=1000Hz, 4=2000Hz, 5=4000Hz,
//! 6=8000Hz.

use crate::error::{Error, Result};
use crate::protocol::{commands, Request};
use crate::settings::PollingRate;
use crate::transport::{request, HidTransport};

/// Read the current polling rate from the device.
pub fn read_report_rate(transport: &dyn HidTransport) -> Result<PollingRate> {
    let resp = request(transport, &Request::get(commands::POLLING_RATE))?;
    PollingRate::from_code(resp.param(0)).ok_or(Error::Protocol {
        command: commands::POLLING_RATE,
        code: resp.param(0),
    })
}

/// Write a polling rate to the device.
pub fn write_report_rate(transport: &dyn HidTransport, rate: PollingRate) -> Result<()> {
    request(
        transport,
        &Request::set(commands::POLLING_RATE, vec![rate.code()]),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::SimulatedMouse;

    #[test]
    fn read_report_rate_1000hz() {
        let mouse = SimulatedMouse::new();
        assert_eq!(read_report_rate(&mouse).unwrap(), PollingRate::Hz1000);
    }

    #[test]
    fn write_then_read_500hz() {
        let mouse = SimulatedMouse::new();
        write_report_rate(&mouse, PollingRate::Hz500).unwrap();
        assert_eq!(mouse.block(commands::POLLING_RATE), vec![2]);
        assert_eq!(read_report_rate(&mouse).unwrap(), PollingRate::Hz500);
    }

    #[test]
    fn invalid_code_rejected() {
        let mouse = SimulatedMouse::new();
        mouse.set_block(commands::POLLING_RATE, vec![9]);
        assert!(matches!(
            read_report_rate(&mouse),
            Err(Error::Protocol { code: 9, .. })
        ));
    }
}
