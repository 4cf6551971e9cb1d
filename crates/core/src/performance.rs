//! Sensor settings: angle snapping/tuning (ANGLE, 0x09) and lift-off
//! distance (LIFT_OFF, 0x0A).
//!
//! ANGLE payload: `[snapping, adjustment]`, adjustment is a signed byte in
//! degrees. Angle snapping and angle tuning share one record, so a write of
//! either carries the current value of the other.

use crate::error::{Error, Result};
use crate::protocol::{commands, Request};
use crate::settings::LiftOffDistance;
use crate::transport::{request, HidTransport};

/// Angle snapping flag and angle tuning in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AngleSettings {
    pub snapping: bool,
    pub adjustment: i8,
}

pub fn read_angle(transport: &dyn HidTransport) -> Result<AngleSettings> {
    let resp = request(transport, &Request::get(commands::ANGLE))?;
    Ok(AngleSettings {
        snapping: resp.param(0) != 0,
        adjustment: resp.param(1) as i8,
    })
}

pub fn write_angle(transport: &dyn HidTransport, angle: AngleSettings) -> Result<()> {
    let params = vec![angle.snapping as u8, angle.adjustment as u8];
    request(transport, &Request::set(commands::ANGLE, params))?;
    Ok(())
}

pub fn read_lift_off(transport: &dyn HidTransport) -> Result<LiftOffDistance> {
    let resp = request(transport, &Request::get(commands::LIFT_OFF))?;
    LiftOffDistance::from_code(resp.param(0)).ok_or(Error::Protocol {
        command: commands::LIFT_OFF,
        code: resp.param(0),
    })
}

pub fn write_lift_off(transport: &dyn HidTransport, distance: LiftOffDistance) -> Result<()> {
    request(
        transport,
        &Request::set(commands::LIFT_OFF, vec![distance.code()]),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::SimulatedMouse;

    #[test]
    fn negative_adjustment_round_trips_through_firmware() {
        let mouse = SimulatedMouse::new();
        let angle = AngleSettings {
            snapping: true,
            adjustment: -15,
        };
        write_angle(&mouse, angle).unwrap();
        assert_eq!(mouse.block(commands::ANGLE), vec![1, 0xF1]);
        assert_eq!(read_angle(&mouse).unwrap(), angle);
    }

    #[test]
    fn lift_off_read_write() {
        let mouse = SimulatedMouse::new();
        assert_eq!(read_lift_off(&mouse).unwrap(), LiftOffDistance::Low);
        write_lift_off(&mouse, LiftOffDistance::High).unwrap();
        assert_eq!(read_lift_off(&mouse).unwrap(), LiftOffDistance::High);
    }

    #[test]
    fn lift_off_unknown_code() {
        let mouse = SimulatedMouse::new();
        mouse.set_block(commands::LIFT_OFF, vec![7]);
        assert!(read_lift_off(&mouse).is_err());
    }
}
