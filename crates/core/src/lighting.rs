//! Lighting read/write via the LIGHTING command (0x03).
//!
//! Payload layout (GET response and SET request):
//!   `[mode, brightness, r, g, b, direction, random_color, speed]`

use crate::error::{Error, Result};
use crate::protocol::{commands, Request};
use crate::settings::{AnimationDirection, AnimationSpeed, LightingMode, LightingSetting, Rgb};
use crate::transport::{request, HidTransport};

fn bad_code(code: u8) -> Error {
    Error::Protocol {
        command: commands::LIGHTING,
        code,
    }
}

pub fn read_lighting(transport: &dyn HidTransport) -> Result<LightingSetting> {
    let resp = request(transport, &Request::get(commands::LIGHTING))?;

    let mode = LightingMode::from_code(resp.param(0)).ok_or_else(|| bad_code(resp.param(0)))?;
    let direction =
        AnimationDirection::from_code(resp.param(5)).ok_or_else(|| bad_code(resp.param(5)))?;
    let speed = AnimationSpeed::from_code(resp.param(7)).ok_or_else(|| bad_code(resp.param(7)))?;

    Ok(LightingSetting {
        mode,
        brightness: resp.param(1),
        color: Rgb::new(resp.param(2), resp.param(3), resp.param(4)),
        random_color: resp.param(6) != 0,
        speed,
        direction,
    })
}

pub fn write_lighting(transport: &dyn HidTransport, setting: &LightingSetting) -> Result<()> {
    let [r, g, b] = setting.color.to_bytes();
    let params = vec![
        setting.mode.code(),
        setting.brightness,
        r,
        g,
        b,
        setting.direction.code(),
        setting.random_color as u8,
        setting.speed.code(),
    ];
    request(transport, &Request::set(commands::LIGHTING, params))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::SimulatedMouse;

    #[test]
    fn read_factory_lighting() {
        let mouse = SimulatedMouse::new();
        let ls = read_lighting(&mouse).unwrap();
        assert_eq!(ls.mode, LightingMode::Static);
        assert_eq!(ls.brightness, 100);
        assert_eq!(ls.color, Rgb::new(0xFF, 0, 0));
        assert_eq!(ls.speed, AnimationSpeed::Medium);
        assert!(!ls.random_color);
    }

    #[test]
    fn write_encodes_every_field() {
        let mouse = SimulatedMouse::new();
        let ls = LightingSetting {
            mode: LightingMode::Comet,
            brightness: 40,
            color: Rgb::new(0x10, 0x20, 0x30),
            random_color: true,
            speed: AnimationSpeed::Fast,
            direction: AnimationDirection::CounterClockwise,
        };
        write_lighting(&mouse, &ls).unwrap();
        assert_eq!(
            mouse.block(commands::LIGHTING),
            vec![0x05, 40, 0x10, 0x20, 0x30, 0x01, 0x01, 0x05]
        );
        assert_eq!(read_lighting(&mouse).unwrap(), ls);
    }

    #[test]
    fn off_mode_decodes() {
        let mouse = SimulatedMouse::new();
        mouse.set_block(commands::LIGHTING, vec![0xFF, 0, 0, 0, 0, 0, 0, 0x09]);
        let ls = read_lighting(&mouse).unwrap();
        assert_eq!(ls.mode, LightingMode::Off);
        assert_eq!(ls.speed, AnimationSpeed::Slow);
    }

    #[test]
    fn unknown_mode_rejected() {
        let mouse = SimulatedMouse::new();
        mouse.set_block(commands::LIGHTING, vec![0x42, 0, 0, 0, 0, 0, 0, 0x07]);
        assert!(matches!(
            read_lighting(&mouse),
            Err(Error::Protocol { code: 0x42, .. })
        ));
    }
}
