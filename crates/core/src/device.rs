//! A connected mouse: descriptor, capability table, settings mirror, and
//! transport handle.
//!
//! Every mutation goes through the per-device lock, which is held across the
//! transport I/O so that two callers can never interleave writes to the same
//! device. The mirror is updated only after the firmware accepted a write; a
//! rejected value or a failed write leaves it untouched.

use crate::capability::CapabilitySet;
use crate::catalog::{DeviceId, MouseModel};
use crate::connection::ConnectionState;
use crate::error::{Error, Result};
use crate::energy::EnergySettings;
use crate::performance::AngleSettings;
use crate::protocol::commands;
use crate::settings::{
    Battery, DeviceState, DpiSetting, LiftOffDistance, LightingSetting, PollingRate,
    PowerOffTimeout,
};
use crate::transport::{HidBackend, HidTransport};
use crate::{dpi, energy, lighting, performance, profile, report_rate, safety};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

struct Link {
    transport: Option<Box<dyn HidTransport>>,
    state: DeviceState,
    connection: ConnectionState,
}

/// One physical mouse.
pub struct Device {
    model: MouseModel,
    link: Mutex<Link>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("model", &self.model)
            .field("connection", &self.connection_state())
            .finish()
    }
}

impl Device {
    /// Unconnected device with an empty mirror.
    pub fn new(model: MouseModel) -> Self {
        let caps = model.capabilities();
        let state = DeviceState {
            dpi_slot: 1,
            dpi: vec![DpiSetting::default(); caps.dpi_profile_count as usize],
            ..Default::default()
        };
        Self {
            model,
            link: Mutex::new(Link {
                transport: None,
                state,
                connection: ConnectionState::Disconnected,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn model(&self) -> MouseModel {
        self.model
    }

    pub fn id(&self) -> DeviceId {
        self.model.descriptor()
    }

    pub fn name(&self) -> &'static str {
        self.model.name()
    }

    pub fn capabilities(&self) -> &'static CapabilitySet {
        self.model.capabilities()
    }

    /// Snapshot of the settings mirror.
    pub fn state(&self) -> DeviceState {
        self.lock().state.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.lock().state.ready
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.lock().connection
    }

    /// Move the connection state machine; invalid transitions are refused.
    pub(crate) fn transition(&self, next: ConnectionState) -> bool {
        let mut link = self.lock();
        let current = link.connection;
        if !current.can_transition_to(next) {
            warn!(
                device = self.name(),
                from = ?current,
                to = ?next,
                "refusing invalid connection transition"
            );
            return false;
        }
        debug!(device = self.name(), from = ?current, to = ?next, "connection transition");
        link.connection = next;
        true
    }

    /// Acquire the transport handle.
    pub fn connect(&self, backend: &dyn HidBackend) -> Result<()> {
        let descriptor = self.id();
        let open_error = |reason: String| Error::TransportOpen {
            device: self.name(),
            reason,
        };

        let handle = backend
            .find(&descriptor)
            .ok_or_else(|| open_error("not enumerated".into()))?;
        let transport = backend.open(&handle).map_err(|e| open_error(e.to_string()))?;

        info!(device = self.name(), path = %handle.path, "transport handle acquired");
        self.lock().transport = Some(transport);
        Ok(())
    }

    /// Release the transport handle; no further I/O is attempted afterwards.
    pub fn disconnect(&self) {
        let mut link = self.lock();
        link.transport = None;
        link.state.ready = false;
        if link.connection == ConnectionState::Ready {
            link.connection = ConnectionState::Disconnected;
        }
        debug!(device = self.name(), "transport handle released");
    }

    /// Read every supported setting from firmware into the mirror.
    ///
    /// Readiness is all-or-nothing: on any failure the device is marked not
    /// ready and the previous mirror values are kept. Callers outside the
    /// crate re-synchronize through [`Registry::synchronize`], which drops a
    /// device that fails.
    ///
    /// [`Registry::synchronize`]: crate::Registry::synchronize
    pub(crate) fn synchronize(&self) -> Result<()> {
        let mut link = self.lock();
        let Some(transport) = link.transport.as_deref() else {
            link.state.ready = false;
            return Err(Error::Sync {
                device: self.name(),
                source: Box::new(Error::Disconnected),
            });
        };

        match read_all(transport, self.capabilities(), &link.state) {
            Ok(state) => {
                link.state = state;
                info!(device = self.name(), "settings synchronized");
                Ok(())
            }
            Err(e) => {
                link.state.ready = false;
                warn!(device = self.name(), error = %e, "synchronize failed");
                Err(Error::Sync {
                    device: self.name(),
                    source: Box::new(e),
                })
            }
        }
    }

    /// Lightweight battery read; updates only the battery fields.
    pub fn read_battery(&self) -> Result<Battery> {
        safety::require(self.capabilities().battery, self.name(), "battery reporting")?;
        let mut link = self.lock();
        let transport = link.transport.as_deref().ok_or(Error::Disconnected)?;
        let battery = energy::read_battery(transport)?;
        link.state.battery = battery;
        debug!(
            device = self.name(),
            percent = battery.percent,
            charging = battery.charging,
            "battery read"
        );
        Ok(battery)
    }

    /// Store a battery reading pushed by the transport.
    pub fn apply_battery(&self, battery: Battery) {
        self.lock().state.battery = battery;
    }

    /// Field-level read of the lighting state; refreshes that mirror entry.
    pub fn read_lighting(&self) -> Result<LightingSetting> {
        safety::require(self.capabilities().has_rgb(), self.name(), "lighting")?;
        let mut link = self.lock();
        let transport = link.transport.as_deref().ok_or(Error::Disconnected)?;
        let setting = lighting::read_lighting(transport)?;
        link.state.lighting = setting;
        Ok(setting)
    }

    /// Send a write and apply it to the mirror once the firmware accepted it.
    fn write_through(
        &self,
        setting: &'static str,
        write: impl FnOnce(&dyn HidTransport, &DeviceState) -> Result<()>,
        apply: impl FnOnce(&mut DeviceState),
    ) -> Result<()> {
        let mut link = self.lock();
        let Link {
            transport, state, ..
        } = &mut *link;
        let transport = transport.as_deref().ok_or(Error::Disconnected)?;

        if let Err(e) = write(transport, state) {
            warn!(device = self.name(), setting, error = %e, "write failed");
            return Err(Error::Write {
                setting,
                source: Box::new(e),
            });
        }

        apply(state);
        debug!(device = self.name(), setting, "write applied");
        Ok(())
    }

    /// Set value and color of a 1-based DPI slot. Returns the stored setting
    /// (DPI rounded to the firmware step).
    pub fn set_dpi_for_profile(&self, slot: u8, setting: DpiSetting) -> Result<DpiSetting> {
        let caps = self.capabilities();
        safety::validate_dpi_slot(slot, caps)?;
        let stored = DpiSetting {
            dpi: safety::validate_dpi(setting.dpi, caps)?,
            color: setting.color,
        };

        self.write_through(
            "dpi",
            |t, _| dpi::write_dpi_slot(t, slot, stored),
            |state| state.dpi[slot as usize - 1] = stored,
        )?;
        Ok(stored)
    }

    /// Make a 1-based DPI slot the active one.
    pub fn set_dpi_slot(&self, slot: u8) -> Result<()> {
        safety::validate_dpi_slot(slot, self.capabilities())?;
        self.write_through(
            "dpi slot",
            |t, _| dpi::select_dpi_slot(t, slot),
            |state| state.dpi_slot = slot,
        )
    }

    /// Switch the firmware to a 0-based profile.
    ///
    /// Only the profile index is mirrored; the other fields belong to the old
    /// bank until the next synchronize.
    pub fn set_profile(&self, index: u8) -> Result<()> {
        safety::validate_profile(index, self.capabilities())?;
        self.write_through(
            "profile",
            |t, _| profile::switch_profile(t, index),
            |state| state.profile = index,
        )
    }

    pub fn set_lighting(&self, setting: LightingSetting) -> Result<()> {
        safety::validate_lighting(&setting, self.capabilities(), self.name())?;
        self.write_through(
            "lighting",
            |t, _| lighting::write_lighting(t, &setting),
            |state| state.lighting = setting,
        )
    }

    pub fn set_polling_rate(&self, rate: PollingRate) -> Result<()> {
        safety::validate_polling_rate(rate, self.capabilities(), self.name())?;
        self.write_through(
            "polling rate",
            |t, _| report_rate::write_report_rate(t, rate),
            |state| state.polling_rate = rate,
        )
    }

    pub fn set_angle_snapping(&self, enabled: bool) -> Result<()> {
        safety::require(self.capabilities().angle_snapping, self.name(), "angle snapping")?;
        self.write_through(
            "angle snapping",
            |t, state| {
                let angle = AngleSettings {
                    snapping: enabled,
                    adjustment: state.angle_adjustment,
                };
                performance::write_angle(t, angle)
            },
            |state| state.angle_snapping = enabled,
        )
    }

    pub fn set_angle_adjustment(&self, degrees: i8) -> Result<()> {
        safety::validate_angle(degrees, self.capabilities(), self.name())?;
        self.write_through(
            "angle adjustment",
            |t, state| {
                let angle = AngleSettings {
                    snapping: state.angle_snapping,
                    adjustment: degrees,
                };
                performance::write_angle(t, angle)
            },
            |state| state.angle_adjustment = degrees,
        )
    }

    pub fn set_lift_off_distance(&self, distance: LiftOffDistance) -> Result<()> {
        safety::require(self.capabilities().lift_off, self.name(), "lift-off distance")?;
        self.write_through(
            "lift-off distance",
            |t, _| performance::write_lift_off(t, distance),
            |state| state.lift_off = distance,
        )
    }

    pub fn set_energy_settings(
        &self,
        low_battery_warning: u8,
        power_off: PowerOffTimeout,
    ) -> Result<()> {
        let caps = self.capabilities();
        safety::require(caps.has_energy_settings(), self.name(), "energy settings")?;
        safety::validate_percent("low_battery_warning", low_battery_warning)?;
        let energy = EnergySettings {
            power_off,
            low_battery_warning,
        };
        self.write_through(
            "energy settings",
            |t, _| energy::write_energy(t, energy),
            |state| {
                state.low_battery_warning = low_battery_warning;
                state.power_off = power_off;
            },
        )
    }
}

/// Read every field the capability table claims, in a fixed order:
/// profile, DPI slots, lighting, polling rate, angle, lift-off, energy,
/// battery.
fn read_all(
    transport: &dyn HidTransport,
    caps: &CapabilitySet,
    previous: &DeviceState,
) -> Result<DeviceState> {
    let mut state = previous.clone();

    let active = profile::read_profile(transport)?;
    if active.profile >= caps.profile_count {
        return Err(Error::Protocol {
            command: commands::PROFILE,
            code: active.profile,
        });
    }
    state.profile = active.profile;
    state.dpi_slot = active.dpi_slot.clamp(1, caps.dpi_profile_count);

    state.dpi = dpi::read_dpi_slots(transport, caps.dpi_profile_count)?;

    if caps.has_rgb() {
        state.lighting = lighting::read_lighting(transport)?;
    }
    if caps.can_set_polling_rate() {
        state.polling_rate = report_rate::read_report_rate(transport)?;
    }
    if caps.has_angle_settings() {
        let angle = performance::read_angle(transport)?;
        state.angle_snapping = angle.snapping;
        state.angle_adjustment = angle.adjustment;
    }
    if caps.lift_off {
        state.lift_off = performance::read_lift_off(transport)?;
    }
    if caps.has_energy_settings() {
        let energy = energy::read_energy(transport)?;
        state.power_off = energy.power_off;
        state.low_battery_warning = energy.low_battery_warning;
    }
    if caps.battery {
        state.battery = energy::read_battery(transport)?;
    }

    state.ready = true;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AnimationSpeed, LightingMode, Rgb};
    use crate::transport::mock::{MockBackend, SimulatedMouse};

    fn connected(model: MouseModel) -> (Device, SimulatedMouse) {
        let backend = MockBackend::new();
        let mouse = SimulatedMouse::new();
        backend.plug(model.descriptor(), mouse.clone());
        let device = Device::new(model);
        device.connect(&backend).unwrap();
        device.synchronize().unwrap();
        (device, mouse)
    }

    #[test]
    fn new_device_is_unconnected() {
        let device = Device::new(MouseModel::GladiusIII);
        assert_eq!(device.connection_state(), ConnectionState::Disconnected);
        assert!(!device.is_ready());
        assert_eq!(device.state().dpi.len(), 4);
    }

    #[test]
    fn connect_fails_when_absent() {
        let backend = MockBackend::new();
        let device = Device::new(MouseModel::ChakramX);
        assert!(matches!(
            device.connect(&backend),
            Err(Error::TransportOpen { .. })
        ));
    }

    #[test]
    fn synchronize_populates_mirror() {
        let (device, _mouse) = connected(MouseModel::GladiusIII);
        let state = device.state();
        assert!(state.ready);
        assert_eq!(state.profile, 0);
        assert_eq!(state.dpi_slot, 2);
        assert_eq!(state.dpi[2].dpi, 1600);
        assert_eq!(state.polling_rate, PollingRate::Hz1000);
        assert_eq!(state.low_battery_warning, 20);
        assert_eq!(state.battery.percent, 80);
    }

    #[test]
    fn synchronize_skips_unsupported_fields() {
        let (device, mouse) = connected(MouseModel::TufM4Wireless);
        // profile, dpi, polling, energy, battery
        assert_eq!(mouse.reads(), 5);
        assert_eq!(device.state().lighting, LightingSetting::default());
    }

    #[test]
    fn profile_index_beyond_profile_count_fails_sync() {
        let (device, mouse) = connected(MouseModel::TufM4Wireless);
        mouse.set_block(commands::PROFILE, vec![0xFF, 0]);
        let err = device.synchronize().unwrap_err();
        assert!(matches!(
            err,
            Error::Sync { ref source, .. }
                if matches!(**source, Error::Protocol { code: 0xFF, .. })
        ));
        assert!(!device.is_ready());
        assert_eq!(device.state().profile, 0);
    }

    #[test]
    fn synchronize_is_idempotent() {
        let (device, _mouse) = connected(MouseModel::ChakramX);
        let first = device.state();
        device.synchronize().unwrap();
        assert_eq!(device.state(), first);
    }

    #[test]
    fn failed_synchronize_clears_readiness_and_keeps_mirror() {
        let (device, mouse) = connected(MouseModel::GladiusIII);
        let before = device.state();
        // DPI read succeeds with new values, then lighting decodes garbage
        mouse.set_block(commands::DPI, vec![0x40, 0x1F, 0, 0, 0]);
        mouse.set_block(commands::LIGHTING, vec![0x42, 100, 0, 0, 0, 0, 0, 7]);
        assert!(matches!(device.synchronize(), Err(Error::Sync { .. })));
        let after = device.state();
        assert!(!after.ready);
        assert_eq!(after.dpi, before.dpi);
    }

    #[test]
    fn set_dpi_rejects_out_of_range_without_io() {
        let (device, mouse) = connected(MouseModel::GladiusIII);
        let before = device.state();
        let err = device
            .set_dpi_for_profile(2, DpiSetting::new(40_000, Rgb::default()))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(device.state(), before);
        assert_eq!(mouse.writes(), 0);
    }

    #[test]
    fn set_dpi_rejects_bad_slot() {
        let (device, mouse) = connected(MouseModel::GladiusIII);
        for slot in [0, 5] {
            let err = device
                .set_dpi_for_profile(slot, DpiSetting::new(800, Rgb::default()))
                .unwrap_err();
            assert!(err.is_validation());
        }
        assert_eq!(mouse.writes(), 0);
    }

    #[test]
    fn set_dpi_updates_mirror_after_write() {
        let (device, mouse) = connected(MouseModel::GladiusIII);
        let stored = device
            .set_dpi_for_profile(2, DpiSetting::new(20_000, Rgb::new(0, 0, 255)))
            .unwrap();
        assert_eq!(stored.dpi, 20_000);
        assert_eq!(device.state().dpi[1], stored);
        assert_eq!(mouse.writes(), 1);
    }

    #[test]
    fn failed_write_leaves_mirror_untouched() {
        let (device, mouse) = connected(MouseModel::GladiusIII);
        let before = device.state();
        mouse.fail_next_writes(1);
        let err = device.set_polling_rate(PollingRate::Hz250).unwrap_err();
        assert!(matches!(err, Error::Write { setting: "polling rate", .. }));
        assert_eq!(device.state(), before);
        // No automatic retry
        assert_eq!(mouse.writes(), 0);
    }

    #[test]
    fn writes_after_disconnect_are_refused() {
        let (device, mouse) = connected(MouseModel::ChakramX);
        device.disconnect();
        assert!(matches!(
            device.set_polling_rate(PollingRate::Hz500),
            Err(Error::Disconnected)
        ));
        assert_eq!(mouse.writes(), 0);
    }

    #[test]
    fn lighting_sub_fields_are_stored_verbatim() {
        let (device, _mouse) = connected(MouseModel::ChakramX);
        let ls = LightingSetting {
            mode: LightingMode::Static,
            speed: AnimationSpeed::Fast,
            random_color: true,
            ..device.state().lighting
        };
        device.set_lighting(ls).unwrap();
        assert_eq!(device.state().lighting, ls);
        assert_eq!(device.read_lighting().unwrap(), ls);
    }

    #[test]
    fn lighting_rejected_on_model_without_rgb() {
        let (device, mouse) = connected(MouseModel::TufM4Wireless);
        let err = device.set_lighting(LightingSetting::default()).unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
        assert_eq!(mouse.writes(), 0);
    }

    #[test]
    fn angle_writes_carry_the_other_field() {
        let (device, mouse) = connected(MouseModel::GladiusIII);
        device.set_angle_adjustment(-10).unwrap();
        device.set_angle_snapping(true).unwrap();
        assert_eq!(mouse.block(commands::ANGLE), vec![1, (-10i8) as u8]);
        let state = device.state();
        assert!(state.angle_snapping);
        assert_eq!(state.angle_adjustment, -10);
    }

    #[test]
    fn profile_and_slot_selection() {
        let (device, _mouse) = connected(MouseModel::GladiusIII);
        device.set_profile(4).unwrap();
        device.set_dpi_slot(3).unwrap();
        assert!(device.set_profile(5).is_err());
        let state = device.state();
        assert_eq!(state.profile, 4);
        assert_eq!(state.dpi_slot, 3);
        device.synchronize().unwrap();
        assert_eq!(device.state().profile, 4);
        assert_eq!(device.state().dpi_slot, 3);
    }

    #[test]
    fn energy_and_lift_off() {
        let (device, _mouse) = connected(MouseModel::ChakramX);
        device
            .set_energy_settings(30, PowerOffTimeout::Never)
            .unwrap();
        device.set_lift_off_distance(LiftOffDistance::High).unwrap();
        assert!(device
            .set_energy_settings(101, PowerOffTimeout::OneMinute)
            .is_err());
        device.synchronize().unwrap();
        let state = device.state();
        assert_eq!(state.low_battery_warning, 30);
        assert_eq!(state.power_off, PowerOffTimeout::Never);
        assert_eq!(state.lift_off, LiftOffDistance::High);
    }

    #[test]
    fn read_battery_updates_only_battery() {
        let (device, mouse) = connected(MouseModel::GladiusIII);
        mouse.set_battery(42, true);
        mouse.set_block(commands::POLLING_RATE, vec![0]);
        let battery = device.read_battery().unwrap();
        assert_eq!(battery.percent, 42);
        let state = device.state();
        assert_eq!(state.battery, battery);
        assert_eq!(state.polling_rate, PollingRate::Hz1000);
    }

    #[test]
    fn read_battery_unsupported_on_wired() {
        let (device, _mouse) = connected(MouseModel::GladiusIIIWired);
        assert!(matches!(
            device.read_battery(),
            Err(Error::Unsupported { .. })
        ));
    }
}
