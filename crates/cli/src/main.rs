//! rog-mouse CLI: command-line configuration and monitoring of ROG mice.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rog_mouse_core::notify::{self, DeviceEvent, Notifier};
use rog_mouse_core::settings::{
    AnimationDirection, AnimationSpeed, DpiSetting, LightingMode, PollingRate, Rgb,
};
use rog_mouse_core::transport::HidApiBackend;
use rog_mouse_core::{Device, DeviceId, DeviceWatcher, MouseModel, Registry, RegistryConfig};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How often `watch` compares the host enumeration.
const ENUMERATION_POLL: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(
    name = "rog-mouse",
    version,
    about = "Open-source ASUS ROG mouse configuration"
)]
struct Cli {
    /// JSON file with registry settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only act on models whose name contains this text.
    #[arg(long, short, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported mice that are plugged in.
    List,
    /// Connect, synchronize, and print every mouse's settings.
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Set value and color of a DPI slot.
    SetDpi {
        /// DPI slot (1-based).
        slot: u8,
        /// DPI value, rounded to the nearest 50.
        dpi: u16,
        /// Slot color as RRGGBB; keeps the current color when omitted.
        #[arg(long)]
        color: Option<String>,
    },
    /// Make a DPI slot the active one.
    SelectDpi {
        /// DPI slot (1-based).
        slot: u8,
    },
    /// Set polling rate in Hz.
    SetRate { hz: u16 },
    /// Switch the firmware profile (0-based).
    SetProfile { index: u8 },
    /// Change the lighting effect.
    SetLighting {
        /// static, breathing, color-cycle, rainbow, react, comet, battery, off.
        #[arg(long)]
        mode: String,
        /// 0-100.
        #[arg(long)]
        brightness: Option<u8>,
        /// RRGGBB.
        #[arg(long)]
        color: Option<String>,
        #[arg(long, value_enum)]
        speed: Option<SpeedArg>,
        #[arg(long, value_enum)]
        direction: Option<DirectionArg>,
        /// Pick random colors (comet).
        #[arg(long)]
        random: bool,
    },
    /// Print battery level of wireless mice.
    Battery,
    /// Watch for plug/unplug and battery changes until Ctrl-C.
    Watch,
}

#[derive(Clone, Copy, ValueEnum)]
enum SpeedArg {
    Slow,
    Medium,
    Fast,
}

impl From<SpeedArg> for AnimationSpeed {
    fn from(arg: SpeedArg) -> Self {
        match arg {
            SpeedArg::Slow => AnimationSpeed::Slow,
            SpeedArg::Medium => AnimationSpeed::Medium,
            SpeedArg::Fast => AnimationSpeed::Fast,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Clockwise,
    CounterClockwise,
}

impl From<DirectionArg> for AnimationDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Clockwise => AnimationDirection::Clockwise,
            DirectionArg::CounterClockwise => AnimationDirection::CounterClockwise,
        }
    }
}

fn parse_color(hex: &str) -> Result<Rgb> {
    Rgb::from_hex(hex).ok_or_else(|| anyhow!("invalid color '{hex}', expected RRGGBB"))
}

fn load_config(path: Option<&PathBuf>) -> Result<RegistryConfig> {
    match path {
        Some(path) => RegistryConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(RegistryConfig::default()),
    }
}

struct App {
    backend: Arc<HidApiBackend>,
    registry: Registry,
    config: RegistryConfig,
}

impl App {
    fn new(cli: &Cli, notifier: Notifier) -> Result<Self> {
        let config = load_config(cli.config.as_ref())?;
        let backend = Arc::new(HidApiBackend::new().context("initializing hidapi")?);

        let catalog: Vec<MouseModel> = MouseModel::ALL
            .iter()
            .copied()
            .filter(|m| match &cli.model {
                Some(filter) => m.name().to_lowercase().contains(&filter.to_lowercase()),
                None => true,
            })
            .collect();
        if catalog.is_empty() {
            bail!("no supported model matches '{}'", cli.model.as_deref().unwrap_or_default());
        }

        let registry = Registry::with_catalog(backend.clone(), notifier, &config, &catalog);
        Ok(Self {
            backend,
            registry,
            config,
        })
    }

    /// Detect and return every ready device.
    async fn connect_all(&self) -> Result<Vec<Arc<Device>>> {
        self.registry.detect_all().await;
        let mut devices = self.registry.devices();
        if devices.is_empty() {
            bail!("no supported mouse is connected and ready");
        }
        devices.sort_by_key(|d| d.name());
        Ok(devices)
    }

    /// The single device a setting command applies to.
    async fn connect_one(&self) -> Result<Arc<Device>> {
        let devices = self.connect_all().await?;
        if devices.len() > 1 {
            let names: Vec<_> = devices.iter().map(|d| d.name()).collect();
            bail!(
                "several mice connected ({}); pick one with --model",
                names.join(", ")
            );
        }
        devices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no supported mouse is connected"))
    }
}

fn print_status(device: &Device) {
    let caps = device.capabilities();
    let state = device.state();

    println!("{} [{}]", device.name(), device.id());
    println!("  Connection:    {}", device.connection_state());
    println!("  Profile:       {} of {}", state.profile.saturating_add(1), caps.profile_count);
    for (i, slot) in state.dpi.iter().enumerate() {
        let marker = if i + 1 == state.dpi_slot as usize { "*" } else { " " };
        if caps.dpi_colors {
            println!("  DPI slot {}{}:   {} ({})", i + 1, marker, slot.dpi, slot.color);
        } else {
            println!("  DPI slot {}{}:   {}", i + 1, marker, slot.dpi);
        }
    }
    if caps.can_set_polling_rate() {
        println!("  Polling rate:  {}", state.polling_rate);
    }
    if caps.has_rgb() {
        let ls = &state.lighting;
        println!(
            "  Lighting:      {} {}% {}",
            ls.mode.label(),
            ls.brightness,
            ls.color
        );
    }
    if caps.has_angle_settings() {
        println!(
            "  Angle:         snapping {}, tuning {} deg",
            if state.angle_snapping { "on" } else { "off" },
            state.angle_adjustment
        );
    }
    if caps.lift_off {
        println!("  Lift-off:      {:?}", state.lift_off);
    }
    if caps.has_energy_settings() {
        let power_off = match state.power_off.minutes() {
            Some(m) => format!("{m} min"),
            None => "never".to_string(),
        };
        println!(
            "  Power off:     {power_off}, warn at {}%",
            state.low_battery_warning
        );
    }
    if caps.battery {
        println!(
            "  Battery:       {}%{}",
            state.battery.percent,
            if state.battery.charging { " (charging)" } else { "" }
        );
    }
}

fn model_name(id: &DeviceId) -> &'static str {
    MouseModel::from_ids(id.vendor_id, id.product_id).map_or("unknown device", |m| m.name())
}

fn print_event(registry: &Registry, event: &DeviceEvent, known: &mut HashSet<DeviceId>) {
    match event {
        DeviceEvent::Changed(id) => {
            debug!(descriptor = %id, tracked = registry.len(), "device set changed");
            if registry.is_tracked(id) && known.insert(*id) {
                println!("{}: connected", model_name(id));
            }
        }
        DeviceEvent::BatteryUpdated { id, battery } => println!(
            "{}: battery {}%{}",
            model_name(id),
            battery.percent,
            if battery.charging { " (charging)" } else { "" }
        ),
        DeviceEvent::ReadinessChanged { id, ready } => println!(
            "{}: {}",
            model_name(id),
            if *ready { "ready" } else { "not ready" }
        ),
        DeviceEvent::Disconnected(id) => {
            known.remove(id);
            println!("{}: disconnected", model_name(id));
        }
    }
}

async fn watch(app: App, mut events: notify::Subscription) -> Result<()> {
    let watcher = DeviceWatcher::start(app.registry.clone());
    watcher.notify_changed();

    let mut enumeration = tokio::time::interval(ENUMERATION_POLL);
    let mut battery = tokio::time::interval(app.config.battery_poll_interval());
    let mut last_snapshot = app.backend.snapshot().unwrap_or_default();
    let mut known = HashSet::new();

    println!("Watching for mice, press Ctrl-C to stop.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = enumeration.tick() => {
                match app.backend.snapshot() {
                    Ok(snapshot) if snapshot != last_snapshot => {
                        last_snapshot = snapshot;
                        watcher.notify_changed();
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "enumeration snapshot failed"),
                }
            }
            _ = battery.tick() => {
                let registry = app.registry.clone();
                let refresh = move || registry.refresh_battery_for_all();
                if let Err(e) = tokio::task::spawn_blocking(refresh).await {
                    warn!(error = %e, "battery refresh task failed");
                }
            }
            Some(event) = events.recv() => print_event(&app.registry, &event, &mut known),
        }
    }

    watcher.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let (notifier, events) = notify::channel();
    let app = App::new(&cli, notifier)?;

    match cli.command {
        Commands::List => {
            let present = app.registry.present_models();
            if present.is_empty() {
                println!("No supported mice found.");
                println!("Ensure your mouse is connected and you can access its hidraw node.");
            } else {
                for model in present {
                    let id = model.descriptor();
                    println!(
                        "{} (VID: 0x{:04X}, PID: 0x{:04X})",
                        model.name(),
                        id.vendor_id,
                        id.product_id
                    );
                }
            }
        }
        Commands::Status { json } => {
            let devices = app.connect_all().await?;
            if json {
                let out: Vec<_> = devices
                    .iter()
                    .map(|d| {
                        serde_json::json!({
                            "name": d.name(),
                            "model": d.model(),
                            "descriptor": d.id(),
                            "connection": d.connection_state(),
                            "state": d.state(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for device in &devices {
                    print_status(device);
                }
            }
        }
        Commands::SetDpi { slot, dpi, color } => {
            let device = app.connect_one().await?;
            let color = match color {
                Some(hex) => parse_color(&hex)?,
                None => device
                    .state()
                    .dpi_setting(slot)
                    .map(|s| s.color)
                    .unwrap_or_default(),
            };
            let stored = device.set_dpi_for_profile(slot, DpiSetting::new(dpi, color))?;
            println!("DPI slot {slot} set to {} ({})", stored.dpi, stored.color);
        }
        Commands::SelectDpi { slot } => {
            let device = app.connect_one().await?;
            device.set_dpi_slot(slot)?;
            println!("Active DPI slot: {slot}");
        }
        Commands::SetRate { hz } => {
            let rate = PollingRate::from_hz(hz).ok_or_else(|| {
                let valid: Vec<_> = PollingRate::ALL
                    .iter()
                    .map(|r| r.as_hz().to_string())
                    .collect();
                anyhow!(
                    "unknown polling rate {hz} Hz, expected one of {}",
                    valid.join(", ")
                )
            })?;
            let device = app.connect_one().await?;
            device.set_polling_rate(rate)?;
            println!("Polling rate set to {rate}");
        }
        Commands::SetProfile { index } => {
            let device = app.connect_one().await?;
            device.set_profile(index)?;
            app.registry.synchronize(&device.id())?;
            println!("Switched to profile {index}");
        }
        Commands::SetLighting {
            mode,
            brightness,
            color,
            speed,
            direction,
            random,
        } => {
            let mode = LightingMode::from_name(&mode)
                .ok_or_else(|| anyhow!("unknown lighting mode '{mode}'"))?;
            let device = app.connect_one().await?;
            let mut ls = device.state().lighting;
            ls.mode = mode;
            ls.random_color = random;
            if let Some(b) = brightness {
                ls.brightness = b;
            }
            if let Some(hex) = color {
                ls.color = parse_color(&hex)?;
            }
            if let Some(s) = speed {
                ls.speed = s.into();
            }
            if let Some(d) = direction {
                ls.direction = d.into();
            }
            device.set_lighting(ls)?;
            println!("Lighting set to {} at {}%", ls.mode.label(), ls.brightness);
        }
        Commands::Battery => {
            let devices = app.connect_all().await?;
            for device in devices.iter().filter(|d| d.capabilities().battery) {
                let battery = app.registry.read_battery(&device.id())?;
                println!(
                    "{}: {}%{}",
                    device.name(),
                    battery.percent,
                    if battery.charging { " (charging)" } else { "" }
                );
            }
        }
        Commands::Watch => watch(app, events).await?,
    }

    Ok(())
}
