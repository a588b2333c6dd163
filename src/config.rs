/*
 *  config.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, command line
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::layout::LayoutStyle;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level configuration, every section falls back to its defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// e.g. "info" | "debug"
    pub log_level: Option<String>,
    pub channel_count: usize,
    pub mode: Mode,
    /// cascade mode: time for a channel to ramp from dark to full
    pub cascade_fade_ms: u64,
    pub timing: TimingConfig,
    pub display: DisplayConfig,
    pub layout: LayoutConfig,
    pub input: InputConfig,
    pub assets: AssetsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            channel_count: 5,
            mode: Mode::Smooth,
            cascade_fade_ms: 10_000,
            timing: TimingConfig::default(),
            display: DisplayConfig::default(),
            layout: LayoutConfig::default(),
            input: InputConfig::default(),
            assets: AssetsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// debounced visibility with exponential fades
    #[default]
    Smooth,
    /// left-to-right cascade with linear brightness ramps
    Cascade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub activation_delay_ms: u64,
    pub deactivation_delay_ms: u64,
    /// <= 0 snaps instantly
    pub rise_tau_ms: f32,
    pub fall_tau_ms: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            activation_delay_ms: 120,
            deactivation_delay_ms: 150,
            rise_tau_ms: 700.0,
            fall_tau_ms: 900.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// physical canvas, both monitors side by side
    pub canvas_width: u32,
    pub height: u32,
    pub dual_screens: bool,
    pub left_width: Option<u32>,
    pub right_width: Option<u32>,
    /// hidden gutter behind the physical bezel, tuned on site
    pub bezel_width: u32,
    pub fps: u32,
    pub emulated: bool,
    pub window_scale_down: u32,
    pub snapshot_path: Option<PathBuf>,
    pub snapshot_interval_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            canvas_width: 3840,
            height: 1080,
            dual_screens: true,
            left_width: None,
            right_width: None,
            bezel_width: 60,
            fps: 60,
            emulated: false,
            window_scale_down: 2,
            snapshot_path: None,
            snapshot_interval_secs: 5,
        }
    }
}

impl DisplayConfig {
    /// Monitor split as `(left, bezel, right)`
    ///
    /// Missing widths split the canvas in half (odd pixel to the right).
    /// A single screen takes the whole canvas and has no gutter.
    pub fn split(&self) -> (u32, u32, u32) {
        if !self.dual_screens {
            return (self.canvas_width, 0, 0);
        }
        let left = self.left_width.unwrap_or(self.canvas_width / 2);
        let right = self
            .right_width
            .unwrap_or_else(|| self.canvas_width.saturating_sub(left));
        (left, self.bezel_width, right)
    }

    /// Width of the presented canvas, gutter excluded
    pub fn physical_width(&self) -> u32 {
        let (left, _, right) = self.split();
        left + right
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub side_margin: f32,
    pub bottom_margin: f32,
    /// fraction of a band an image may fill, leaves gaps between slots
    pub slot_fill: f32,
    pub target_height_fraction: f32,
    pub style: LayoutStyle,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            side_margin: 40.0,
            bottom_margin: 40.0,
            slot_fill: 0.92,
            target_height_fraction: 0.9,
            style: LayoutStyle::Slots,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub source: InputKind,
    /// mock generator rate
    pub update_hz: f64,
    pub covered_probability: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { source: InputKind::Mock, update_hz: 1.0, covered_probability: 0.45 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Mock,
    Stdin,
    /// serial tty (configured with stty beforehand) or a capture file
    Device { path: PathBuf },
}

impl InputKind {
    /// `mock`, `stdin` or a path
    pub fn from_arg(arg: &str) -> Self {
        match arg {
            "mock" => InputKind::Mock,
            "stdin" | "-" => InputKind::Stdin,
            path => InputKind::Device { path: PathBuf::from(path) },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub dir: PathBuf,
    /// `{}` is replaced by the channel index
    pub image_pattern: String,
    pub background: Option<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            image_pattern: "Fase{}.png".to_string(),
            background: Some("wood.png".to_string()),
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "florafade", about = "Florafade sensor bloom display", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// shorthand for --log-level debug
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub channels: Option<usize>,
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,
    #[arg(long)]
    pub activation_delay_ms: Option<u64>,
    #[arg(long)]
    pub deactivation_delay_ms: Option<u64>,
    #[arg(long, allow_negative_numbers = true)]
    pub rise_tau_ms: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    pub fall_tau_ms: Option<f32>,
    #[arg(long)]
    pub canvas_width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    #[arg(long)]
    pub left_width: Option<u32>,
    #[arg(long)]
    pub right_width: Option<u32>,
    #[arg(long)]
    pub bezel_width: Option<u32>,
    #[arg(long, action = ArgAction::SetTrue)]
    pub single_screen: bool,
    #[arg(long)]
    pub fps: Option<u32>,
    /// open the desktop emulator window
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub emulated: bool,
    #[arg(long)]
    pub scale_down: Option<u32>,
    /// write periodic PNG snapshots of the presented canvas here
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub snapshot: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub layout_style: Option<LayoutStyle>,
    /// `mock`, `stdin` or a device/file path
    #[arg(long)]
    pub input: Option<String>,
    #[arg(long)]
    pub update_hz: Option<f64>,
    #[arg(long)]
    pub covered_probability: Option<f64>,
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub assets: Option<PathBuf>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = resolve(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Layer file and CLI over the defaults and validate the result
pub fn resolve(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults, 2) YAML file (explicit path or search)
    let mut cfg = if let Some(p) = cli.config.as_ref() {
        if !p.exists() {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
        read_yaml(p)?
    } else if let Some(p) = find_config_file() {
        read_yaml(&p)?
    } else {
        Config::default()
    };

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/florafade/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/florafade/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/florafade.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["florafade.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

/// Missing keys keep their defaults
pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()      { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                    { cfg.log_level = Some("debug".into()); }
    if let Some(n) = cli.channels   { cfg.channel_count = n; }
    if let Some(m) = cli.mode       { cfg.mode = m; }

    let t = &mut cfg.timing;
    if let Some(v) = cli.activation_delay_ms   { t.activation_delay_ms = v; }
    if let Some(v) = cli.deactivation_delay_ms { t.deactivation_delay_ms = v; }
    if let Some(v) = cli.rise_tau_ms           { t.rise_tau_ms = v; }
    if let Some(v) = cli.fall_tau_ms           { t.fall_tau_ms = v; }

    let d = &mut cfg.display;
    if let Some(v) = cli.canvas_width { d.canvas_width = v; }
    if let Some(v) = cli.height       { d.height = v; }
    if cli.left_width.is_some()       { d.left_width = cli.left_width; }
    if cli.right_width.is_some()      { d.right_width = cli.right_width; }
    if let Some(v) = cli.bezel_width  { d.bezel_width = v; }
    if cli.single_screen              { d.dual_screens = false; }
    if let Some(v) = cli.fps          { d.fps = v; }
    if cli.emulated                   { d.emulated = true; }
    if let Some(v) = cli.scale_down   { d.window_scale_down = v; }
    if cli.snapshot.is_some()         { d.snapshot_path = cli.snapshot.clone(); }

    if let Some(s) = cli.layout_style { cfg.layout.style = s; }

    let i = &mut cfg.input;
    if let Some(src) = cli.input.as_deref()       { i.source = InputKind::from_arg(src); }
    if let Some(v) = cli.update_hz                { i.update_hz = v; }
    if let Some(v) = cli.covered_probability      { i.covered_probability = v; }

    if let Some(dir) = cli.assets.as_ref() { cfg.assets.dir = dir.clone(); }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

/// Degenerate settings are rejected before anything starts
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.channel_count == 0 {
        return Err(invalid("channel_count must be > 0"));
    }
    if cfg.mode == Mode::Cascade && cfg.cascade_fade_ms == 0 {
        return Err(invalid("cascade_fade_ms must be > 0"));
    }

    let t = &cfg.timing;
    if !t.rise_tau_ms.is_finite() || !t.fall_tau_ms.is_finite() {
        return Err(invalid("rise_tau_ms/fall_tau_ms must be finite"));
    }

    let d = &cfg.display;
    let (left, _, right) = d.split();
    if d.height == 0 || left == 0 {
        return Err(invalid("display width/height must be > 0"));
    }
    if d.dual_screens && right == 0 {
        return Err(invalid("right_width must be > 0 with dual_screens"));
    }
    if d.fps == 0 {
        return Err(invalid("display fps must be > 0"));
    }
    if d.window_scale_down == 0 {
        return Err(invalid("window_scale_down must be >= 1"));
    }
    if d.snapshot_path.is_some() && d.snapshot_interval_secs == 0 {
        return Err(invalid("snapshot_interval_secs must be > 0"));
    }

    let l = &cfg.layout;
    for (name, v) in [
        ("side_margin", l.side_margin),
        ("bottom_margin", l.bottom_margin),
        ("slot_fill", l.slot_fill),
        ("target_height_fraction", l.target_height_fraction),
    ] {
        if !v.is_finite() || v < 0.0 {
            return Err(invalid(format!("layout {name} must be finite and >= 0, got {v}")));
        }
    }

    let i = &cfg.input;
    if !(i.update_hz.is_finite() && i.update_hz > 0.0) {
        return Err(invalid("input update_hz must be > 0"));
    }
    if !(0.0..=1.0).contains(&i.covered_probability) {
        return Err(invalid("input covered_probability must be in 0..=1"));
    }
    if !cfg.assets.image_pattern.contains("{}") {
        return Err(invalid("assets image_pattern must contain {}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::default();
        validate(&cfg).unwrap();
        assert_eq!(cfg.display.split(), (1920, 60, 1920));
        assert_eq!(cfg.display.physical_width(), 3840);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = parse_yaml(
            "channel_count: 3\ntiming:\n  activation_delay_ms: 50\ndisplay:\n  bezel_width: 72\n",
        )
        .unwrap();
        assert_eq!(cfg.channel_count, 3);
        assert_eq!(cfg.timing.activation_delay_ms, 50);
        assert_eq!(cfg.timing.deactivation_delay_ms, 150);
        assert_eq!(cfg.display.bezel_width, 72);
        assert_eq!(cfg.display.height, 1080);
        assert_eq!(cfg.layout.slot_fill, 0.92);
    }

    #[test]
    fn test_yaml_input_and_style() {
        let cfg = parse_yaml(
            "mode: cascade\nlayout:\n  style: full_canvas\ninput:\n  source:\n    type: device\n    path: /dev/ttyACM0\n",
        )
        .unwrap();
        assert_eq!(cfg.mode, Mode::Cascade);
        assert_eq!(cfg.layout.style, LayoutStyle::FullCanvas);
        assert_eq!(cfg.input.source, InputKind::Device { path: PathBuf::from("/dev/ttyACM0") });
    }

    #[test]
    fn test_split_rules() {
        let mut d = DisplayConfig { canvas_width: 3001, ..Default::default() };
        assert_eq!(d.split(), (1500, 60, 1501));

        d.left_width = Some(1280);
        d.right_width = Some(1920);
        assert_eq!(d.split(), (1280, 60, 1920));

        d.dual_screens = false;
        assert_eq!(d.split(), (3001, 0, 0));
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut cfg = Config::default();
        let cli = Cli {
            debug: true,
            bezel_width: Some(0),
            rise_tau_ms: Some(-1.0),
            input: Some("stdin".into()),
            single_screen: true,
            ..Default::default()
        };
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.display.bezel_width, 0);
        assert_eq!(cfg.timing.rise_tau_ms, -1.0);
        assert_eq!(cfg.input.source, InputKind::Stdin);
        assert!(!cfg.display.dual_screens);
        validate(&cfg).unwrap();
    }

    #[test]
    fn test_validation_rejects_degenerate() {
        let mut cfg = Config { channel_count: 0, ..Default::default() };
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));

        cfg.channel_count = 5;
        cfg.display.height = 0;
        assert!(validate(&cfg).is_err());

        cfg.display.height = 1080;
        cfg.layout.side_margin = -1.0;
        assert!(validate(&cfg).is_err());

        cfg.layout.side_margin = 40.0;
        cfg.timing.fall_tau_ms = f32::NAN;
        assert!(validate(&cfg).is_err());

        cfg.timing.fall_tau_ms = 900.0;
        cfg.input.covered_probability = 1.5;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_input_arg() {
        assert_eq!(InputKind::from_arg("mock"), InputKind::Mock);
        assert_eq!(InputKind::from_arg("-"), InputKind::Stdin);
        assert_eq!(
            InputKind::from_arg("/dev/ttyUSB0"),
            InputKind::Device { path: PathBuf::from("/dev/ttyUSB0") }
        );
    }
}
