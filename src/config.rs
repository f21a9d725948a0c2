use crate::finisher::NamingScheme;
use crate::machine::State;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BoothConfig {
    pub camera: CameraConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub gpio: GpioConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Show a live preview during the countdown
    #[serde(default = "default_camera_preview")]
    pub preview: bool,

    /// Preview frames per second
    #[serde(default = "default_camera_preview_fps")]
    pub preview_fps: u32,

    /// Picture resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Shots per row of the composite
    #[serde(default = "default_num_x")]
    pub num_x: u32,

    /// Rows of the composite
    #[serde(default = "default_num_y")]
    pub num_y: u32,

    /// Leave the last grid cell free (e.g. for a logo)
    #[serde(default = "default_skip_last")]
    pub skip_last: bool,

    /// Start at the welcome screen instead of the camera startup
    #[serde(default = "default_start_at_welcome")]
    pub start_at_welcome: bool,

    /// Seconds the greeter is shown
    #[serde(default = "default_greeter_time")]
    pub greeter_time: u64,

    /// Countdown ticks before each shot
    #[serde(default = "default_countdown_time")]
    pub countdown_time: u32,

    /// Seconds the assembled picture is shown
    #[serde(default = "default_display_time")]
    pub display_time: u64,

    /// Seconds the postprocess screen waits before returning to idle
    #[serde(default = "default_postprocess_time")]
    pub postprocess_time: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Directory all pictures are written below
    #[serde(default = "default_basedir")]
    pub basedir: String,

    /// strftime pattern for picture names, may contain subdirectories
    #[serde(default = "default_basename")]
    pub basename: String,

    #[serde(default)]
    pub naming: NamingScheme,

    /// Also archive every single shot
    #[serde(default = "default_keep_shots")]
    pub keep_shots: bool,

    /// Write a JSON sidecar next to every composite
    #[serde(default = "default_save_metadata")]
    pub save_metadata: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GpioConfig {
    #[serde(default = "default_gpio_enable")]
    pub enable: bool,

    #[serde(default = "default_lamp_pin")]
    pub lamp_pin: u8,

    #[serde(default = "default_trigger_pin")]
    pub trigger_pin: u8,

    #[serde(default = "default_exit_pin")]
    pub exit_pin: u8,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for the daily rotated log file
    pub directory: Option<String>,
}

impl BoothConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("photobooth.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.preview", default_camera_preview())?
            .set_default("camera.preview_fps", default_camera_preview_fps())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("session.num_x", default_num_x())?
            .set_default("session.num_y", default_num_y())?
            .set_default("session.skip_last", default_skip_last())?
            .set_default("session.start_at_welcome", default_start_at_welcome())?
            .set_default("session.greeter_time", default_greeter_time())?
            .set_default("session.countdown_time", default_countdown_time())?
            .set_default("session.display_time", default_display_time())?
            .set_default("session.postprocess_time", default_postprocess_time())?
            .set_default("storage.basedir", default_basedir())?
            .set_default("storage.basename", default_basename())?
            .set_default("storage.naming", "sequential")?
            .set_default("storage.keep_shots", default_keep_shots())?
            .set_default("storage.save_metadata", default_save_metadata())?
            .set_default("gpio.enable", default_gpio_enable())?
            .set_default("gpio.lamp_pin", default_lamp_pin())?
            .set_default("gpio.trigger_pin", default_trigger_pin())?
            .set_default("gpio.exit_pin", default_exit_pin())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // PHOTOBOOTH_SESSION__NUM_X style overrides, keys contain underscores
            .add_source(
                Environment::with_prefix("PHOTOBOOTH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: BoothConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.preview_fps == 0 {
            return Err(ConfigError::Message(
                "Camera preview_fps must be greater than 0".to_string(),
            ));
        }

        if self.session.num_x == 0 || self.session.num_y == 0 {
            return Err(ConfigError::Message(
                "Session num_x and num_y must be greater than 0".to_string(),
            ));
        }

        if self.session.countdown_time == 0 {
            return Err(ConfigError::Message(
                "Session countdown_time must be greater than 0".to_string(),
            ));
        }

        if self.storage.basename.trim().is_empty() {
            return Err(ConfigError::Message(
                "Storage basename must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl SessionConfig {
    /// Number of shots taken per session
    pub fn total_shots(&self) -> u32 {
        let cells = self.num_x.saturating_mul(self.num_y);
        cells.saturating_sub(u32::from(self.skip_last)).max(1)
    }

    /// First state of the booth, `run_now` skips the welcome screen
    pub fn initial_state(&self, run_now: bool) -> State {
        if self.start_at_welcome && !run_now {
            State::Welcome
        } else {
            State::Startup
        }
    }

    pub fn greeter(&self) -> Duration {
        Duration::from_secs(self.greeter_time)
    }

    pub fn display(&self) -> Duration {
        Duration::from_secs(self.display_time)
    }

    pub fn postprocess(&self) -> Duration {
        Duration::from_secs(self.postprocess_time)
    }
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                preview: default_camera_preview(),
                preview_fps: default_camera_preview_fps(),
                resolution: default_camera_resolution(),
            },
            session: SessionConfig {
                num_x: default_num_x(),
                num_y: default_num_y(),
                skip_last: default_skip_last(),
                start_at_welcome: default_start_at_welcome(),
                greeter_time: default_greeter_time(),
                countdown_time: default_countdown_time(),
                display_time: default_display_time(),
                postprocess_time: default_postprocess_time(),
            },
            storage: StorageConfig {
                basedir: default_basedir(),
                basename: default_basename(),
                naming: NamingScheme::default(),
                keep_shots: default_keep_shots(),
                save_metadata: default_save_metadata(),
            },
            gpio: GpioConfig {
                enable: default_gpio_enable(),
                lamp_pin: default_lamp_pin(),
                trigger_pin: default_trigger_pin(),
                exit_pin: default_exit_pin(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

// Default value functions
fn default_camera_preview() -> bool {
    true
}
fn default_camera_preview_fps() -> u32 {
    10
}
fn default_camera_resolution() -> (u32, u32) {
    (640, 480)
}

fn default_num_x() -> u32 {
    2
}
fn default_num_y() -> u32 {
    2
}
fn default_skip_last() -> bool {
    false
}
fn default_start_at_welcome() -> bool {
    true
}
fn default_greeter_time() -> u64 {
    4
}
fn default_countdown_time() -> u32 {
    8
}
fn default_display_time() -> u64 {
    5
}
fn default_postprocess_time() -> u64 {
    10
}

fn default_basedir() -> String {
    "./pictures".to_string()
}
fn default_basename() -> String {
    "%Y-%m-%d/photobooth".to_string()
}
fn default_keep_shots() -> bool {
    false
}
fn default_save_metadata() -> bool {
    false
}

fn default_gpio_enable() -> bool {
    true
}
fn default_lamp_pin() -> u8 {
    7
}
fn default_trigger_pin() -> u8 {
    5
}
fn default_exit_pin() -> u8 {
    13
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = BoothConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.total_shots(), 4);
        assert_eq!(config.storage.naming, NamingScheme::Sequential);
    }

    #[test]
    fn test_total_shots() {
        let mut session = BoothConfig::default().session;
        session.num_x = 2;
        session.num_y = 2;
        session.skip_last = true;
        assert_eq!(session.total_shots(), 3);

        session.num_x = 1;
        session.num_y = 1;
        assert_eq!(session.total_shots(), 1);
    }

    #[test]
    fn test_initial_state() {
        let mut session = BoothConfig::default().session;
        assert_eq!(session.initial_state(false), State::Welcome);
        assert_eq!(session.initial_state(true), State::Startup);

        session.start_at_welcome = false;
        assert_eq!(session.initial_state(false), State::Startup);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booth.toml");
        fs::write(
            &path,
            r#"
[camera]
preview = false
resolution = [320, 240]

[session]
num_x = 1
num_y = 3
countdown_time = 3

[storage]
basedir = "/srv/booth"
naming = "random"
keep_shots = true
"#,
        )
        .unwrap();

        let config = BoothConfig::load_from_file(&path).unwrap();
        assert!(!config.camera.preview);
        assert_eq!(config.camera.resolution, (320, 240));
        assert_eq!(config.camera.preview_fps, default_camera_preview_fps());
        assert_eq!(config.session.total_shots(), 3);
        assert_eq!(config.session.countdown_time, 3);
        assert_eq!(config.storage.basedir, "/srv/booth");
        assert_eq!(config.storage.naming, NamingScheme::Random);
        assert!(config.storage.keep_shots);
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BoothConfig::load_from_file(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.session.num_x, default_num_x());
        assert_eq!(config.storage.basename, default_basename());
    }

    #[test]
    fn test_environment_variable_override() {
        let dir = tempfile::tempdir().unwrap();
        env::set_var("PHOTOBOOTH_GPIO__LAMP_PIN", "21");

        let config = BoothConfig::load_from_file(dir.path().join("absent.toml"));

        env::remove_var("PHOTOBOOTH_GPIO__LAMP_PIN");
        assert_eq!(config.unwrap().gpio.lamp_pin, 21);
    }

    #[test]
    fn test_config_validation() {
        let mut config = BoothConfig::default();

        config.session.num_y = 0;
        assert!(config.validate().is_err());
        config.session.num_y = 1;

        config.camera.preview_fps = 0;
        assert!(config.validate().is_err());
        config.camera.preview_fps = 5;

        config.storage.basename = "  ".to_string();
        assert!(config.validate().is_err());
        config.storage.basename = "booth".to_string();

        config.session.countdown_time = 0;
        assert!(config.validate().is_err());
        config.session.countdown_time = 1;

        assert!(config.validate().is_ok());
    }
}
