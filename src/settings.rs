use crate::CONFY_APP_NAME;

use serde::{Deserialize, Serialize};

/// Frame loop of the headless driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    pub fps: f32,
    pub frames: u32,
    pub log_interval: u32, // Frames between state summaries, 0 disables them
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            fps: 60.0,
            frames: 1200,
            log_interval: 60,
        }
    }
}

impl DriverSettings {
    pub fn load() -> Self {
        confy::load(CONFY_APP_NAME, "driver").unwrap_or_else(|e| {
            log::warn!("driver settings unreadable, using defaults: {e}");
            Self::default()
        })
    }

    pub fn save(&self) {
        if let Err(e) = confy::store(CONFY_APP_NAME, "driver", self) {
            log::warn!("could not store driver settings: {e}");
        }
    }

    /// Seconds per frame; non-positive rates fall back to the default
    pub fn frame_time(&self) -> f32 {
        if self.fps.is_finite() && self.fps > 0.0 {
            1.0 / self.fps
        } else {
            1.0 / Self::default().fps
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dump_world_transforms: bool,
    pub dump_pretty: bool,
}

impl OutputSettings {
    pub fn load() -> Self {
        confy::load(CONFY_APP_NAME, "output").unwrap_or_default()
    }

    pub fn save(&self) {
        let _ = confy::store(CONFY_APP_NAME, "output", self);
    }
}

// Aggregate struct for convenience
pub struct Settings {
    pub driver: DriverSettings,
    pub output: OutputSettings,
}

impl Settings {
    pub fn load() -> Self {
        Self {
            driver: DriverSettings::load(),
            output: OutputSettings::load(),
        }
    }

    pub fn save(&self) {
        self.driver.save();
        self.output.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_time_guards_bad_rates() {
        let mut s = DriverSettings::default();
        assert_eq!(s.frame_time(), 1.0 / 60.0);
        s.fps = 0.0;
        assert_eq!(s.frame_time(), 1.0 / 60.0);
        s.fps = 30.0;
        assert_eq!(s.frame_time(), 1.0 / 30.0);
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let s: DriverSettings = serde_json::from_str(r#"{ "frames": 10 }"#).unwrap();
        assert_eq!(s.frames, 10);
        assert_eq!(s.fps, DriverSettings::default().fps);
    }
}
