use serde::{Deserialize, Serialize};

/// User settings from `ProtonTrace Settings.yaml`.
///
/// Every field has a default so the tool runs without a settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "Capture_Settings")]
    pub capture: CaptureSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Override for the Steam library manifest. Empty means
    /// `~/.steam/root/steamapps/libraryfolders.vdf`.
    #[serde(rename = "Library VDF", default)]
    pub library_vdf: String,

    #[serde(rename = "Apitrace Win32 Dir", default = "default_apitrace_win32")]
    pub apitrace_win32_dir: String,

    #[serde(rename = "Apitrace Win64 Dir", default = "default_apitrace_win64")]
    pub apitrace_win64_dir: String,

    #[serde(rename = "GfxReconstruct Dir", default = "default_gfxrecon")]
    pub gfxrecon_dir: String,

    #[serde(rename = "Trace Output Dir", default = "default_output_dir")]
    pub trace_output_dir: String,

    /// Seconds to wait after launching Steam before polling. Steam briefly
    /// spawns a transient helper process that would confuse the polls.
    #[serde(rename = "Launch Settle Secs", default = "default_launch_settle")]
    pub launch_settle_secs: u64,

    /// Seconds to wait after killing Steam before touching its state.
    #[serde(rename = "Kill Settle Secs", default = "default_kill_settle")]
    pub kill_settle_secs: u64,

    #[serde(rename = "Poll Interval Secs", default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(rename = "Repack Program", default = "default_repack_program")]
    pub repack_program: String,

    #[serde(rename = "Repack Brotli Quality", default = "default_brotli_quality")]
    pub repack_brotli_quality: u32,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            library_vdf: String::new(),
            apitrace_win32_dir: default_apitrace_win32(),
            apitrace_win64_dir: default_apitrace_win64(),
            gfxrecon_dir: default_gfxrecon(),
            trace_output_dir: default_output_dir(),
            launch_settle_secs: default_launch_settle(),
            kill_settle_secs: default_kill_settle(),
            poll_interval_secs: default_poll_interval(),
            repack_program: default_repack_program(),
            repack_brotli_quality: default_brotli_quality(),
            debug_mode: false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capture: CaptureSettings::default(),
        }
    }
}

fn default_apitrace_win32() -> String {
    "apitrace-win32".to_string()
}

fn default_apitrace_win64() -> String {
    "apitrace-win64".to_string()
}

fn default_gfxrecon() -> String {
    "gfxreconstruct".to_string()
}

fn default_output_dir() -> String {
    "traces".to_string()
}

fn default_launch_settle() -> u64 {
    15
}

fn default_kill_settle() -> u64 {
    5
}

fn default_poll_interval() -> u64 {
    1
}

fn default_repack_program() -> String {
    "apitrace".to_string()
}

fn default_brotli_quality() -> u32 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_settings_defaults() {
        let settings = CaptureSettings::default();
        assert_eq!(settings.apitrace_win64_dir, "apitrace-win64");
        assert_eq!(settings.gfxrecon_dir, "gfxreconstruct");
        assert_eq!(settings.trace_output_dir, "traces");
        assert_eq!(settings.launch_settle_secs, 15);
        assert_eq!(settings.kill_settle_secs, 5);
        assert_eq!(settings.poll_interval_secs, 1);
        assert_eq!(settings.repack_brotli_quality, 2);
        assert!(settings.library_vdf.is_empty());
        assert!(!settings.debug_mode);
    }

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.capture.repack_program, "apitrace");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
Capture_Settings:
  Trace Output Dir: "captures"
"#;
        let settings: Settings = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(settings.capture.trace_output_dir, "captures");
        assert_eq!(settings.capture.launch_settle_secs, 15);
        assert_eq!(settings.capture.apitrace_win32_dir, "apitrace-win32");
    }
}
