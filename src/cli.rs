use crate::config::ViewportConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

/// Where submitted frames go when running the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderBackend {
    /// Keep snapshots in process and print them.
    #[default]
    Record,
    /// Hand frames to a worker thread that discards them.
    Thread,
    /// Hand frames to a worker thread driving a headless GPU device.
    Gpu,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub entries: Option<PathBuf>,
    pub frames: Option<u32>,
    pub backend: RenderBackend,
    width: Option<u32>,
    height: Option<u32>,
    realtime: Option<bool>,
    reversed_z: Option<bool>,
}

const USAGE: &str = "--config, --entries, --frames, --backend, --width, --height, --realtime, --reversed-z";

impl CliOptions {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = CliOptions::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Supported flags: {USAGE}.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => options.config = Some(PathBuf::from(value)),
                "entries" => options.entries = Some(PathBuf::from(value)),
                "frames" => {
                    options.frames =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid frame count '{value}'"))?);
                }
                "backend" => options.backend = parse_backend(&value)?,
                "width" => {
                    options.width = Some(value.parse::<u32>().with_context(|| format!("Invalid width '{value}'"))?);
                }
                "height" => {
                    options.height =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid height '{value}'"))?);
                }
                "realtime" => options.realtime = Some(parse_bool_flag("realtime", &value)?),
                "reversed-z" => options.reversed_z = Some(parse_bool_flag("reversed-z", &value)?),
                _ => bail!("Unknown flag '{flag}'. Supported flags: {USAGE}."),
            }
        }
        Ok(options)
    }

    pub fn config_overrides(&self) -> ViewportConfigOverrides {
        ViewportConfigOverrides {
            width: self.width,
            height: self.height,
            realtime: self.realtime,
            reversed_z: self.reversed_z,
        }
    }
}

fn parse_backend(value: &str) -> Result<RenderBackend> {
    match value.to_ascii_lowercase().as_str() {
        "record" => Ok(RenderBackend::Record),
        "thread" => Ok(RenderBackend::Thread),
        "gpu" => Ok(RenderBackend::Gpu),
        other => bail!("Invalid backend '{other}'. Use record, thread or gpu."),
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paths_frames_and_overrides() {
        let args = [
            "probe",
            "--config",
            "viewport.json",
            "--entries",
            "entries.json",
            "--frames",
            "3",
            "--width",
            "640",
            "--realtime",
            "off",
        ];
        let options = CliOptions::parse(args).expect("parse options");
        assert_eq!(options.config, Some(PathBuf::from("viewport.json")));
        assert_eq!(options.entries, Some(PathBuf::from("entries.json")));
        assert_eq!(options.frames, Some(3));
        let overrides = options.config_overrides();
        assert_eq!(overrides.width, Some(640));
        assert_eq!(overrides.realtime, Some(false));
        assert_eq!(overrides.height, None);
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["probe", "--backend", "gpu", "--backend", "thread", "--reversed-z", "on", "--reversed-z", "no"];
        let options = CliOptions::parse(args).expect("parse options");
        assert_eq!(options.backend, RenderBackend::Thread);
        assert_eq!(options.config_overrides().reversed_z, Some(false));
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOptions::parse(["probe", "--frames"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_backends() {
        let err = CliOptions::parse(["probe", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        let err = CliOptions::parse(["probe", "--backend", "vulkan"]).unwrap_err();
        assert!(err.to_string().contains("Invalid backend"));
    }
}
