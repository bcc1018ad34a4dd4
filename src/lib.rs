use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub mod error;
pub mod system;
pub mod workstation;

pub use error::{exit_status, Result, WarriorError};

// Constants
pub const APP_NAME: &str = "company-warrior";
pub const ROADWARRIOR_SECTION: &str = "roadwarrior";
pub const ADDRESS_PLACEHOLDER: &str = "xxx.xxx.xxx.xxx";

static IP4_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"IP4\.ADDRESS\[[0-9]+\]:\s+([0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3})")
        .expect("IP4.ADDRESS pattern is valid")
});

/// Default location of the JSON config file, `~/.config/company-warrior/config.json` on Linux.
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("config.json")
}

// Print queue description: queue name, driver, media size and device URI
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "(String, String, String, String)")]
pub struct Printer {
    pub queue: String,
    pub driver: String,
    pub media: String,
    pub connection_string: String,
}

impl From<(String, String, String, String)> for Printer {
    fn from((queue, driver, media, connection_string): (String, String, String, String)) -> Self {
        Self {
            queue,
            driver,
            media,
            connection_string,
        }
    }
}

impl Printer {
    // Build from the four positional values of `--printer`
    #[must_use]
    pub fn from_parts(parts: &[String]) -> Option<Self> {
        match parts {
            [queue, driver, media, connection_string] => Some(Self {
                queue: queue.clone(),
                driver: driver.clone(),
                media: media.clone(),
                connection_string: connection_string.clone(),
            }),
            _ => None,
        }
    }

    /// Device URI to register with CUPS.
    ///
    /// When a printer address is given, every `xxx.xxx.xxx.xxx` in the
    /// connection string is replaced by it; otherwise the string is used as is.
    #[must_use]
    pub fn device_uri(&self, printer_ip: Option<&str>) -> String {
        match printer_ip {
            Some(ip) => self.connection_string.replace(ADDRESS_PLACEHOLDER, ip),
            None => self.connection_string.clone(),
        }
    }
}

/// Last octet of the printer address on an Android hotspot.
///
/// Also acts as the switch for address substitution: an empty string or a
/// zero disables it.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum LastOctet {
    Number(u64),
    Text(String),
}

impl LastOctet {
    #[must_use]
    pub fn is_set(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0,
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl From<String> for LastOctet {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for LastOctet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// Settings for one run; every key is optional
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    #[serde(default)]
    pub nmcli_connection_name: Option<String>,
    #[serde(default)]
    pub printer: Option<Printer>,
    #[serde(default)]
    pub printer_ip_last_octet_android_hotspot: Option<LastOctet>,
    #[serde(default)]
    pub wireguard_config: Option<String>,
    #[serde(default)]
    pub launch: Vec<String>,
}

impl Profile {
    /// Overlay `overrides` on top of these settings.
    ///
    /// Values present in `overrides` win; a non-empty launch list replaces
    /// the current one entirely.
    #[must_use]
    pub fn merge(self, overrides: Profile) -> Self {
        Self {
            nmcli_connection_name: overrides
                .nmcli_connection_name
                .or(self.nmcli_connection_name),
            printer: overrides.printer.or(self.printer),
            printer_ip_last_octet_android_hotspot: overrides
                .printer_ip_last_octet_android_hotspot
                .or(self.printer_ip_last_octet_android_hotspot),
            wireguard_config: overrides.wireguard_config.or(self.wireguard_config),
            launch: if overrides.launch.is_empty() {
                self.launch
            } else {
                overrides.launch
            },
        }
    }
}

// The JSON config file: a top-level object of named sections
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    sections: Map<String, Value>,
}

impl ConfigFile {
    /// Load the config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path).map_err(|source| WarriorError::ConfigRead {
            path: path.clone(),
            source,
        })?;
        Self::from_str_at(&content, path)
    }

    /// Parse config content that was read from `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a JSON object.
    pub fn from_str_at(content: &str, path: PathBuf) -> Result<Self> {
        let sections: Map<String, Value> = serde_json::from_str(content)
            .map_err(|source| WarriorError::ConfigParse {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, sections })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // Sorted, serde_json keeps object keys in a BTreeMap
    #[must_use]
    pub fn section_names(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }

    /// Look up a named section (a profile, or `roadwarrior`)
    ///
    /// # Errors
    ///
    /// Returns an error if the section is missing or its keys have the wrong types.
    pub fn profile(&self, name: &str) -> Result<Profile> {
        let section = self
            .sections
            .get(name)
            .ok_or_else(|| WarriorError::MissingSection {
                path: self.path.clone(),
                section: name.to_string(),
            })?;

        Profile::deserialize(section).map_err(|source| WarriorError::InvalidSection {
            path: self.path.clone(),
            section: name.to_string(),
            source,
        })
    }
}

// Extract the first `IP4.ADDRESS[n]: a.b.c.d` from `nmcli con show` output
#[must_use]
pub fn find_ipv4_address(output: &str) -> Option<&str> {
    IP4_ADDRESS
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Printer address on the same /24 as `resolved`: its first three octets
/// followed by `last_octet`.
#[must_use]
pub fn printer_address(resolved: &str, last_octet: &LastOctet) -> String {
    let prefix = resolved
        .rsplit_once('.')
        .map_or(resolved, |(network, _)| network);
    format!("{prefix}.{last_octet}")
}

// Interface names from `wg show` output, in output order
#[must_use]
pub fn parse_active_interfaces(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.contains("interface"))
        .map(|line| line.replace("interface: ", ""))
        .collect()
}
