use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use company_warrior::system::SystemRunner;
use company_warrior::workstation::Workstation;
use company_warrior::{
    default_config_path, ConfigFile, LastOctet, Printer, Profile, WarriorError,
    ROADWARRIOR_SECTION,
};

// CLI arguments parsing structure
#[derive(Parser)]
#[command(author, version, about, long_about = None, disable_help_subcommand = true)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "debug")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up your mobile office behind an Android hotspot.
    ///
    /// Android changes the hotspot subnet on every reboot of the phone. This
    /// connects to the hotspot, moves the mobile printer to the new subnet,
    /// establishes the wireguard VPN and launches your apps. Defaults are read
    /// from the "roadwarrior" section of the config file.
    ///
    /// Requires cups, wireguard (wg-quick, runnable with sudo without a
    /// password) and nmcli.
    Roadwarrior(RoadwarriorArgs),
    /// Apply a named profile from the config file
    Profile {
        /// Profile name (a top-level key of the config file)
        profile: String,

        /// Read the profile from this config file
        #[arg(short, long, value_name = "CONFIG_FILE", default_value_os_t = default_config_path())]
        config: PathBuf,
    },
    /// Welcome to the office
    Office,
}

#[derive(Args)]
pub struct RoadwarriorArgs {
    /// Read default options from this config file
    #[arg(short, long, value_name = "CONFIG_FILE", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Connection name, to list available connections use "nmcli con show"
    #[arg(short, long, value_name = "NAME")]
    pub nmcli_connection_name: Option<String>,

    /// Printer queue to (re)create
    #[arg(
        short,
        long,
        num_args = 4,
        value_names = ["PRINTER_QUEUE", "PRINTER_DRIVER", "PRINTER_PAPER", "PRINTER_CONNECTION_STRING"]
    )]
    pub printer: Option<Vec<String>>,

    /// Wireguard config name. For /etc/wireguard/wg0.conf pass "wg0"
    #[arg(short, long, value_name = "WIREGUARD_CONFIG")]
    pub wireguard_config: Option<String>,

    /// Launch an app or URI (repeatable)
    #[arg(short, long)]
    pub launch: Vec<String>,

    /// Last octet of the mobile printer's address on an Android 11+ hotspot.
    /// Write xxx.xxx.xxx.xxx in the connection string instead of the address
    /// and it is replaced with the printer's address on the current subnet
    #[arg(
        short = 'a',
        long = "android-hotspot-mode",
        value_name = "MOBILE_PRINTER_LAST_OCTET"
    )]
    pub printer_ip_last_octet_android_hotspot: Option<String>,
}

impl RoadwarriorArgs {
    // Settings given explicitly on the command line
    fn to_profile(&self) -> Profile {
        Profile {
            nmcli_connection_name: self.nmcli_connection_name.clone(),
            printer: self.printer.as_deref().and_then(Printer::from_parts),
            printer_ip_last_octet_android_hotspot: self
                .printer_ip_last_octet_android_hotspot
                .clone()
                .map(LastOctet::from),
            wireguard_config: self.wireguard_config.clone(),
            launch: self.launch.clone(),
        }
    }
}

// Execute the selected command
pub fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Roadwarrior(args) => cmd_roadwarrior(args),
        Commands::Profile { profile, config } => cmd_profile(profile, config),
        Commands::Office => {
            println!("Welcome to the Office");
            Ok(())
        }
    }
}

fn cmd_roadwarrior(args: &RoadwarriorArgs) -> Result<()> {
    let config = ConfigFile::from_file(&args.config)
        .context("failed to load roadwarrior defaults")?;
    let defaults = config
        .profile(ROADWARRIOR_SECTION)
        .context("failed to load roadwarrior defaults")?;
    debug!("roadwarrior defaults from {}: {defaults:?}", config.path().display());

    let profile = defaults.merge(args.to_profile());
    debug!("effective settings: {profile:?}");

    Workstation::new(SystemRunner)
        .apply(&profile)
        .context("roadwarrior setup failed")
}

fn cmd_profile(name: &str, config_path: &Path) -> Result<()> {
    let config = ConfigFile::from_file(config_path)
        .with_context(|| format!("failed to load profile '{name}'"))?;

    let profile = match config.profile(name) {
        Ok(profile) => profile,
        Err(e @ WarriorError::MissingSection { .. }) => {
            error!("available profiles: {}", config.section_names().join(", "));
            return Err(e).with_context(|| format!("failed to load profile '{name}'"));
        }
        Err(e) => return Err(e).with_context(|| format!("failed to load profile '{name}'")),
    };
    debug!("profile {name}: {profile:?}");

    Workstation::new(SystemRunner)
        .apply(&profile)
        .with_context(|| format!("failed to apply profile '{name}'"))?;
    info!("profile {name} applied");
    Ok(())
}
