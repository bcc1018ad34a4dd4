use std::fmt;
use tracing::{debug, error, info, warn};

use crate::error::{Result, WarriorError};
use crate::system::{self, CommandOutput, CommandRunner, OPEN_PROGRAM};
use crate::{find_ipv4_address, parse_active_interfaces, printer_address};
use crate::{LastOctet, Printer, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelState {
    Up,
    Down,
}

impl TunnelState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for TunnelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Workstation drives the host tools for one run
pub struct Workstation<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> Workstation<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Apply a profile: connection, printer, wireguard, then launch targets.
    ///
    /// Stops at the first fatal failure; nothing already changed on the host
    /// is rolled back.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error of any step.
    pub fn apply(&self, profile: &Profile) -> Result<()> {
        let connection = profile.nmcli_connection_name.as_deref();

        if let Some(name) = connection {
            self.connect(name)?;
        }

        if let Some(printer) = &profile.printer {
            self.setup_printer(
                printer,
                profile.printer_ip_last_octet_android_hotspot.as_ref(),
                connection,
            )?;
        }

        for interface in self.active_tunnels()? {
            self.set_tunnel_state(&interface, TunnelState::Down)?;
        }
        if let Some(config) = &profile.wireguard_config {
            self.set_tunnel_state(config, TunnelState::Up)?;
        }

        self.launch_all(&profile.launch);
        Ok(())
    }

    /// Bring a NetworkManager connection up (`nmcli con up <name>`).
    ///
    /// # Errors
    ///
    /// Fails if nmcli cannot be started or exits non-zero.
    pub fn connect(&self, name: &str) -> Result<()> {
        self.run_required(
            "nmcli",
            &["con", "up", name],
            "unable to connect to hotspot. Enable the hotspot and try again.",
        )
        .map(|_| ())
    }

    /// Current IPv4 address of a connection, from `nmcli con show <name>`.
    ///
    /// # Errors
    ///
    /// Fails with [`WarriorError::AddressNotFound`] if the output has no
    /// `IP4.ADDRESS` line.
    pub fn resolve_address(&self, name: &str) -> Result<String> {
        let output = system::run(&self.runner, "nmcli", &["con", "show", name])?;
        if !output.success() {
            debug!("{output}");
        }

        find_ipv4_address(&output.stdout)
            .map(str::to_string)
            .ok_or_else(|| WarriorError::AddressNotFound(name.to_string()))
    }

    /// Recreate a CUPS queue on the hotspot's current subnet and make it the default.
    ///
    /// # Errors
    ///
    /// Fails if the address cannot be resolved or `lpadmin -p` fails.
    /// Removing the old queue and setting the default are best effort.
    pub fn setup_printer(
        &self,
        printer: &Printer,
        last_octet: Option<&LastOctet>,
        connection: Option<&str>,
    ) -> Result<()> {
        let connection = connection.ok_or(WarriorError::MissingConnection)?;
        let resolved = self.resolve_address(connection)?;
        debug!("connection {connection} has address {resolved}");

        let printer_ip = last_octet
            .filter(|octet| octet.is_set())
            .map(|octet| printer_address(&resolved, octet));
        if let Some(ip) = &printer_ip {
            info!("printer ip address = {ip}");
        }
        let uri = printer.device_uri(printer_ip.as_deref());

        // The queue may not exist yet
        self.run_optional("lpadmin", &["-x", &printer.queue])?;

        let media = format!("media={}", printer.media);
        self.run_required(
            "lpadmin",
            &[
                "-p",
                &printer.queue,
                "-E",
                "-v",
                &uri,
                "-m",
                &printer.driver,
                "-o",
                &media,
            ],
            "unable to add the printer queue",
        )?;

        self.run_optional("lpoptions", &["-d", &printer.queue])?;
        Ok(())
    }

    /// Names of the active WireGuard interfaces, from `sudo wg show`.
    ///
    /// # Errors
    ///
    /// Fails only if sudo cannot be started.
    pub fn active_tunnels(&self) -> Result<Vec<String>> {
        let output = system::run(&self.runner, "sudo", &["wg", "show"])?;
        if !output.success() {
            warn!("{output}");
        }
        Ok(parse_active_interfaces(&output.stdout))
    }

    /// Run `sudo wg-quick <up|down> <config>`.
    ///
    /// # Errors
    ///
    /// Any failure is fatal for the run.
    pub fn set_tunnel_state(&self, config: &str, state: TunnelState) -> Result<()> {
        info!("bringing wireguard {config} {state}");
        self.run_required(
            "sudo",
            &["wg-quick", state.as_str(), config],
            "make sure you are allowed to run wg-quick with sudo and without password",
        )
        .map(|_| ())
    }

    // Open every target with the desktop's default handler, best effort
    pub fn launch_all(&self, targets: &[String]) {
        for target in targets {
            match self.runner.launch(OPEN_PROGRAM, &[target.as_str()]) {
                Ok(()) => info!("launched {target}"),
                Err(e) => warn!("failed to launch {target}: {e}"),
            }
        }
    }

    // A failed exit status aborts the run
    fn run_required(&self, program: &str, args: &[&str], hint: &str) -> Result<CommandOutput> {
        let output = system::run(&self.runner, program, args)?;
        if output.success() {
            info!("{output}");
            Ok(output)
        } else {
            error!("{output}");
            error!("{hint}");
            Err(output.failure())
        }
    }

    // A failed exit status is logged and ignored
    fn run_optional(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = system::run(&self.runner, program, args)?;
        if output.success() {
            info!("{output}");
        } else {
            error!("{output}");
        }
        Ok(output)
    }
}
