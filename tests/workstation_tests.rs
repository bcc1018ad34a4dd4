#[cfg(test)]
mod tests {
    use company_warrior::system::{command_line, CommandOutput, CommandRunner, OPEN_PROGRAM};
    use company_warrior::workstation::{TunnelState, Workstation};
    use company_warrior::{LastOctet, Printer, Profile, WarriorError};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;

    // Fake host: records every command and answers from a table
    #[derive(Default)]
    struct RecordingRunner {
        responses: HashMap<String, (i32, String)>,
        missing: Vec<String>,
        calls: RefCell<Vec<String>>,
        launched: RefCell<Vec<String>>,
    }

    impl RecordingRunner {
        fn respond(mut self, command: &str, code: i32, stdout: &str) -> Self {
            self.responses
                .insert(command.to_string(), (code, stdout.to_string()));
            self
        }

        fn without_program(mut self, program: &str) -> Self {
            self.missing.push(program.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
            let command = command_line(program, args);
            self.calls.borrow_mut().push(command.clone());

            if self.missing.iter().any(|p| p == program) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "not installed"));
            }

            let (code, stdout) = self
                .responses
                .get(&command)
                .cloned()
                .unwrap_or((0, String::new()));
            Ok(CommandOutput {
                command,
                status: Some(code),
                stdout,
                stderr: String::new(),
            })
        }

        fn launch(&self, program: &str, args: &[&str]) -> io::Result<()> {
            if self.missing.iter().any(|p| p == program) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "not installed"));
            }
            self.launched.borrow_mut().push(command_line(program, args));
            Ok(())
        }
    }

    const WG_SHOW: &str = "\
interface: wg0
  public key: AAAA
  listening port: 51820

interface: wg1
  public key: BBBB
";

    fn printer() -> Printer {
        Printer {
            queue: "OfficeJet".to_string(),
            driver: "hp.ppd".to_string(),
            media: "A4".to_string(),
            connection_string: "hp:/net/Printer?ip=xxx.xxx.xxx.xxx".to_string(),
        }
    }

    fn hotspot_runner() -> RecordingRunner {
        RecordingRunner::default().respond(
            "nmcli con show Pixel",
            0,
            "GENERAL.STATE: activated\nIP4.ADDRESS[1]:    192.168.1.17/24\n",
        )
    }

    #[test]
    fn test_connection_only_profile() {
        let runner = RecordingRunner::default();
        let profile = Profile {
            nmcli_connection_name: Some("Home".to_string()),
            ..Profile::default()
        };

        Workstation::new(&runner).apply(&profile).unwrap();

        // No printer, no tunnel transitions, nothing launched
        assert_eq!(runner.calls(), vec!["nmcli con up Home", "sudo wg show"]);
        assert!(runner.launched.borrow().is_empty());
    }

    #[test]
    fn test_connection_failure_stops_run() {
        let runner = RecordingRunner::default().respond("nmcli con up Pixel", 10, "");
        let profile = Profile {
            nmcli_connection_name: Some("Pixel".to_string()),
            printer: Some(printer()),
            wireguard_config: Some("wg0".to_string()),
            launch: vec!["firefox".to_string()],
            ..Profile::default()
        };

        let err = Workstation::new(&runner).apply(&profile).unwrap_err();

        assert!(matches!(err, WarriorError::CommandFailed { code: 10, .. }));
        assert_eq!(err.exit_code(), 10);
        assert_eq!(runner.calls(), vec!["nmcli con up Pixel"]);
        assert!(runner.launched.borrow().is_empty());
    }

    #[test]
    fn test_setup_printer_with_hotspot_octet() {
        let runner = hotspot_runner();
        let octet = LastOctet::Text("42".to_string());

        Workstation::new(&runner)
            .setup_printer(&printer(), Some(&octet), Some("Pixel"))
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                "nmcli con show Pixel",
                "lpadmin -x OfficeJet",
                "lpadmin -p OfficeJet -E -v hp:/net/Printer?ip=192.168.1.42 -m hp.ppd -o media=A4",
                "lpoptions -d OfficeJet",
            ]
        );
    }

    #[test]
    fn test_setup_printer_without_octet_keeps_uri() {
        let runner = hotspot_runner();

        Workstation::new(&runner)
            .setup_printer(&printer(), Some(&LastOctet::Number(0)), Some("Pixel"))
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0], "nmcli con show Pixel");
        assert_eq!(
            calls[2],
            "lpadmin -p OfficeJet -E -v hp:/net/Printer?ip=xxx.xxx.xxx.xxx -m hp.ppd -o media=A4"
        );
    }

    #[test]
    fn test_setup_printer_tolerates_optional_failures() {
        let runner = hotspot_runner()
            .respond("lpadmin -x OfficeJet", 1, "")
            .respond("lpoptions -d OfficeJet", 1, "");

        let result = Workstation::new(&runner).setup_printer(&printer(), None, Some("Pixel"));

        assert!(result.is_ok());
        assert_eq!(runner.calls().len(), 4);
    }

    #[test]
    fn test_setup_printer_add_failure_is_fatal() {
        let runner = hotspot_runner().respond(
            "lpadmin -p OfficeJet -E -v hp:/net/Printer?ip=192.168.1.93 -m hp.ppd -o media=A4",
            5,
            "",
        );
        let profile = Profile {
            printer: Some(printer()),
            nmcli_connection_name: Some("Pixel".to_string()),
            printer_ip_last_octet_android_hotspot: Some(LastOctet::Number(93)),
            wireguard_config: Some("wg0".to_string()),
            ..Profile::default()
        };

        let err = Workstation::new(&runner).apply(&profile).unwrap_err();

        assert_eq!(err.exit_code(), 5);
        // lpoptions and the tunnel steps never ran
        assert_eq!(runner.calls().len(), 4);
        assert!(!runner.calls().iter().any(|c| c.starts_with("sudo")));
    }

    #[test]
    fn test_address_not_found() {
        let runner = RecordingRunner::default().respond("nmcli con show Pixel", 10, "");

        let err = Workstation::new(&runner)
            .resolve_address("Pixel")
            .unwrap_err();

        assert!(matches!(err, WarriorError::AddressNotFound(ref name) if name == "Pixel"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_printer_needs_connection() {
        let runner = RecordingRunner::default();

        let err = Workstation::new(&runner)
            .setup_printer(&printer(), None, None)
            .unwrap_err();

        assert!(matches!(err, WarriorError::MissingConnection));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_tunnels_are_replaced_in_order() {
        let runner = RecordingRunner::default().respond("sudo wg show", 0, WG_SHOW);
        let profile = Profile {
            wireguard_config: Some("office".to_string()),
            launch: vec!["thunderbird".to_string(), "https://example.com".to_string()],
            ..Profile::default()
        };

        Workstation::new(&runner).apply(&profile).unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                "sudo wg show",
                "sudo wg-quick down wg0",
                "sudo wg-quick down wg1",
                "sudo wg-quick up office",
            ]
        );
        assert_eq!(
            *runner.launched.borrow(),
            vec![
                format!("{OPEN_PROGRAM} thunderbird"),
                format!("{OPEN_PROGRAM} https://example.com"),
            ]
        );
    }

    #[test]
    fn test_tunnel_down_failure_is_fatal() {
        let runner = RecordingRunner::default()
            .respond("sudo wg show", 0, WG_SHOW)
            .respond("sudo wg-quick down wg0", 1, "");
        let profile = Profile {
            wireguard_config: Some("office".to_string()),
            ..Profile::default()
        };

        let err = Workstation::new(&runner).apply(&profile).unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert_eq!(runner.calls(), vec!["sudo wg show", "sudo wg-quick down wg0"]);
    }

    #[test]
    fn test_set_tunnel_state_command() {
        let runner = RecordingRunner::default();
        let workstation = Workstation::new(&runner);

        workstation.set_tunnel_state("wg0", TunnelState::Up).unwrap();
        workstation.set_tunnel_state("wg0", TunnelState::Down).unwrap();

        assert_eq!(
            runner.calls(),
            vec!["sudo wg-quick up wg0", "sudo wg-quick down wg0"]
        );
        assert_eq!(TunnelState::Down.to_string(), "down");
    }

    #[test]
    fn test_wg_show_failure_is_not_fatal() {
        let runner = RecordingRunner::default().respond("sudo wg show", 1, "");

        let tunnels = Workstation::new(&runner).active_tunnels().unwrap();

        assert!(tunnels.is_empty());
    }

    #[test]
    fn test_missing_program_is_fatal() {
        let runner = RecordingRunner::default().without_program("nmcli");
        let profile = Profile {
            nmcli_connection_name: Some("Pixel".to_string()),
            ..Profile::default()
        };

        let err = Workstation::new(&runner).apply(&profile).unwrap_err();

        assert!(matches!(err, WarriorError::Spawn { ref program, .. } if program == "nmcli"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_launch_failures_are_ignored() {
        let runner = RecordingRunner::default().without_program(OPEN_PROGRAM);
        let profile = Profile {
            launch: vec!["firefox".to_string()],
            ..Profile::default()
        };

        assert!(Workstation::new(&runner).apply(&profile).is_ok());
        assert!(runner.launched.borrow().is_empty());
    }
}
