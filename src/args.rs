//! Command-line argument parsing and processing.
//!
//! This module handles parsing of command-line arguments and provides a clean
//! interface for the main application logic. It supports the standard help,
//! version, and debug flags plus the `times` and `simulate` subcommands, and
//! falls back to the help screen on anything it does not recognize.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon with these settings
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_file: Option<String>,
    },
    /// Print one day's prayer times and exit
    Times {
        date: Option<String>,
        config_dir: Option<String>,
    },
    /// Run the daemon loop against a fast-forward clock
    Simulate {
        debug_enabled: bool,
        start_time: String,
        end_time: String,
        config_dir: Option<String>,
        log_file: Option<String>,
    },
    /// Help for one command, or the general help
    HelpCommand { command: Option<String> },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped. Flags may appear
    /// before or after the subcommand; `--help` and `--version` win over
    /// everything else.
    ///
    /// # Arguments
    /// * `args` - Iterator over command-line arguments (typically from std::env::args())
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut positionals: Vec<String> = Vec::new();

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = args_vec[i].as_str();
            match arg {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--config" | "-c" => {
                    if let Some(dir) = args_vec.get(i + 1) {
                        config_dir = Some(dir.clone());
                        i += 1;
                    } else {
                        log_warning!("Missing directory for --config");
                        unknown_arg_found = true;
                    }
                }
                "--log" | "-l" => {
                    if let Some(path) = args_vec.get(i + 1) {
                        log_file = Some(path.clone());
                        i += 1;
                    } else {
                        log_warning!("Missing file path for --log");
                        unknown_arg_found = true;
                    }
                }
                _ if arg.starts_with('-') => {
                    log_warning!("Unknown argument: {arg}");
                    unknown_arg_found = true;
                }
                _ => positionals.push(arg.to_string()),
            }
            i += 1;
        }

        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if display_help {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }
        if unknown_arg_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let action = match positionals.split_first() {
            None => CliAction::Run {
                debug_enabled,
                config_dir,
                log_file,
            },
            Some((command, rest)) => match (command.as_str(), rest) {
                ("help" | "h", []) => CliAction::HelpCommand { command: None },
                ("help" | "h", [topic]) => CliAction::HelpCommand {
                    command: Some(topic.clone()),
                },
                ("times" | "t", []) => CliAction::Times {
                    date: None,
                    config_dir,
                },
                ("times" | "t", [date]) => CliAction::Times {
                    date: Some(date.clone()),
                    config_dir,
                },
                ("simulate" | "S", [start, end]) => CliAction::Simulate {
                    debug_enabled,
                    start_time: start.clone(),
                    end_time: end.clone(),
                    config_dir,
                    log_file,
                },
                ("simulate" | "S", _) => {
                    log_warning!(
                        "Usage: adhanr simulate \"YYYY-MM-DD HH:MM:SS\" \"YYYY-MM-DD HH:MM:SS\""
                    );
                    CliAction::ShowHelpDueToError
                }
                ("times" | "t", _) => {
                    log_warning!("Usage: adhanr times [YYYY-MM-DD]");
                    CliAction::ShowHelpDueToError
                }
                (other, _) => {
                    log_warning!("Unknown command: {other}");
                    CliAction::ShowHelpDueToError
                }
            },
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("adhanr [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-l, --log <file>       Write output to a file instead of stdout");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("times, t [date]        Print the prayer times for a day (default today)");
    log_indented!("simulate, S <start> <end>");
    log_indented!("                       Run the scheduler on a fast-forward clock");
    log_indented!("                       Times use \"YYYY-MM-DD HH:MM:SS\"");
    log_indented!("help, h [command]      Print help for a command");
    log_block_start!("Signals:");
    log_indented!("SIGUSR2                Reload configuration and refetch now");
    log_indented!("SIGINT, SIGTERM        Stop playback and exit");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["adhanr"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
                log_file: None,
            }
        );
    }

    #[test]
    fn test_parse_debug_flag() {
        for flag in ["--debug", "-d"] {
            let parsed = ParsedArgs::parse(vec!["adhanr", flag]);
            assert_eq!(
                parsed.action,
                CliAction::Run {
                    debug_enabled: true,
                    config_dir: None,
                    log_file: None,
                }
            );
        }
    }

    #[test]
    fn test_parse_config_and_log() {
        let parsed = ParsedArgs::parse(vec![
            "adhanr",
            "--config",
            "/tmp/adhanr",
            "-l",
            "/tmp/adhanr.log",
        ]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: false,
                config_dir: Some("/tmp/adhanr".to_string()),
                log_file: Some("/tmp/adhanr.log".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_missing_config_value() {
        let parsed = ParsedArgs::parse(vec!["adhanr", "--config"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_help_flags() {
        for flag in ["--help", "-h"] {
            assert_eq!(
                ParsedArgs::parse(vec!["adhanr", flag]).action,
                CliAction::ShowHelp
            );
        }
        assert_eq!(
            ParsedArgs::parse(vec!["adhanr", "help"]).action,
            CliAction::HelpCommand { command: None }
        );
        assert_eq!(
            ParsedArgs::parse(vec!["adhanr", "help", "times"]).action,
            CliAction::HelpCommand {
                command: Some("times".to_string())
            }
        );
    }

    #[test]
    fn test_parse_version_flags() {
        for flag in ["--version", "-V", "-v"] {
            assert_eq!(
                ParsedArgs::parse(vec!["adhanr", flag]).action,
                CliAction::ShowVersion
            );
        }
    }

    #[test]
    fn test_version_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["adhanr", "--help", "--version", "--bogus"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
    }

    #[test]
    fn test_parse_unknown_flag() {
        let parsed = ParsedArgs::parse(vec!["adhanr", "--unknown"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_unknown_command() {
        let parsed = ParsedArgs::parse(vec!["adhanr", "qibla"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_times_command() {
        assert_eq!(
            ParsedArgs::parse(vec!["adhanr", "times"]).action,
            CliAction::Times {
                date: None,
                config_dir: None,
            }
        );
        assert_eq!(
            ParsedArgs::parse(vec!["adhanr", "-c", "/etc/adhanr", "t", "2026-10-16"]).action,
            CliAction::Times {
                date: Some("2026-10-16".to_string()),
                config_dir: Some("/etc/adhanr".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_times_too_many_arguments() {
        let parsed = ParsedArgs::parse(vec!["adhanr", "times", "2026-10-16", "extra"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_simulate_command() {
        let parsed = ParsedArgs::parse(vec![
            "adhanr",
            "simulate",
            "2026-10-16 04:00:00",
            "2026-10-17 06:00:00",
            "--debug",
        ]);
        assert_eq!(
            parsed.action,
            CliAction::Simulate {
                debug_enabled: true,
                start_time: "2026-10-16 04:00:00".to_string(),
                end_time: "2026-10-17 06:00:00".to_string(),
                config_dir: None,
                log_file: None,
            }
        );
    }

    #[test]
    fn test_parse_simulate_missing_end() {
        let parsed = ParsedArgs::parse(vec!["adhanr", "S", "2026-10-16 04:00:00"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }
}
