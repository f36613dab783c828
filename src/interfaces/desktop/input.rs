use std::path::PathBuf;

use crate::application::use_cases::session::Command;
use crate::domain::session::{LoginMode, ViewState};

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Commands(Vec<Command>),
    /// Write the type chart of the current upload to an SVG file
    ExportChart(PathBuf),
    Help,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "\
Commands:
  login <username> <password>
  register <username> <password> <confirm>
  upload <path>       analyze a CSV file
  history             refresh recent uploads
  report              open the PDF report of the current upload
  chart <path.svg>    save the type distribution chart
  logout
  quit";

fn switch_to(view: &ViewState, mode: LoginMode) -> Option<Command> {
    (view.mode != mode).then_some(Command::ToggleMode)
}

/// Parses one line typed at the prompt against the current snapshot.
pub fn parse_input(line: &str, view: &ViewState) -> Input {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let args: Vec<&str> = rest.split_whitespace().collect();

    match word.to_ascii_lowercase().as_str() {
        "" => Input::Commands(Vec::new()),
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        "login" => {
            let mut commands: Vec<Command> = switch_to(view, LoginMode::Login).into_iter().collect();
            commands.push(Command::Submit {
                username: args.first().unwrap_or(&"").to_string(),
                password: args.get(1).unwrap_or(&"").to_string(),
                confirm: None,
            });
            Input::Commands(commands)
        }
        "register" => {
            let mut commands: Vec<Command> =
                switch_to(view, LoginMode::Register).into_iter().collect();
            commands.push(Command::Submit {
                username: args.first().unwrap_or(&"").to_string(),
                password: args.get(1).unwrap_or(&"").to_string(),
                confirm: Some(args.get(2).unwrap_or(&"").to_string()),
            });
            Input::Commands(commands)
        }
        "upload" => {
            let path = rest.trim().trim_matches('"');
            if path.is_empty() {
                Input::Invalid("Usage: upload <path>".to_string())
            } else {
                Input::Commands(vec![Command::Upload {
                    path: PathBuf::from(path),
                }])
            }
        }
        "chart" => {
            let path = rest.trim().trim_matches('"');
            if path.is_empty() {
                Input::Invalid("Usage: chart <path.svg>".to_string())
            } else {
                Input::ExportChart(PathBuf::from(path))
            }
        }
        "history" => Input::Commands(vec![Command::RefreshHistory]),
        "report" => Input::Commands(vec![Command::DownloadReport]),
        "logout" => Input::Commands(vec![Command::Logout]),
        other => Input::Invalid(format!("Unknown command: {} (try `help`)", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_switches_mode_first() {
        let view = ViewState::default();
        match parse_input("register bob pw pw", &view) {
            Input::Commands(commands) => {
                assert_eq!(commands[0], Command::ToggleMode);
                assert_eq!(
                    commands[1],
                    Command::Submit {
                        username: "bob".to_string(),
                        password: "pw".to_string(),
                        confirm: Some("pw".to_string()),
                    }
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_login_in_login_mode_submits_only() {
        let view = ViewState::default();
        assert_eq!(
            parse_input("login alice secret", &view),
            Input::Commands(vec![Command::Submit {
                username: "alice".to_string(),
                password: "secret".to_string(),
                confirm: None,
            }])
        );
    }

    #[test]
    fn test_upload_keeps_path_with_spaces() {
        let view = ViewState::default();
        assert_eq!(
            parse_input("upload \"/tmp/my data.csv\"", &view),
            Input::Commands(vec![Command::Upload {
                path: PathBuf::from("/tmp/my data.csv"),
            }])
        );
        assert!(matches!(parse_input("upload", &view), Input::Invalid(_)));
    }

    #[test]
    fn test_chart_takes_output_path() {
        let view = ViewState::default();
        assert_eq!(
            parse_input("chart out/types.svg", &view),
            Input::ExportChart(PathBuf::from("out/types.svg"))
        );
        assert!(matches!(parse_input("chart", &view), Input::Invalid(_)));
    }

    #[test]
    fn test_unknown_and_quit() {
        let view = ViewState::default();
        assert_eq!(parse_input("exit", &view), Input::Quit);
        assert!(matches!(parse_input("dance", &view), Input::Invalid(_)));
    }
}
