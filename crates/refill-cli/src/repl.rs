//! REPL – interactive command shell for a running refill service.
//!
//! Every line is either a shell command or something forwarded to the
//! service's command surface:
//!
//!   help          – show this list
//!   status        – print the loop state and completed cycle count
//!   quit | exit   – close the service and exit
//!   {"start": {}} – a JSON object is forwarded as-is
//!   <word>        – forwarded as `{"<word>": {}}` (e.g. `start`, `stop`)

use colored::Colorize;
use refill_runtime::RefillService;
use serde_json::{Map, Value};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Help,
    Status,
    Quit,
    Command(Map<String, Value>),
}

/// Parse a non-empty, trimmed line.
pub fn parse_line(line: &str) -> Result<Input, String> {
    match line {
        "help" => Ok(Input::Help),
        "status" => Ok(Input::Status),
        "quit" | "exit" => Ok(Input::Quit),
        json if json.starts_with('{') => serde_json::from_str::<Map<String, Value>>(json)
            .map(Input::Command)
            .map_err(|e| format!("invalid command object: {e}")),
        word => {
            let mut request = Map::new();
            request.insert(word.to_string(), Value::Object(Map::new()));
            Ok(Input::Command(request))
        }
    }
}

/// Read commands from stdin until EOF, `quit`, or `shutdown` fires.
pub async fn run(service: &RefillService, mut shutdown: watch::Receiver<bool>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", "refill>".bold().cyan());
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = shutdown.wait_for(|stop| *stop) => {
                println!();
                println!("{}", "⚠  Ctrl-C received – shutting down …".yellow().bold());
                break;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break, // EOF
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok(Input::Help) => cmd_help(),
            Ok(Input::Status) => cmd_status(service),
            Ok(Input::Quit) => {
                println!("{}", "Goodbye.".green());
                break;
            }
            Ok(Input::Command(request)) => {
                let reply = service.do_command(&request);
                for (name, performed) in &reply {
                    if performed.as_bool() == Some(true) {
                        println!("  {} {}", "✓".green().bold(), name.bold());
                    } else {
                        println!("  {} {} (unrecognised)", "✗".red().bold(), name.yellow());
                    }
                }
            }
            Err(e) => println!("{}: {}", "Error".red(), e),
        }
    }
}

fn cmd_help() {
    println!();
    println!("{}", "Refill Commands".bold().underline());
    println!("  {}        – start the refill loop", "start".bold().cyan());
    println!("  {}         – stop the refill loop", "stop".bold().cyan());
    println!("  {}       – show loop state", "status".bold().cyan());
    println!("  {}    – send a raw command object", "{...}".bold().cyan());
    println!("  {}  – exit", "quit  exit".bold().cyan());
    println!();
}

fn cmd_status(service: &RefillService) {
    println!("  State  : {}", format!("{:?}", service.state()).yellow());
    if let Some(controller) = service.controller() {
        println!("  Cycles : {}", controller.cycles_completed());
        println!("  Devices: {:?}", controller.devices());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shell_words() {
        assert_eq!(parse_line("help"), Ok(Input::Help));
        assert_eq!(parse_line("status"), Ok(Input::Status));
        assert_eq!(parse_line("quit"), Ok(Input::Quit));
        assert_eq!(parse_line("exit"), Ok(Input::Quit));
    }

    #[test]
    fn bare_word_becomes_command() {
        let Ok(Input::Command(request)) = parse_line("start") else {
            panic!("expected a command");
        };
        assert_eq!(Value::Object(request), json!({"start": {}}));
    }

    #[test]
    fn json_object_is_forwarded() {
        let Ok(Input::Command(request)) = parse_line(r#"{"start": {}, "foo": {}}"#) else {
            panic!("expected a command");
        };
        assert_eq!(request.len(), 2);
        assert!(request.contains_key("foo"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(parse_line("{start").is_err());
    }
}
