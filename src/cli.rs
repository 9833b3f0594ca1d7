use std::path::PathBuf;

use crate::config::{DEFAULT_BASELINE_FILE, DEFAULT_THRESHOLD};

#[derive(Clone, Debug, PartialEq)]
pub enum CliCommand {
    List,
    Show { name: String },
    Check { name: String, elapsed: f64 },
    Reset,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommandLineConfig {
    pub file: PathBuf,
    pub threshold: f64,
    pub command: CliCommand,
}

impl CommandLineConfig {
    /// `args[0]` is the program name. `default_file` applies when `--file`
    /// is absent.
    pub fn from_args(args: &[&str], default_file: Option<&str>) -> Result<Self, String> {
        let mut file = PathBuf::from(default_file.unwrap_or(DEFAULT_BASELINE_FILE));
        let mut threshold = DEFAULT_THRESHOLD;
        let mut positional = Vec::new();
        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            match *arg {
                "--file" | "-f" => {
                    file = PathBuf::from(
                        iter.next()
                            .ok_or_else(|| "--file requires a value".to_string())?,
                    );
                }
                "--threshold" | "-t" => {
                    let raw = iter
                        .next()
                        .ok_or_else(|| "--threshold requires a value".to_string())?;
                    threshold = raw
                        .parse()
                        .map_err(|_| format!("invalid threshold {raw}"))?;
                }
                other if other.starts_with('-') => {
                    return Err(format!("unknown flag {other}"));
                }
                _ => positional.push(*arg),
            }
        }
        let command = parse_command(&positional)?;
        Ok(Self {
            file,
            threshold,
            command,
        })
    }

    pub fn help() -> &'static str {
        "Usage: perf-baseline [--file PATH] [--threshold RATIO] [list | show NAME | check NAME SECONDS | reset]\n"
    }
}

fn parse_command(positional: &[&str]) -> Result<CliCommand, String> {
    match positional {
        [] | ["list"] => Ok(CliCommand::List),
        ["show", name] => Ok(CliCommand::Show {
            name: name.to_string(),
        }),
        ["check", name, seconds] => {
            let elapsed = seconds
                .parse()
                .map_err(|_| format!("invalid seconds {seconds}"))?;
            Ok(CliCommand::Check {
                name: name.to_string(),
                elapsed,
            })
        }
        ["reset"] => Ok(CliCommand::Reset),
        [other, ..] => Err(format!("unknown or incomplete command {other}")),
    }
}
