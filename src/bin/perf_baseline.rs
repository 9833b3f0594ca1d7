use std::{env, process};

use perf_baseline::{
    BaselineOutcome, BaselineStore, PerfBaselineError,
    cli::{CliCommand, CommandLineConfig},
    config::ENV_FILE,
    logging,
};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{}", CommandLineConfig::help());
        return;
    }
    let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    let default_file = env::var(ENV_FILE).ok();
    let config = match CommandLineConfig::from_args(&arg_refs, default_file.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };
    if let Err(err) = logging::init(logging::DEFAULT_FILTER) {
        eprintln!("warning: {err}");
    }

    let store = match BaselineStore::open_with_threshold(config.file.clone(), config.threshold) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };
    match run_command(&store, &config.command) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err @ PerfBaselineError::Regression(_)) => {
            eprintln!("regression: {err}");
            process::exit(1);
        }
        Err(err) => {
            eprintln!("command failed: {err}");
            process::exit(2);
        }
    }
}

fn run_command(store: &BaselineStore, command: &CliCommand) -> Result<bool, PerfBaselineError> {
    match command {
        CliCommand::List => {
            for (name, record) in store.records()? {
                println!("{name}\t{:.9}\t{}", record.elapsed, record.created_at);
            }
            Ok(true)
        }
        CliCommand::Show { name } => match store.get(name)? {
            Some(record) => {
                println!("{}", serde_json::to_string_pretty(&record)?);
                Ok(true)
            }
            None => {
                eprintln!("no baseline named {name}");
                Ok(false)
            }
        },
        CliCommand::Check { name, elapsed } => {
            match store.record_or_compare_elapsed(name, *elapsed)? {
                BaselineOutcome::Recorded(record) => {
                    println!("recorded {name} elapsed={:.9}", record.elapsed);
                }
                BaselineOutcome::Compared(comparison) => {
                    println!("ok {}", comparison.summary());
                }
            }
            Ok(true)
        }
        CliCommand::Reset => {
            store.reset()?;
            println!("removed {}", store.path().display());
            Ok(true)
        }
    }
}
