use std::process::ExitCode;
use std::{env, fs};

use psil::{Interpreter, Options};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: psil [--no-memo] [--max-depth N] <path>";

#[derive(Debug, PartialEq)]
struct Config {
    path: String,
    options: Options,
}

impl Config {
    fn from_args(args: impl IntoIterator<Item = String>) -> Result<Config, String> {
        let mut options = Options::default();
        let mut path = None;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--no-memo" => options.memoize = false,
                "--max-depth" => {
                    let value = args.next().ok_or("--max-depth needs a value")?;
                    options.max_depth = value
                        .parse()
                        .map_err(|_| format!("invalid depth '{}'", value))?;
                }
                flag if flag.starts_with("--") => return Err(format!("unknown flag '{}'", flag)),
                _ if path.is_some() => return Err("only one program path is accepted".to_string()),
                _ => path = Some(arg),
            }
        }
        let path = path.ok_or("missing program path")?;
        Ok(Config { path, options })
    }
}

fn run(config: Config) -> ExitCode {
    let source = match fs::read_to_string(&config.path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Could not read '{}': {}", config.path, err);
            return ExitCode::FAILURE;
        }
    };

    let mut interpreter = Interpreter::with_options(config.options);
    match interpreter.run_source(&source) {
        Ok(value) => {
            println!("{}", value);
            println!("profiler - times called: {}", interpreter.profile().count);
            ExitCode::SUCCESS
        }
        Err(err) => {
            if err.pretty_print(&config.path, &source).is_err() {
                eprintln!("Error: {}", err);
            }
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("PSIL_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_args(env::args().skip(1)) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}\n{}", message, USAGE);
            return ExitCode::from(2);
        }
    };

    run(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_path_only() {
        let config = Config::from_args(args(&["prog.psil"])).unwrap();
        assert_eq!(config.path, "prog.psil");
        assert_eq!(config.options, Options::default());
    }

    #[test]
    fn test_flags() {
        let config =
            Config::from_args(args(&["--no-memo", "--max-depth", "64", "prog.psil"])).unwrap();
        assert!(!config.options.memoize);
        assert_eq!(config.options.max_depth, 64);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(Config::from_args(args(&[])).is_err());
        assert!(Config::from_args(args(&["--max-depth"])).is_err());
        assert!(Config::from_args(args(&["--max-depth", "lots", "p"])).is_err());
        assert!(Config::from_args(args(&["--verbose", "p"])).is_err());
        assert!(Config::from_args(args(&["a", "b"])).is_err());
    }
}
