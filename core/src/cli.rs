use std::path::PathBuf;

use anyhow::{Result, anyhow};

const USAGE: &str = "usage: portgate [--config <path>] [--list-evaluators]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub config_path: PathBuf,
    /// Print the evaluators found on the configured search path and exit.
    pub list_evaluators: bool,
}

pub fn options_from_args() -> Result<CliOptions> {
    parse_options(std::env::args().skip(1))
}

fn parse_options(args: impl IntoIterator<Item = String>) -> Result<CliOptions> {
    let mut args = args.into_iter();
    let mut config_path = None;
    let mut list_evaluators = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --config"))?;
                config_path = Some(PathBuf::from(value));
            }
            "--list-evaluators" => list_evaluators = true,
            other => return Err(anyhow!("unknown argument: {other}. {USAGE}")),
        }
    }

    Ok(CliOptions {
        config_path: config_path.unwrap_or_else(|| PathBuf::from("./portgate.jsonc")),
        list_evaluators,
    })
}
