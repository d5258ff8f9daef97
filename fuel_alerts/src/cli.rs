use thiserror::Error;

pub const USAGE: &str = "usage: fuel_alerts [check | status | serve]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// One scheduled check that posts threshold alerts.
    Check,
    /// Print the full fuel listing to stdout.
    Status,
    /// Answer interactions and run the check on its own schedule.
    Serve,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("unknown argument `{0}`, {USAGE}")]
    Unknown(String),
    #[error("expected at most one argument, {USAGE}")]
    TooMany,
}

impl Command {
    /// Parses everything after the program name.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, CliError> {
        let mut args = args.into_iter();
        let command = match args.next().as_deref() {
            None | Some("check") => Self::Check,
            Some("status") => Self::Status,
            Some("serve") => Self::Serve,
            Some(other) => return Err(CliError::Unknown(other.to_string())),
        };
        if args.next().is_some() {
            return Err(CliError::TooMany);
        }
        Ok(command)
    }
}
