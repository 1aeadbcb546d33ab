//! Utility module for command line interfaces

use std::{error::Error, fmt, fmt::Display, str::FromStr};

/// An error struct to wrap simple static error messages
#[derive(Debug, PartialEq, Eq)]
pub struct CliErr(pub &'static str);

impl Display for CliErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Error for CliErr {}

/// The next positional argument or `CliErr(missing)`.
pub fn next_arg<I: Iterator<Item = String>>(args: &mut I, missing: &'static str) -> Result<String, CliErr> {
    args.next().ok_or(CliErr(missing))
}

/// Parse the next positional argument if there is one.
pub fn parse_arg_or<T: FromStr, I: Iterator<Item = String>>(args: &mut I, default: T, invalid: &'static str) -> Result<T, CliErr> {
    match args.next() {
        Some(arg) => arg.parse().map_err(|_| CliErr(invalid)),
        None => Ok(default),
    }
}
