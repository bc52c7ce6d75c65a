//! Verbosity flags for the command line,
//! built on the log levels of [`clap_verbosity`] but local to the top-level command,
//! so that they can not be confused with the options of subcommands.
use std::fmt;
use std::marker::PhantomData;

use clap_verbosity::{level_value, ErrorLevel, LogLevel};
use log::LevelFilter;

#[derive(clap::Args, Debug, Clone, Default)]
pub struct Verbosity<L: LogLevel = ErrorLevel> {
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        help = L::verbose_help(),
        long_help = L::verbose_long_help(),
    )]
    verbose: u8,

    #[arg(
        long,
        short = 'q',
        action = clap::ArgAction::Count,
        help = L::quiet_help(),
        long_help = L::quiet_long_help(),
        conflicts_with = "verbose",
    )]
    quiet: u8,

    #[arg(skip)]
    level: PhantomData<L>,
}

impl<L: LogLevel> Verbosity<L> {
    pub fn log_level_filter(&self) -> LevelFilter {
        match self.steps() {
            i16::MIN..=-1 => LevelFilter::Off,
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Number of steps above `Error` (negative when everything is silenced).
    fn steps(&self) -> i16 {
        i16::from(level_value(L::default())) + i16::from(self.verbose) - i16::from(self.quiet)
    }
}

impl<L: LogLevel> fmt::Display for Verbosity<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.log_level_filter().fmt(f)
    }
}
