//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

/// pifan fan control daemon
#[derive(Debug, Parser)]
#[command(name = "pifand", version, about)]
pub struct Cli {
    /// Configuration file (default: /etc/pifan/config.json)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the built-in configuration as JSON and exit
    #[arg(long)]
    pub print_default_config: bool,

    /// Do not read the tachometer even if the configuration enables it
    #[arg(long)]
    pub no_tach: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["pifand"]);
        assert!(cli.config.is_none());
        assert!(!cli.print_default_config);
        assert!(!cli.no_tach);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["pifand", "-c", "/tmp/fan.json", "--no-tach"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/fan.json")));
        assert!(cli.no_tach);
    }

    #[test]
    fn test_command_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
