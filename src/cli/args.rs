//! Command-line argument definitions using clap derive macros.

use clap::{ArgAction, Parser, Subcommand};

/// apt-plugin - software-management plugin for Debian packages
///
/// Installs, removes and lists Debian packages on behalf of a device
/// management agent. The exit code is the result.
#[derive(Parser, Debug)]
#[command(name = "apt-plugin")]
#[command(version)]
#[command(about = "Software-management plugin for Debian packages (apt)", long_about = None)]
pub struct Cli {
    /// Increase log verbosity; repeat for more (`-v` is the module version)
    #[arg(long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Install a package from the repositories or from a local .deb file
    #[command(disable_version_flag = true)]
    Install {
        /// Package name
        module: Option<String>,
        /// Version to install
        #[arg(
            short = 'v',
            long = "version",
            visible_alias = "module-version",
            value_name = "VERSION"
        )]
        module_version: Option<String>,
        /// Path of a local .deb artifact
        #[arg(long = "file", value_name = "PATH")]
        file: Option<String>,
    },

    /// Remove a package
    #[command(disable_version_flag = true)]
    Remove {
        /// Package name
        module: Option<String>,
        /// Only remove this installed version
        #[arg(
            short = 'v',
            long = "version",
            visible_alias = "module-version",
            value_name = "VERSION"
        )]
        module_version: Option<String>,
    },

    /// List installed packages as JSON lines
    List,

    /// Refresh the package index before a sequence of operations
    Prepare,

    /// Remove packages that are no longer needed after a sequence of operations
    Finalize,

    /// Apply installs and removals read from stdin in one transaction
    ///
    /// One action per line, tab-separated:
    /// `install<TAB>name<TAB>version<TAB>file` or `remove<TAB>name<TAB>version`.
    #[command(name = "update-list")]
    UpdateList,
}

impl Commands {
    /// The verb as typed on the command line
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Install { .. } => "install",
            Self::Remove { .. } => "remove",
            Self::List => "list",
            Self::Prepare => "prepare",
            Self::Finalize => "finalize",
            Self::UpdateList => "update-list",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_install_flags() {
        let cli = Cli::try_parse_from([
            "apt-plugin",
            "install",
            "rolldice",
            "--file",
            "notafile.deb",
            "--module-version",
            "1.16-1+b3",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::Install {
                module: Some("rolldice".to_string()),
                module_version: Some("1.16-1+b3".to_string()),
                file: Some("notafile.deb".to_string()),
            }
        );
    }

    #[test]
    fn test_short_v_is_module_version() {
        let cli = Cli::try_parse_from(["apt-plugin", "install", "rolldice", "-v", "1.16-1+b3"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Install {
                module: Some("rolldice".to_string()),
                module_version: Some("1.16-1+b3".to_string()),
                file: None,
            }
        );
        assert_eq!(cli.verbose, 0);

        let cli = Cli::try_parse_from(["apt-plugin", "remove", "vim", "-v", "9.1"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Remove {
                module: Some("vim".to_string()),
                module_version: Some("9.1".to_string()),
            }
        );
    }

    #[test]
    fn test_verbosity_is_global() {
        let cli = Cli::try_parse_from(["apt-plugin", "list", "--verbose", "--verbose"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.command.verb(), "list");

        let cli = Cli::try_parse_from(["apt-plugin", "--verbose", "install", "vim", "-v", "9.1"]).unwrap();
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_update_list_is_kebab_case() {
        let cli = Cli::try_parse_from(["apt-plugin", "update-list"]).unwrap();
        assert_eq!(cli.command, Commands::UpdateList);
    }

    #[test]
    fn test_unknown_verb_is_rejected() {
        let err = Cli::try_parse_from(["apt-plugin", "upgrade"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
    }
}
