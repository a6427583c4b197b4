//! Turn parsed arguments into a validated [`Request`]

use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use clap::error::{ContextKind, ContextValue, ErrorKind};

use crate::cli::args::Commands;
use crate::core::validation::{validate_package_name, validate_version};
use crate::core::{Outcome, PackageRef, PluginError, Result, UpdateAction, UpdateKind};

/// One validated plugin invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Install(PackageRef),
    Remove {
        name: String,
        version: Option<String>,
    },
    List,
    Prepare,
    Finalize,
    UpdateList(Vec<UpdateAction>),
}

impl Request {
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Remove { .. } => "remove",
            Self::List => "list",
            Self::Prepare => "prepare",
            Self::Finalize => "finalize",
            Self::UpdateList(_) => "update-list",
        }
    }

    /// Check names and versions against Debian's syntax; an update list may
    /// name each package once
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Install(package) => check_name_and_version(&package.name, package.version.as_deref()),
            Self::Remove { name, version } => check_name_and_version(name, version.as_deref()),
            Self::UpdateList(actions) => {
                let mut seen = BTreeSet::new();
                actions.iter().try_for_each(|action| {
                    check_name_and_version(&action.name, action.version.as_deref())?;
                    if !seen.insert(action.name.as_str()) {
                        return Err(PluginError::InvalidInput(format!(
                            "package '{}' appears more than once",
                            action.name
                        )));
                    }
                    Ok(())
                })
            }
            Self::List | Self::Prepare | Self::Finalize => Ok(()),
        }
    }
}

fn check_name_and_version(name: &str, version: Option<&str>) -> Result<()> {
    validate_package_name(name)?;
    version.map_or(Ok(()), validate_version)
}

/// Build the request for a parsed command.
///
/// `stdin` is only read by `update-list`.
pub fn build_request(command: Commands, stdin: impl BufRead) -> Result<Request> {
    match command {
        Commands::Install {
            module,
            module_version,
            file,
        } => {
            let name = required_name(module)?;
            match file {
                Some(file) => Ok(Request::Install(PackageRef::local_file(
                    name,
                    module_version,
                    absolute_file(&file)?,
                ))),
                None => Ok(Request::Install(PackageRef::repository(name, module_version))),
            }
        }
        Commands::Remove {
            module,
            module_version,
        } => Ok(Request::Remove {
            name: required_name(module)?,
            version: module_version,
        }),
        Commands::List => Ok(Request::List),
        Commands::Prepare => Ok(Request::Prepare),
        Commands::Finalize => Ok(Request::Finalize),
        Commands::UpdateList => Ok(Request::UpdateList(parse_update_list(stdin)?)),
    }
}

fn required_name(module: Option<String>) -> Result<String> {
    module
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| PluginError::InvalidInput("missing package name".to_string()))
}

/// Resolve `--file` against the working directory; existence is not checked
fn absolute_file(file: &str) -> Result<PathBuf> {
    if file.trim().is_empty() {
        return Err(PluginError::InvalidInput("empty file path".to_string()));
    }
    std::path::absolute(Path::new(file))
        .map_err(|err| PluginError::InvalidInput(format!("invalid file path '{file}': {err}")))
}

/// Parse the `update-list` action list.
///
/// Any malformed line rejects the whole list.
pub fn parse_update_list(input: impl BufRead) -> Result<Vec<UpdateAction>> {
    let mut actions = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line = line.map_err(|err| PluginError::Internal(format!("failed to read stdin: {err}")))?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let lineno = index + 1;
        let invalid = |reason: String| PluginError::InvalidInput(format!("line {lineno}: {reason}"));
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let optional = |position: usize| {
            fields
                .get(position)
                .filter(|value| !value.is_empty())
                .map(|value| (*value).to_string())
        };

        let (kind, max_fields) = match fields[0] {
            "install" => (UpdateKind::Install, 4),
            "remove" => (UpdateKind::Remove, 3),
            other => return Err(invalid(format!("unknown action '{other}'"))),
        };
        if fields.len() > max_fields {
            return Err(invalid(format!("too many fields for {kind}")));
        }

        let name = optional(1).ok_or_else(|| invalid("missing package name".to_string()))?;
        let file = match optional(3) {
            Some(file) => Some(absolute_file(&file).map_err(|err| invalid(err.to_string()))?),
            None => None,
        };

        actions.push(UpdateAction {
            kind,
            name,
            version: optional(2),
            file,
        });
    }

    Ok(actions)
}

/// Outcome of an argument-parsing failure.
///
/// `None` for `--help` and `--version`, which clap prints and which succeed.
pub fn parse_error_outcome(err: &clap::Error) -> Option<Outcome> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
        ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand | ErrorKind::MissingSubcommand => {
            Some(Outcome::InvalidInput("missing verb".to_string()))
        }
        ErrorKind::InvalidSubcommand => {
            let verb = match err.get(ContextKind::InvalidSubcommand) {
                Some(ContextValue::String(verb)) => format!(" '{verb}'"),
                _ => String::new(),
            };
            Some(Outcome::InvalidInput(format!("unknown verb{verb}")))
        }
        _ => {
            let rendered = err.to_string();
            let first_line = rendered.lines().next().unwrap_or_default();
            Some(Outcome::InvalidInput(
                first_line.trim_start_matches("error: ").to_string(),
            ))
        }
    }
}
