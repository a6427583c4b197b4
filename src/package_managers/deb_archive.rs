//! Local `.deb` artifact inspection
//!
//! A `.deb` is an `ar` archive holding `debian-binary` ("2.0"), then
//! `control.tar[.gz|.xz|.zst]`, then `data.tar.*`. Only the control member is
//! decompressed; the payload is never touched. No subprocess spawning.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Component, Path};

use crate::core::{ArtifactInfo, BackendError};
use crate::package_managers::dpkg_status::fields;

/// Upper bound for the control member and the control file it contains
const MAX_CONTROL_SIZE: u64 = 16 * 1024 * 1024;

/// Read the control metadata of a `.deb` file.
///
/// Every failure (missing file, unreadable file, not an ar archive, unknown
/// format version, missing or corrupt control member) is an
/// [`BackendError::InvalidArtifact`].
pub fn inspect(path: &Path) -> Result<ArtifactInfo, BackendError> {
    let invalid = |reason: &dyn std::fmt::Display| BackendError::invalid_artifact(path, reason);

    let file = File::open(path).map_err(|err| invalid(&err))?;
    let metadata = file.metadata().map_err(|err| invalid(&err))?;
    if !metadata.is_file() {
        return Err(invalid(&"not a regular file"));
    }

    let mut archive = ar::Archive::new(BufReader::new(file));
    let mut format_checked = false;

    while let Some(entry) = archive.next_entry() {
        let mut entry = entry.map_err(|err| invalid(&err))?;
        let member = member_name(entry.header().identifier());

        if member == "debian-binary" {
            let mut format = String::new();
            entry
                .by_ref()
                .take(64)
                .read_to_string(&mut format)
                .map_err(|err| invalid(&err))?;
            if !format.trim().starts_with("2.") {
                return Err(invalid(&format!(
                    "unsupported deb format version '{}'",
                    format.trim()
                )));
            }
            format_checked = true;
        } else if member.starts_with("control.tar") {
            if !format_checked {
                return Err(invalid(&"control member precedes debian-binary"));
            }
            if entry.header().size() > MAX_CONTROL_SIZE {
                return Err(invalid(&"control member is too large"));
            }
            let control = read_control_member(&member, &mut entry).map_err(|err| invalid(&err))?;
            return parse_control(&control).map_err(|err| invalid(&err));
        }
    }

    if format_checked {
        Err(invalid(&"no control member"))
    } else {
        Err(invalid(&"empty archive"))
    }
}

/// ar member names may be space padded and GNU ar appends a `/`
fn member_name(identifier: &[u8]) -> String {
    String::from_utf8_lossy(identifier)
        .trim_end()
        .trim_end_matches('/')
        .to_string()
}

fn read_control_member(member: &str, entry: &mut impl Read) -> Result<String, String> {
    let mut compressed = Vec::new();
    entry
        .take(MAX_CONTROL_SIZE)
        .read_to_end(&mut compressed)
        .map_err(|err| format!("failed to read {member}: {err}"))?;

    let tarball: Box<dyn Read> = match member {
        "control.tar" => Box::new(Cursor::new(compressed)),
        "control.tar.gz" => Box::new(flate2::read::GzDecoder::new(Cursor::new(compressed))),
        "control.tar.xz" => {
            let mut output = Vec::new();
            lzma_rs::xz_decompress(&mut BufReader::new(Cursor::new(compressed)), &mut output)
                .map_err(|err| format!("failed to decompress {member}: {err}"))?;
            Box::new(Cursor::new(output))
        }
        "control.tar.zst" => Box::new(
            ruzstd::decoding::StreamingDecoder::new(Cursor::new(compressed))
                .map_err(|err| format!("failed to decompress {member}: {err}"))?,
        ),
        other => return Err(format!("unsupported control member '{other}'")),
    };

    let mut archive = tar::Archive::new(tarball);
    let entries = archive
        .entries()
        .map_err(|err| format!("failed to read {member}: {err}"))?;

    for entry in entries {
        let mut entry = entry.map_err(|err| format!("corrupt {member}: {err}"))?;
        let entry_path = entry
            .path()
            .map_err(|err| format!("corrupt {member}: {err}"))?
            .into_owned();

        // Accept `control` and `./control`, nothing nested or absolute
        let mut components = entry_path
            .components()
            .filter(|component| !matches!(component, Component::CurDir));
        let is_control = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(name)), None) if name == "control"
        );
        if !is_control {
            continue;
        }

        let mut control = String::new();
        entry
            .by_ref()
            .take(MAX_CONTROL_SIZE)
            .read_to_string(&mut control)
            .map_err(|err| format!("failed to read control file: {err}"))?;
        return Ok(control);
    }

    Err(format!("no control file in {member}"))
}

/// Parse the first paragraph of a control file
pub(crate) fn parse_control(control: &str) -> Result<ArtifactInfo, String> {
    let paragraph = control.split("\n\n").next().unwrap_or_default();

    let mut name = None;
    let mut version = None;
    let mut architecture = None;
    for (key, value) in fields(paragraph) {
        match key {
            "Package" => name = Some(value.to_string()),
            "Version" => version = Some(value.to_string()),
            "Architecture" => architecture = Some(value.to_string()),
            _ => {}
        }
    }

    let name = name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "control file has no Package field".to_string())?;
    let version = version
        .filter(|version| !version.is_empty())
        .ok_or_else(|| "control file has no Version field".to_string())?;

    Ok(ArtifactInfo {
        name,
        version,
        architecture,
    })
}
