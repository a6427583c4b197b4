//! Test fixtures and builders for common test scenarios

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::Path;

/// Compression of the control member of a generated `.deb`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControlCompression {
    #[default]
    Gzip,
    Xz,
    None,
}

/// Builder for small but well-formed `.deb` artifacts
#[derive(Debug, Clone)]
pub struct DebFixture {
    name: String,
    version: String,
    architecture: String,
    format_version: String,
    compression: ControlCompression,
    include_control: bool,
}

impl DebFixture {
    /// Create a new artifact builder
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            architecture: "amd64".to_string(),
            format_version: "2.0".to_string(),
            compression: ControlCompression::default(),
            include_control: true,
        }
    }

    /// Set the architecture
    #[must_use]
    pub fn architecture(mut self, architecture: impl Into<String>) -> Self {
        self.architecture = architecture.into();
        self
    }

    /// Set the content of the `debian-binary` member
    #[must_use]
    pub fn format_version(mut self, format_version: impl Into<String>) -> Self {
        self.format_version = format_version.into();
        self
    }

    /// Set the compression of `control.tar`
    #[must_use]
    pub fn compression(mut self, compression: ControlCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Leave out the control member entirely
    #[must_use]
    pub fn without_control(mut self) -> Self {
        self.include_control = false;
        self
    }

    /// The `control` file written into the artifact
    pub fn control_text(&self) -> String {
        format!(
            "Package: {}\nVersion: {}\nArchitecture: {}\nMaintainer: Test <test@example.com>\nDescription: test package\n",
            self.name, self.version, self.architecture
        )
    }

    /// Write the artifact to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create fixture: {}", path.display()))?;
        let mut builder = ar::Builder::new(file);

        let format = format!("{}\n", self.format_version);
        append_member(&mut builder, "debian-binary", format.as_bytes())?;

        if self.include_control {
            let control = tar_with_file("./control", self.control_text().as_bytes())?;
            let (member, bytes) = match self.compression {
                ControlCompression::Gzip => ("control.tar.gz", gzip(&control)?),
                ControlCompression::Xz => ("control.tar.xz", xz(&control)?),
                ControlCompression::None => ("control.tar", control),
            };
            append_member(&mut builder, member, &bytes)?;
        }

        let data = gzip(&tar_with_file("./usr/share/doc/placeholder", b"")?)?;
        append_member(&mut builder, "data.tar.gz", &data)?;
        Ok(())
    }
}

fn append_member<W: Write>(builder: &mut ar::Builder<W>, name: &str, bytes: &[u8]) -> Result<()> {
    let header = ar::Header::new(name.as_bytes().to_vec(), bytes.len() as u64);
    builder
        .append(&header, bytes)
        .with_context(|| format!("Failed to append ar member {name}"))
}

fn tar_with_file(path: &str, content: &[u8]) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    builder.append_data(&mut header, path, content)?;
    Ok(builder.into_inner()?)
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

fn xz(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    lzma_rs::xz_compress(&mut Cursor::new(bytes), &mut output)?;
    Ok(output)
}

/// Builder for a dpkg status database (and apt's extended_states)
#[derive(Debug, Clone, Default)]
pub struct StatusFixture {
    packages: Vec<(String, String, String, bool)>,
}

impl StatusFixture {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an installed, manually selected package
    #[must_use]
    pub fn installed(self, name: &str, version: &str) -> Self {
        self.with_status(name, version, "install ok installed", false)
    }

    /// Add an installed package that apt marked as automatic
    #[must_use]
    pub fn auto_installed(self, name: &str, version: &str) -> Self {
        self.with_status(name, version, "install ok installed", true)
    }

    /// Add a package with an arbitrary `Status` field
    #[must_use]
    pub fn with_status(mut self, name: &str, version: &str, status: &str, auto: bool) -> Self {
        self.packages
            .push((name.to_string(), version.to_string(), status.to_string(), auto));
        self
    }

    /// Content of the status file
    pub fn status_text(&self) -> String {
        let mut out = String::new();
        for (name, version, status, _) in &self.packages {
            let _ = write!(
                out,
                "Package: {name}\nStatus: {status}\nArchitecture: amd64\nVersion: {version}\nDescription: {name}\n\n"
            );
        }
        out
    }

    /// Content of the extended_states file
    pub fn extended_states_text(&self) -> String {
        let mut out = String::new();
        for (name, _, _, _) in self.packages.iter().filter(|(_, _, _, auto)| *auto) {
            let _ = write!(out, "Package: {name}\nArchitecture: amd64\nAuto-Installed: 1\n\n");
        }
        out
    }

    /// Write `status` and `extended_states` into `dir`
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join("status"), self.status_text())?;
        fs::write(dir.join("extended_states"), self.extended_states_text())?;
        Ok(())
    }
}
