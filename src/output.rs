use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use log::info;

use crate::ca::IssuanceResult;

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

const PUBLIC_MODE: u32 = 0o644;
const SECRET_MODE: u32 = 0o600;

pub struct ArtifactOptions<'a> {
    pub directory: &'a Path,
    pub overwrite: bool,
}

/// Paths of the three files written for one issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifacts {
    pub certificate_request: PathBuf,
    pub certificate: PathBuf,
    pub private_key: PathBuf,
}

impl WrittenArtifacts {
    /// `{CN}.csr`, `{CN}.pem` and `{CN}-key.pem` inside `directory`.
    pub fn planned(directory: &Path, common_name: &str) -> Self {
        Self {
            certificate_request: directory.join(format!("{common_name}.csr")),
            certificate: directory.join(format!("{common_name}.pem")),
            private_key: directory.join(format!("{common_name}-key.pem")),
        }
    }

    pub fn paths(&self) -> [&Path; 3] {
        [
            &self.certificate_request,
            &self.certificate,
            &self.private_key,
        ]
    }
}

/// Writes the issued artifacts verbatim, the private key owner-readable only.
pub fn write_artifacts(
    issued: &IssuanceResult,
    common_name: &str,
    options: ArtifactOptions<'_>,
) -> Result<WrittenArtifacts> {
    validate_file_stem(common_name)?;
    let targets = WrittenArtifacts::planned(options.directory, common_name);

    if !options.overwrite {
        let existing: Vec<String> = targets
            .paths()
            .iter()
            .filter(|path| path.exists())
            .map(|path| path.display().to_string())
            .collect();
        if !existing.is_empty() {
            return Err(anyhow!(
                "refusing to overwrite existing files: {}",
                existing.join(", ")
            ));
        }
    }

    write_file(
        &targets.certificate_request,
        issued.certificate_request.as_bytes(),
        options.overwrite,
        PUBLIC_MODE,
    )?;
    write_file(
        &targets.certificate,
        issued.certificate.as_bytes(),
        options.overwrite,
        PUBLIC_MODE,
    )?;
    write_file(
        &targets.private_key,
        issued.private_key.as_bytes(),
        options.overwrite,
        SECRET_MODE,
    )?;

    info!(
        "[output] wrote {}, {}, {}",
        targets.certificate_request.display(),
        targets.certificate.display(),
        targets.private_key.display()
    );
    Ok(targets)
}

fn validate_file_stem(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow!("common name cannot be used as a file name: it is empty"));
    }
    let has_separator = name
        .chars()
        .any(|c| c == '/' || c == '\\' || std::path::is_separator(c));
    if has_separator || name == "." || name == ".." {
        return Err(anyhow!(
            "common name {name:?} cannot be used as a file name: it must be a single path segment"
        ));
    }
    Ok(())
}

/// Opens `path` and narrows its mode before any byte of `content` lands in
/// it; `OpenOptionsExt::mode` alone only applies to newly created files.
fn write_file(path: &Path, content: &[u8], overwrite: bool, mode: u32) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    #[cfg(unix)]
    options.mode(mode);

    let mut file = options
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    #[cfg(unix)]
    file.set_permissions(fs::Permissions::from_mode(mode))
        .with_context(|| format!("failed to set permissions {:o} on {}", mode, path.display()))?;
    #[cfg(not(unix))]
    let _ = mode;

    file.write_all(content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    file.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}
