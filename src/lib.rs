//! Client front-end for a CFSSL certificate authority.
//!
//! A CSR descriptor is checked against a fixed schema, submitted to the
//! CA's `newcert` endpoint, and the returned CSR, certificate and private
//! key are written next to each other as `{CN}.csr`, `{CN}.pem` and
//! `{CN}-key.pem`.

pub mod ca;
pub mod csr;
pub mod inspect;
pub mod output;

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{info, warn};

use ca::{CaClient, CaConfig};
use output::{ArtifactOptions, WrittenArtifacts};

pub struct RunOptions {
    pub csr_path: PathBuf,
    pub output_dir: PathBuf,
    pub overwrite: bool,
    pub ca: CaConfig,
}

impl RunOptions {
    pub fn new(csr_path: impl Into<PathBuf>, ca: CaConfig) -> Self {
        Self {
            csr_path: csr_path.into(),
            output_dir: PathBuf::from("."),
            overwrite: true,
            ca,
        }
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }
}

/// Loads and validates the CSR file, requests issuance, and persists the
/// artifacts. Nothing is written unless the CA issued a certificate.
///
/// Errors from validation and issuance keep their concrete types
/// ([`csr::ValidationError`], [`ca::IssueError`]) and can be recovered with
/// `downcast_ref`.
pub fn run(options: &RunOptions) -> Result<WrittenArtifacts> {
    let document = csr::load_document(&options.csr_path)?;
    let descriptor = csr::validate(&document)?;
    info!(
        "[csr] loaded {} for CN={}",
        options.csr_path.display(),
        descriptor.common_name
    );

    let client = CaClient::new(options.ca.clone())?;
    let issued = client.issue(&descriptor)?;

    match inspect::summarize_certificate(&issued.certificate) {
        Ok(summary) => info!(
            "[ca] issued serial={} not_after={} sha256={}",
            summary.serial,
            summary.not_after.to_rfc3339(),
            summary.fingerprint
        ),
        Err(err) => warn!("[ca] could not inspect issued certificate: {err}"),
    }

    output::write_artifacts(
        &issued,
        &descriptor.common_name,
        ArtifactOptions {
            directory: &options.output_dir,
            overwrite: options.overwrite,
        },
    )
}
