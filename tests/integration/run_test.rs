use anyhow::{Result, anyhow};
use std::fs;

use cfssl_newcert_lib::{
    RunOptions,
    ca::{CaConfig, IssueError},
    csr::ValidationError,
    inspect::summarize_certificate,
    run,
};

use super::ca_stub::{CaStub, issued_material, sample_document, success_body, temp_dir};

fn write_csr(dir: &std::path::Path, document: &serde_json::Value) -> Result<std::path::PathBuf> {
    let path = dir.join("csr.json");
    fs::write(&path, serde_json::to_string_pretty(document)?)?;
    Ok(path)
}

#[test]
fn run_persists_artifacts_verbatim() -> Result<()> {
    let (csr_pem, cert_pem, key_pem) = issued_material("example.com")?;
    let stub = CaStub::respond(200, &success_body(&csr_pem, &cert_pem, &key_pem))?;
    let dir = temp_dir("run")?;
    let csr_path = write_csr(&dir, &sample_document())?;

    let written = run(&RunOptions::new(&csr_path, stub.config()).output_dir(&dir))?;

    assert_eq!(written.certificate_request, dir.join("example.com.csr"));
    assert_eq!(written.certificate, dir.join("example.com.pem"));
    assert_eq!(written.private_key, dir.join("example.com-key.pem"));
    assert_eq!(fs::read_to_string(&written.certificate_request)?, csr_pem);
    assert_eq!(fs::read_to_string(&written.certificate)?, cert_pem);
    assert_eq!(fs::read_to_string(&written.private_key)?, key_pem);

    let summary = summarize_certificate(&fs::read_to_string(&written.certificate)?)?;
    assert!(summary.subject.contains("example.com"));
    assert!(summary.issuer.contains("Stub Root CA"));

    let blocks = pem::parse_many(fs::read_to_string(&written.private_key)?)?;
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].tag(), "PRIVATE KEY");
    Ok(())
}

#[test]
fn run_accepts_opaque_artifacts() -> Result<()> {
    let stub = CaStub::respond(200, &success_body("CSRDATA", " CERTDATA\n", "KEYDATA\n\n"))?;
    let dir = temp_dir("opaque")?;
    let csr_path = write_csr(&dir, &sample_document())?;

    let written = run(&RunOptions::new(&csr_path, stub.config()).output_dir(&dir))?;

    assert_eq!(fs::read_to_string(&written.certificate_request)?, "CSRDATA");
    assert_eq!(fs::read_to_string(&written.certificate)?, " CERTDATA\n");
    assert_eq!(fs::read_to_string(&written.private_key)?, "KEYDATA\n\n");
    Ok(())
}

#[test]
fn invalid_document_never_reaches_ca() -> Result<()> {
    let stub = CaStub::respond(200, &success_body("a", "b", "c"))?;
    let config = stub.config();
    let dir = temp_dir("invalid")?;
    let mut document = sample_document();
    document
        .as_object_mut()
        .ok_or_else(|| anyhow!("sample is an object"))?
        .remove("hosts");
    let csr_path = write_csr(&dir, &document)?;

    let err = run(&RunOptions::new(&csr_path, config).output_dir(&dir))
        .expect_err("missing hosts");
    let validation = err
        .downcast_ref::<ValidationError>()
        .ok_or_else(|| anyhow!("expected validation error, got {err:#}"))?;
    assert_eq!(validation.first().path, "hosts");
    assert!(!dir.join("example.com.pem").exists());

    // The stub is still waiting for its first connection.
    let probe = std::net::TcpStream::connect(("127.0.0.1", stub.config().port));
    assert!(probe.is_ok());
    drop(probe);
    Ok(())
}

#[test]
fn service_failure_writes_nothing() -> Result<()> {
    let stub = CaStub::respond(500, "internal error")?;
    let dir = temp_dir("service")?;
    let csr_path = write_csr(&dir, &sample_document())?;

    let err = run(&RunOptions::new(&csr_path, stub.config()).output_dir(&dir))
        .expect_err("500");
    assert!(matches!(
        err.downcast_ref::<IssueError>(),
        Some(IssueError::Service {
            status: Some(500),
            ..
        })
    ));
    for name in ["example.com.csr", "example.com.pem", "example.com-key.pem"] {
        assert!(!dir.join(name).exists(), "{name} should not exist");
    }
    Ok(())
}

#[test]
fn missing_csr_file_reports_path() -> Result<()> {
    let dir = temp_dir("missing")?;
    let csr_path = dir.join("absent.json");

    let err = run(&RunOptions::new(&csr_path, CaConfig::default()).output_dir(&dir))
        .expect_err("no file");
    assert!(format!("{err:#}").contains("absent.json"));
    assert!(err.downcast_ref::<ValidationError>().is_none());
    Ok(())
}
