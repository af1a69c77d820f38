use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::{
    fs,
    io::{BufRead, BufReader, Read, Write},
    net::{TcpListener, TcpStream},
    path::PathBuf,
    thread::{self, JoinHandle},
    time::Duration,
};

use cfssl_newcert_lib::ca::CaConfig;

/// What the stub CA saw on the wire.
pub struct CapturedRequest {
    pub request_line: String,
    pub content_type: Option<String>,
    pub body: Value,
}

/// A one-shot CA on 127.0.0.1 that answers the first request with a
/// canned status and body.
pub struct CaStub {
    port: u16,
    handle: Option<JoinHandle<Result<CapturedRequest>>>,
}

impl CaStub {
    pub fn respond(status: u16, body: &str) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").context("bind stub CA")?;
        let port = listener.local_addr()?.port();
        let body = body.to_string();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().context("accept")?;
            serve_once(stream, status, &body)
        });
        Ok(Self {
            port,
            handle: Some(handle),
        })
    }

    pub fn config(&self) -> CaConfig {
        CaConfig::new("127.0.0.1")
            .with_port(self.port)
            .with_timeout(Duration::from_secs(5))
    }

    /// Waits for the stub thread and returns the request it received.
    pub fn captured(mut self) -> Result<CapturedRequest> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| anyhow!("stub already joined"))?;
        handle
            .join()
            .map_err(|_| anyhow!("stub CA thread panicked"))?
    }
}

fn serve_once(stream: TcpStream, status: u16, body: &str) -> Result<CapturedRequest> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let mut content_length = 0usize;
    let mut content_type = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse()?;
            } else if name.eq_ignore_ascii_case("content-type") {
                content_type = Some(value.to_string());
            }
        }
    }

    let mut raw = vec![0u8; content_length];
    reader.read_exact(&mut raw)?;

    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )?;
    stream.flush()?;

    Ok(CapturedRequest {
        request_line: request_line.trim_end().to_string(),
        content_type,
        body: serde_json::from_slice(&raw).context("request body is not JSON")?,
    })
}

/// A port on 127.0.0.1 with nothing listening on it.
pub fn unreachable_config() -> Result<CaConfig> {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?.port()
    };
    Ok(CaConfig::new("127.0.0.1")
        .with_port(port)
        .with_timeout(Duration::from_secs(2)))
}

pub fn success_body(csr: &str, cert: &str, key: &str) -> String {
    serde_json::json!({
        "success": true,
        "result": {
            "certificate_request": csr,
            "certificate": cert,
            "private_key": key,
            "sums": {}
        },
        "errors": [],
        "messages": []
    })
    .to_string()
}

pub fn sample_document() -> Value {
    serde_json::json!({
        "CN": "example.com",
        "key": {"algo": "rsa", "size": 2048},
        "names": [{"C": "US", "O": "Example"}],
        "hosts": ["example.com", "www.example.com"]
    })
}

pub fn temp_dir(label: &str) -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!(
        "cfssl-newcert-{}-{}",
        label,
        uuid::Uuid::new_v4()
    ));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// A CA-signed leaf certificate for `cn`, returned as (csr, cert, key) PEMs.
pub fn issued_material(cn: &str) -> Result<(String, String, String)> {
    use rcgen::{
        BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    };

    let mut ca_params = CertificateParams::new(Vec::<String>::new())?;
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let mut ca_dn = DistinguishedName::new();
    ca_dn.push(DnType::CommonName, "Stub Root CA");
    ca_params.distinguished_name = ca_dn;
    let ca_key = KeyPair::generate()?;
    let ca = ca_params.self_signed(&ca_key)?;

    let mut leaf_params = CertificateParams::new(vec![cn.to_string()])?;
    let mut leaf_dn = DistinguishedName::new();
    leaf_dn.push(DnType::CommonName, cn);
    leaf_params.distinguished_name = leaf_dn;
    let leaf_key = KeyPair::generate()?;
    let csr = leaf_params.serialize_request(&leaf_key)?.pem()?;
    let leaf = leaf_params.signed_by(&leaf_key, &ca, &ca_key)?;

    Ok((csr, leaf.pem(), leaf_key.serialize_pem()))
}
