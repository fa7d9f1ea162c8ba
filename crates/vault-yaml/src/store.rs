//! Vault connection and the secret store interface
//!
//! Secrets are read and written through Vault's logical HTTP API:
//! `GET /v1/<path>` and `POST /v1/<path>`. With a KV v2 engine the
//! fields travel wrapped in a `data` object.

use crate::config::{AuthMode, ConnectionConfig, KvVersion};
use crate::credentials::CredentialProvider;
use crate::error::{Result, VaultYamlError};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use serde_yaml::Mapping;
use std::fs;
use tracing::{debug, warn};

/// Where secrets are written to and read from
pub trait SecretStore {
    /// Replace the fields stored at `path`
    fn write(&self, path: &str, fields: &Mapping) -> Result<()>;

    /// Fields stored at `path`, in the order the store returns them
    fn read(&self, path: &str) -> Result<Mapping>;
}

/// An authenticated Vault client
pub struct VaultClient {
    http: Client,
    address: String,
    token: String,
    namespace: Option<String>,
    kv_version: KvVersion,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Deserialize)]
struct ReadResponse {
    data: Option<Mapping>,
}

#[derive(Deserialize)]
struct KvV2ReadResponse {
    data: Option<KvV2Data>,
}

#[derive(Deserialize)]
struct KvV2Data {
    data: Option<Mapping>,
}

impl VaultClient {
    /// Connect and authenticate. One attempt; any failure is fatal.
    pub fn connect(
        config: &ConnectionConfig,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self> {
        let http = build_http_client(config)?;

        let mut client = Self {
            http,
            address: config.address.trim_end_matches('/').to_string(),
            token: String::new(),
            namespace: config.namespace.clone(),
            kv_version: config.kv_version,
        };

        client.check_health()?;

        client.token = match &config.auth {
            AuthMode::Token(token) => token.clone(),
            AuthMode::UserPass { mount, username } => {
                let username = match username {
                    Some(username) => username.clone(),
                    None => credentials.username()?,
                };
                let password = credentials.password(&username)?;
                client.login_userpass(mount, &username, &password)?
            }
        };

        debug!(address = %client.address, "connected to vault");
        Ok(client)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "vault request");
        let mut builder = self.http.request(method, self.url(path));
        if !self.token.is_empty() {
            builder = builder.header("X-Vault-Token", &self.token);
        }
        if let Some(namespace) = &self.namespace {
            builder = builder.header("X-Vault-Namespace", namespace);
        }
        builder
    }

    /// Probe the server so an unreachable or sealed Vault fails before any
    /// credentials are requested
    fn check_health(&self) -> Result<()> {
        let response = self
            .request(Method::GET, "sys/health?standbyok=true&perfstandbyok=true")
            .send()
            .map_err(|e| {
                VaultYamlError::Connection(format!("{} is unreachable: {}", self.address, e))
            })?;

        match response.status().as_u16() {
            501 => Err(VaultYamlError::Connection(format!(
                "{} is not initialized",
                self.address
            ))),
            503 => Err(VaultYamlError::Connection(format!(
                "{} is sealed",
                self.address
            ))),
            _ => Ok(()),
        }
    }

    fn login_userpass(&self, mount: &str, username: &str, password: &str) -> Result<String> {
        let path = format!("auth/{}/login/{}", mount, username);
        let response = self
            .request(Method::POST, &path)
            .json(&json!({ "password": password }))
            .send()
            .map_err(|e| VaultYamlError::Connection(format!("login request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultYamlError::Connection(format!(
                "login as {} failed: {}",
                username,
                error_detail(status, response)
            )));
        }

        let body: LoginResponse = response.json().map_err(|e| {
            VaultYamlError::Connection(format!("failed to decode login response: {}", e))
        })?;
        body.auth
            .map(|auth| auth.client_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                VaultYamlError::Connection("login response carried no token".to_string())
            })
    }
}

impl SecretStore for VaultClient {
    fn write(&self, path: &str, fields: &Mapping) -> Result<()> {
        let write_err = |message: String| VaultYamlError::Write {
            path: path.to_string(),
            message,
        };

        let fields = serde_json::to_value(fields)
            .map_err(|e| write_err(format!("fields cannot be encoded as JSON: {}", e)))?;
        let body = match self.kv_version {
            KvVersion::V1 => fields,
            KvVersion::V2 => json!({ "data": fields }),
        };

        let response = self
            .request(Method::POST, path)
            .json(&body)
            .send()
            .map_err(|e| write_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(write_err(error_detail(status, response)));
        }
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Mapping> {
        let read_err = |message: String| VaultYamlError::Read {
            path: path.to_string(),
            message,
        };

        let response = self
            .request(Method::GET, path)
            .send()
            .map_err(|e| read_err(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(read_err("no secret found".to_string()));
        }
        if !status.is_success() {
            return Err(read_err(error_detail(status, response)));
        }

        let body = response
            .text()
            .map_err(|e| read_err(format!("failed to read response: {}", e)))?;
        let decode_err =
            |e: serde_json::Error| read_err(format!("failed to decode response: {}", e));

        let data = match self.kv_version {
            KvVersion::V1 => serde_json::from_str::<ReadResponse>(&body)
                .map_err(decode_err)?
                .data,
            KvVersion::V2 => serde_json::from_str::<KvV2ReadResponse>(&body)
                .map_err(decode_err)?
                .data
                .and_then(|data| data.data),
        };

        data.ok_or_else(|| read_err("no secret found".to_string()))
    }
}

fn build_http_client(config: &ConnectionConfig) -> Result<Client> {
    let mut builder = Client::builder().timeout(config.timeout);

    if let Some(path) = &config.ca_cert {
        let pem = fs::read(path).map_err(|e| {
            VaultYamlError::Config(format!("failed to read CA bundle {}: {}", path.display(), e))
        })?;
        let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
            VaultYamlError::Config(format!("failed to parse CA bundle {}: {}", path.display(), e))
        })?;
        builder = builder.add_root_certificate(cert);
    }

    if config.tls_skip_verify {
        warn!("TLS certificate verification is disabled (--tls_skip_verify false enables it)");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| VaultYamlError::Connection(format!("failed to build HTTP client: {}", e)))
}

/// Status plus Vault's `errors` list, or the raw body when there is none
fn error_detail(status: StatusCode, response: Response) -> String {
    let body = response.text().unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(parsed) if !parsed.errors.is_empty() => {
            format!("{} ({})", status, parsed.errors.join("; "))
        }
        _ if body.trim().is_empty() => status.to_string(),
        _ => format!("{} {}", status, body.trim()),
    }
}
