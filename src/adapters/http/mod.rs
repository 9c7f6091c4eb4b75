//! HTTP adapter: `ClinicalBackend` over the clinical REST service.
//!
//! Uses a blocking `reqwest` client; calls run on worker threads, never on
//! the UI thread. Error mapping:
//! - no response (connect, timeout, body read) -> `Transport`
//! - non-2xx -> `Rejected`, message from the body's `error` or `message` key
//! - 2xx with an unexpected body -> `Decode`

use reqwest::blocking::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::domain::{
    ClinicalForm, CreateUserRequest, Credentials, DiagnosisResult, Identity, PatientRecord,
    SavePatientRequest,
};
use crate::ports::{BackendError, ClinicalBackend, ReportDocument};
use crate::NephroguardError;

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.without_url().to_string())
}

/// Pull the server's explanation out of an error body.
fn rejection_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
        .map(str::to_string)
}

fn reject(response: Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    BackendError::Rejected {
        status,
        message: rejection_message(&body),
    }
}

fn expect_success(response: Response) -> Result<(), BackendError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(reject(response))
    }
}

fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    if !response.status().is_success() {
        return Err(reject(response));
    }
    let body = response.bytes().map_err(transport)?;
    serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

impl HttpBackend {
    /// Build a client for `config.backend_url`.
    ///
    /// # Errors
    /// Returns `Config` if the TLS backend cannot be initialised.
    pub fn new(config: &Config) -> Result<Self, NephroguardError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("nephroguard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NephroguardError::Config(format!("HTTP client: {e}")))?;
        tracing::info!(url = %config.backend_url, "HTTP backend configured");
        Ok(Self {
            client,
            base_url: config.backend_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> Result<Response, BackendError> {
        self.client.get(self.url(path)).send().map_err(transport)
    }

    fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response, BackendError> {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .map_err(transport)
    }
}

impl ClinicalBackend for HttpBackend {
    fn health(&self) -> Result<(), BackendError> {
        expect_success(self.get("/")?)
    }

    fn login(&self, credentials: &Credentials) -> Result<Identity, BackendError> {
        read_json(self.post("/login", credentials)?)
    }

    fn create_user(&self, request: &CreateUserRequest) -> Result<(), BackendError> {
        expect_success(self.post("/create_user", request)?)
    }

    fn parse_report(&self, document: &ReportDocument) -> Result<ClinicalForm, BackendError> {
        let part = multipart::Part::bytes(document.bytes.clone()).file_name(document.file_name.clone());
        let form = multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.url("/parse_report"))
            .multipart(form)
            .send()
            .map_err(transport)?;
        read_json(response)
    }

    fn predict(&self, form: &ClinicalForm) -> Result<DiagnosisResult, BackendError> {
        read_json(self.post("/predict", form)?)
    }

    fn save_patient(&self, record: &SavePatientRequest) -> Result<(), BackendError> {
        expect_success(self.post("/save_patient", record)?)
    }

    fn get_history(&self) -> Result<Vec<PatientRecord>, BackendError> {
        read_json(self.get("/get_history")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Answer exactly one HTTP request with `status` and a JSON `body`.
    /// The join handle yields the raw request text.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut raw = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).expect("read");
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    if text[..end].to_ascii_lowercase().contains("transfer-encoding: chunked") {
                        if text.ends_with("\r\n0\r\n\r\n") {
                            break;
                        }
                        continue;
                    }
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let reply = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).expect("write");
            String::from_utf8_lossy(&raw).to_string()
        });
        (url, handle)
    }

    fn backend(url: String) -> HttpBackend {
        HttpBackend::new(&Config {
            backend_url: url,
            ..Config::default()
        })
        .expect("client")
    }

    #[test]
    fn test_rejection_message_keys() {
        assert_eq!(rejection_message(r#"{"error":"invalid age"}"#).as_deref(), Some("invalid age"));
        assert_eq!(
            rejection_message(r#"{"message":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(rejection_message("<html>500</html>"), None);
        assert_eq!(rejection_message(r#"{"error": 5}"#), None);
    }

    #[test]
    fn test_login_success() {
        let (url, server) = serve_once("200 OK", r#"{"message":"ok","username":"admin","role":"admin"}"#);
        let identity = backend(url)
            .login(&Credentials::new("admin", "123"))
            .expect("login");
        assert_eq!(identity, Identity::new("admin", Role::Admin));
        let request = server.join().expect("server");
        assert!(request.starts_with("POST /login"));
        assert!(request.contains(r#""password":"123""#));
    }

    #[test]
    fn test_predict_rejection_carries_error() {
        let (url, server) = serve_once("500 Internal Server Error", r#"{"error":"invalid age"}"#);
        let err = backend(url)
            .predict(&ClinicalForm::default())
            .expect_err("rejected");
        assert_eq!(err, BackendError::rejected(500, "invalid age"));
        let request = server.join().expect("server");
        assert!(request.contains(r#""albumin":"0""#));
    }

    #[test]
    fn test_history_wrong_shape_is_decode_error() {
        let (url, server) = serve_once("200 OK", r#"{"records":[]}"#);
        let err = backend(url).get_history().expect_err("decode");
        assert!(matches!(err, BackendError::Decode(_)));
        server.join().expect("server");
    }

    #[test]
    fn test_parse_report_sends_multipart_file() {
        let (url, server) = serve_once("200 OK", r#"{"age":"52","serum_creatinine":"1.9"}"#);
        let document = ReportDocument {
            file_name: "labs.txt".into(),
            bytes: b"Age: 52".to_vec(),
        };
        let form = backend(url).parse_report(&document).expect("parsed");
        assert_eq!(form.age, "52");
        assert_eq!(form.albumin, "0");
        let request = server.join().expect("server");
        assert!(request.contains("multipart/form-data"));
        assert!(request.contains(r#"name="file"; filename="labs.txt""#));
    }

    #[test]
    fn test_unreachable_service_is_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        drop(listener);
        let err = backend(url).health().expect_err("offline");
        assert!(err.is_transport());
    }
}
