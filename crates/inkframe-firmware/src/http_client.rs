//! HTTPS over the ESP-IDF client, with the certificate bundle attached.

use core::time::Duration;

use embedded_svc::http::client::Client;
use embedded_svc::http::{Headers, Method};
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};

use inkframe_core::http::{FetchError, HttpClient, HttpResponse, MAX_BODY_BYTES};
use inkframe_core::network::{RadioError, ReachabilityProbe};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

fn connect(timeout: Duration) -> Result<Client<EspHttpConnection>, FetchError> {
    let config = HttpConfiguration {
        use_global_ca_store: true,
        crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
        timeout: Some(timeout),
        ..Default::default()
    };
    let conn =
        EspHttpConnection::new(&config).map_err(|e| FetchError::Transport(format!("{:?}", e)))?;
    Ok(Client::wrap(conn))
}

/// A fresh connection per request; a cycle makes one or two at most.
#[derive(Default)]
pub struct EspFetcher;

impl HttpClient for EspFetcher {
    fn get(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, FetchError> {
        let mut client = connect(REQUEST_TIMEOUT)?;
        let request = client
            .request(Method::Get, url, headers)
            .map_err(|e| FetchError::Transport(format!("{:?}", e)))?;
        let mut response = request
            .submit()
            .map_err(|e| FetchError::Transport(format!("{:?}", e)))?;

        let status = response.status();
        let content_length = response.content_len().unwrap_or(0) as usize;
        if content_length > MAX_BODY_BYTES {
            return Err(FetchError::TooLarge);
        }

        let mut body = Vec::with_capacity(content_length.max(1024));
        let mut buf = [0u8; 2048];
        loop {
            let read = response
                .read(&mut buf)
                .map_err(|e| FetchError::Transport(format!("{:?}", e)))?;
            if read == 0 {
                break;
            }
            if body.len() + read > MAX_BODY_BYTES {
                return Err(FetchError::TooLarge);
            }
            body.extend_from_slice(&buf[..read]);
        }

        log::info!("http: GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

/// Any HTTP answer from `url` proves the uplink works, whatever the status.
pub struct HttpProbe {
    url: &'static str,
}

impl HttpProbe {
    pub const fn new(url: &'static str) -> Self {
        Self { url }
    }
}

impl ReachabilityProbe for HttpProbe {
    fn probe(&mut self, timeout: Duration) -> Result<(), RadioError> {
        let mut client = connect(timeout).map_err(|err| RadioError(err.to_string()))?;
        let request = client
            .request(Method::Head, self.url, &[])
            .map_err(|e| RadioError(format!("{:?}", e)))?;
        let response = request
            .submit()
            .map_err(|e| RadioError(format!("{:?}", e)))?;
        log::debug!("probe: {} answered {}", self.url, response.status());
        Ok(())
    }
}
