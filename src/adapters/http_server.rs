//! HTTP server adapter.
//!
//! Binds [`ResultEndpoint`] to `EspHttpServer` on the configured port.
//! A wildcard route for each of [`ROUTED_METHODS`] forwards every request
//! to [`ResultEndpoint::handle`], which owns the routing decision. Unknown
//! paths get the endpoint's 404 whatever the method.
//!
//! On host targets nothing listens; [`HttpServerAdapter::dispatch`] feeds
//! requests straight to the endpoint for tests.

use std::sync::Arc;

use log::info;

use crate::endpoint::{Response, ResultEndpoint};
use crate::error::CommsError;

use super::log_sink::LogEventSink;

/// Methods the wildcard route is registered for.
pub const ROUTED_METHODS: [&str; 8] =
    ["GET", "HEAD", "POST", "PUT", "DELETE", "OPTIONS", "PATCH", "TRACE"];

pub struct HttpServerAdapter {
    port: u16,
    endpoint: Option<Arc<ResultEndpoint>>,
    #[cfg(target_os = "espidf")]
    server: Option<esp_idf_svc::http::server::EspHttpServer<'static>>,
}

impl HttpServerAdapter {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            endpoint: None,
            #[cfg(target_os = "espidf")]
            server: None,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_running(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Start serving. Call once the network is up.
    pub fn start(&mut self, endpoint: Arc<ResultEndpoint>) -> Result<(), CommsError> {
        if self.is_running() {
            return Ok(());
        }
        self.platform_start(&endpoint)?;
        self.endpoint = Some(endpoint);
        info!(
            "HTTP: listening on port {} ({})",
            self.port,
            ROUTED_METHODS.join(", ")
        );
        Ok(())
    }

    /// Run one request through the endpoint with a logging sink.
    pub fn dispatch(&self, uri: &str) -> Response {
        match &self.endpoint {
            Some(ep) => ep.handle(uri, &mut LogEventSink::new()),
            None => Response::not_found(),
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self, endpoint: &Arc<ResultEndpoint>) -> Result<(), CommsError> {
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::server::{Configuration, EspHttpServer};
        use esp_idf_svc::io::Write;

        let conf = Configuration {
            http_port: self.port,
            uri_match_wildcard: true,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&conf).map_err(|e| {
            log::error!("HTTP: server start failed ({})", e);
            CommsError::HttpServerFailed
        })?;

        for name in ROUTED_METHODS {
            let method = match name {
                "GET" => Method::Get,
                "HEAD" => Method::Head,
                "POST" => Method::Post,
                "PUT" => Method::Put,
                "DELETE" => Method::Delete,
                "OPTIONS" => Method::Options,
                "PATCH" => Method::Patch,
                _ => Method::Trace,
            };
            let ep = Arc::clone(endpoint);
            server
                .fn_handler("/*", method, move |req| {
                    let resp = ep.handle(req.uri(), &mut LogEventSink::new());
                    let mut out = req.into_response(
                        resp.status,
                        None,
                        &[("Content-Type", resp.content_type)],
                    )?;
                    out.write_all(&resp.body)?;
                    Ok::<(), esp_idf_svc::io::EspIOError>(())
                })
                .map_err(|e| {
                    log::error!("HTTP: {} handler registration failed ({})", name, e);
                    CommsError::HttpServerFailed
                })?;
        }

        self.server = Some(server);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self, _endpoint: &Arc<ResultEndpoint>) -> Result<(), CommsError> {
        info!("HTTP(sim): no socket bound for port {}", self.port);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemConfig;
    use crate::frame_buffer::FrameBuffer;
    use crate::pipeline::Pipeline;

    fn endpoint() -> Arc<ResultEndpoint> {
        let config = SystemConfig::default();
        let buffer = Arc::new(FrameBuffer::new(config.geometry()));
        Arc::new(ResultEndpoint::new(Pipeline::new(&config), buffer))
    }

    #[test]
    fn dispatch_before_start_is_not_found() {
        let http = HttpServerAdapter::new(80);
        assert_eq!(http.dispatch("/raw").status, 404);
    }

    #[test]
    fn dispatch_after_start_serves_record() {
        let mut http = HttpServerAdapter::new(80);
        http.start(endpoint()).unwrap();
        assert!(http.is_running());
        let resp = http.dispatch("/raw");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, "application/json");
        assert_eq!(http.dispatch("/favicon.ico").status, 404);
    }

    #[test]
    fn wildcard_covers_methods_beyond_crud() {
        for name in ["HEAD", "OPTIONS", "PATCH"] {
            assert!(ROUTED_METHODS.contains(&name), "{name} not routed");
        }
    }
}
