//! Result endpoint: maps an HTTP request onto the pipeline.
//!
//! | Request          | Status | Content type       | Body          |
//! |------------------|--------|--------------------|---------------|
//! | `/raw`           | 200    | `application/json` | record        |
//! | `/raw`, failure  | 500    | `text/plain`       | error message |
//! | anything else    | 404    | `text/plain`       | `Not found`   |
//!
//! `/raw` answers any method.
//!
//! Transport-agnostic: the ESP-IDF HTTP server adapter forwards every
//! request here and writes back the [`Response`].

use std::sync::Arc;

use log::{debug, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::frame_buffer::FrameBuffer;
use crate::pipeline::Pipeline;

pub const RECORD_PATH: &str = "/raw";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_TEXT,
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn not_found() -> Self {
        Self::text(404, "Not found")
    }
}

pub struct ResultEndpoint {
    pipeline: Pipeline,
    buffer: Arc<FrameBuffer>,
}

impl ResultEndpoint {
    pub fn new(pipeline: Pipeline, buffer: Arc<FrameBuffer>) -> Self {
        Self { pipeline, buffer }
    }

    /// Serve one request. The query string, if any, is ignored.
    pub fn handle(&self, uri: &str, sink: &mut impl EventSink) -> Response {
        let path = uri.split('?').next().unwrap_or(uri);
        if path != RECORD_PATH {
            debug!("HTTP: no route for {}", uri);
            return Response::not_found();
        }

        match self.pipeline.run(&self.buffer) {
            Ok(out) => {
                sink.emit(&AppEvent::RecordServed {
                    bytes: out.body.len(),
                    stats: out.stats,
                    seed: out.seed,
                });
                Response {
                    status: 200,
                    content_type: CONTENT_TYPE_JSON,
                    body: out.body,
                }
            }
            Err(e) => {
                warn!("HTTP: record encoding failed: {}", e);
                sink.emit(&AppEvent::EncodingFailed(e));
                Response::text(500, "Record encoding failed")
            }
        }
    }
}
