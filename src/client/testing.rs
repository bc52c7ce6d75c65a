//! An in-memory [`Transport`] for tests, completing requests on demand.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use percent_encoding::percent_decode_str;

use super::transport::{Completion, HttpRequest, HttpResponse, Transport, TransportError};

type Outcome = Result<HttpResponse, TransportError>;

#[derive(Default)]
struct State {
    in_flight: VecDeque<(HttpRequest, Completion)>,
    sent: Vec<HttpRequest>,
    auto: Option<Outcome>,
}

/// Keeps every request in flight until the test calls [`ManualTransport::complete_next`],
/// unless built with [`ManualTransport::auto`].
#[derive(Clone, Default)]
pub struct ManualTransport(Arc<Mutex<State>>);

impl ManualTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport answering every request immediately with `outcome`,
    /// be it a response or a transport error.
    pub fn auto(outcome: Outcome) -> Self {
        let ret = Self::new();
        ret.0.lock().auto = Some(outcome);
        ret
    }

    pub fn in_flight(&self) -> usize {
        self.0.lock().in_flight.len()
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.0.lock().sent.clone()
    }

    /// The decoded `query` parameter of every request sent so far, without PREFIX declarations.
    pub fn sent_queries(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|req| {
                let params = req.body.as_deref().or_else(|| req.url.split('?').nth(1))?;
                let encoded = params.rsplit("query=").next()?;
                Some(percent_decode_str(encoded).decode_utf8().ok()?.into_owned())
            })
            .collect()
    }

    /// Complete the oldest request in flight.
    pub fn complete_next(&self, outcome: Outcome) {
        let next = self.0.lock().in_flight.pop_front();
        let (_, done) = next.expect("no request in flight");
        done(outcome);
    }
}

impl Transport for ManualTransport {
    fn send(&self, request: HttpRequest, done: Completion) {
        let mut state = self.0.lock();
        state.sent.push(request.clone());
        if let Some(outcome) = state.auto.clone() {
            drop(state);
            done(outcome);
        } else {
            state.in_flight.push_back((request, done));
        }
    }
}

pub fn ok_json(body: &str) -> Outcome {
    Ok(HttpResponse {
        status: 200,
        content_type: Some("application/sparql-results+json".into()),
        body: body.into(),
    })
}
