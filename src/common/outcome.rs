use std::sync::mpsc;

use anyhow::{Context, Result};
use snorql::{client::Error, page::failure_message};

/// The callback expected by the dispatch methods of the library.
pub type Done<T> = Box<dyn FnOnce(snorql::client::Result<T>) + Send>;

/// Call `dispatch` with a callback, and wait for that callback to be called.
///
/// Typically: `wait_for(|done| service.ask(query, done))`.
pub fn wait_for<T: Send + 'static>(dispatch: impl FnOnce(Done<T>)) -> Result<T> {
    let (tx, rx) = mpsc::channel();
    dispatch(Box::new(move |res| {
        // the receiver lives until we got our answer
        let _ = tx.send(res);
    }));
    rx.recv()
        .context("Query dropped before completion")?
        .map_err(report)
}

/// Convert a library error into a CLI error,
/// with the message of the endpoint's error page when there is one.
pub fn report(err: Error) -> anyhow::Error {
    match err.response().map(failure_message) {
        Some(msg) => anyhow::Error::new(err).context(msg),
        None => err.into(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use snorql::client::HttpResponse;

    #[test]
    fn immediate() {
        let got = wait_for(|done: Done<u32>| done(Ok(42))).unwrap();
        assert_eq!(got, 42);
    }

    #[test]
    fn from_another_thread() {
        let got = wait_for(|done: Done<&str>| {
            std::thread::spawn(move || done(Ok("hello")));
        })
        .unwrap();
        assert_eq!(got, "hello");
    }

    #[test]
    fn dropped() {
        assert!(wait_for(|done: Done<u32>| drop(done)).is_err());
    }

    #[test]
    fn endpoint_message() {
        let err = Error::TransportFailure {
            reason: "HTTP status 400".into(),
            response: Some(HttpResponse {
                status: 400,
                content_type: Some("text/html".into()),
                body: "<html><pre>Parse error on line 1</pre></html>".into(),
            }),
        };
        let err = wait_for(|done: Done<()>| done(Err(err))).unwrap_err();
        assert_eq!(err.to_string(), "Parse error on line 1");
        assert_eq!(err.root_cause().to_string(), "transport failure: HTTP status 400");
    }

    #[test]
    fn no_response() {
        let err = report(Error::MalformedResult("not JSON".into()));
        assert_eq!(err.to_string(), "malformed result: not JSON");
    }
}
