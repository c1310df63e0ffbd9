//! The `{results, next}` pagination envelope.

use std::collections::{HashSet, VecDeque};

use serde_json::Value;
use tracing::debug;

use crate::client::SourceClient;
use crate::error::FetchError;

/// Split one envelope into its records and the absolute URL of the next page.
///
/// `next` may be absent, `null`, `false` or empty to end pagination; a
/// relative `next` is resolved against `url`.
pub(crate) fn parse_envelope(url: &str, doc: Value) -> Result<(Vec<Value>, Option<String>), FetchError> {
    let Value::Object(mut map) = doc else {
        return Err(FetchError::Parse { url: url.to_string(), message: "expected a JSON object".into() });
    };

    let results = match map.remove("results") {
        Some(Value::Array(results)) => results,
        Some(_) => {
            return Err(FetchError::Parse { url: url.to_string(), message: "'results' is not a list".into() });
        }
        None => return Err(FetchError::MissingField { url: url.to_string(), field: "results".into() }),
    };

    let next = match map.remove("next") {
        Some(Value::String(next)) if !next.trim().is_empty() => {
            let resolved = url::Url::parse(url)
                .and_then(|base| base.join(next.trim()))
                .map_err(|e| FetchError::Parse { url: url.to_string(), message: format!("bad next link: {e}") })?;
            Some(resolved.to_string())
        }
        _ => None,
    };

    Ok((results, next))
}

/// Lazy record sequence over a paginated endpoint.
///
/// Pages are requested only as the iterator drains. The first error is
/// yielded once and ends the sequence; records buffered from the failing
/// page are dropped. Not restartable: call
/// [`SourceClient::fetch_all`] again for a fresh pass.
pub struct Pages<'c> {
    client: &'c SourceClient,
    next_url: Option<String>,
    visited: HashSet<String>,
    buffer: VecDeque<Value>,
    pages_read: usize,
    done: bool,
}

impl<'c> Pages<'c> {
    pub(crate) fn new(client: &'c SourceClient, first_url: String) -> Self {
        Self {
            client,
            next_url: Some(first_url),
            visited: HashSet::new(),
            buffer: VecDeque::new(),
            pages_read: 0,
            done: false,
        }
    }

    pub fn pages_read(&self) -> usize {
        self.pages_read
    }

    fn load(&mut self, url: &str) -> Result<(), FetchError> {
        if !self.visited.insert(url.to_string()) {
            return Err(FetchError::PaginationStuck { url: url.to_string() });
        }

        let doc = self.client.get_json(url)?;
        let (results, next) = parse_envelope(url, doc)?;
        if results.is_empty() {
            return Err(if self.pages_read == 0 {
                FetchError::EmptyResult { url: url.to_string() }
            } else {
                FetchError::EmptyPage { url: url.to_string() }
            });
        }

        self.pages_read += 1;
        debug!(url, page = self.pages_read, records = results.len(), "page fetched");
        self.buffer.extend(results);
        self.next_url = next;
        Ok(())
    }
}

impl Iterator for Pages<'_> {
    type Item = Result<Value, FetchError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }
            let url = self.next_url.take()?;
            if let Err(err) = self.load(&url) {
                self.done = true;
                self.buffer.clear();
                return Some(Err(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client() -> SourceClient {
        SourceClient::new(Duration::from_secs(5)).unwrap()
    }

    fn collect(pages: Pages<'_>) -> Result<Vec<Value>, FetchError> {
        pages.collect()
    }

    #[test]
    fn envelope_next_variants() {
        let (results, next) = parse_envelope("https://a.example/x", json!({"results": [1], "next": null})).unwrap();
        assert_eq!(results, vec![json!(1)]);
        assert_eq!(next, None);

        let (_, next) = parse_envelope("https://a.example/x", json!({"results": [], "next": false})).unwrap();
        assert_eq!(next, None);

        let (_, next) = parse_envelope("https://a.example/api/x?page=1", json!({"results": [], "next": "?page=2"})).unwrap();
        assert_eq!(next.as_deref(), Some("https://a.example/api/x?page=2"));

        let err = parse_envelope("https://a.example/x", json!([1, 2])).unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    // ── Pagination (httpmock) ───────────────────────────────────────

    #[test]
    fn follows_next_until_absent() {
        let server = MockServer::start();
        let page2_url = server.url("/programs/page2");

        let page1 = server.mock(|when, then| {
            when.method(GET).path("/programs").query_param("use", "programSearch");
            then.status(200).json_body(json!({
                "results": [{"degree_id": 1}, {"degree_id": 2}],
                "next": page2_url.as_str(),
            }));
        });
        let page2 = server.mock(|when, then| {
            when.method(GET).path("/programs/page2");
            then.status(200).json_body(json!({"results": [{"degree_id": 3}]}));
        });

        let client = client();
        let pages = client.fetch_all(&server.url("/programs"), &[("use", "programSearch")]).unwrap();
        page1.assert_calls(0);

        let records = collect(pages).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r["degree_id"].as_i64().unwrap()).collect();
        assert_eq!(ids, [1, 2, 3]);
        page1.assert();
        page2.assert();
    }

    #[test]
    fn empty_first_page_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/researchers");
            then.status(200).json_body(json!({"results": [], "next": null}));
        });

        let client = client();
        let err = collect(client.fetch_all(&server.url("/researchers"), &[]).unwrap()).unwrap_err();
        assert!(matches!(err, FetchError::EmptyResult { .. }), "{err}");
    }

    #[test]
    fn empty_later_page_is_a_protocol_error() {
        let server = MockServer::start();
        let page2_url = server.url("/p2");
        server.mock(|when, then| {
            when.method(GET).path("/p1");
            then.status(200).json_body(json!({"results": [{"id": 1}], "next": page2_url.as_str()}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/p2");
            then.status(200).json_body(json!({"results": []}));
        });

        let client = client();
        let err = collect(client.fetch_all(&server.url("/p1"), &[]).unwrap()).unwrap_err();
        assert!(matches!(err, FetchError::EmptyPage { .. }), "{err}");
    }

    #[test]
    fn repeated_next_link_stops_pagination() {
        let server = MockServer::start();
        let self_url = server.url("/loop");
        let mock = server.mock(|when, then| {
            when.method(GET).path("/loop");
            then.status(200).json_body(json!({"results": [{"id": 1}], "next": self_url.as_str()}));
        });

        let client = client();
        let mut pages = client.fetch_all(&server.url("/loop"), &[]).unwrap();
        assert!(matches!(pages.next(), Some(Ok(_))));
        assert!(matches!(pages.next(), Some(Err(FetchError::PaginationStuck { .. }))));
        assert!(pages.next().is_none());
        mock.assert_calls(1);
    }

    #[test]
    fn failure_mid_stream_ends_the_sequence() {
        let server = MockServer::start();
        let page2_url = server.url("/p2");
        server.mock(|when, then| {
            when.method(GET).path("/p1");
            then.status(200).json_body(json!({"results": [{"id": 1}], "next": page2_url.as_str()}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/p2");
            then.status(502);
        });

        let client = client();
        let mut pages = client.fetch_all(&server.url("/p1"), &[]).unwrap();
        assert!(matches!(pages.next(), Some(Ok(_))));
        assert!(matches!(pages.next(), Some(Err(FetchError::Http { status: 502, .. }))));
        assert!(pages.next().is_none());
        assert_eq!(pages.pages_read(), 1);
    }

    #[test]
    fn missing_results_and_bad_json() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/no-results");
            then.status(200).json_body(json!({"count": 0}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/garbage");
            then.status(200).body("<html>maintenance</html>");
        });

        let client = client();
        let err = collect(client.fetch_all(&server.url("/no-results"), &[]).unwrap()).unwrap_err();
        assert!(matches!(err, FetchError::MissingField { ref field, .. } if field == "results"), "{err}");

        let err = collect(client.fetch_all(&server.url("/garbage"), &[]).unwrap()).unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }), "{err}");
    }
}
