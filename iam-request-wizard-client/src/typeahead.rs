//! Typeahead search with debounce and stale-response suppression.
//!
//! Search requests race only against the user's own later keystrokes; the
//! backend never cancels them. Each request gets a monotonically increasing
//! sequence number, and a response is delivered only if nothing newer has
//! been delivered already ("last response wins"). The debounced entry point
//! additionally waits out the typing burst before sending anything.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::debug;

use crate::backend::{BackendClient, TypeaheadResults};
use crate::errors::Result;

/// Debounce window between a keystroke and the request it issues
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);

/// Sequence-number bookkeeping for last-response-wins ordering
#[derive(Debug, Default)]
struct ResponseSequencer {
    issued: AtomicU64,
    delivered: AtomicU64,
}

impl ResponseSequencer {
    /// Allocate the next request sequence number
    fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True while no newer request has been issued since `seq`
    fn is_latest(&self, seq: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == seq
    }

    /// Claim delivery for `seq`. Returns false if a newer response was
    /// already delivered, in which case this one must be discarded.
    fn deliver(&self, seq: u64) -> bool {
        self.delivered.fetch_max(seq, Ordering::SeqCst) < seq
    }
}

/// Typeahead front end over a [`BackendClient`]
#[derive(Debug)]
pub struct TypeaheadSearch {
    client: BackendClient,
    sequencer: ResponseSequencer,
    debounce: Duration,
}

impl TypeaheadSearch {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self::with_debounce(client, DEFAULT_DEBOUNCE)
    }

    #[must_use]
    pub fn with_debounce(client: BackendClient, debounce: Duration) -> Self {
        Self {
            client,
            sequencer: ResponseSequencer::default(),
            debounce,
        }
    }

    /// Issue a search immediately. Returns `Ok(None)` for an empty query
    /// (the deliberate ignore-empty short-circuit) or when the response
    /// arrived after a newer one was already delivered.
    ///
    /// # Errors
    /// Propagates transport and decode errors from the backend client.
    pub async fn search(
        &self,
        resource: &str,
        query: &str,
        account_id: &str,
    ) -> Result<Option<TypeaheadResults>> {
        if query.is_empty() {
            return Ok(None);
        }

        let seq = self.sequencer.begin();
        let results = self.client.typeahead(resource, query, account_id).await?;

        if self.sequencer.deliver(seq) {
            Ok(Some(results))
        } else {
            debug!("discarding stale typeahead response (seq {seq})");
            Ok(None)
        }
    }

    /// Issue a search after the debounce window, skipping the request
    /// entirely when another keystroke arrived while waiting.
    ///
    /// # Errors
    /// Propagates transport and decode errors from the backend client.
    pub async fn search_debounced(
        &self,
        resource: &str,
        query: &str,
        account_id: &str,
    ) -> Result<Option<TypeaheadResults>> {
        if query.is_empty() {
            return Ok(None);
        }

        let seq = self.sequencer.begin();
        tokio::time::sleep(self.debounce).await;

        if !self.sequencer.is_latest(seq) {
            debug!("typeahead request superseded while debouncing (seq {seq})");
            return Ok(None);
        }

        let results = self.client.typeahead(resource, query, account_id).await?;

        if self.sequencer.deliver(seq) {
            Ok(Some(results))
        } else {
            debug!("discarding stale typeahead response (seq {seq})");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_sequencer_last_response_wins() {
        let sequencer = ResponseSequencer::default();

        let first = sequencer.begin();
        let second = sequencer.begin();
        assert!(!sequencer.is_latest(first));
        assert!(sequencer.is_latest(second));

        // Second response arrives first and is delivered; the straggler
        // from the first request must be discarded.
        assert!(sequencer.deliver(second));
        assert!(!sequencer.deliver(first));
    }

    #[test]
    fn test_sequencer_in_order_delivery() {
        let sequencer = ResponseSequencer::default();
        let first = sequencer.begin();
        let second = sequencer.begin();

        assert!(sequencer.deliver(first));
        assert!(sequencer.deliver(second));
    }

    async fn mock_backend() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/policies/typeahead"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Apps": [{"title": "billing-service"}]
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        // Unroutable address: an empty query must never hit the network
        let client = BackendClient::new("http://127.0.0.1:1").unwrap();
        let search = TypeaheadSearch::new(client);

        let results = search.search("app", "", "123456789012").await.unwrap();
        assert!(results.is_none());
    }

    #[tokio::test]
    async fn test_search_delivers_results() {
        let server = mock_backend().await;
        let search = TypeaheadSearch::new(BackendClient::new(&server.uri()).unwrap());

        let results = search
            .search("app", "bill", "123456789012")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(results["Apps"][0].title, "billing-service");
    }

    #[tokio::test]
    async fn test_debounced_search_superseded_by_newer_keystroke() {
        let server = mock_backend().await;
        let search = Arc::new(TypeaheadSearch::new(
            BackendClient::new(&server.uri()).unwrap(),
        ));

        // First keystroke starts debouncing...
        let first = tokio::spawn({
            let search = Arc::clone(&search);
            async move { search.search_debounced("app", "bil", "123456789012").await }
        });

        // ...and a second keystroke lands well inside its window.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = search.search("app", "bill", "123456789012").await.unwrap();
        assert!(second.is_some());

        // The superseded request never fires and yields nothing.
        let first = first.await.unwrap().unwrap();
        assert!(first.is_none());
    }
}
