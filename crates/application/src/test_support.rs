//! In-memory fakes of every port, shared by the unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use courier_domain::{
    HeaderPair, HttpMethod, HttpRequest, ParsedBody, ParsedRequestFields, StoreKey, StoredValues,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::ports::{
    CurlCodec, HeaderRewriteService, HttpTransport, KeyValueStore, MessagingError, RewriteMessage,
    StorageDelta, StorageError, TransportError, TransportRequest, TransportResponse,
    delta_for_removal, delta_for_write,
};

#[derive(Default)]
pub struct FakeRewriteService {
    messages: Mutex<Vec<RewriteMessage>>,
    reject: bool,
}

impl FakeRewriteService {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<RewriteMessage> {
        self.messages.lock().clone()
    }

    pub fn clear_count(&self) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|m| matches!(m, RewriteMessage::ClearRequestHeaders))
            .count()
    }
}

#[async_trait]
impl HeaderRewriteService for FakeRewriteService {
    async fn send(&self, message: RewriteMessage) -> Result<(), MessagingError> {
        self.messages.lock().push(message);
        if self.reject {
            Err(MessagingError::Disconnected)
        } else {
            Ok(())
        }
    }
}

pub struct FakeTransport {
    outcome: Result<TransportResponse, TransportError>,
    requests: Mutex<Vec<TransportRequest>>,
    observed: Mutex<Option<Arc<FakeRewriteService>>>,
    seen_at_dispatch: Mutex<Option<usize>>,
}

impl FakeTransport {
    pub fn ok(status: u16, body: &str) -> Self {
        Self::with_outcome(Ok(TransportResponse {
            status,
            status_text: String::new(),
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: body.as_bytes().to_vec(),
        }))
    }

    pub fn failing(error: TransportError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<TransportResponse, TransportError>) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
            observed: Mutex::new(None),
            seen_at_dispatch: Mutex::new(None),
        }
    }

    /// Records how many rewrite messages `service` had received when the
    /// next request was dispatched.
    pub fn observe(&self, service: Arc<FakeRewriteService>) {
        *self.observed.lock() = Some(service);
    }

    pub fn messages_seen_at_dispatch(&self) -> Option<usize> {
        *self.seen_at_dispatch.lock()
    }

    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn dispatch(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        if let Some(service) = self.observed.lock().as_ref() {
            *self.seen_at_dispatch.lock() = Some(service.messages().len());
        }
        self.requests.lock().push(request);
        tokio::task::yield_now().await;
        self.outcome.clone()
    }
}

pub struct FakeStore {
    values: Mutex<StoredValues>,
    writes: Mutex<Vec<StoredValues>>,
    changes: broadcast::Sender<StorageDelta>,
    fail_reads: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::seeded(StoredValues::new())
    }

    pub fn seeded(values: StoredValues) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            values: Mutex::new(values),
            writes: Mutex::new(Vec::new()),
            changes,
            fail_reads: false,
        }
    }

    pub fn unreadable() -> Self {
        Self {
            fail_reads: true,
            ..Self::new()
        }
    }

    pub fn value(&self, key: StoreKey) -> Option<serde_json::Value> {
        self.values.lock().get(&key).cloned()
    }

    pub fn writes(&self) -> Vec<StoredValues> {
        self.writes.lock().clone()
    }

    /// Simulates a write by another process.
    pub fn external_write(&self, values: StoredValues) {
        self.values.lock().extend(values.clone());
        let _ = self.changes.send(delta_for_write(&values));
    }
}

#[async_trait]
impl KeyValueStore for FakeStore {
    async fn get(&self, keys: &[StoreKey]) -> Result<StoredValues, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Io("disk on fire".to_string()));
        }
        let values = self.values.lock();
        Ok(keys
            .iter()
            .filter_map(|key| values.get(key).map(|v| (*key, v.clone())))
            .collect())
    }

    async fn set(&self, values: StoredValues) -> Result<(), StorageError> {
        self.values.lock().extend(values.clone());
        self.writes.lock().push(values.clone());
        let _ = self.changes.send(delta_for_write(&values));
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let keys: Vec<StoreKey> = {
            let mut values = self.values.lock();
            let keys = values.keys().copied().collect();
            values.clear();
            keys
        };
        let _ = self.changes.send(delta_for_removal(keys));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageDelta> {
        self.changes.subscribe()
    }
}

/// Accepts `curl <url>` and `curl -X <METHOD> <url> [-d <body>]`, enough
/// to drive the session.
pub struct FakeCurl;

impl CurlCodec for FakeCurl {
    fn parse(&self, text: &str) -> Option<ParsedRequestFields> {
        let mut words = text.split_whitespace();
        if words.next()? != "curl" {
            return None;
        }
        let mut fields = ParsedRequestFields::default();
        while let Some(word) = words.next() {
            match word {
                "-X" => fields.method = words.next()?.parse().ok(),
                "-H" => {
                    let (key, value) = words.next()?.split_once(':')?;
                    fields.headers.push(HeaderPair::new(key, value));
                }
                "-d" => fields.body = Some(ParsedBody::Raw(words.next()?.to_string())),
                url => fields.url = Some(url.to_string()),
            }
        }
        fields.url.as_ref()?;
        Some(fields)
    }

    fn serialize(&self, request: &HttpRequest) -> String {
        if request.method == HttpMethod::Get {
            format!("curl '{}'", request.url)
        } else {
            format!("curl -X {} '{}'", request.method, request.url)
        }
    }
}
