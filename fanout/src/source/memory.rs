use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, FanoutResult};
use crate::source::{Connection, DataStore, Row, Value};

#[derive(Debug, Default)]
struct Documents {
    texts: HashMap<i64, String>,
    failing_ids: HashSet<i64>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: Mutex<Documents>,
    open_connections: AtomicUsize,
    total_connections: AtomicUsize,
    refuse_connections: AtomicBool,
}

/// In-memory [`DataStore`] keyed by integer identifier.
///
/// Every query is answered as a lookup of the document whose id is the first parameter, so the
/// query text itself is ignored. The store keeps count of open connections, which lets tests
/// check that every fetch releases the connection it acquired.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given `(id, text)` documents.
    pub fn with_documents<I, T>(documents: I) -> Self
    where
        I: IntoIterator<Item = (i64, T)>,
        T: Into<String>,
    {
        let texts = documents
            .into_iter()
            .map(|(id, text)| (id, text.into()))
            .collect();

        Self {
            inner: Arc::new(Inner {
                documents: Mutex::new(Documents {
                    texts,
                    failing_ids: HashSet::new(),
                }),
                ..Default::default()
            }),
        }
    }

    /// Inserts or replaces a document.
    pub async fn insert(&self, id: i64, text: impl Into<String>) {
        let mut documents = self.inner.documents.lock().await;
        documents.texts.insert(id, text.into());
    }

    /// Makes every query for `id` fail with [`ErrorKind::SourceQueryFailed`].
    pub async fn fail_queries_for(&self, id: i64) {
        let mut documents = self.inner.documents.lock().await;
        documents.failing_ids.insert(id);
    }

    /// Makes every subsequent connection attempt fail while `refuse` is `true`.
    pub fn refuse_connections(&self, refuse: bool) {
        self.inner.refuse_connections.store(refuse, Ordering::SeqCst);
    }

    /// Returns the number of connections currently open.
    pub fn open_connections(&self) -> usize {
        self.inner.open_connections.load(Ordering::SeqCst)
    }

    /// Returns the number of connections opened since creation.
    pub fn total_connections(&self) -> usize {
        self.inner.total_connections.load(Ordering::SeqCst)
    }
}

impl DataStore for MemoryStore {
    type Connection = MemoryConnection;

    fn name() -> &'static str {
        "memory"
    }

    async fn connect(&self) -> FanoutResult<MemoryConnection> {
        if self.inner.refuse_connections.load(Ordering::SeqCst) {
            bail!(
                ErrorKind::SourceConnectionFailed,
                "Memory store refused the connection"
            );
        }

        self.inner.open_connections.fetch_add(1, Ordering::SeqCst);
        self.inner.total_connections.fetch_add(1, Ordering::SeqCst);

        Ok(MemoryConnection {
            inner: self.inner.clone(),
            released: false,
        })
    }
}

/// Connection handed out by [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryConnection {
    inner: Arc<Inner>,
    released: bool,
}

impl MemoryConnection {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.inner.open_connections.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Connection for MemoryConnection {
    async fn execute(&mut self, query: &str, params: &[Value]) -> FanoutResult<Vec<Row>> {
        let Some(Value::Int(id)) = params.first() else {
            bail!(
                ErrorKind::SourceQueryFailed,
                "Memory store lookup requires an integer id parameter",
                format!("query `{query}` was called with parameters {params:?}")
            );
        };

        let documents = self.inner.documents.lock().await;
        if documents.failing_ids.contains(id) {
            bail!(
                ErrorKind::SourceQueryFailed,
                "Memory store query failed",
                format!("query for id {id} is configured to fail")
            );
        }

        debug!(id, "memory store lookup");

        let rows = documents
            .texts
            .get(id)
            .map(|text| vec![Row::new(vec![Value::Text(text.clone())])])
            .unwrap_or_default();

        Ok(rows)
    }

    async fn close(mut self) -> FanoutResult<()> {
        self.release();

        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.release();
    }
}
