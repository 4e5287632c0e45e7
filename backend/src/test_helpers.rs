//! In-memory capability doubles for pipeline and route tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::{Mutex, Once};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use crate::analysis::{AnalysisError, ContentAnalyzer};
use crate::ledger::{LedgerClient, LedgerError, LedgerRow};
use crate::storage::{ObjectStore, StorageError, StoredAsset};

enum StoreBehaviour {
    Fixed(String),
    Numbered,
    Fail,
}

pub struct FakeStore {
    behaviour: StoreBehaviour,
    puts: AtomicUsize,
    last_put_at: Mutex<Option<DateTime<Utc>>>,
}

impl FakeStore {
    pub fn succeeding(url: &str) -> Self {
        Self::with(StoreBehaviour::Fixed(url.to_string()))
    }

    /// Every put gets a fresh URL.
    pub fn numbered() -> Self {
        Self::with(StoreBehaviour::Numbered)
    }

    pub fn failing() -> Self {
        Self::with(StoreBehaviour::Fail)
    }

    fn with(behaviour: StoreBehaviour) -> Self {
        Self {
            behaviour,
            puts: AtomicUsize::new(0),
            last_put_at: Mutex::new(None),
        }
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn last_put_at(&self) -> Option<DateTime<Utc>> {
        *self.last_put_at.lock().unwrap()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn put(&self, _bytes: &[u8], _content_type: &str) -> Result<StoredAsset, StorageError> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst);
        *self.last_put_at.lock().unwrap() = Some(Utc::now());
        let url = match &self.behaviour {
            StoreBehaviour::Fixed(url) => url.clone(),
            StoreBehaviour::Numbered => format!("https://cdn.example/{}.jpg", n),
            StoreBehaviour::Fail => {
                return Err(StorageError::S3("bucket unavailable".to_string()));
            }
        };
        Ok(StoredAsset {
            key: format!("key-{}", n),
            url,
        })
    }
}

pub struct FakeAnalyzer {
    reply: Option<String>,
    pub calls: AtomicUsize,
    content_types: Mutex<Vec<String>>,
}

impl FakeAnalyzer {
    pub fn succeeding(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
            content_types: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            content_types: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_content_types(&self) -> Vec<String> {
        self.content_types.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentAnalyzer for FakeAnalyzer {
    async fn analyze(
        &self,
        _bytes: &[u8],
        content_type: &str,
        _prompt: &str,
    ) -> Result<String, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.content_types
            .lock()
            .unwrap()
            .push(content_type.to_string());
        self.reply.clone().ok_or(AnalysisError::EmptyResponse)
    }
}

/// Blocks inside `analyze` until `release` is called.
pub struct GatedAnalyzer {
    reply: String,
    gate: Notify,
}

impl GatedAnalyzer {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            gate: Notify::new(),
        }
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl ContentAnalyzer for GatedAnalyzer {
    async fn analyze(
        &self,
        _bytes: &[u8],
        _content_type: &str,
        _prompt: &str,
    ) -> Result<String, AnalysisError> {
        self.gate.notified().await;
        Ok(self.reply.clone())
    }
}

pub struct FakeLedger {
    fail: bool,
    pub attempts: AtomicUsize,
    rows: Mutex<Vec<LedgerRow>>,
}

impl FakeLedger {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            attempts: AtomicUsize::new(0),
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::succeeding()
        }
    }

    pub fn rows(&self) -> Vec<LedgerRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn append_row(&self, row: &LedgerRow) -> Result<(), LedgerError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LedgerError::Api {
                status: 503,
                body: "sheet unavailable".to_string(),
            });
        }
        self.rows.lock().unwrap().push(row.clone());
        Ok(())
    }
}

struct CapturingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    records: Mutex::new(Vec::new()),
};
static INSTALL_LOGGER: Once = Once::new();

/// Routes the `log` facade into memory for the whole test binary.
pub fn capture_logs() {
    INSTALL_LOGGER.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Debug);
        }
    });
}

/// Error records mentioning `needle`. Tests share one logger, so filter on something unique.
pub fn logged_errors(needle: &str) -> Vec<String> {
    LOGGER
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, message)| *level == Level::Error && message.contains(needle))
        .map(|(_, message)| message.clone())
        .collect()
}
