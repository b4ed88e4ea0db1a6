// Shared test helpers
#![allow(dead_code)]

use async_trait::async_trait;
use dealerboard::error::FetchError;
use dealerboard::models::*;
use dealerboard::sheet::SheetSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

pub const SHEET_HEADER: &str =
    "A-Dealers,A-Service,A-Zone,Active Users,E-Dealers,E-Service,E-Zone,Expired Users";

/// Full sheet with both sides populated, one Zong row that must be dropped on both sides.
pub fn sample_csv() -> String {
    [
        SHEET_HEADER,
        "Acme,TES Gold,North,42,Acme,TES Gold,North,25",
        "Bravo,McSOL Basic,South,10,Bravo,McSOL Basic,South,5",
        "Zed,Zong Basic,North,99,Zed,Zong Basic,North,99",
        "Cargo,tes lite,North,8,Cargo,tes lite,North,12",
    ]
    .join("\n")
}

pub fn active(dealer: &str, service: &str, zone: &str, users: u32) -> ActiveDealerData {
    ActiveDealerData {
        dealer: dealer.into(),
        service: service.into(),
        zone: zone.into(),
        active_users: users,
        observed_at: None,
    }
}

pub fn expired(dealer: &str, service: &str, zone: &str, users: u32) -> ExpiredDealerData {
    ExpiredDealerData {
        dealer: dealer.into(),
        service: service.into(),
        zone: zone.into(),
        expired_users: users,
        observed_at: None,
    }
}

pub fn record_set(active: Vec<ActiveDealerData>, expired: Vec<ExpiredDealerData>) -> RecordSet {
    RecordSet { active, expired }
}

/// Serves whatever text it currently holds; counts fetches.
#[derive(Clone)]
pub struct StaticSheetSource {
    body: Arc<Mutex<String>>,
    pub fetches: Arc<AtomicUsize>,
}

impl StaticSheetSource {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: Arc::new(Mutex::new(body.into())),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn set_body(&self, body: impl Into<String>) {
        *self.body.lock().await = body.into();
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SheetSource for StaticSheetSource {
    async fn fetch_csv(&self) -> Result<String, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.lock().await.clone())
    }
}

/// Always fails like a sheet host answering 503.
pub struct FailingSheetSource;

#[async_trait]
impl SheetSource for FailingSheetSource {
    async fn fetch_csv(&self) -> Result<String, FetchError> {
        Err(FetchError::Status(503))
    }
}
