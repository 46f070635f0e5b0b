//! libSQL backend - async `LeadStore` implementation.
//!
//! Supports local file and in-memory databases. The leads table is shared
//! with the site that creates the records; this agent only reads pending
//! rows and writes terminal statuses back.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use tracing::info;

use crate::error::StoreError;
use crate::store::traits::{Lead, LeadStore, ProcessingStatus, SiteSettings};

/// Status value marking a lead as not yet processed.
const STATUS_PENDING: &str = "PENDING";

/// libSQL lead store.
///
/// Holds a single connection reused for all operations; `libsql::Connection`
/// is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<Database>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to open database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        info!(path = %path.display(), "Lead store opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to create database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS leads (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT,
                    phone TEXT,
                    message TEXT NOT NULL DEFAULT '',
                    property_title TEXT,
                    property_price REAL,
                    property_type TEXT,
                    status TEXT NOT NULL DEFAULT 'PENDING',
                    processed_at TEXT,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status);
                CREATE TABLE IF NOT EXISTS site_settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .await
            .map_err(|e| StoreError::Query(format!("Schema init failed: {e}")))?;
        Ok(())
    }

    /// Insert a lead in PENDING state. Seeding helper for tests and tooling;
    /// production leads are created by the site, not the agent.
    pub async fn insert_lead(&self, lead: &Lead) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO leads
                 (id, name, email, phone, message, property_title, property_price,
                  property_type, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'PENDING', ?9)",
                params![
                    lead.id.as_str(),
                    lead.name.as_str(),
                    opt_text(lead.email.as_deref()),
                    opt_text(lead.phone.as_deref()),
                    lead.message.as_str(),
                    opt_text(lead.property_title.as_deref()),
                    opt_real(lead.property_price),
                    opt_text(lead.property_type.as_deref()),
                    lead.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Insert failed: {e}")))?;
        Ok(())
    }

    /// Upsert a site setting.
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO site_settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Setting upsert failed: {e}")))?;
        Ok(())
    }

    /// Read the stored status of a lead (diagnostics and tests).
    pub async fn lead_status(&self, lead_id: &str) -> Result<String, StoreError> {
        let mut rows = self
            .conn
            .query("SELECT status FROM leads WHERE id = ?1", params![lead_id])
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        match rows.next().await.map_err(|e| StoreError::Query(e.to_string()))? {
            Some(row) => row
                .get::<String>(0)
                .map_err(|e| StoreError::Query(e.to_string())),
            None => Err(StoreError::NotFound(lead_id.to_string())),
        }
    }
}

/// Convert `Option<&str>` to a libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Convert `Option<f64>` to a libsql Value.
fn opt_real(v: Option<f64>) -> libsql::Value {
    match v {
        Some(v) => libsql::Value::Real(v),
        None => libsql::Value::Null,
    }
}

/// Parse an RFC 3339 or SQLite datetime string into `DateTime<Utc>`.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Map a libsql row to a `Lead`.
///
/// Column order:
/// 0:id, 1:name, 2:email, 3:phone, 4:message, 5:property_title,
/// 6:property_price, 7:property_type, 8:created_at
fn row_to_lead(row: &libsql::Row) -> Result<Lead, libsql::Error> {
    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get::<String>(2).ok(),
        phone: row.get::<String>(3).ok(),
        message: row.get(4)?,
        property_title: row.get::<String>(5).ok(),
        property_price: row.get::<f64>(6).ok(),
        property_type: row.get::<String>(7).ok(),
        created_at: parse_datetime(&row.get::<String>(8)?),
    })
}

#[async_trait]
impl LeadStore for LibSqlStore {
    async fn fetch_unprocessed(&self) -> Result<Vec<Lead>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, email, phone, message, property_title,
                        property_price, property_type, created_at
                 FROM leads
                 WHERE status = ?1
                 ORDER BY created_at, id",
                params![STATUS_PENDING],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Lead fetch failed: {e}")))?;

        let mut leads = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
        {
            leads.push(row_to_lead(&row).map_err(|e| StoreError::Query(e.to_string()))?);
        }
        Ok(leads)
    }

    async fn mark_processed(
        &self,
        lead_id: &str,
        status: ProcessingStatus,
    ) -> Result<(), StoreError> {
        let affected = self
            .conn
            .execute(
                "UPDATE leads SET status = ?1, processed_at = ?2 WHERE id = ?3",
                params![status.as_str(), Utc::now().to_rfc3339(), lead_id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("Status update failed: {e}")))?;

        if affected == 0 {
            return Err(StoreError::NotFound(lead_id.to_string()));
        }
        Ok(())
    }

    async fn site_settings(&self) -> Result<SiteSettings, StoreError> {
        let mut rows = self
            .conn
            .query("SELECT key, value FROM site_settings", ())
            .await
            .map_err(|e| StoreError::Query(format!("Settings fetch failed: {e}")))?;

        let mut settings = SiteSettings::default();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
        {
            let key: String = row.get(0).map_err(|e| StoreError::Query(e.to_string()))?;
            let value: String = row.get(1).map_err(|e| StoreError::Query(e.to_string()))?;
            match key.as_str() {
                "contactWhatsapp" => settings.contact_whatsapp = Some(value),
                "siteName" => settings.site_name = Some(value),
                "contactPhone" => settings.contact_phone = Some(value),
                _ => {}
            }
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lead(id: &str) -> Lead {
        Lead {
            id: id.to_string(),
            name: "Ana".to_string(),
            email: Some("ana@example.com".to_string()),
            phone: Some("+5511999990000".to_string()),
            message: "Is this apartment still available?".to_string(),
            property_title: Some("2BR apartment downtown".to_string()),
            property_price: Some(500_000.0),
            property_type: Some("apartment".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn fetch_returns_only_pending() {
        let store = LibSqlStore::new_memory().await.unwrap();
        store.insert_lead(&sample_lead("1")).await.unwrap();
        store.insert_lead(&sample_lead("2")).await.unwrap();
        store
            .mark_processed("1", ProcessingStatus::Sent)
            .await
            .unwrap();

        let pending = store.fetch_unprocessed().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "2");
    }

    #[tokio::test]
    async fn terminal_statuses_excluded_from_fetch() {
        let store = LibSqlStore::new_memory().await.unwrap();
        for id in ["a", "b", "c"] {
            store.insert_lead(&sample_lead(id)).await.unwrap();
        }
        store.mark_processed("a", ProcessingStatus::Sent).await.unwrap();
        store.mark_processed("b", ProcessingStatus::AiError).await.unwrap();
        store.mark_processed("c", ProcessingStatus::Error).await.unwrap();

        // No automatic retry: every terminal status is out of the pending set.
        assert!(store.fetch_unprocessed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_processed_writes_status() {
        let store = LibSqlStore::new_memory().await.unwrap();
        store.insert_lead(&sample_lead("1")).await.unwrap();
        store
            .mark_processed("1", ProcessingStatus::AiError)
            .await
            .unwrap();

        assert_eq!(store.lead_status("1").await.unwrap(), "AI_ERROR");
    }

    #[tokio::test]
    async fn mark_unknown_lead_is_not_found() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let err = store
            .mark_processed("ghost", ProcessingStatus::Sent)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn fetch_order_is_stable() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let base = Utc::now();
        for (i, id) in ["z", "m", "a"].iter().enumerate() {
            let mut lead = sample_lead(id);
            lead.created_at = base + chrono::Duration::seconds(i as i64);
            store.insert_lead(&lead).await.unwrap();
        }

        let ids: Vec<String> = store
            .fetch_unprocessed()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["z", "m", "a"]);
    }

    #[tokio::test]
    async fn site_settings_roundtrip() {
        let store = LibSqlStore::new_memory().await.unwrap();
        store.set_setting("contactWhatsapp", "+5511988887777").await.unwrap();
        store.set_setting("siteName", "Modelo Imóveis").await.unwrap();
        store.set_setting("unrelatedKey", "ignored").await.unwrap();

        let settings = store.site_settings().await.unwrap();
        assert_eq!(settings.contact_whatsapp.as_deref(), Some("+5511988887777"));
        assert_eq!(settings.site_name.as_deref(), Some("Modelo Imóveis"));
        assert!(settings.contact_phone.is_none());
    }

    #[tokio::test]
    async fn settings_empty_when_unconfigured() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let settings = store.site_settings().await.unwrap();
        assert!(settings.contact_whatsapp.is_none());
    }

    #[tokio::test]
    async fn local_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.db");
        {
            let store = LibSqlStore::new_local(&path).await.unwrap();
            store.insert_lead(&sample_lead("1")).await.unwrap();
        }
        let store = LibSqlStore::new_local(&path).await.unwrap();
        assert_eq!(store.fetch_unprocessed().await.unwrap().len(), 1);
    }

    #[test]
    fn datetime_parsing_accepts_both_formats() {
        assert_ne!(
            parse_datetime("2025-06-01T10:00:00+00:00"),
            DateTime::<Utc>::MIN_UTC
        );
        assert_ne!(parse_datetime("2025-06-01 10:00:00"), DateTime::<Utc>::MIN_UTC);
        assert_eq!(parse_datetime("not a date"), DateTime::<Utc>::MIN_UTC);
    }
}
