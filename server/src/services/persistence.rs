//! Signing record and field list storage.
//!
//! DESIGN
//! ======
//! The signer record lives in `contracts.field_data` next to a
//! `field_data_version` counter. Writes name the version they read; a write
//! against any other version is rejected with
//! [`StoreError::VersionMismatch`] so concurrent transitions can't interleave.
//! Version `0` means "no record yet".
//!
//! `field_data` holds the serialized [`SignerRecord`]: an object whose
//! `signers` key is the ordered signer array, alongside the workflow's
//! `title`, `status` and `completed_at`. The embedded `version` is ignored
//! on load; the column is authoritative.
//!
//! The field list is replaced wholesale inside one transaction. Once a
//! signer record exists the field list is frozen and replacing it is a
//! version mismatch.
//!
//! [`MemoryStore`] has the same semantics and backs tests and database-less
//! development runs.

use std::collections::HashMap;

use async_trait::async_trait;
use canvas::doc::{ContractId, FieldKind, FieldRecord};
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;

use crate::services::signing::SignerRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("stale write: expected version {expected}")]
    VersionMismatch { expected: i64 },
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Durable storage for signer records and field lists.
#[async_trait]
pub trait SigningStore: Send + Sync {
    async fn load_signers(&self, contract_id: ContractId) -> Result<Option<SignerRecord>, StoreError>;

    /// Write `record` if the stored version equals `expected_version`.
    async fn save_signers(
        &self,
        contract_id: ContractId,
        record: &SignerRecord,
        expected_version: i64,
    ) -> Result<(), StoreError>;

    /// Fields in saved order.
    async fn load_fields(&self, contract_id: ContractId) -> Result<Vec<FieldRecord>, StoreError>;

    async fn save_fields(&self, contract_id: ContractId, fields: &[FieldRecord]) -> Result<(), StoreError>;
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Debug, Default, Clone)]
struct Entry {
    signers: Option<SignerRecord>,
    fields: Vec<FieldRecord>,
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<ContractId, Entry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SigningStore for MemoryStore {
    async fn load_signers(&self, contract_id: ContractId) -> Result<Option<SignerRecord>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&contract_id).and_then(|e| e.signers.clone()))
    }

    async fn save_signers(
        &self,
        contract_id: ContractId,
        record: &SignerRecord,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(contract_id).or_default();
        let current = entry.signers.as_ref().map_or(0, |r| r.version);
        if current != expected_version {
            return Err(StoreError::VersionMismatch { expected: expected_version });
        }
        entry.signers = Some(record.clone());
        Ok(())
    }

    async fn load_fields(&self, contract_id: ContractId) -> Result<Vec<FieldRecord>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&contract_id).map(|e| e.fields.clone()).unwrap_or_default())
    }

    async fn save_fields(&self, contract_id: ContractId, fields: &[FieldRecord]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(contract_id).or_default();
        if entry.signers.is_some() {
            return Err(StoreError::VersionMismatch { expected: 0 });
        }
        entry.fields = fields.to_vec();
        Ok(())
    }
}

// =============================================================================
// POSTGRES
// =============================================================================

/// `PostgreSQL`-backed store over the `contracts` and `contract_fields` tables.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SigningStore for PgStore {
    async fn load_signers(&self, contract_id: ContractId) -> Result<Option<SignerRecord>, StoreError> {
        let row = sqlx::query("SELECT field_data, field_data_version FROM contracts WHERE id = $1")
            .bind(contract_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let data: Option<serde_json::Value> = row.get("field_data");
        let version: i64 = row.get("field_data_version");
        let Some(data) = data else {
            return Ok(None);
        };
        let mut record: SignerRecord = serde_json::from_value(data)?;
        record.version = version;
        if !record.is_consistent() {
            return Err(StoreError::Corrupt(format!("contract {contract_id}: status disagrees with signers")));
        }
        Ok(Some(record))
    }

    async fn save_signers(
        &self,
        contract_id: ContractId,
        record: &SignerRecord,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let data = serde_json::to_value(record)?;
        let result = if expected_version == 0 {
            sqlx::query(
                "INSERT INTO contracts (id, field_data, field_data_version) VALUES ($1, $2, $3) \
                 ON CONFLICT (id) DO UPDATE SET \
                     field_data = EXCLUDED.field_data, \
                     field_data_version = EXCLUDED.field_data_version, \
                     updated_at = now() \
                 WHERE contracts.field_data IS NULL",
            )
            .bind(contract_id)
            .bind(&data)
            .bind(record.version)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                "UPDATE contracts SET field_data = $2, field_data_version = $3, updated_at = now() \
                 WHERE id = $1 AND field_data_version = $4",
            )
            .bind(contract_id)
            .bind(&data)
            .bind(record.version)
            .bind(expected_version)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::VersionMismatch { expected: expected_version });
        }
        Ok(())
    }

    async fn load_fields(&self, contract_id: ContractId) -> Result<Vec<FieldRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT client_id, field_type, field_name, position_x, position_y, width, height, \
                    is_required, placeholder \
             FROM contract_fields WHERE contract_id = $1 ORDER BY ordinal",
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let field_type: String = row.get("field_type");
                let kind = FieldKind::parse(&field_type)
                    .ok_or_else(|| StoreError::Corrupt(format!("unknown field_type {field_type:?}")))?;
                Ok(FieldRecord {
                    contract_id,
                    client_id: row.get("client_id"),
                    field_type: kind,
                    field_name: row.get("field_name"),
                    position_x: row.get("position_x"),
                    position_y: row.get("position_y"),
                    width: row.get("width"),
                    height: row.get("height"),
                    is_required: row.get("is_required"),
                    placeholder: row.get("placeholder"),
                })
            })
            .collect()
    }

    async fn save_fields(&self, contract_id: ContractId, fields: &[FieldRecord]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO contracts (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(contract_id)
            .execute(&mut *tx)
            .await?;
        let dispatched: bool =
            sqlx::query("SELECT field_data IS NOT NULL AS dispatched FROM contracts WHERE id = $1 FOR UPDATE")
                .bind(contract_id)
                .fetch_one(&mut *tx)
                .await?
                .get("dispatched");
        if dispatched {
            return Err(StoreError::VersionMismatch { expected: 0 });
        }

        sqlx::query("DELETE FROM contract_fields WHERE contract_id = $1")
            .bind(contract_id)
            .execute(&mut *tx)
            .await?;
        for (ordinal, field) in fields.iter().enumerate() {
            let ordinal = i32::try_from(ordinal).map_err(|_| StoreError::Corrupt("too many fields".into()))?;
            sqlx::query(
                "INSERT INTO contract_fields \
                     (contract_id, ordinal, client_id, field_type, field_name, position_x, position_y, \
                      width, height, is_required, placeholder) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(contract_id)
            .bind(ordinal)
            .bind(field.client_id)
            .bind(field.field_type.as_str())
            .bind(&field.field_name)
            .bind(field.position_x)
            .bind(field.position_y)
            .bind(field.width)
            .bind(field.height)
            .bind(field.is_required)
            .bind(&field.placeholder)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
