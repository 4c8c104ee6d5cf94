use crate::domain::identity::{CampaignId, VoucherId};
use crate::domain::ports::RedemptionStore;
use crate::domain::redemption::{CampaignStats, RedemptionCommit, RedemptionRecord};
use crate::error::{RedemptionError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column Family for redemption records, keyed by voucher id.
pub const CF_REDEMPTIONS: &str = "redemptions";
/// Column Family for per-campaign statistics, keyed by campaign id.
pub const CF_CAMPAIGN_STATS: &str = "campaign_stats";
/// Column Family for engine-wide counters.
pub const CF_META: &str = "meta";

const TOTAL_REDEMPTIONS_KEY: &[u8] = b"total_redemptions";

/// A persistent redemption store backed by RocksDB.
///
/// Records, statistics and the global counter live in separate Column Families.
/// A commit writes all three through one `WriteBatch`, so a crash never leaves a
/// record without its statistics.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_REDEMPTIONS, CF_CAMPAIGN_STATS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            RedemptionError::InternalError(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

#[async_trait]
impl RedemptionStore for RocksDBStore {
    async fn get_redemption(&self, voucher_id: VoucherId) -> Result<Option<RedemptionRecord>> {
        self.get_json(CF_REDEMPTIONS, &voucher_id.0.to_be_bytes())
    }

    async fn get_campaign_stats(&self, campaign_id: CampaignId) -> Result<Option<CampaignStats>> {
        self.get_json(CF_CAMPAIGN_STATS, &campaign_id.0.to_be_bytes())
    }

    async fn all_campaign_stats(&self) -> Result<Vec<CampaignStats>> {
        let cf = self.cf(CF_CAMPAIGN_STATS)?;

        let mut stats = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            stats.push(serde_json::from_slice(&value)?);
        }

        Ok(stats)
    }

    async fn total_redemptions(&self) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(cf, TOTAL_REDEMPTIONS_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    RedemptionError::InternalError(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "Corrupt redemption counter",
                    )))
                })?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    async fn commit(&self, commit: RedemptionCommit) -> Result<()> {
        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_REDEMPTIONS)?,
            commit.record.voucher_id.0.to_be_bytes(),
            to_json(&commit.record)?,
        );
        batch.put_cf(
            self.cf(CF_CAMPAIGN_STATS)?,
            commit.stats.campaign_id.0.to_be_bytes(),
            to_json(&commit.stats)?,
        );
        batch.put_cf(
            self.cf(CF_META)?,
            TOTAL_REDEMPTIONS_KEY,
            commit.total_redemptions.to_be_bytes(),
        );

        self.db.write(batch)?;
        Ok(())
    }
}
