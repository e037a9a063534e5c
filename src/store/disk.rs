use crate::core::history::RateHistory;
use crate::core::rate::RateObservation;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const RATES_PARTITION: &str = "rates";
const META_PARTITION: &str = "meta";
const NEXT_ID_KEY: &str = "next_id";

/// Rate history persisted in a fjall keyspace.
///
/// Keys are `(observed_at micros, id)` in big-endian so the partition's key
/// order is the chronological order of the window.
pub struct DiskRateHistory {
    keyspace: Arc<Keyspace>,
    rates: PartitionHandle,
    meta: PartitionHandle,
    max_records: usize,
}

fn rate_key(observation: &RateObservation, id: u64) -> Vec<u8> {
    // Flip the sign bit so negative timestamps still sort first
    let micros = (observation.observed_at.timestamp_micros() as u64) ^ (1 << 63);
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&micros.to_be_bytes());
    key.extend_from_slice(&id.to_be_bytes());
    key
}

impl DiskRateHistory {
    pub fn open(path: &Path, max_records: usize) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open rate history at {}", path.display()))?;
        let rates = keyspace.open_partition(RATES_PARTITION, PartitionCreateOptions::default())?;
        let meta = keyspace.open_partition(META_PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened rate history at {}", path.display());

        Ok(Self {
            keyspace: Arc::new(keyspace),
            rates,
            meta,
            max_records,
        })
    }

    fn next_id(&self) -> Result<u64> {
        let id = match self.meta.get(NEXT_ID_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes[..]
                    .try_into()
                    .context("Corrupted id counter in rate history")?;
                u64::from_be_bytes(raw)
            }
            None => 1,
        };
        Ok(id)
    }

    fn decode(value: &[u8]) -> Result<RateObservation> {
        serde_json::from_slice(value).context("Failed to decode stored rate")
    }

    fn read_all(&self) -> Result<Vec<RateObservation>> {
        self.rates
            .iter()
            .map(|item| {
                let (_, value) = item?;
                Self::decode(&value)
            })
            .collect()
    }
}

#[async_trait]
impl RateHistory for DiskRateHistory {
    fn max_records(&self) -> usize {
        self.max_records
    }

    async fn insert_and_trim(&self, observation: RateObservation) -> Result<RateObservation> {
        let id = self.next_id()?;
        let stored = observation.with_id(id);
        let new_key = rate_key(&stored, id);

        let mut keys = self
            .rates
            .keys()
            .map(|key| key.map(|k| k.to_vec()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let position = keys.partition_point(|k| k < &new_key);
        keys.insert(position, new_key.clone());
        let excess = keys.len().saturating_sub(self.max_records);

        let mut batch = self.keyspace.batch();
        batch.insert(&self.rates, new_key, serde_json::to_vec(&stored)?);
        batch.insert(&self.meta, NEXT_ID_KEY, (id + 1).to_be_bytes().to_vec());
        for key in keys.into_iter().take(excess) {
            batch.remove(&self.rates, key);
        }
        batch.commit().context("Failed to commit rate insert")?;
        self.keyspace.persist(PersistMode::SyncAll)?;

        if excess > 0 {
            debug!("Evicted {} old rate(s)", excess);
        }
        debug!(id, "Rate PUT");
        Ok(stored)
    }

    async fn last_known(&self) -> Result<Option<RateObservation>> {
        match self.rates.last_key_value()? {
            Some((_, value)) => Ok(Some(Self::decode(&value)?)),
            None => Ok(None),
        }
    }

    async fn last_n(&self, n: usize) -> Result<Vec<RateObservation>> {
        let mut recent = self
            .rates
            .iter()
            .rev()
            .take(n)
            .map(|item| {
                let (_, value) = item?;
                Self::decode(&value)
            })
            .collect::<Result<Vec<_>>>()?;
        recent.reverse();
        Ok(recent)
    }

    async fn has_observation_today(&self, today: NaiveDate) -> Result<bool> {
        Ok(self
            .read_all()?
            .iter()
            .any(|r| r.observed_at.date_naive() == today))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.rates.len()?)
    }
}
