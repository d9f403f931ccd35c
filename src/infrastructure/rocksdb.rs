use crate::domain::payment::{Payment, PaymentDraft, PaymentId, PaymentNotification};
use crate::domain::ports::{InsertOutcome, NotificationStore, PaymentStore};
use crate::error::{CaptureError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Column Family for captured payments, keyed by transaction id.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for the append-only notification trail, keyed by sequence.
pub const CF_NOTIFICATIONS: &str = "notifications";

#[derive(Debug, Default)]
struct Counters {
    last_payment_id: u64,
    last_notification_seq: u64,
}

/// Persistent payment/notification store on RocksDB.
///
/// Payments live in their own column family keyed by `transaction_id`, so
/// the uniqueness invariant maps directly onto the key space; the counters
/// mutex serializes the check-then-put in `insert_if_absent`, which makes
/// the insert atomic for a single-process deployment.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    counters: Arc<Mutex<Counters>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at `path`, ensuring both column
    /// families exist and recovering the id/sequence counters from the
    /// stored data.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let cf_notifications = ColumnFamilyDescriptor::new(CF_NOTIFICATIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments, cf_notifications])
            .map_err(CaptureError::storage)?;

        let store = Self {
            db: Arc::new(db),
            counters: Arc::new(Mutex::new(Counters::default())),
        };
        store.recover_counters()?;
        Ok(store)
    }

    fn recover_counters(&self) -> Result<()> {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let payments = self.cf(CF_PAYMENTS)?;
        for entry in self.db.iterator_cf(payments, IteratorMode::Start) {
            let (_key, value) = entry.map_err(CaptureError::storage)?;
            let payment: Payment = serde_json::from_slice(&value).map_err(CaptureError::storage)?;
            counters.last_payment_id = counters.last_payment_id.max(payment.id.0);
        }

        let notifications = self.cf(CF_NOTIFICATIONS)?;
        if let Some(entry) = self.db.iterator_cf(notifications, IteratorMode::End).next() {
            let (key, _value) = entry.map_err(CaptureError::storage)?;
            let bytes: [u8; 8] = key.as_ref().try_into().map_err(|_| {
                CaptureError::storage(std::io::Error::other("malformed notification key"))
            })?;
            counters.last_notification_seq = u64::from_be_bytes(bytes);
        }

        Ok(())
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            CaptureError::storage(std::io::Error::other(format!(
                "{name} column family not found"
            )))
        })
    }

    /// Notifications recorded for `payment_id`, in append order.
    pub fn notifications_for(&self, payment_id: PaymentId) -> Result<Vec<PaymentNotification>> {
        let cf = self.cf(CF_NOTIFICATIONS)?;
        let mut out = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = entry.map_err(CaptureError::storage)?;
            let notification: PaymentNotification =
                serde_json::from_slice(&value).map_err(CaptureError::storage)?;
            if notification.payment_id == payment_id {
                out.push(notification);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl PaymentStore for RocksDbStore {
    async fn insert_if_absent(&self, draft: PaymentDraft) -> Result<InsertOutcome> {
        let cf = self.cf(CF_PAYMENTS)?;
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(bytes) = self
            .db
            .get_cf(cf, draft.transaction_id.as_bytes())
            .map_err(CaptureError::storage)?
        {
            let existing = serde_json::from_slice(&bytes).map_err(CaptureError::storage)?;
            return Ok(InsertOutcome::AlreadyExists(existing));
        }

        counters.last_payment_id += 1;
        let payment = draft.into_payment(PaymentId(counters.last_payment_id));
        let value = serde_json::to_vec(&payment).map_err(CaptureError::storage)?;
        self.db
            .put_cf(cf, payment.transaction_id.as_bytes(), value)
            .map_err(CaptureError::storage)?;

        Ok(InsertOutcome::Inserted(payment))
    }

    async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<Payment>> {
        let cf = self.cf(CF_PAYMENTS)?;
        match self
            .db
            .get_cf(cf, transaction_id.as_bytes())
            .map_err(CaptureError::storage)?
        {
            Some(bytes) => {
                let payment = serde_json::from_slice(&bytes).map_err(CaptureError::storage)?;
                Ok(Some(payment))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl NotificationStore for RocksDbStore {
    async fn append(&self, notification: PaymentNotification) -> Result<()> {
        let cf = self.cf(CF_NOTIFICATIONS)?;
        let seq = {
            let mut counters = self
                .counters
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            counters.last_notification_seq += 1;
            counters.last_notification_seq
        };
        let value = serde_json::to_vec(&notification).map_err(CaptureError::storage)?;
        self.db
            .put_cf(cf, seq.to_be_bytes(), value)
            .map_err(CaptureError::storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn draft(transaction_id: &str) -> PaymentDraft {
        PaymentDraft {
            transaction_id: transaction_id.into(),
            card_id: Some("card_abc".into()),
            card_last_digits: Some("1111".into()),
            installments: 12,
            item_ids: vec!["curso-python".into()],
        }
    }

    #[tokio::test]
    async fn open_creates_both_column_families() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).expect("failed to open RocksDB");
        assert!(store.db.cf_handle(CF_PAYMENTS).is_some());
        assert!(store.db.cf_handle(CF_NOTIFICATIONS).is_some());
    }

    #[tokio::test]
    async fn insert_if_absent_is_unique_per_transaction() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();

        let InsertOutcome::Inserted(payment) =
            store.insert_if_absent(draft("7656690")).await.unwrap()
        else {
            panic!("first insert must win");
        };

        let second = store.insert_if_absent(draft("7656690")).await.unwrap();
        assert_eq!(second, InsertOutcome::AlreadyExists(payment.clone()));

        let found = store.find_by_transaction("7656690").await.unwrap();
        assert_eq!(found, Some(payment));
        assert!(store.find_by_transaction("999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn counters_survive_a_reopen() {
        let dir = tempdir().unwrap();
        let first_id = {
            let store = RocksDbStore::open(dir.path()).unwrap();
            let InsertOutcome::Inserted(payment) =
                store.insert_if_absent(draft("1")).await.unwrap()
            else {
                panic!("insert failed");
            };
            payment.id
        };

        let store = RocksDbStore::open(dir.path()).unwrap();
        let InsertOutcome::Inserted(payment) = store.insert_if_absent(draft("2")).await.unwrap()
        else {
            panic!("insert failed");
        };
        assert!(payment.id > first_id);
    }

    #[tokio::test]
    async fn notifications_round_trip_in_append_order() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();

        store
            .append(PaymentNotification::paid(PaymentId(1)))
            .await
            .unwrap();
        store
            .append(PaymentNotification::paid(PaymentId(2)))
            .await
            .unwrap();
        store
            .append(PaymentNotification::paid(PaymentId(1)))
            .await
            .unwrap();

        let for_one = store.notifications_for(PaymentId(1)).unwrap();
        assert_eq!(for_one.len(), 2);
        let for_two = store.notifications_for(PaymentId(2)).unwrap();
        assert_eq!(for_two.len(), 1);
    }
}
