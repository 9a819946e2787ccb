use std::collections::HashMap;
use std::sync::RwLock;

use crate::credit::CreditRecord;
use crate::error::CreditPoolError;
use crate::CreditPoolResult;

/// Persistence for credit records, keyed by borrower.
pub trait CreditRecordStore: Send + Sync {
    fn get(&self, borrower: &str) -> CreditPoolResult<Option<CreditRecord>>;
    fn put(&self, record: CreditRecord) -> CreditPoolResult<()>;
    fn borrowers(&self) -> CreditPoolResult<Vec<String>>;
}

#[derive(Debug, Default)]
pub struct InMemoryCreditStore {
    records: RwLock<HashMap<String, CreditRecord>>,
}

impl InMemoryCreditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> CreditPoolError {
    CreditPoolError::StorageError("credit record store lock poisoned".into())
}

impl CreditRecordStore for InMemoryCreditStore {
    fn get(&self, borrower: &str) -> CreditPoolResult<Option<CreditRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(borrower).cloned())
    }

    fn put(&self, record: CreditRecord) -> CreditPoolResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.insert(record.borrower_id.clone(), record);
        Ok(())
    }

    fn borrowers(&self) -> CreditPoolResult<Vec<String>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut ids: Vec<String> = records.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::CreditType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_put_then_get() {
        let store = InMemoryCreditStore::new();
        assert!(store.get("alice").unwrap().is_none());
        store
            .put(CreditRecord::requested("alice", dec!(100), 1000, 30, 3, CreditType::InterestOnly))
            .unwrap();
        store
            .put(CreditRecord::requested("bob", dec!(100), 1000, 30, 3, CreditType::InterestOnly))
            .unwrap();
        assert_eq!(store.get("alice").unwrap().unwrap().credit_limit, dec!(100));
        assert_eq!(store.borrowers().unwrap(), vec!["alice".to_string(), "bob".to_string()]);
    }
}
