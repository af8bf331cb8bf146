//! Document storage on top of Sled.
//!
//! Each entity lives in its own collection, made of three trees:
//! - `<name>`: JSON documents keyed by the 16 id bytes
//! - `<name>_by_owner`: empty values keyed by `owner ++ id`, for per-user listing
//! - `<name>_unique`: unique key -> id, for the one-per-user style invariants
//!
//! Every mutation touches the three trees in a single Sled transaction, so a
//! unique key can never be claimed twice.

use std::marker::PhantomData;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{
    abort, ConflictableTransactionResult, TransactionError, TransactionalTree,
};
use sled::{Db, Transactional, Tree};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CoreValues, DailyTask, Goal, MissionPurpose, User, Vision};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("corrupt key in collection {0}")]
    CorruptKey(&'static str),

    #[error("duplicate key {key:?} in collection {collection}")]
    Duplicate {
        collection: &'static str,
        key: String,
    },

    #[error("record not found in collection {collection}")]
    NotFound { collection: &'static str },
}

impl From<TransactionError<StorageError>> for StorageError {
    fn from(err: TransactionError<StorageError>) -> Self {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => StorageError::Sled(e),
        }
    }
}

/// A document that can be stored in a [`Collection`].
pub trait Record: Serialize + DeserializeOwned {
    /// Tree name of the collection.
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;

    /// The user owning this record.
    fn owner_id(&self) -> Uuid;

    /// Key that must be unique across the collection, if any.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

/// Typed view over the trees of one collection.
#[derive(Clone)]
pub struct Collection<T> {
    docs: Tree,
    by_owner: Tree,
    unique: Tree,
    _record: PhantomData<fn() -> T>,
}

fn owner_key(owner: Uuid, id: Uuid) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(owner.as_bytes());
    key[16..].copy_from_slice(id.as_bytes());
    key
}

impl<T: Record> Collection<T> {
    fn open(db: &Db) -> Result<Self, StorageError> {
        Ok(Self {
            docs: db.open_tree(T::COLLECTION)?,
            by_owner: db.open_tree(format!("{}_by_owner", T::COLLECTION))?,
            unique: db.open_tree(format!("{}_unique", T::COLLECTION))?,
            _record: PhantomData,
        })
    }

    /// Insert a new record. Fails with [`StorageError::Duplicate`] if its
    /// unique key is already taken.
    pub fn insert(&self, record: &T) -> Result<(), StorageError> {
        let id = record.id();
        let bytes = serde_json::to_vec(record)?;
        let index_key = owner_key(record.owner_id(), id);
        let unique_key = record.unique_key();

        (&self.docs, &self.by_owner, &self.unique).transaction(
            |(docs, by_owner, unique)| -> ConflictableTransactionResult<(), StorageError> {
                if let Some(key) = &unique_key {
                    claim_unique::<T>(unique, key, id)?;
                }
                docs.insert(id.as_bytes().as_slice(), bytes.as_slice())?;
                by_owner.insert(index_key.as_slice(), &[] as &[u8])?;
                Ok(())
            },
        )?;
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<Option<T>, StorageError> {
        match self.docs.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All records owned by `owner`, in id order.
    pub fn find_by_owner(&self, owner: Uuid) -> Result<Vec<T>, StorageError> {
        let mut records = Vec::new();
        for item in self.by_owner.scan_prefix(owner.as_bytes()) {
            let (key, _) = item?;
            let id = Uuid::from_slice(&key[16..])
                .map_err(|_| StorageError::CorruptKey(T::COLLECTION))?;
            if let Some(record) = self.get(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub fn find_one_by_owner(&self, owner: Uuid) -> Result<Option<T>, StorageError> {
        Ok(self.find_by_owner(owner)?.into_iter().next())
    }

    /// Look a record up through its unique key.
    pub fn find_by_unique(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.unique.get(key.as_bytes())? {
            Some(id) => {
                let id = Uuid::from_slice(&id)
                    .map_err(|_| StorageError::CorruptKey(T::COLLECTION))?;
                self.get(id)
            }
            None => Ok(None),
        }
    }

    /// Overwrite an existing record. The owner is not expected to change; the
    /// unique key may, in which case the new key is claimed first. Fails with
    /// [`StorageError::NotFound`] if the record was removed in the meantime.
    pub fn replace(&self, record: &T) -> Result<(), StorageError> {
        let id = record.id();
        let bytes = serde_json::to_vec(record)?;
        let new_key = record.unique_key();

        (&self.docs, &self.unique).transaction(
            |(docs, unique)| -> ConflictableTransactionResult<(), StorageError> {
                let Some(old) = docs.get(id.as_bytes().as_slice())? else {
                    return abort(StorageError::NotFound {
                        collection: T::COLLECTION,
                    });
                };
                let old_key = decode::<T>(&old)?.unique_key();
                if old_key != new_key {
                    if let Some(key) = &new_key {
                        claim_unique::<T>(unique, key, id)?;
                    }
                    if let Some(key) = &old_key {
                        unique.remove(key.as_bytes())?;
                    }
                }
                docs.insert(id.as_bytes().as_slice(), bytes.as_slice())?;
                Ok(())
            },
        )?;
        Ok(())
    }

    /// Delete a record and its index entries. Returns the removed record.
    pub fn remove(&self, id: Uuid) -> Result<Option<T>, StorageError> {
        let removed = (&self.docs, &self.by_owner, &self.unique).transaction(
            |(docs, by_owner, unique)| -> ConflictableTransactionResult<Option<T>, StorageError> {
                let Some(bytes) = docs.remove(id.as_bytes().as_slice())? else {
                    return Ok(None);
                };
                let record = decode::<T>(&bytes)?;
                by_owner.remove(owner_key(record.owner_id(), id).as_slice())?;
                if let Some(key) = record.unique_key() {
                    // Only release the key if it still points at this record
                    if unique.get(key.as_bytes())?.as_deref() == Some(id.as_bytes().as_slice()) {
                        unique.remove(key.as_bytes())?;
                    }
                }
                Ok(Some(record))
            },
        )?;
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

fn claim_unique<T: Record>(
    unique: &TransactionalTree,
    key: &str,
    id: Uuid,
) -> ConflictableTransactionResult<(), StorageError> {
    if let Some(holder) = unique.get(key.as_bytes())? {
        if holder.as_ref() != id.as_bytes().as_slice() {
            return abort(StorageError::Duplicate {
                collection: T::COLLECTION,
                key: key.to_string(),
            });
        }
    }
    unique.insert(key.as_bytes(), id.as_bytes().as_slice())?;
    Ok(())
}

fn decode<T: Record>(bytes: &[u8]) -> ConflictableTransactionResult<T, StorageError> {
    serde_json::from_slice(bytes).or_else(|e| abort(StorageError::Encoding(e)))
}

/// Handle to every collection of the application. Cheap to clone (Sled
/// handles are reference counted).
#[derive(Clone)]
pub struct Storage {
    db: Db,
    users: Collection<User>,
    core_values: Collection<CoreValues>,
    mission_purposes: Collection<MissionPurpose>,
    visions: Collection<Vision>,
    goals: Collection<Goal>,
    tasks: Collection<DailyTask>,
}

impl Storage {
    /// Open or create the Sled database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::from_db(sled::open(path)?)
    }

    /// In-memory database that is dropped with the last handle. Used by tests.
    pub fn temporary() -> Result<Self, StorageError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self, StorageError> {
        Ok(Self {
            users: Collection::open(&db)?,
            core_values: Collection::open(&db)?,
            mission_purposes: Collection::open(&db)?,
            visions: Collection::open(&db)?,
            goals: Collection::open(&db)?,
            tasks: Collection::open(&db)?,
            db,
        })
    }

    pub fn users(&self) -> &Collection<User> {
        &self.users
    }

    pub fn core_values(&self) -> &Collection<CoreValues> {
        &self.core_values
    }

    pub fn mission_purposes(&self) -> &Collection<MissionPurpose> {
        &self.mission_purposes
    }

    pub fn visions(&self) -> &Collection<Vision> {
        &self.visions
    }

    pub fn goals(&self) -> &Collection<Goal> {
        &self.goals
    }

    pub fn tasks(&self) -> &Collection<DailyTask> {
        &self.tasks
    }

    /// Flush dirty pages to disk. Returns the number of bytes flushed.
    pub async fn flush(&self) -> Result<usize, StorageError> {
        Ok(self.db.flush_async().await?)
    }
}
