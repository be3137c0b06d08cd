//! JSON-file-based storage backend.
//!
//! Keeps the cart in a single JSON file under a configurable directory
//! (default: `$XDG_DATA_HOME/wholesale-rs/`).

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::cart::CartItem;
use crate::error::{Result, WholesaleError};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "wholesale-rs";

/// File holding the serialized cart lines.
const CART_FILE: &str = "wholesale-cart.json";
/// Sentinel file used for cross-process file locking.
const LOCK_FILE: &str = "storage.lock";

/// File-backed storage that persists the cart as JSON.
///
/// The file holds the cart lines as a JSON array in the same camelCase
/// shape the web storefront keeps under its `wholesale-cart` local-storage
/// key.
///
/// # Concurrency
///
/// Thread safety within a single process is provided by an in-process
/// [`Mutex`]. Cross-process safety is achieved via an advisory file lock
/// on `storage.lock` (using [`std::fs::File::lock`] /
/// [`std::fs::File::lock_shared`]). Writes go to a temporary file that is
/// then renamed over the cart file, so readers never see a torn cart.
///
/// # File layout
///
/// ```text
/// <dir>/
///   storage.lock          (cross-process lock sentinel)
///   wholesale-cart.json
/// ```
#[derive(Debug)]
pub struct FileStorage {
    /// Directory containing the cart and lock files.
    dir: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
    /// Sentinel file for cross-process advisory locking.
    lock_file: fs::File,
}

impl FileStorage {
    /// Creates a new file storage rooted at the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist. Also
    /// opens (or creates) the `storage.lock` sentinel file used for
    /// cross-process advisory locking.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the lock
    /// file cannot be opened.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(storage_io_error)?;
        let lock_file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(storage_io_error)?;
        tracing::debug!(dir = %dir.display(), "opened cart storage");
        Ok(Self {
            dir,
            lock: Mutex::new(()),
            lock_file,
        })
    }

    /// Returns the default XDG-compliant data directory for this application.
    ///
    /// On Linux: `$XDG_DATA_HOME/wholesale-rs/` (typically
    /// `~/.local/share/wholesale-rs/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                WholesaleError::Storage("could not determine platform data directory".into())
            })
    }

    /// Path of the cart file.
    #[inline]
    #[must_use]
    pub fn cart_path(&self) -> PathBuf {
        self.dir.join(CART_FILE)
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Acquires an in-process mutex guard and a shared (read) file lock,
    /// executes `op`, then releases the file lock.
    fn with_shared_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock_shared().map_err(storage_io_error)?;
        let result = op();
        // An unlock failure only matters if the operation itself succeeded.
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Acquires an in-process mutex guard and an exclusive (write) file
    /// lock, executes `op`, then releases the file lock.
    fn with_exclusive_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock().map_err(storage_io_error)?;
        let result = op();
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Reads the cart file. Returns an empty `Vec` if it does not exist.
    fn read_items(&self) -> Result<Vec<CartItem>> {
        self.with_shared_lock(|| match fs::read_to_string(self.cart_path()) {
            Ok(contents) => serde_json::from_str(&contents).map_err(WholesaleError::from),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(storage_io_error(err)),
        })
    }

    /// Atomically writes the cart file (write-to-tmp then rename).
    fn write_items(&self, items: &[CartItem]) -> Result<()> {
        let json = serde_json::to_string_pretty(items).map_err(WholesaleError::from)?;
        self.with_exclusive_lock(|| {
            let tmp_path = self.dir.join(format!("{CART_FILE}.tmp"));
            fs::write(&tmp_path, &json).map_err(storage_io_error)?;
            fs::rename(&tmp_path, self.cart_path()).map_err(storage_io_error)?;
            tracing::trace!(lines = items.len(), "cart written");
            Ok(())
        })
    }

    /// Deletes the cart file.
    ///
    /// The `storage.lock` sentinel is preserved; it is infrastructure, not
    /// data.
    fn remove_items(&self) -> Result<()> {
        self.with_exclusive_lock(|| match fs::remove_file(self.cart_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_io_error(err)),
        })
    }
}

// ── Free-standing helpers ───────────────────────────────────────────────

/// Wraps an I/O error into a [`WholesaleError::Storage`].
fn storage_io_error(err: std::io::Error) -> WholesaleError {
    WholesaleError::Storage(Box::new(err))
}

/// Wraps a mutex poison error into a [`WholesaleError::Storage`].
fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> WholesaleError {
    WholesaleError::Storage(err.to_string().into())
}

// ── BlockingCartStorage implementation ──────────────────────────────────

#[cfg(feature = "blocking")]
impl super::BlockingCartStorage for FileStorage {
    #[inline]
    fn cart_items(&self) -> Result<Vec<CartItem>> {
        self.read_items()
    }

    #[inline]
    fn save_cart_items(&self, items: Vec<CartItem>) -> Result<()> {
        self.write_items(&items)
    }

    #[inline]
    fn clear_cart(&self) -> Result<()> {
        self.remove_items()
    }
}

// ── CartStorage (async) implementation ──────────────────────────────────

#[cfg(feature = "async")]
impl super::CartStorage for FileStorage {
    #[inline]
    fn cart_items(&self) -> impl Future<Output = Result<Vec<CartItem>>> + Send {
        core::future::ready(self.read_items())
    }

    #[inline]
    fn save_cart_items(&self, items: Vec<CartItem>) -> impl Future<Output = Result<()>> + Send {
        core::future::ready(self.write_items(&items))
    }

    #[inline]
    fn clear_cart(&self) -> impl Future<Output = Result<()>> + Send {
        core::future::ready(self.remove_items())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProductId, ProductSnapshot};
    use crate::pricing::TierPrices;

    /// Helper to create a [`FileStorage`] in a temporary directory.
    fn temp_storage() -> (FileStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        (storage, dir)
    }

    /// Creates a cart line for a product with flat pricing.
    fn test_item(id: &str, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::from(id),
            quantity,
            product: ProductSnapshot {
                id: ProductId::from(id),
                code: format!("BEV{id}"),
                name: format!("Product {id}"),
                description: None,
                image_url: None,
                prices: TierPrices::new(10.0, 9.0, 8.0, 7.0),
                category_id: None,
                category: None,
            },
        }
    }

    #[cfg(feature = "blocking")]
    mod blocking {
        use super::*;
        use crate::storage::BlockingCartStorage;

        #[test]
        fn empty_storage_returns_empty_cart() {
            let (storage, _dir) = temp_storage();
            assert!(storage.cart_items().unwrap().is_empty());
        }

        #[test]
        fn save_and_read_keeps_order() {
            let (storage, _dir) = temp_storage();
            storage
                .save_cart_items(vec![test_item("2", 5), test_item("1", 12)])
                .unwrap();

            let items = storage.cart_items().unwrap();
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].product_id, ProductId::from("2"));
            assert_eq!(items[1].quantity, 12);
        }

        #[test]
        fn save_replaces_previous_cart() {
            let (storage, _dir) = temp_storage();
            storage.save_cart_items(vec![test_item("1", 1)]).unwrap();
            storage.save_cart_items(vec![test_item("3", 4)]).unwrap();

            let items = storage.cart_items().unwrap();
            assert_eq!(items, vec![test_item("3", 4)]);
        }

        #[test]
        fn clear_removes_cart_file() {
            let (storage, _dir) = temp_storage();
            storage.save_cart_items(vec![test_item("1", 1)]).unwrap();
            storage.clear_cart().unwrap();

            assert!(!storage.cart_path().exists());
            assert!(storage.cart_items().unwrap().is_empty());
        }

        #[test]
        fn clear_without_cart_is_ok() {
            let (storage, _dir) = temp_storage();
            storage.clear_cart().unwrap();
        }

        #[test]
        fn corrupt_cart_is_a_serialization_error() {
            let (storage, _dir) = temp_storage();
            fs::write(storage.cart_path(), "{not json").unwrap();
            let err = storage.cart_items().unwrap_err();
            assert!(matches!(err, WholesaleError::Serialization(_)));
        }

        #[test]
        fn default_dir_returns_path() {
            let dir = FileStorage::default_dir();
            assert!(dir.is_ok());
        }
    }

    #[test]
    fn cart_file_uses_web_storefront_shape() {
        let (storage, _dir) = temp_storage();
        storage.write_items(&[test_item("1", 3)]).unwrap();
        let raw = fs::read_to_string(storage.cart_path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["productId"], "1");
        assert_eq!(json[0]["quantity"], 3);
        assert_eq!(json[0]["product"]["price_10"], 9.0);
    }

    #[test]
    fn lockfile_created_on_construction() {
        let (storage, _dir) = temp_storage();
        assert!(storage.dir.join(LOCK_FILE).exists());
    }

    #[test]
    fn clear_preserves_lockfile() {
        let (storage, _dir) = temp_storage();
        storage.write_items(&[test_item("1", 1)]).unwrap();
        storage.remove_items().unwrap();
        assert!(storage.dir.join(LOCK_FILE).exists());
        assert!(!storage.dir.join(format!("{CART_FILE}.tmp")).exists());
    }

    #[cfg(feature = "blocking")]
    #[test]
    fn concurrent_saves_leave_a_whole_cart() {
        use std::sync::Arc;
        use std::thread;

        use crate::storage::BlockingCartStorage;

        let (storage, _dir) = temp_storage();
        let storage = Arc::new(storage);
        let num_threads: u32 = 8;

        let handles: Vec<_> = (0..num_threads)
            .map(|thread_idx| {
                let storage = Arc::clone(&storage);
                thread::spawn(move || {
                    for round in 0..20_u32 {
                        let lines = (0..=thread_idx)
                            .map(|line| test_item(&format!("{thread_idx}-{line}"), round + 1))
                            .collect();
                        storage.save_cart_items(lines).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let items = storage.cart_items().unwrap();
        let writer = items[0].product_id.as_inner().split('-').next().unwrap();
        assert!(
            items
                .iter()
                .all(|item| item.product_id.as_inner().starts_with(&format!("{writer}-")))
        );
        assert_eq!(items.len(), writer.parse::<usize>().unwrap() + 1);
    }

    #[cfg(feature = "async")]
    mod async_tests {
        use super::*;
        use crate::storage::CartStorage;

        #[tokio::test]
        async fn save_and_read_cart() {
            let (storage, _dir) = temp_storage();
            storage
                .save_cart_items(vec![test_item("1", 10)])
                .await
                .unwrap();

            let items = storage.cart_items().await.unwrap();
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].unit_price(), 9.0);
        }
    }
}
