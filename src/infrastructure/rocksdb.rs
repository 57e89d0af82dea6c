use crate::domain::order::{Order, OrderCriteria, OrderId, OrderUpdate};
use crate::domain::ports::OrderRepository;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing orders.
pub const CF_ORDERS: &str = "orders";

/// A persistent order store backed by RocksDB.
///
/// Orders are serialized as JSON under their big-endian id. `update` runs its
/// read-modify-write under a single writer lock so concurrent updates do not
/// overwrite each other.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbOrderRepository {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

impl RocksDbOrderRepository {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_orders])?;

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }

    fn read(&self, order_id: OrderId) -> Result<Option<Order>> {
        let cf = self.orders_cf()?;
        match self.db.get_cf(cf, order_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&self, order: &Order) -> Result<()> {
        let cf = self.orders_cf()?;
        self.db
            .put_cf(cf, order.id.to_be_bytes(), serde_json::to_vec(order)?)?;
        Ok(())
    }

    fn orders_cf(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_ORDERS)
            .ok_or_else(|| PaymentError::processing_error("Orders column family not found"))
    }
}

#[async_trait]
impl OrderRepository for RocksDbOrderRepository {
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        self.read(order_id)
    }

    async fn update(&self, order_id: OrderId, changes: OrderUpdate) -> Result<bool> {
        let _guard = self.writer.lock().await;
        match self.read(order_id)? {
            Some(mut order) => {
                order.apply(&changes);
                self.write(&order)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by(&self, criteria: &OrderCriteria) -> Result<Vec<Order>> {
        let cf = self.orders_cf()?;
        let mut orders = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let order: Order = serde_json::from_slice(&value)?;
            if criteria.matches(&order) {
                orders.push(order);
            }
        }

        Ok(orders)
    }

    async fn insert(&self, order: Order) -> Result<()> {
        let _guard = self.writer.lock().await;
        self.write(&order)
    }
}
