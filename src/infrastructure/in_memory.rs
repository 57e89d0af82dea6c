use crate::domain::order::{Order, OrderCriteria, OrderId, OrderUpdate};
use crate::domain::ports::OrderRepository;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory order store.
///
/// Orders are kept sorted by id so `find_by` returns them in a stable order.
#[derive(Default, Clone)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<BTreeMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&order_id).cloned())
    }

    async fn update(&self, order_id: OrderId, changes: OrderUpdate) -> Result<bool> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order_id) {
            Some(order) => {
                order.apply(&changes);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by(&self, criteria: &OrderCriteria) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|order| criteria.matches(order))
            .cloned()
            .collect())
    }

    async fn insert(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order);
        Ok(())
    }
}
