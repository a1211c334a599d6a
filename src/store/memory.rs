use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::OrderStore;
use crate::error::AppError;
use crate::models::order::{NewOrder, Order, OrderPatch};

pub struct InMemoryOrderStore {
    orders: DashMap<u64, Order>,
    next_id: AtomicU64,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let order = Order {
            id,
            user_id: order.user_id,
            created_at: Utc::now(),
            car_number: order.car_number,
            address_from: order.address_from,
            address_to: order.address_to,
            distance_km: order.distance_km,
            cargo_type: None,
            load_amount: None,
            unload_amount: None,
            remainder: None,
        };

        self.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: u64) -> Result<Option<Order>, AppError> {
        Ok(self.orders.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, id: u64, patch: OrderPatch) -> Result<Option<Order>, AppError> {
        let Some(mut order) = self.orders.get_mut(&id) else {
            return Ok(None);
        };

        order.apply(patch);
        Ok(Some(order.clone()))
    }

    async fn list_recent(&self, user_id: i64, limit: usize) -> Result<Vec<Order>, AppError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();

        orders.sort_by(|a, b| b.id.cmp(&a.id));
        orders.truncate(limit);
        Ok(orders)
    }

    async fn count(&self) -> Result<usize, AppError> {
        Ok(self.orders.len())
    }
}
