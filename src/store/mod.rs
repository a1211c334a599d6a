pub mod memory;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::order::{NewOrder, Order, OrderPatch};

pub use memory::InMemoryOrderStore;

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, order: NewOrder) -> Result<Order, AppError>;

    async fn get(&self, id: u64) -> Result<Option<Order>, AppError>;

    /// Applies `patch` to the stored order and returns the result, or `None`
    /// when no order has this id.
    async fn update(&self, id: u64, patch: OrderPatch) -> Result<Option<Order>, AppError>;

    async fn list_recent(&self, user_id: i64, limit: usize) -> Result<Vec<Order>, AppError>;

    async fn count(&self) -> Result<usize, AppError>;
}
