use bigdecimal::BigDecimal;

use crate::error::Result;
use crate::ledger::model::{Balance, NewTransaction, Transaction};
use crate::ledger::orders::{
    Fulfilment, NewOrderRequest, OrderNotification, OrderRequest, OrderStatus, OrderTransition, StatusChange,
};

pub mod connect;
pub mod memory;
pub mod models;
pub mod mutations;
pub mod postgres;
pub mod queries;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub farmer_id: Option<String>,
    pub dealer_id: Option<String>,
}

impl TransactionFilter {
    pub fn pair(farmer_id: &str, dealer_id: &str) -> Self {
        Self {
            farmer_id: Some(farmer_id.to_string()),
            dealer_id: Some(dealer_id.to_string()),
        }
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.farmer_id.as_ref().map_or(true, |id| *id == tx.farmer_id)
            && self.dealer_id.as_ref().map_or(true, |id| *id == tx.dealer_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub farmer_id: Option<String>,
    pub dealer_id: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &OrderRequest) -> bool {
        self.farmer_id.as_ref().map_or(true, |id| *id == order.farmer_id)
            && self.dealer_id.as_ref().map_or(true, |id| *id == order.dealer_id)
            && self.status.map_or(true, |status| status == order.status)
    }
}

/// Persistence for the ledger.
///
/// Every write method is atomic: the balance read, the transaction insert and
/// the balance update either all happen or none do, and concurrent writers to
/// the same farmer-dealer pair are serialized. Inputs are validated by the
/// caller.
pub trait LedgerStore: Send + Sync {
    fn record_transaction(&self, entry: NewTransaction) -> Result<(Transaction, Balance)>;

    fn load_balance(&self, farmer_id: &str, dealer_id: &str) -> Result<Option<Balance>>;

    /// Oldest first.
    fn load_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    fn insert_order(&self, order: NewOrderRequest) -> Result<(OrderRequest, OrderNotification)>;

    fn load_order(&self, order_id: i64) -> Result<Option<OrderRequest>>;

    /// Newest first.
    fn load_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderRequest>>;

    /// Applies a status change, including the completion debit, in one unit.
    fn transition_order(&self, order_id: i64, change: &StatusChange) -> Result<OrderTransition>;

    /// Approves (when pending) and completes an order in one unit. Nothing is
    /// written unless both steps succeed.
    fn fulfil_order(&self, order_id: i64, actual_cost: Option<BigDecimal>) -> Result<Fulfilment>;

    /// Newest first.
    fn load_notifications(&self, recipient_id: &str) -> Result<Vec<OrderNotification>>;

    /// Returns false when no such notification exists.
    fn mark_notification_read(&self, notification_id: i64) -> Result<bool>;
}
