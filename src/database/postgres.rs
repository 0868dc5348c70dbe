use std::ops::DerefMut;

use bigdecimal::BigDecimal;

use crate::database::connect::DbPool;
use crate::database::{mutations, queries, LedgerStore, OrderFilter, TransactionFilter};
use crate::error::Result;
use crate::ledger::model::{Balance, NewTransaction, Transaction};
use crate::ledger::orders::{
    Fulfilment, NewOrderRequest, OrderNotification, OrderRequest, OrderTransition, StatusChange,
};

/// PostgreSQL-backed store. Pair balances are serialized with row locks.
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl LedgerStore for PgStore {
    fn record_transaction(&self, entry: NewTransaction) -> Result<(Transaction, Balance)> {
        let mut conn = self.pool.get()?;
        mutations::record_transaction(conn.deref_mut(), entry)
    }

    fn load_balance(&self, farmer_id: &str, dealer_id: &str) -> Result<Option<Balance>> {
        let mut conn = self.pool.get()?;
        queries::load_balance(conn.deref_mut(), farmer_id, dealer_id)
    }

    fn load_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut conn = self.pool.get()?;
        queries::load_transactions(conn.deref_mut(), filter)
    }

    fn insert_order(&self, order: NewOrderRequest) -> Result<(OrderRequest, OrderNotification)> {
        let mut conn = self.pool.get()?;
        mutations::insert_order(conn.deref_mut(), order)
    }

    fn load_order(&self, order_id: i64) -> Result<Option<OrderRequest>> {
        let mut conn = self.pool.get()?;
        queries::load_order(conn.deref_mut(), order_id)
    }

    fn load_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderRequest>> {
        let mut conn = self.pool.get()?;
        queries::load_orders(conn.deref_mut(), filter)
    }

    fn transition_order(&self, order_id: i64, change: &StatusChange) -> Result<OrderTransition> {
        let mut conn = self.pool.get()?;
        mutations::transition_order(conn.deref_mut(), order_id, change)
    }

    fn fulfil_order(&self, order_id: i64, actual_cost: Option<BigDecimal>) -> Result<Fulfilment> {
        let mut conn = self.pool.get()?;
        mutations::fulfil_order(conn.deref_mut(), order_id, actual_cost)
    }

    fn load_notifications(&self, recipient_id: &str) -> Result<Vec<OrderNotification>> {
        let mut conn = self.pool.get()?;
        queries::load_notifications(conn.deref_mut(), recipient_id)
    }

    fn mark_notification_read(&self, notification_id: i64) -> Result<bool> {
        let mut conn = self.pool.get()?;
        mutations::mark_notification_read(conn.deref_mut(), notification_id)
    }
}
