use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use bigdecimal::BigDecimal;

use crate::database::{LedgerStore, OrderFilter, TransactionFilter};
use crate::error::{LedgerError, Result};
use crate::ledger::model::{pair_key, post_entry, Balance, NewTransaction, Transaction};
use crate::ledger::orders::{
    plan_fulfilment, plan_transition, Fulfilment, NewOrderRequest, OrderNotification, OrderRequest, OrderStatus,
    OrderTransition, StatusChange,
};

#[derive(Default)]
struct State {
    transactions: Vec<Transaction>,
    balances: HashMap<String, Balance>,
    orders: BTreeMap<i64, OrderRequest>,
    notifications: Vec<OrderNotification>,
}

impl State {
    fn order(&self, order_id: i64) -> Result<OrderRequest> {
        self.orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("order request", order_id))
    }

    fn apply(&mut self, transition: &OrderTransition) {
        if let Some(debit) = &transition.debit {
            self.transactions.push(debit.transaction.clone());
            self.balances.insert(debit.balance.pair_key(), debit.balance.clone());
        }
        self.orders.insert(transition.order.id, transition.order.clone());
        self.notifications.push(transition.notification.clone());
    }
}

/// Process-local store. One mutex guards all collections, so every write is
/// serialized and atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))
    }
}

fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

impl LedgerStore for MemoryStore {
    fn record_transaction(&self, entry: NewTransaction) -> Result<(Transaction, Balance)> {
        let mut state = self.state()?;
        let key = pair_key(&entry.farmer_id, &entry.dealer_id);
        let current = state.balances.get(&key).cloned();
        let (tx, balance) = post_entry(entry, current, now());
        state.transactions.push(tx.clone());
        state.balances.insert(key, balance.clone());
        Ok((tx, balance))
    }

    fn load_balance(&self, farmer_id: &str, dealer_id: &str) -> Result<Option<Balance>> {
        let state = self.state()?;
        Ok(state.balances.get(&pair_key(farmer_id, dealer_id)).cloned())
    }

    fn load_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let state = self.state()?;
        Ok(state
            .transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect())
    }

    fn insert_order(&self, order: NewOrderRequest) -> Result<(OrderRequest, OrderNotification)> {
        let mut state = self.state()?;
        let at = now();
        let order = order.into_order(at);
        let notification = OrderNotification::order_created(&order, at);
        state.orders.insert(order.id, order.clone());
        state.notifications.push(notification.clone());
        Ok((order, notification))
    }

    fn load_order(&self, order_id: i64) -> Result<Option<OrderRequest>> {
        Ok(self.state()?.orders.get(&order_id).cloned())
    }

    fn load_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderRequest>> {
        let state = self.state()?;
        let mut orders: Vec<OrderRequest> = state
            .orders
            .values()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    fn transition_order(&self, order_id: i64, change: &StatusChange) -> Result<OrderTransition> {
        let mut state = self.state()?;
        let order = state.order(order_id)?;
        let balance = if change.status == OrderStatus::Completed {
            state.balances.get(&pair_key(&order.farmer_id, &order.dealer_id)).cloned()
        } else {
            None
        };

        let transition = plan_transition(&order, change, balance, now())?;
        state.apply(&transition);
        Ok(transition)
    }

    fn fulfil_order(&self, order_id: i64, actual_cost: Option<BigDecimal>) -> Result<Fulfilment> {
        let mut state = self.state()?;
        let order = state.order(order_id)?;
        let balance = state.balances.get(&pair_key(&order.farmer_id, &order.dealer_id)).cloned();

        let fulfilment = plan_fulfilment(&order, actual_cost, balance, now())?;
        if let Some(approval) = &fulfilment.approval {
            state.apply(approval);
        }
        state.apply(&fulfilment.completion);
        Ok(fulfilment)
    }

    fn load_notifications(&self, recipient_id: &str) -> Result<Vec<OrderNotification>> {
        let state = self.state()?;
        let mut notifications: Vec<OrderNotification> = state
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notifications)
    }

    fn mark_notification_read(&self, notification_id: i64) -> Result<bool> {
        let mut state = self.state()?;
        match state.notifications.iter_mut().find(|n| n.id == notification_id) {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
