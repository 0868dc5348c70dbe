//! Farmer-dealer ledger: transactions, running balances, order requests.
//!
//! [`Ledger`] is the entry point. It validates input, hands atomic writes to a
//! [`LedgerStore`] and publishes what changed on its [`ChangeFeed`].

use std::sync::Arc;

use bigdecimal::{BigDecimal, Signed, Zero};
use tracing::{info, warn};

use crate::database::{LedgerStore, OrderFilter, TransactionFilter};
use crate::error::{LedgerError, Result};

pub mod feed;
pub mod gate;
pub mod model;
pub mod orders;
pub mod reconstruct;

use feed::{ChangeFeed, LedgerEvent, Subscription, Topic};
use gate::BalanceCheck;
use model::{Balance, NewTransaction, Transaction, TransactionType};
use orders::{NewOrderRequest, OrderNotification, OrderRequest, OrderStatus, OrderTransition, StatusChange};
use reconstruct::calculate_balances;

/// What a caller supplies to record a transaction for a pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDetails {
    pub kind: TransactionType,
    pub amount: BigDecimal,
    pub description: String,
    pub category: String,
    pub order_id: Option<i64>,
}

/// Stored balance of a pair next to the one rebuilt from its transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub stored: Option<Balance>,
    pub computed: Option<Balance>,
    pub consistent: bool,
}

#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    feed: ChangeFeed,
}

fn require_id(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(LedgerError::validation(field, "must not be empty"))
    } else {
        Ok(())
    }
}

// a stored row with no history is only fine while it is still all zero
fn balances_agree(stored: Option<&Balance>, computed: Option<&Balance>) -> bool {
    match (stored, computed) {
        (Some(stored), Some(computed)) => {
            stored.net_balance == computed.net_balance
                && stored.credit_balance == computed.credit_balance
                && stored.debit_balance == computed.debit_balance
        }
        (Some(stored), None) => {
            stored.net_balance.is_zero() && stored.credit_balance.is_zero() && stored.debit_balance.is_zero()
        }
        (None, Some(_)) => false,
        (None, None) => true,
    }
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            feed: ChangeFeed::new(),
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub fn subscribe(&self, topic: Topic) -> Subscription {
        self.feed.subscribe(topic)
    }

    pub fn record_transaction(
        &self,
        farmer_id: &str,
        dealer_id: &str,
        dealer_name: &str,
        details: TransactionDetails,
    ) -> Result<(Transaction, Balance)> {
        let entry = NewTransaction {
            farmer_id: farmer_id.to_string(),
            dealer_id: dealer_id.to_string(),
            dealer_name: dealer_name.to_string(),
            kind: details.kind,
            amount: details.amount,
            description: details.description,
            category: details.category,
            order_id: details.order_id,
        };
        entry.validate()?;

        let (transaction, balance) = self.store.record_transaction(entry)?;
        info!(
            transaction_id = transaction.id,
            farmer_id,
            dealer_id,
            kind = %transaction.kind,
            amount = %transaction.amount,
            net_balance = %balance.net_balance,
            "transaction recorded"
        );
        self.feed.publish(LedgerEvent::TransactionRecorded {
            transaction: transaction.clone(),
            balance: balance.clone(),
        });
        Ok((transaction, balance))
    }

    /// Stored balance of the pair, `None` before its first transaction.
    pub fn balance(&self, farmer_id: &str, dealer_id: &str) -> Result<Option<Balance>> {
        require_id("farmer_id", farmer_id)?;
        require_id("dealer_id", dealer_id)?;
        self.store.load_balance(farmer_id, dealer_id)
    }

    pub fn check_balance(&self, farmer_id: &str, dealer_id: &str, required: BigDecimal) -> Result<BalanceCheck> {
        if required.is_negative() {
            return Err(LedgerError::validation("amount", "must not be negative"));
        }
        let current = self
            .balance(farmer_id, dealer_id)?
            .map(|balance| balance.net_balance)
            .unwrap_or_else(BigDecimal::zero);
        Ok(BalanceCheck::evaluate(current, required))
    }

    pub fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.store.load_transactions(filter)
    }

    /// Balances of every dealer the farmer deals with, rebuilt from history.
    pub fn farmer_balances(&self, farmer_id: &str) -> Result<Vec<Balance>> {
        require_id("farmer_id", farmer_id)?;
        let filter = TransactionFilter {
            farmer_id: Some(farmer_id.to_string()),
            dealer_id: None,
        };
        Ok(calculate_balances(&self.store.load_transactions(&filter)?))
    }

    /// Balances of every farmer the dealer deals with, rebuilt from history.
    pub fn dealer_balances(&self, dealer_id: &str) -> Result<Vec<Balance>> {
        require_id("dealer_id", dealer_id)?;
        let filter = TransactionFilter {
            farmer_id: None,
            dealer_id: Some(dealer_id.to_string()),
        };
        Ok(calculate_balances(&self.store.load_transactions(&filter)?))
    }

    pub fn reconcile(&self, farmer_id: &str, dealer_id: &str) -> Result<Reconciliation> {
        let stored = self.balance(farmer_id, dealer_id)?;
        let history = self
            .store
            .load_transactions(&TransactionFilter::pair(farmer_id, dealer_id))?;
        let computed = calculate_balances(&history).into_iter().next();

        let consistent = balances_agree(stored.as_ref(), computed.as_ref());
        if !consistent {
            warn!(farmer_id, dealer_id, "stored balance does not match transaction history");
        }
        Ok(Reconciliation {
            stored,
            computed,
            consistent,
        })
    }

    pub fn create_order_request(&self, order: NewOrderRequest) -> Result<(OrderRequest, OrderNotification)> {
        order.validate()?;
        let (order, notification) = self.store.insert_order(order)?;
        info!(order_id = order.id, farmer_id = %order.farmer_id, dealer_id = %order.dealer_id, "order request created");
        self.feed.publish(LedgerEvent::OrderUpdated { order: order.clone() });
        Ok((order, notification))
    }

    pub fn order_request(&self, order_id: i64) -> Result<OrderRequest> {
        self.store
            .load_order(order_id)?
            .ok_or_else(|| LedgerError::not_found("order request", order_id))
    }

    pub fn order_requests(&self, filter: &OrderFilter) -> Result<Vec<OrderRequest>> {
        self.store.load_orders(filter)
    }

    pub fn update_order_status(&self, order_id: i64, change: StatusChange) -> Result<OrderTransition> {
        change.validate()?;
        let transition = self.store.transition_order(order_id, &change)?;
        self.announce(&transition);
        Ok(transition)
    }

    /// Approves a pending order and completes it in one go.
    ///
    /// An already approved order is only completed. Either both steps are
    /// stored or neither is.
    pub fn fulfil_order(&self, order_id: i64, actual_cost: Option<BigDecimal>) -> Result<OrderTransition> {
        let change = StatusChange {
            status: OrderStatus::Completed,
            actual_cost,
            note: None,
        };
        change.validate()?;
        let fulfilment = self.store.fulfil_order(order_id, change.actual_cost)?;
        if let Some(approval) = &fulfilment.approval {
            self.announce(approval);
        }
        self.announce(&fulfilment.completion);
        Ok(fulfilment.completion)
    }

    // logs a stored status change and publishes what it wrote
    fn announce(&self, transition: &OrderTransition) {
        let order = &transition.order;
        info!(order_id = order.id, status = %order.status, "order status updated");

        if let Some(debit) = &transition.debit {
            if let Some(warning) = debit.check.warning() {
                warn!(
                    order_id = order.id,
                    farmer_id = %order.farmer_id,
                    dealer_id = %order.dealer_id,
                    shortfall = %debit.check.shortfall,
                    "order completed on credit: {warning}"
                );
            }
            self.feed.publish(LedgerEvent::TransactionRecorded {
                transaction: debit.transaction.clone(),
                balance: debit.balance.clone(),
            });
        }
        self.feed.publish(LedgerEvent::OrderUpdated { order: order.clone() });
    }

    pub fn notifications(&self, recipient_id: &str) -> Result<Vec<OrderNotification>> {
        require_id("recipient_id", recipient_id)?;
        self.store.load_notifications(recipient_id)
    }

    pub fn mark_notification_read(&self, notification_id: i64) -> Result<()> {
        if self.store.mark_notification_read(notification_id)? {
            Ok(())
        } else {
            Err(LedgerError::not_found("notification", notification_id))
        }
    }
}
