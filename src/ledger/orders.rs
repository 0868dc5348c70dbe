use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Signed, Zero};
use chrono::NaiveDateTime;

use crate::error::{LedgerError, Result};
use crate::idgen;
use crate::ledger::gate::BalanceCheck;
use crate::ledger::model::{post_entry, Balance, NewTransaction, Transaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Completed)
    }

    /// Checks that an order in this status may move to `next`.
    pub fn ensure_transition(&self, next: OrderStatus) -> Result<()> {
        use OrderStatus::*;
        if self.is_terminal() {
            return Err(LedgerError::InvalidTransition(format!("Cannot modify a {self} order")));
        }
        match (self, next) {
            (Pending, Approved) | (Pending, Rejected) | (Approved, Completed) => Ok(()),
            (from, to) => Err(LedgerError::InvalidTransition(format!(
                "Invalid status transition from {from} to {to}"
            ))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "approved" => Ok(OrderStatus::Approved),
            "rejected" => Ok(OrderStatus::Rejected),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(LedgerError::validation("status", format!("unknown order status {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub id: i64,
    pub farmer_id: String,
    pub dealer_id: String,
    pub dealer_name: String,
    pub order_type: String,
    pub quantity: BigDecimal,
    pub unit: String,
    pub status: OrderStatus,
    pub estimated_cost: Option<BigDecimal>,
    pub actual_cost: Option<BigDecimal>,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderRequest {
    pub farmer_id: String,
    pub dealer_id: String,
    pub dealer_name: String,
    pub order_type: String,
    pub quantity: BigDecimal,
    pub unit: String,
    pub estimated_cost: Option<BigDecimal>,
    pub note: Option<String>,
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(LedgerError::validation(field, "must not be empty"))
    } else {
        Ok(())
    }
}

fn require_positive(field: &'static str, value: &BigDecimal) -> Result<()> {
    if value.is_negative() || value.is_zero() {
        Err(LedgerError::validation(field, "must be greater than zero"))
    } else {
        Ok(())
    }
}

impl NewOrderRequest {
    pub fn validate(&self) -> Result<()> {
        require("farmer_id", &self.farmer_id)?;
        require("dealer_id", &self.dealer_id)?;
        require("dealer_name", &self.dealer_name)?;
        require("order_type", &self.order_type)?;
        require("unit", &self.unit)?;
        require_positive("quantity", &self.quantity)?;
        if let Some(cost) = &self.estimated_cost {
            require_positive("estimated_cost", cost)?;
        }
        Ok(())
    }

    pub fn into_order(self, now: NaiveDateTime) -> OrderRequest {
        OrderRequest {
            id: idgen::next_id(),
            farmer_id: self.farmer_id,
            dealer_id: self.dealer_id,
            dealer_name: self.dealer_name,
            order_type: self.order_type,
            quantity: self.quantity,
            unit: self.unit,
            status: OrderStatus::Pending,
            estimated_cost: self.estimated_cost,
            actual_cost: None,
            note: self.note,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A requested move of an order to a new status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub actual_cost: Option<BigDecimal>,
    pub note: Option<String>,
}

impl StatusChange {
    pub fn to(status: OrderStatus) -> Self {
        Self {
            status,
            actual_cost: None,
            note: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(cost) = &self.actual_cost {
            require_positive("actual_cost", cost)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientRole {
    Farmer,
    Dealer,
}

impl RecipientRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientRole::Farmer => "farmer",
            RecipientRole::Dealer => "dealer",
        }
    }
}

impl FromStr for RecipientRole {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "farmer" => Ok(RecipientRole::Farmer),
            "dealer" => Ok(RecipientRole::Dealer),
            other => Err(LedgerError::validation("recipient_role", format!("unknown role {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderNotification {
    pub id: i64,
    pub order_id: i64,
    pub recipient_id: String,
    pub recipient_role: RecipientRole,
    pub status: OrderStatus,
    pub message: String,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

impl OrderNotification {
    fn about(order: &OrderRequest, role: RecipientRole, message: String, now: NaiveDateTime) -> Self {
        let recipient_id = match role {
            RecipientRole::Farmer => order.farmer_id.clone(),
            RecipientRole::Dealer => order.dealer_id.clone(),
        };
        Self {
            id: idgen::next_id(),
            order_id: order.id,
            recipient_id,
            recipient_role: role,
            status: order.status,
            message,
            read: false,
            created_at: now,
        }
    }

    /// Tells the dealer about a freshly created order.
    pub fn order_created(order: &OrderRequest, now: NaiveDateTime) -> Self {
        let message = format!(
            "New order request: {} {} {}",
            order.quantity, order.unit, order.order_type
        );
        Self::about(order, RecipientRole::Dealer, message, now)
    }
}

/// The debit written when an order completes.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDebit {
    pub transaction: Transaction,
    pub balance: Balance,
    pub check: BalanceCheck,
}

/// Everything a store has to write for one status change.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTransition {
    pub order: OrderRequest,
    pub debit: Option<OrderDebit>,
    pub notification: OrderNotification,
}

impl OrderTransition {
    pub fn warning(&self) -> Option<String> {
        self.debit.as_ref().and_then(|debit| debit.check.warning())
    }
}

/// Cost an order is settled for: the explicit completion cost, else the cost
/// already on the order, else its estimate.
pub fn settlement_cost(order: &OrderRequest, change: &StatusChange) -> Result<BigDecimal> {
    let cost = change
        .actual_cost
        .clone()
        .or_else(|| order.actual_cost.clone())
        .or_else(|| order.estimated_cost.clone())
        .ok_or_else(|| LedgerError::validation("actual_cost", "order has no cost to settle"))?;
    require_positive("actual_cost", &cost)?;
    Ok(cost)
}

/// Computes the writes for moving `order` to `change.status`.
///
/// `balance` is the pair's current balance and is only consulted when the
/// order completes; stores read it (locked) before calling this.
pub fn plan_transition(
    order: &OrderRequest,
    change: &StatusChange,
    balance: Option<Balance>,
    now: NaiveDateTime,
) -> Result<OrderTransition> {
    order.status.ensure_transition(change.status)?;
    change.validate()?;

    let mut updated = order.clone();
    updated.status = change.status;
    updated.updated_at = now;
    if change.note.is_some() {
        updated.note = change.note.clone();
    }
    if let Some(cost) = &change.actual_cost {
        updated.actual_cost = Some(cost.clone());
    }

    let debit = if change.status == OrderStatus::Completed {
        let cost = settlement_cost(order, change)?;
        let current = balance.as_ref().map(|b| b.net_balance.clone()).unwrap_or_else(BigDecimal::zero);
        let check = BalanceCheck::evaluate(current, cost.clone());
        let entry = NewTransaction {
            farmer_id: order.farmer_id.clone(),
            dealer_id: order.dealer_id.clone(),
            dealer_name: order.dealer_name.clone(),
            kind: TransactionType::Debit,
            amount: cost.clone(),
            description: format!("Order: {} {} {}", order.quantity, order.unit, order.order_type),
            category: "order".to_string(),
            order_id: Some(order.id),
        };
        let (transaction, balance) = post_entry(entry, balance, now);
        updated.actual_cost = Some(cost);
        Some(OrderDebit {
            transaction,
            balance,
            check,
        })
    } else {
        None
    };

    let message = match (&updated.status, &debit) {
        (OrderStatus::Approved, _) => format!("Your {} order has been approved", updated.order_type),
        (OrderStatus::Rejected, _) => format!("Your {} order has been rejected", updated.order_type),
        (OrderStatus::Completed, Some(debit)) => {
            let mut message = format!(
                "Your {} order has been completed; {} debited",
                updated.order_type, debit.transaction.amount
            );
            if let Some(warning) = debit.check.warning() {
                message.push_str("; ");
                message.push_str(&warning);
            }
            message
        }
        (status, _) => format!("Your {} order is now {}", updated.order_type, status),
    };
    let notification = OrderNotification::about(&updated, RecipientRole::Farmer, message, now);

    Ok(OrderTransition {
        order: updated,
        debit,
        notification,
    })
}

/// Both steps of a one-shot fulfilment.
#[derive(Debug, Clone, PartialEq)]
pub struct Fulfilment {
    /// Present when the order was still pending.
    pub approval: Option<OrderTransition>,
    pub completion: OrderTransition,
}

/// Plans approve-then-complete as one unit: if completion would fail, the
/// approval is never produced either.
pub fn plan_fulfilment(
    order: &OrderRequest,
    actual_cost: Option<BigDecimal>,
    balance: Option<Balance>,
    now: NaiveDateTime,
) -> Result<Fulfilment> {
    let approval = if order.status == OrderStatus::Pending {
        Some(plan_transition(order, &StatusChange::to(OrderStatus::Approved), None, now)?)
    } else {
        None
    };
    let approved = approval.as_ref().map_or(order, |approval| &approval.order);
    let change = StatusChange {
        status: OrderStatus::Completed,
        actual_cost,
        note: None,
    };
    let completion = plan_transition(approved, &change, balance, now)?;
    Ok(Fulfilment { approval, completion })
}
