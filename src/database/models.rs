use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::error::Result;
use crate::ledger::model::{pair_key, Balance, Transaction};
use crate::ledger::orders::{OrderNotification, OrderRequest};

#[derive(Queryable)]
pub struct BalanceRow {
    pub pair_key: String,
    pub farmer_id: String,
    pub dealer_id: String,
    pub dealer_name: String,
    pub credit_balance: BigDecimal,
    pub debit_balance: BigDecimal,
    pub net_balance: BigDecimal,
    pub last_updated: NaiveDateTime,
}

impl From<BalanceRow> for Balance {
    fn from(row: BalanceRow) -> Self {
        debug_assert_eq!(row.pair_key, pair_key(&row.farmer_id, &row.dealer_id));
        Balance {
            farmer_id: row.farmer_id,
            dealer_id: row.dealer_id,
            dealer_name: row.dealer_name,
            credit_balance: row.credit_balance,
            debit_balance: row.debit_balance,
            net_balance: row.net_balance,
            last_updated: row.last_updated,
        }
    }
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = crate::schema::farmer_transactions)]
pub struct TransactionRow {
    pub id: i64,
    pub farmer_id: String,
    pub dealer_id: String,
    pub dealer_name: String,
    pub kind: String,
    pub amount: BigDecimal,
    pub description: String,
    pub category: String,
    pub order_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

impl TransactionRow {
    pub fn into_transaction(self) -> Result<Transaction> {
        Ok(Transaction {
            id: self.id,
            kind: self.kind.parse()?,
            farmer_id: self.farmer_id,
            dealer_id: self.dealer_id,
            dealer_name: self.dealer_name,
            amount: self.amount,
            description: self.description,
            category: self.category,
            order_id: self.order_id,
            timestamp: self.created_at,
        })
    }
}

impl From<&Transaction> for TransactionRow {
    fn from(tx: &Transaction) -> Self {
        TransactionRow {
            id: tx.id,
            farmer_id: tx.farmer_id.clone(),
            dealer_id: tx.dealer_id.clone(),
            dealer_name: tx.dealer_name.clone(),
            kind: tx.kind.as_str().to_string(),
            amount: tx.amount.clone(),
            description: tx.description.clone(),
            category: tx.category.clone(),
            order_id: tx.order_id,
            created_at: tx.timestamp,
        }
    }
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = crate::schema::order_requests)]
pub struct OrderRow {
    pub id: i64,
    pub farmer_id: String,
    pub dealer_id: String,
    pub dealer_name: String,
    pub order_type: String,
    pub quantity: BigDecimal,
    pub unit: String,
    pub status: String,
    pub estimated_cost: Option<BigDecimal>,
    pub actual_cost: Option<BigDecimal>,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl OrderRow {
    pub fn into_order(self) -> Result<OrderRequest> {
        Ok(OrderRequest {
            id: self.id,
            status: self.status.parse()?,
            farmer_id: self.farmer_id,
            dealer_id: self.dealer_id,
            dealer_name: self.dealer_name,
            order_type: self.order_type,
            quantity: self.quantity,
            unit: self.unit,
            estimated_cost: self.estimated_cost,
            actual_cost: self.actual_cost,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<&OrderRequest> for OrderRow {
    fn from(order: &OrderRequest) -> Self {
        OrderRow {
            id: order.id,
            farmer_id: order.farmer_id.clone(),
            dealer_id: order.dealer_id.clone(),
            dealer_name: order.dealer_name.clone(),
            order_type: order.order_type.clone(),
            quantity: order.quantity.clone(),
            unit: order.unit.clone(),
            status: order.status.as_str().to_string(),
            estimated_cost: order.estimated_cost.clone(),
            actual_cost: order.actual_cost.clone(),
            note: order.note.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = crate::schema::order_notifications)]
pub struct NotificationRow {
    pub id: i64,
    pub order_id: i64,
    pub recipient_id: String,
    pub recipient_role: String,
    pub status: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

impl NotificationRow {
    pub fn into_notification(self) -> Result<OrderNotification> {
        Ok(OrderNotification {
            id: self.id,
            order_id: self.order_id,
            recipient_id: self.recipient_id,
            recipient_role: self.recipient_role.parse()?,
            status: self.status.parse()?,
            message: self.message,
            read: self.is_read,
            created_at: self.created_at,
        })
    }
}

impl From<&OrderNotification> for NotificationRow {
    fn from(notification: &OrderNotification) -> Self {
        NotificationRow {
            id: notification.id,
            order_id: notification.order_id,
            recipient_id: notification.recipient_id.clone(),
            recipient_role: notification.recipient_role.as_str().to_string(),
            status: notification.status.as_str().to_string(),
            message: notification.message.clone(),
            is_read: notification.read,
            created_at: notification.created_at,
        }
    }
}
