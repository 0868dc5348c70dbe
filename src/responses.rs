use actix_web::HttpResponse;
use chrono::NaiveDateTime;
use prost::Message;

use crate::error::LedgerError;
use crate::ledger::feed::LedgerEvent;
use crate::ledger::gate::BalanceCheck;
use crate::ledger::model::{Balance, Transaction};
use crate::ledger::orders::{OrderNotification, OrderRequest, OrderTransition};
use crate::ledger::Reconciliation;
use crate::proto::{
    error, BadParameterError, BalanceCheckData, BalanceData, Error, GenericOutput, InvalidTransitionError,
    LedgerEventData, NotFoundError, NotificationData, OrderData, OrderUpdate, ReconciliationData,
    TransactionData, TransactionRecorded,
};

fn timestamp(at: NaiveDateTime) -> String {
    at.and_utc().to_rfc3339()
}

pub fn balance_data(balance: &Balance) -> BalanceData {
    BalanceData {
        farmer_id: balance.farmer_id.clone(),
        dealer_id: balance.dealer_id.clone(),
        dealer_name: balance.dealer_name.clone(),
        credit_balance: balance.credit_balance.to_string(),
        debit_balance: balance.debit_balance.to_string(),
        net_balance: balance.net_balance.to_string(),
        last_updated: timestamp(balance.last_updated),
        is_overdraft: balance.is_overdraft(),
    }
}

pub fn transaction_data(tx: &Transaction) -> TransactionData {
    TransactionData {
        id: tx.id,
        farmer_id: tx.farmer_id.clone(),
        dealer_id: tx.dealer_id.clone(),
        dealer_name: tx.dealer_name.clone(),
        kind: tx.kind.to_string(),
        amount: tx.amount.to_string(),
        description: tx.description.clone(),
        category: tx.category.clone(),
        order_id: tx.order_id,
        timestamp: timestamp(tx.timestamp),
    }
}

pub fn balance_check_data(check: &BalanceCheck) -> BalanceCheckData {
    BalanceCheckData {
        sufficient: check.sufficient,
        current: check.current.to_string(),
        required: check.required.to_string(),
        shortfall: check.shortfall.to_string(),
    }
}

pub fn order_data(order: &OrderRequest) -> OrderData {
    OrderData {
        id: order.id,
        farmer_id: order.farmer_id.clone(),
        dealer_id: order.dealer_id.clone(),
        dealer_name: order.dealer_name.clone(),
        order_type: order.order_type.clone(),
        quantity: order.quantity.to_string(),
        unit: order.unit.clone(),
        status: order.status.to_string(),
        estimated_cost: order.estimated_cost.as_ref().map(ToString::to_string),
        actual_cost: order.actual_cost.as_ref().map(ToString::to_string),
        note: order.note.clone(),
        created_at: timestamp(order.created_at),
        updated_at: timestamp(order.updated_at),
    }
}

pub fn notification_data(notification: &OrderNotification) -> NotificationData {
    NotificationData {
        id: notification.id,
        order_id: notification.order_id,
        recipient_id: notification.recipient_id.clone(),
        recipient_role: notification.recipient_role.as_str().to_string(),
        status: notification.status.to_string(),
        message: notification.message.clone(),
        read: notification.read,
        created_at: timestamp(notification.created_at),
    }
}

pub fn transaction_recorded(tx: &Transaction, balance: &Balance) -> GenericOutput {
    GenericOutput {
        transaction_recorded: Some(TransactionRecorded {
            transaction: Some(transaction_data(tx)),
            balance: Some(balance_data(balance)),
        }),
        ok: true,
        ..Default::default()
    }
}

pub fn order_update(transition: &OrderTransition) -> GenericOutput {
    let debit = transition.debit.as_ref();
    GenericOutput {
        order_update: Some(OrderUpdate {
            order: Some(order_data(&transition.order)),
            transaction: debit.map(|d| transaction_data(&d.transaction)),
            balance: debit.map(|d| balance_data(&d.balance)),
            balance_check: debit.map(|d| balance_check_data(&d.check)),
            notification: Some(notification_data(&transition.notification)),
            warning: transition.warning(),
        }),
        ok: true,
        ..Default::default()
    }
}

pub fn reconciliation(report: &Reconciliation) -> GenericOutput {
    GenericOutput {
        reconciliation: Some(ReconciliationData {
            stored: report.stored.as_ref().map(balance_data),
            computed: report.computed.as_ref().map(balance_data),
            consistent: report.consistent,
        }),
        ok: true,
        ..Default::default()
    }
}

pub fn event_data(event: &LedgerEvent) -> LedgerEventData {
    match event {
        LedgerEvent::TransactionRecorded { transaction, balance } => LedgerEventData {
            kind: "transactionRecorded".to_string(),
            transaction: Some(transaction_data(transaction)),
            balance: Some(balance_data(balance)),
            order: None,
        },
        LedgerEvent::OrderUpdated { order } => LedgerEventData {
            kind: "orderUpdated".to_string(),
            transaction: None,
            balance: None,
            order: Some(order_data(order)),
        },
    }
}

fn error_output(one_error: error::OneError) -> GenericOutput {
    GenericOutput {
        error: Some(Error {
            one_error: Some(one_error),
        }),
        ..Default::default()
    }
}

pub fn bad_parameter(field: &str, reason: &str) -> GenericOutput {
    error_output(error::OneError::BadParameter(BadParameterError {
        name: field.to_string(),
        reason: reason.to_string(),
    }))
}

/// Envelope for a domain error, `None` for failures that are not the
/// caller's fault.
pub fn ledger_error(err: &LedgerError) -> Option<GenericOutput> {
    match err {
        LedgerError::Validation { field, reason } => Some(bad_parameter(field, reason)),
        LedgerError::NotFound { entity, id } => Some(error_output(error::OneError::NotFound(NotFoundError {
            entity: entity.to_string(),
            id: id.clone(),
        }))),
        LedgerError::InvalidTransition(message) => Some(error_output(error::OneError::InvalidTransition(
            InvalidTransitionError {
                message: message.clone(),
            },
        ))),
        LedgerError::Storage(_) | LedgerError::Pool(_) | LedgerError::Unavailable(_) => None,
    }
}

pub fn http_response(data: GenericOutput, is_protobuf: bool) -> HttpResponse {
    if is_protobuf {
        HttpResponse::Ok()
            .content_type("application/x-protobuf")
            .body(data.encode_to_vec())
    } else {
        HttpResponse::Ok().json(data)
    }
}
