use diesel::{ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl};

use crate::database::{models, OrderFilter, TransactionFilter};
use crate::error::Result;
use crate::ledger::model::{pair_key as balance_key, Balance, Transaction};
use crate::ledger::orders::{OrderNotification, OrderRequest};

pub fn load_balance(conn: &mut PgConnection, req_farmer_id: &str, req_dealer_id: &str) -> Result<Option<Balance>> {
    use crate::schema::farmer_balances::dsl::*;
    let balance = farmer_balances
        .filter(pair_key.eq(balance_key(req_farmer_id, req_dealer_id)))
        .first::<models::BalanceRow>(conn)
        .optional()?;
    Ok(balance.map(Balance::from))
}

pub fn load_transactions(conn: &mut PgConnection, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
    use crate::schema::farmer_transactions::dsl::*;
    let mut query = farmer_transactions.into_boxed();
    if let Some(req_farmer_id) = &filter.farmer_id {
        query = query.filter(farmer_id.eq(req_farmer_id));
    }
    if let Some(req_dealer_id) = &filter.dealer_id {
        query = query.filter(dealer_id.eq(req_dealer_id));
    }
    query
        .order((created_at.asc(), id.asc()))
        .load::<models::TransactionRow>(conn)?
        .into_iter()
        .map(models::TransactionRow::into_transaction)
        .collect()
}

pub fn load_order(conn: &mut PgConnection, req_order_id: i64) -> Result<Option<OrderRequest>> {
    use crate::schema::order_requests::dsl::*;
    order_requests
        .filter(id.eq(req_order_id))
        .first::<models::OrderRow>(conn)
        .optional()?
        .map(models::OrderRow::into_order)
        .transpose()
}

pub fn load_orders(conn: &mut PgConnection, filter: &OrderFilter) -> Result<Vec<OrderRequest>> {
    use crate::schema::order_requests::dsl::*;
    let mut query = order_requests.into_boxed();
    if let Some(req_farmer_id) = &filter.farmer_id {
        query = query.filter(farmer_id.eq(req_farmer_id));
    }
    if let Some(req_dealer_id) = &filter.dealer_id {
        query = query.filter(dealer_id.eq(req_dealer_id));
    }
    if let Some(req_status) = filter.status {
        query = query.filter(status.eq(req_status.as_str()));
    }
    query
        .order((created_at.desc(), id.desc()))
        .load::<models::OrderRow>(conn)?
        .into_iter()
        .map(models::OrderRow::into_order)
        .collect()
}

pub fn load_notifications(conn: &mut PgConnection, req_recipient_id: &str) -> Result<Vec<OrderNotification>> {
    use crate::schema::order_notifications::dsl::*;
    order_notifications
        .filter(recipient_id.eq(req_recipient_id))
        .order((created_at.desc(), id.desc()))
        .load::<models::NotificationRow>(conn)?
        .into_iter()
        .map(models::NotificationRow::into_notification)
        .collect()
}
