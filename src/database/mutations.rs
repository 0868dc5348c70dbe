use bigdecimal::BigDecimal;
use diesel::result::Error;
use diesel::{Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl};

use crate::database::models;
use crate::error::{LedgerError, Result};
use crate::ledger::model::{pair_key as balance_key, post_entry, Balance, NewTransaction, Transaction};
use crate::ledger::orders::{
    plan_fulfilment, plan_transition, Fulfilment, NewOrderRequest, OrderNotification, OrderRequest, OrderStatus,
    OrderTransition, StatusChange,
};

// creates an empty balance record for the pair, on conflict does nothing
fn init_pair_balance(conn: &mut PgConnection, req_farmer_id: &str, req_dealer_id: &str, req_dealer_name: &str) -> std::result::Result<bool, Error> {
    use crate::schema::farmer_balances::dsl::*;
    diesel::insert_into(farmer_balances)
        .values((
            pair_key.eq(balance_key(req_farmer_id, req_dealer_id)),
            farmer_id.eq(req_farmer_id),
            dealer_id.eq(req_dealer_id),
            dealer_name.eq(req_dealer_name),
            credit_balance.eq(BigDecimal::from(0)),
            debit_balance.eq(BigDecimal::from(0)),
            net_balance.eq(BigDecimal::from(0)),
            last_updated.eq(chrono::Utc::now().naive_utc()),
        ))
        .on_conflict(pair_key)
        .do_nothing()
        .execute(conn)
        .map(|res| res > 0)
}

// loads the pair balance and locks it until the surrounding transaction ends
fn lock_pair_balance(conn: &mut PgConnection, key: &str) -> std::result::Result<Balance, Error> {
    use crate::schema::farmer_balances::dsl::*;
    farmer_balances
        .filter(pair_key.eq(key))
        .for_update()
        .first::<models::BalanceRow>(conn)
        .map(Balance::from)
}

fn write_entry(conn: &mut PgConnection, tx: &Transaction, new_balance: &Balance) -> std::result::Result<(), Error> {
    {
        use crate::schema::farmer_transactions::dsl::*;
        diesel::insert_into(farmer_transactions)
            .values(&models::TransactionRow::from(tx))
            .execute(conn)?;
    }
    {
        use crate::schema::farmer_balances::dsl::*;
        diesel::update(farmer_balances.filter(pair_key.eq(new_balance.pair_key())))
            .set((
                dealer_name.eq(&new_balance.dealer_name),
                credit_balance.eq(&new_balance.credit_balance),
                debit_balance.eq(&new_balance.debit_balance),
                net_balance.eq(&new_balance.net_balance),
                last_updated.eq(new_balance.last_updated),
            ))
            .execute(conn)?;
    }
    Ok(())
}

fn insert_notification(conn: &mut PgConnection, notification: &OrderNotification) -> std::result::Result<(), Error> {
    use crate::schema::order_notifications::dsl::*;
    diesel::insert_into(order_notifications)
        .values(&models::NotificationRow::from(notification))
        .execute(conn)
        .map(|_| ())
}

/// Appends a transaction and moves the pair balance with it.
pub fn record_transaction(conn: &mut PgConnection, entry: NewTransaction) -> Result<(Transaction, Balance)> {
    init_pair_balance(conn, &entry.farmer_id, &entry.dealer_id, &entry.dealer_name)?;

    // wrap in transaction
    conn.transaction::<_, LedgerError, _>(|conn| {
        // reads first: the locked balance
        let key = balance_key(&entry.farmer_id, &entry.dealer_id);
        let current = lock_pair_balance(conn, &key)?;

        let (tx, balance) = post_entry(entry, Some(current), chrono::Utc::now().naive_utc());

        // then writes
        write_entry(conn, &tx, &balance)?;
        Ok((tx, balance))
    })
}

pub fn insert_order(conn: &mut PgConnection, new_order: NewOrderRequest) -> Result<(OrderRequest, OrderNotification)> {
    conn.transaction::<_, LedgerError, _>(|conn| {
        let now = chrono::Utc::now().naive_utc();
        let order = new_order.into_order(now);
        let notification = OrderNotification::order_created(&order, now);
        {
            use crate::schema::order_requests::dsl::*;
            diesel::insert_into(order_requests)
                .values(&models::OrderRow::from(&order))
                .execute(conn)?;
        }
        insert_notification(conn, &notification)?;
        Ok((order, notification))
    })
}

// loads the order and locks it so two status changes cannot both pass the state check
fn lock_order(conn: &mut PgConnection, req_order_id: i64) -> Result<OrderRequest> {
    use crate::schema::order_requests::dsl::*;
    order_requests
        .filter(id.eq(req_order_id))
        .for_update()
        .first::<models::OrderRow>(conn)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("order request", req_order_id))?
        .into_order()
}

fn write_transition(conn: &mut PgConnection, transition: &OrderTransition) -> std::result::Result<(), Error> {
    if let Some(debit) = &transition.debit {
        write_entry(conn, &debit.transaction, &debit.balance)?;
    }
    {
        use crate::schema::order_requests::dsl::*;
        let updated = &transition.order;
        diesel::update(order_requests.filter(id.eq(updated.id)))
            .set((
                status.eq(updated.status.as_str()),
                actual_cost.eq(&updated.actual_cost),
                note.eq(&updated.note),
                updated_at.eq(updated.updated_at),
            ))
            .execute(conn)?;
    }
    insert_notification(conn, &transition.notification)
}

pub fn transition_order(conn: &mut PgConnection, req_order_id: i64, change: &StatusChange) -> Result<OrderTransition> {
    conn.transaction::<_, LedgerError, _>(|conn| {
        let order = lock_order(conn, req_order_id)?;
        let balance = if change.status == OrderStatus::Completed {
            init_pair_balance(conn, &order.farmer_id, &order.dealer_id, &order.dealer_name)?;
            Some(lock_pair_balance(conn, &balance_key(&order.farmer_id, &order.dealer_id))?)
        } else {
            None
        };

        let transition = plan_transition(&order, change, balance, chrono::Utc::now().naive_utc())?;
        write_transition(conn, &transition)?;
        Ok(transition)
    })
}

/// Approves and completes an order under one set of locks.
pub fn fulfil_order(conn: &mut PgConnection, req_order_id: i64, cost: Option<BigDecimal>) -> Result<Fulfilment> {
    conn.transaction::<_, LedgerError, _>(|conn| {
        let order = lock_order(conn, req_order_id)?;
        init_pair_balance(conn, &order.farmer_id, &order.dealer_id, &order.dealer_name)?;
        let balance = lock_pair_balance(conn, &balance_key(&order.farmer_id, &order.dealer_id))?;

        let fulfilment = plan_fulfilment(&order, cost, Some(balance), chrono::Utc::now().naive_utc())?;
        if let Some(approval) = &fulfilment.approval {
            write_transition(conn, approval)?;
        }
        write_transition(conn, &fulfilment.completion)?;
        Ok(fulfilment)
    })
}

pub fn mark_notification_read(conn: &mut PgConnection, notification_id: i64) -> Result<bool> {
    use crate::schema::order_notifications::dsl::*;
    let updated = diesel::update(order_notifications.filter(id.eq(notification_id)))
        .set(is_read.eq(true))
        .execute(conn)?;
    Ok(updated > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{connect, queries, TransactionFilter};
    use crate::idgen;
    use crate::ledger::model::tests::{decimal, entry};
    use crate::ledger::model::TransactionType;
    use crate::ledger::orders::tests::new_order;

    fn pool() -> connect::DbPool {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").unwrap();
        connect::create_db_connection_pool(&url).unwrap()
    }

    #[test]
    #[ignore = "needs a PostgreSQL database in DATABASE_URL"]
    fn test_record_transaction() {
        let pool = pool();
        connect::run_migrations(&pool).unwrap();

        pool.get().unwrap().test_transaction::<_, LedgerError, _>(|conn| {
            let mut deposit = entry(TransactionType::Credit, "1000");
            deposit.farmer_id = "test_record_transaction".to_string();
            let mut debit = entry(TransactionType::Debit, "400");
            debit.farmer_id = "test_record_transaction".to_string();

            record_transaction(conn, deposit)?;
            let (tx, balance) = record_transaction(conn, debit)?;
            assert!(tx.id > 0);
            assert_eq!(balance.net_balance, decimal("600"));

            let stored = queries::load_balance(conn, "test_record_transaction", "dealer-1")?;
            assert_eq!(stored.map(|b| b.net_balance), Some(decimal("600")));
            Ok(())
        });
    }

    #[test]
    #[ignore = "needs a PostgreSQL database in DATABASE_URL"]
    fn test_complete_order() {
        let pool = pool();
        connect::run_migrations(&pool).unwrap();

        pool.get().unwrap().test_transaction::<_, LedgerError, _>(|conn| {
            let mut order = new_order(Some("250"));
            order.farmer_id = "test_complete_order".to_string();
            let (order, _) = insert_order(conn, order)?;

            transition_order(conn, order.id, &StatusChange::to(OrderStatus::Approved))?;
            let transition = transition_order(conn, order.id, &StatusChange::to(OrderStatus::Completed))?;
            let debit = transition.debit.unwrap();
            assert_eq!(debit.balance.net_balance, decimal("-250"));
            assert!(!debit.check.sufficient);

            let err = transition_order(conn, order.id, &StatusChange::to(OrderStatus::Approved)).unwrap_err();
            assert_eq!(err.to_string(), "Cannot modify a completed order");
            Ok(())
        });
    }

    #[test]
    #[ignore = "needs a PostgreSQL database in DATABASE_URL"]
    fn test_concurrent_deposits_are_not_lost() {
        let pool = pool();
        connect::run_migrations(&pool).unwrap();
        // committed for real, so each run gets its own pair
        let farmer = format!("concurrent_{}", idgen::next_id());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                let farmer = farmer.clone();
                std::thread::spawn(move || {
                    let mut conn = pool.get().unwrap();
                    for _ in 0..25 {
                        let mut deposit = entry(TransactionType::Credit, "10");
                        deposit.farmer_id = farmer.clone();
                        record_transaction(&mut conn, deposit).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut conn = pool.get().unwrap();
        let balance = queries::load_balance(&mut conn, &farmer, "dealer-1").unwrap().unwrap();
        assert_eq!(balance.net_balance, decimal("2000"));
        assert_eq!(balance.credit_balance, decimal("2000"));
        let history = queries::load_transactions(&mut conn, &TransactionFilter::pair(&farmer, "dealer-1")).unwrap();
        assert_eq!(history.len(), 200);
    }

    #[test]
    #[ignore = "needs a PostgreSQL database in DATABASE_URL"]
    fn test_failed_completion_writes_nothing() {
        let pool = pool();
        connect::run_migrations(&pool).unwrap();

        pool.get().unwrap().test_transaction::<_, LedgerError, _>(|conn| {
            let mut order = new_order(None);
            order.farmer_id = "test_failed_completion".to_string();
            let (order, _) = insert_order(conn, order)?;
            transition_order(conn, order.id, &StatusChange::to(OrderStatus::Approved))?;

            let err = transition_order(conn, order.id, &StatusChange::to(OrderStatus::Completed)).unwrap_err();
            assert!(matches!(err, LedgerError::Validation { field: "actual_cost", .. }));

            let stored = queries::load_order(conn, order.id)?.unwrap();
            assert_eq!(stored.status, OrderStatus::Approved);
            assert!(queries::load_balance(conn, "test_failed_completion", "dealer-1")?.is_none());
            let filter = TransactionFilter::pair("test_failed_completion", "dealer-1");
            assert!(queries::load_transactions(conn, &filter)?.is_empty());
            assert_eq!(queries::load_notifications(conn, "test_failed_completion")?.len(), 1);
            Ok(())
        });
    }

    #[test]
    #[ignore = "needs a PostgreSQL database in DATABASE_URL"]
    fn test_fulfil_order() {
        let pool = pool();
        connect::run_migrations(&pool).unwrap();

        pool.get().unwrap().test_transaction::<_, LedgerError, _>(|conn| {
            let mut order = new_order(None);
            order.farmer_id = "test_fulfil_order".to_string();
            let (order, _) = insert_order(conn, order)?;

            let err = fulfil_order(conn, order.id, None).unwrap_err();
            assert!(matches!(err, LedgerError::Validation { field: "actual_cost", .. }));
            assert_eq!(queries::load_order(conn, order.id)?.unwrap().status, OrderStatus::Pending);
            assert!(queries::load_notifications(conn, "test_fulfil_order")?.is_empty());

            let fulfilment = fulfil_order(conn, order.id, Some(decimal("90")))?;
            assert!(fulfilment.approval.is_some());
            assert_eq!(queries::load_order(conn, order.id)?.unwrap().status, OrderStatus::Completed);
            assert_eq!(queries::load_notifications(conn, "test_fulfil_order")?.len(), 2);
            let balance = queries::load_balance(conn, "test_fulfil_order", "dealer-1")?.unwrap();
            assert_eq!(balance.net_balance, decimal("-90"));
            Ok(())
        });
    }
}
