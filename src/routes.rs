use std::str::FromStr;
use std::time::Duration;

use actix_request_identifier::RequestId;
use actix_web::{get, http::header, post, web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use crate::database::{OrderFilter, TransactionFilter};
use crate::error::{LedgerError, Result};
use crate::ledger::feed::Topic;
use crate::ledger::model::pair_key;
use crate::ledger::orders::{NewOrderRequest, OrderStatus, StatusChange};
use crate::ledger::{Ledger, TransactionDetails};
use crate::proto::{self, GenericOutput};
use crate::responses;

const DEFAULT_WAIT_MS: u64 = 25_000;
const MAX_WAIT_MS: u64 = 60_000;
const MAX_DECIMAL_LEN: usize = 40;
const MAX_DECIMAL_SCALE: i64 = 18;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountQuery {
    amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    farmer_id: Option<String>,
    dealer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    farmer_id: Option<String>,
    dealer_id: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitQuery {
    wait_ms: Option<u64>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(balance_handler)
        .service(check_balance_handler)
        .service(reconcile_handler)
        .service(farmer_balances_handler)
        .service(dealer_balances_handler)
        .service(record_transaction_handler)
        .service(list_transactions_handler)
        .service(create_order_handler)
        .service(list_orders_handler)
        .service(get_order_handler)
        .service(update_order_status_handler)
        .service(fulfil_order_handler)
        .service(notifications_handler)
        .service(mark_notification_read_handler)
        .service(farmer_events_handler);
}

fn wants_protobuf(accept: &Option<web::Header<header::Accept>>) -> bool {
    accept.as_ref().map_or(false, |accept| {
        accept.iter().any(|a| a.item.essence_str() == "application/x-protobuf")
    })
}

fn parse_decimal(field: &'static str, value: &str) -> Result<BigDecimal> {
    let value = value.trim();
    if value.len() > MAX_DECIMAL_LEN {
        return Err(LedgerError::validation(field, "out of range"));
    }
    let decimal =
        BigDecimal::from_str(value).map_err(|_| LedgerError::validation(field, format!("{value:?} is not a number")))?;
    // a huge exponent is cheap to parse but not to add or compare
    let (_, scale) = decimal.as_bigint_and_exponent();
    if !(-MAX_DECIMAL_SCALE..=MAX_DECIMAL_SCALE).contains(&scale) {
        return Err(LedgerError::validation(field, "out of range"));
    }
    Ok(decimal)
}

fn parse_optional_decimal(field: &'static str, value: &str) -> Result<Option<BigDecimal>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_decimal(field, value).map(Some)
    }
}

fn optional_text(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn success() -> GenericOutput {
    GenericOutput {
        ok: true,
        ..Default::default()
    }
}

// runs a ledger operation on the blocking pool and renders its outcome
async fn respond<T, F, R>(ledger: &web::Data<Ledger>, is_protobuf: bool, op: F, render: R) -> actix_web::Result<HttpResponse>
where
    T: Send + 'static,
    F: FnOnce(&Ledger) -> Result<T> + Send + 'static,
    R: FnOnce(T) -> GenericOutput,
{
    let ledger = ledger.clone();
    match web::block(move || op(ledger.get_ref())).await? {
        Ok(value) => Ok(responses::http_response(render(value), is_protobuf)),
        Err(e) => match responses::ledger_error(&e) {
            Some(data) => Ok(responses::http_response(data, is_protobuf)),
            None => {
                error!("{e}");
                Err(actix_web::error::ErrorInternalServerError(e))
            }
        },
    }
}

#[get("/balances/{farmer_id}/{dealer_id}")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn balance_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    path: web::Path<(String, String)>,
) -> actix_web::Result<HttpResponse> {
    let (farmer_id, dealer_id) = path.into_inner();
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| {
            ledger
                .balance(&farmer_id, &dealer_id)?
                .ok_or_else(|| LedgerError::not_found("balance", pair_key(&farmer_id, &dealer_id)))
        },
        |balance| GenericOutput {
            balance: Some(responses::balance_data(&balance)),
            ok: true,
            ..Default::default()
        },
    )
    .await
}

#[get("/balances/{farmer_id}/{dealer_id}/check")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn check_balance_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    path: web::Path<(String, String)>,
    query: web::Query<AmountQuery>,
) -> actix_web::Result<HttpResponse> {
    let (farmer_id, dealer_id) = path.into_inner();
    let amount = query.into_inner().amount;
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| ledger.check_balance(&farmer_id, &dealer_id, parse_decimal("amount", &amount)?),
        |check| GenericOutput {
            balance_check: Some(responses::balance_check_data(&check)),
            ok: true,
            ..Default::default()
        },
    )
    .await
}

#[get("/balances/{farmer_id}/{dealer_id}/reconcile")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn reconcile_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    path: web::Path<(String, String)>,
) -> actix_web::Result<HttpResponse> {
    let (farmer_id, dealer_id) = path.into_inner();
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| ledger.reconcile(&farmer_id, &dealer_id),
        |report| responses::reconciliation(&report),
    )
    .await
}

#[get("/farmers/{farmer_id}/balances")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn farmer_balances_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    farmer_id: web::Path<String>,
) -> actix_web::Result<HttpResponse> {
    let farmer_id = farmer_id.into_inner();
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| ledger.farmer_balances(&farmer_id),
        |balances| GenericOutput {
            balances: balances.iter().map(responses::balance_data).collect(),
            ok: true,
            ..Default::default()
        },
    )
    .await
}

#[get("/dealers/{dealer_id}/balances")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn dealer_balances_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    dealer_id: web::Path<String>,
) -> actix_web::Result<HttpResponse> {
    let dealer_id = dealer_id.into_inner();
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| ledger.dealer_balances(&dealer_id),
        |balances| GenericOutput {
            balances: balances.iter().map(responses::balance_data).collect(),
            ok: true,
            ..Default::default()
        },
    )
    .await
}

#[post("/transactions")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn record_transaction_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    input: web::Json<proto::RecordTransactionInput>,
) -> actix_web::Result<HttpResponse> {
    let input = input.into_inner();
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| {
            let details = TransactionDetails {
                kind: input.kind.parse()?,
                amount: parse_decimal("amount", &input.amount)?,
                description: input.description,
                category: input.category,
                order_id: input.order_id,
            };
            ledger.record_transaction(&input.farmer_id, &input.dealer_id, &input.dealer_name, details)
        },
        |(tx, balance)| responses::transaction_recorded(&tx, &balance),
    )
    .await
}

#[get("/transactions")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn list_transactions_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    query: web::Query<TransactionQuery>,
) -> actix_web::Result<HttpResponse> {
    let query = query.into_inner();
    let filter = TransactionFilter {
        farmer_id: query.farmer_id,
        dealer_id: query.dealer_id,
    };
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| ledger.transactions(&filter),
        |transactions| GenericOutput {
            transactions: transactions.iter().map(responses::transaction_data).collect(),
            ok: true,
            ..Default::default()
        },
    )
    .await
}

#[post("/orders")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn create_order_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    input: web::Json<proto::CreateOrderInput>,
) -> actix_web::Result<HttpResponse> {
    let input = input.into_inner();
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| {
            let order = NewOrderRequest {
                quantity: parse_decimal("quantity", &input.quantity)?,
                estimated_cost: parse_optional_decimal("estimated_cost", &input.estimated_cost)?,
                farmer_id: input.farmer_id,
                dealer_id: input.dealer_id,
                dealer_name: input.dealer_name,
                order_type: input.order_type,
                unit: input.unit,
                note: optional_text(input.note),
            };
            ledger.create_order_request(order)
        },
        |(order, _)| GenericOutput {
            order: Some(responses::order_data(&order)),
            ok: true,
            ..Default::default()
        },
    )
    .await
}

#[get("/orders")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn list_orders_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    query: web::Query<OrderQuery>,
) -> actix_web::Result<HttpResponse> {
    let query = query.into_inner();
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| {
            let filter = OrderFilter {
                farmer_id: query.farmer_id,
                dealer_id: query.dealer_id,
                status: query.status.as_deref().map(OrderStatus::from_str).transpose()?,
            };
            ledger.order_requests(&filter)
        },
        |orders| GenericOutput {
            orders: orders.iter().map(responses::order_data).collect(),
            ok: true,
            ..Default::default()
        },
    )
    .await
}

#[get("/orders/{order_id}")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn get_order_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    order_id: web::Path<i64>,
) -> actix_web::Result<HttpResponse> {
    let order_id = order_id.into_inner();
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| ledger.order_request(order_id),
        |order| GenericOutput {
            order: Some(responses::order_data(&order)),
            ok: true,
            ..Default::default()
        },
    )
    .await
}

#[post("/orders/{order_id}/status")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn update_order_status_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    order_id: web::Path<i64>,
    input: web::Json<proto::UpdateOrderStatusInput>,
) -> actix_web::Result<HttpResponse> {
    let order_id = order_id.into_inner();
    let input = input.into_inner();
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| {
            let change = StatusChange {
                status: input.status.parse()?,
                actual_cost: parse_optional_decimal("actual_cost", &input.actual_cost)?,
                note: optional_text(input.note),
            };
            ledger.update_order_status(order_id, change)
        },
        |transition| responses::order_update(&transition),
    )
    .await
}

#[post("/orders/{order_id}/fulfil")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn fulfil_order_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    order_id: web::Path<i64>,
    input: web::Json<proto::FulfilOrderInput>,
) -> actix_web::Result<HttpResponse> {
    let order_id = order_id.into_inner();
    let input = input.into_inner();
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| {
            let actual_cost = parse_optional_decimal("actual_cost", &input.actual_cost)?;
            ledger.fulfil_order(order_id, actual_cost)
        },
        |transition| responses::order_update(&transition),
    )
    .await
}

#[get("/notifications/{recipient_id}")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn notifications_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    recipient_id: web::Path<String>,
) -> actix_web::Result<HttpResponse> {
    let recipient_id = recipient_id.into_inner();
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| ledger.notifications(&recipient_id),
        |notifications| GenericOutput {
            notifications: notifications.iter().map(responses::notification_data).collect(),
            ok: true,
            ..Default::default()
        },
    )
    .await
}

#[post("/notifications/{notification_id}/read")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn mark_notification_read_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    notification_id: web::Path<i64>,
) -> actix_web::Result<HttpResponse> {
    let notification_id = notification_id.into_inner();
    respond(
        &ledger,
        wants_protobuf(&accept),
        move |ledger| ledger.mark_notification_read(notification_id),
        |()| success(),
    )
    .await
}

/// Long poll: waits for the next ledger change that involves the farmer.
#[get("/events/farmers/{farmer_id}")]
#[instrument(skip(ledger, accept), fields(request_id = request_id.as_str()))]
pub async fn farmer_events_handler(
    ledger: web::Data<Ledger>,
    request_id: RequestId,
    accept: Option<web::Header<header::Accept>>,
    farmer_id: web::Path<String>,
    query: web::Query<WaitQuery>,
) -> actix_web::Result<HttpResponse> {
    let timeout = Duration::from_millis(query.wait_ms.unwrap_or(DEFAULT_WAIT_MS).min(MAX_WAIT_MS));
    // the subscription lives exactly as long as this request
    let mut subscription = ledger.subscribe(Topic::Farmer(farmer_id.into_inner()));
    debug!(subscribers = ledger.feed().subscriber_count(), "waiting for ledger events");
    let events = subscription.wait(timeout).await;
    let data = GenericOutput {
        events: events.iter().map(responses::event_data).collect(),
        ok: true,
        ..Default::default()
    };
    Ok(responses::http_response(data, wants_protobuf(&accept)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use actix_request_identifier::RequestIdentifier;
    use actix_web::{test, App};
    use prost::Message;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(MemoryStore::new()))
    }

    fn deposit_body(amount: &str) -> Value {
        json!({
            "farmerId": "farmer-1",
            "dealerId": "dealer-1",
            "dealerName": "Sri Feeds",
            "type": "credit",
            "amount": amount,
            "description": "cash deposit",
            "category": "deposit"
        })
    }

    #[actix_web::test]
    async fn test_record_and_read_balance() {
        let app = test::init_service(
            App::new()
                .wrap(RequestIdentifier::with_uuid())
                .app_data(web::Data::new(ledger()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post().uri("/transactions").set_json(deposit_body("1000")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["transactionRecorded"]["transaction"]["type"], "credit");
        assert_eq!(body["transactionRecorded"]["balance"]["netBalance"], "1000");

        let mut debit = deposit_body("400");
        debit["type"] = json!("debit");
        let req = test::TestRequest::post().uri("/transactions").set_json(debit).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["transactionRecorded"]["balance"]["netBalance"], "600");

        let req = test::TestRequest::get().uri("/balances/farmer-1/dealer-1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["balance"]["netBalance"], "600");
        assert_eq!(body["balance"]["creditBalance"], "1000");
        assert_eq!(body["balance"]["debitBalance"], "400");
        assert_eq!(body["balance"]["isOverdraft"], false);

        let req = test::TestRequest::get()
            .uri("/transactions?farmerId=farmer-1&dealerId=dealer-1")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_bad_parameters() {
        let app = test::init_service(
            App::new()
                .wrap(RequestIdentifier::with_uuid())
                .app_data(web::Data::new(ledger()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post().uri("/transactions").set_json(deposit_body("0")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["error"]["oneError"]["badParameter"]["name"], "amount");

        let req = test::TestRequest::post().uri("/transactions").set_json(deposit_body("ten")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["error"]["oneError"]["badParameter"]["name"], "amount");

        let mut wrong_type = deposit_body("10");
        wrong_type["type"] = json!("refund");
        let req = test::TestRequest::post().uri("/transactions").set_json(wrong_type).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["error"]["oneError"]["badParameter"]["name"], "type");

        let req = test::TestRequest::get().uri("/balances/farmer-1/dealer-1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["error"]["oneError"]["notFound"]["entity"], "balance");
    }

    #[actix_web::test]
    async fn test_order_flow() {
        let app = test::init_service(
            App::new()
                .wrap(RequestIdentifier::with_uuid())
                .app_data(web::Data::new(ledger()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post().uri("/transactions").set_json(deposit_body("1000")).to_request();
        let _: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(json!({
                "farmerId": "farmer-1",
                "dealerId": "dealer-1",
                "dealerName": "Sri Feeds",
                "orderType": "broiler feed",
                "quantity": "10",
                "unit": "bags",
                "estimatedCost": "400"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["order"]["status"], "pending");
        let order_id = body["order"]["id"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/orders/{order_id}/status"))
            .set_json(json!({ "status": "approved" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["orderUpdate"]["order"]["status"], "approved");

        let req = test::TestRequest::post()
            .uri(&format!("/orders/{order_id}/status"))
            .set_json(json!({ "status": "completed" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["orderUpdate"]["order"]["status"], "completed");
        assert_eq!(body["orderUpdate"]["balance"]["netBalance"], "600");
        assert_eq!(body["orderUpdate"]["balanceCheck"]["sufficient"], true);

        let req = test::TestRequest::post()
            .uri(&format!("/orders/{order_id}/status"))
            .set_json(json!({ "status": "approved" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["error"]["oneError"]["invalidTransition"]["message"],
            "Cannot modify a completed order"
        );

        let req = test::TestRequest::get().uri("/orders?farmerId=farmer-1&status=completed").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["orders"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get().uri("/notifications/farmer-1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let notifications = body["notifications"].as_array().unwrap();
        assert_eq!(notifications.len(), 2);
        let notification_id = notifications[0]["id"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/notifications/{notification_id}/read"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["ok"], true);

        let req = test::TestRequest::get().uri("/balances/farmer-1/dealer-1/reconcile").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["reconciliation"]["consistent"], true);
    }

    #[actix_web::test]
    async fn test_fulfil_on_credit_warns() {
        let ledger = ledger();
        let app = test::init_service(
            App::new()
                .wrap(RequestIdentifier::with_uuid())
                .app_data(web::Data::new(ledger.clone()))
                .configure(configure),
        )
        .await;

        let (order, _) = ledger
            .create_order_request(NewOrderRequest {
                farmer_id: "farmer-1".to_string(),
                dealer_id: "dealer-1".to_string(),
                dealer_name: "Sri Feeds".to_string(),
                order_type: "chicks".to_string(),
                quantity: BigDecimal::from(500),
                unit: "birds".to_string(),
                estimated_cost: None,
                note: None,
            })
            .unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/orders/{}/fulfil", order.id))
            .set_json(json!({ "actualCost": "1500" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["orderUpdate"]["order"]["status"], "completed");
        assert_eq!(body["orderUpdate"]["balance"]["netBalance"], "-1500");
        assert_eq!(body["orderUpdate"]["balanceCheck"]["shortfall"], "1500");
        assert!(body["orderUpdate"]["warning"].as_str().unwrap().contains("insufficient balance"));
    }

    #[actix_web::test]
    async fn test_check_balance_protobuf() {
        let app = test::init_service(
            App::new()
                .wrap(RequestIdentifier::with_uuid())
                .app_data(web::Data::new(ledger()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post().uri("/transactions").set_json(deposit_body("250")).to_request();
        let _: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/balances/farmer-1/dealer-1/check?amount=400")
            .insert_header((header::ACCEPT, "application/x-protobuf"))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let output = GenericOutput::decode(body.as_ref()).unwrap();
        let check = output.balance_check.unwrap();
        assert!(!check.sufficient);
        assert_eq!(check.current, "250");
        assert_eq!(check.shortfall, "150");
    }

    #[actix_web::test]
    async fn test_events_long_poll() {
        let ledger = ledger();
        let app = test::init_service(
            App::new()
                .wrap(RequestIdentifier::with_uuid())
                .app_data(web::Data::new(ledger.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/events/farmers/farmer-1?waitMs=10").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["ok"], true);
        assert!(body.get("events").is_none());
        assert_eq!(ledger.feed().subscriber_count(), 0);
    }

    #[actix_web::test]
    async fn test_events_long_poll_wakes_on_deposit() {
        let ledger = ledger();
        let app = test::init_service(
            App::new()
                .wrap(RequestIdentifier::with_uuid())
                .app_data(web::Data::new(ledger.clone()))
                .configure(configure),
        )
        .await;

        let writer = ledger.clone();
        actix_web::rt::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let details = TransactionDetails {
                kind: "credit".parse().unwrap(),
                amount: BigDecimal::from(75),
                description: "cash deposit".to_string(),
                category: "deposit".to_string(),
                order_id: None,
            };
            writer.record_transaction("farmer-1", "dealer-1", "Sri Feeds", details).unwrap();
        });

        let req = test::TestRequest::get().uri("/events/farmers/farmer-1?waitMs=5000").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let events = body["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["kind"], "transactionRecorded");
        assert_eq!(ledger.feed().subscriber_count(), 0);
    }

    #[actix_web::test]
    async fn test_amount_out_of_range() {
        assert!(parse_decimal("amount", "1e2000000").is_err());
        assert!(parse_decimal("amount", "1e-40").is_err());
        assert!(parse_decimal("amount", &"9".repeat(80)).is_err());
        assert_eq!(parse_decimal("amount", " 12.50 ").unwrap(), BigDecimal::from_str("12.5").unwrap());
        assert!(parse_decimal("amount", "1000000000000000000000").is_ok());

        let app = test::init_service(
            App::new()
                .wrap(RequestIdentifier::with_uuid())
                .app_data(web::Data::new(ledger()))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/balances/farmer-1/dealer-1/check?amount=1e2000000")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["error"]["oneError"]["badParameter"]["name"], "amount");

        let req = test::TestRequest::post().uri("/transactions").set_json(deposit_body("5e300")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["error"]["oneError"]["badParameter"]["name"], "amount");
    }
}
