//! Wire messages. They encode as protobuf through `prost` and as camelCase
//! JSON through `serde`; amounts travel as decimal strings.

use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordTransactionInput {
    #[prost(string, tag = "1")]
    pub farmer_id: String,
    #[prost(string, tag = "2")]
    pub dealer_id: String,
    #[prost(string, tag = "3")]
    pub dealer_name: String,
    #[prost(string, tag = "4")]
    #[serde(rename = "type")]
    pub kind: String,
    #[prost(string, tag = "5")]
    pub amount: String,
    #[prost(string, tag = "6")]
    pub description: String,
    #[prost(string, tag = "7")]
    pub category: String,
    #[prost(int64, optional, tag = "8")]
    pub order_id: Option<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOrderInput {
    #[prost(string, tag = "1")]
    pub farmer_id: String,
    #[prost(string, tag = "2")]
    pub dealer_id: String,
    #[prost(string, tag = "3")]
    pub dealer_name: String,
    #[prost(string, tag = "4")]
    pub order_type: String,
    #[prost(string, tag = "5")]
    pub quantity: String,
    #[prost(string, tag = "6")]
    pub unit: String,
    #[prost(string, tag = "7")]
    pub estimated_cost: String,
    #[prost(string, tag = "8")]
    pub note: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateOrderStatusInput {
    #[prost(string, tag = "1")]
    pub status: String,
    #[prost(string, tag = "2")]
    pub actual_cost: String,
    #[prost(string, tag = "3")]
    pub note: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FulfilOrderInput {
    #[prost(string, tag = "1")]
    pub actual_cost: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceData {
    #[prost(string, tag = "1")]
    pub farmer_id: String,
    #[prost(string, tag = "2")]
    pub dealer_id: String,
    #[prost(string, tag = "3")]
    pub dealer_name: String,
    #[prost(string, tag = "4")]
    pub credit_balance: String,
    #[prost(string, tag = "5")]
    pub debit_balance: String,
    #[prost(string, tag = "6")]
    pub net_balance: String,
    #[prost(string, tag = "7")]
    pub last_updated: String,
    #[prost(bool, tag = "8")]
    pub is_overdraft: bool,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(string, tag = "2")]
    pub farmer_id: String,
    #[prost(string, tag = "3")]
    pub dealer_id: String,
    #[prost(string, tag = "4")]
    pub dealer_name: String,
    #[prost(string, tag = "5")]
    #[serde(rename = "type")]
    pub kind: String,
    #[prost(string, tag = "6")]
    pub amount: String,
    #[prost(string, tag = "7")]
    pub description: String,
    #[prost(string, tag = "8")]
    pub category: String,
    #[prost(int64, optional, tag = "9")]
    pub order_id: Option<i64>,
    #[prost(string, tag = "10")]
    pub timestamp: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceCheckData {
    #[prost(bool, tag = "1")]
    pub sufficient: bool,
    #[prost(string, tag = "2")]
    pub current: String,
    #[prost(string, tag = "3")]
    pub required: String,
    #[prost(string, tag = "4")]
    pub shortfall: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(string, tag = "2")]
    pub farmer_id: String,
    #[prost(string, tag = "3")]
    pub dealer_id: String,
    #[prost(string, tag = "4")]
    pub dealer_name: String,
    #[prost(string, tag = "5")]
    pub order_type: String,
    #[prost(string, tag = "6")]
    pub quantity: String,
    #[prost(string, tag = "7")]
    pub unit: String,
    #[prost(string, tag = "8")]
    pub status: String,
    #[prost(string, optional, tag = "9")]
    pub estimated_cost: Option<String>,
    #[prost(string, optional, tag = "10")]
    pub actual_cost: Option<String>,
    #[prost(string, optional, tag = "11")]
    pub note: Option<String>,
    #[prost(string, tag = "12")]
    pub created_at: String,
    #[prost(string, tag = "13")]
    pub updated_at: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub order_id: i64,
    #[prost(string, tag = "3")]
    pub recipient_id: String,
    #[prost(string, tag = "4")]
    pub recipient_role: String,
    #[prost(string, tag = "5")]
    pub status: String,
    #[prost(string, tag = "6")]
    pub message: String,
    #[prost(bool, tag = "7")]
    pub read: bool,
    #[prost(string, tag = "8")]
    pub created_at: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecorded {
    #[prost(message, optional, tag = "1")]
    pub transaction: Option<TransactionData>,
    #[prost(message, optional, tag = "2")]
    pub balance: Option<BalanceData>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    #[prost(message, optional, tag = "1")]
    pub order: Option<OrderData>,
    #[prost(message, optional, tag = "2")]
    pub transaction: Option<TransactionData>,
    #[prost(message, optional, tag = "3")]
    pub balance: Option<BalanceData>,
    #[prost(message, optional, tag = "4")]
    pub balance_check: Option<BalanceCheckData>,
    #[prost(message, optional, tag = "5")]
    pub notification: Option<NotificationData>,
    #[prost(string, optional, tag = "6")]
    pub warning: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationData {
    #[prost(message, optional, tag = "1")]
    pub stored: Option<BalanceData>,
    #[prost(message, optional, tag = "2")]
    pub computed: Option<BalanceData>,
    #[prost(bool, tag = "3")]
    pub consistent: bool,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEventData {
    #[prost(string, tag = "1")]
    pub kind: String,
    #[prost(message, optional, tag = "2")]
    pub transaction: Option<TransactionData>,
    #[prost(message, optional, tag = "3")]
    pub balance: Option<BalanceData>,
    #[prost(message, optional, tag = "4")]
    pub order: Option<OrderData>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadParameterError {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub reason: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundError {
    #[prost(string, tag = "1")]
    pub entity: String,
    #[prost(string, tag = "2")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidTransitionError {
    #[prost(string, tag = "1")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    #[prost(oneof = "error::OneError", tags = "1, 2, 3")]
    pub one_error: Option<error::OneError>,
}

pub mod error {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub enum OneError {
        #[prost(message, tag = "1")]
        BadParameter(super::BadParameterError),
        #[prost(message, tag = "2")]
        NotFound(super::NotFoundError),
        #[prost(message, tag = "3")]
        InvalidTransition(super::InvalidTransitionError),
    }
}

/// Envelope of every response; exactly one field is set.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericOutput {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<BalanceData>,
    #[prost(message, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub balances: Vec<BalanceData>,
    #[prost(message, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_check: Option<BalanceCheckData>,
    #[prost(message, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_recorded: Option<TransactionRecorded>,
    #[prost(message, repeated, tag = "5")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<TransactionData>,
    #[prost(message, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderData>,
    #[prost(message, repeated, tag = "7")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orders: Vec<OrderData>,
    #[prost(message, optional, tag = "8")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_update: Option<OrderUpdate>,
    #[prost(message, repeated, tag = "9")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<NotificationData>,
    #[prost(message, optional, tag = "10")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<ReconciliationData>,
    #[prost(message, repeated, tag = "11")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<LedgerEventData>,
    #[prost(bool, tag = "12")]
    pub ok: bool,
    #[prost(message, optional, tag = "15")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
}
