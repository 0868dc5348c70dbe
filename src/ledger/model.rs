use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Signed, Zero};
use chrono::NaiveDateTime;

use crate::error::{LedgerError, Result};
use crate::idgen;

/// Key of the balance record shared by a farmer and a dealer.
pub fn pair_key(farmer_id: &str, dealer_id: &str) -> String {
    format!("{farmer_id}_{dealer_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(LedgerError::validation(
                "type",
                format!("expected credit or debit, got {other:?}"),
            )),
        }
    }
}

/// A ledger entry as written. Never updated after insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub farmer_id: String,
    pub dealer_id: String,
    pub dealer_name: String,
    pub kind: TransactionType,
    pub amount: BigDecimal,
    pub description: String,
    pub category: String,
    pub order_id: Option<i64>,
    pub timestamp: NaiveDateTime,
}

impl Transaction {
    pub fn pair_key(&self) -> String {
        pair_key(&self.farmer_id, &self.dealer_id)
    }

    /// Amount with the sign it contributes to the net balance.
    pub fn signed_amount(&self) -> BigDecimal {
        match self.kind {
            TransactionType::Credit => self.amount.clone(),
            TransactionType::Debit => -self.amount.clone(),
        }
    }
}

/// A transaction that has not been recorded yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub farmer_id: String,
    pub dealer_id: String,
    pub dealer_name: String,
    pub kind: TransactionType,
    pub amount: BigDecimal,
    pub description: String,
    pub category: String,
    pub order_id: Option<i64>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<()> {
        if self.farmer_id.trim().is_empty() {
            return Err(LedgerError::validation("farmer_id", "must not be empty"));
        }
        if self.dealer_id.trim().is_empty() {
            return Err(LedgerError::validation("dealer_id", "must not be empty"));
        }
        if self.dealer_name.trim().is_empty() {
            return Err(LedgerError::validation("dealer_name", "must not be empty"));
        }
        if self.amount.is_negative() || self.amount.is_zero() {
            return Err(LedgerError::validation("amount", "must be greater than zero"));
        }
        Ok(())
    }

    pub fn into_transaction(self, timestamp: NaiveDateTime) -> Transaction {
        Transaction {
            id: idgen::next_id(),
            farmer_id: self.farmer_id,
            dealer_id: self.dealer_id,
            dealer_name: self.dealer_name,
            kind: self.kind,
            amount: self.amount,
            description: self.description,
            category: self.category,
            order_id: self.order_id,
            timestamp,
        }
    }
}

/// Running balance of one farmer-dealer pair.
///
/// `credit_balance` and `debit_balance` are the totals of each side,
/// `net_balance` is their difference. The record is derived state: it always
/// equals the fold of the pair's transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    pub farmer_id: String,
    pub dealer_id: String,
    pub dealer_name: String,
    pub credit_balance: BigDecimal,
    pub debit_balance: BigDecimal,
    pub net_balance: BigDecimal,
    pub last_updated: NaiveDateTime,
}

impl Balance {
    pub fn opening(farmer_id: &str, dealer_id: &str, dealer_name: &str, at: NaiveDateTime) -> Self {
        Self {
            farmer_id: farmer_id.to_string(),
            dealer_id: dealer_id.to_string(),
            dealer_name: dealer_name.to_string(),
            credit_balance: BigDecimal::zero(),
            debit_balance: BigDecimal::zero(),
            net_balance: BigDecimal::zero(),
            last_updated: at,
        }
    }

    pub fn pair_key(&self) -> String {
        pair_key(&self.farmer_id, &self.dealer_id)
    }

    pub fn is_overdraft(&self) -> bool {
        self.net_balance.is_negative()
    }

    /// Folds one transaction of this pair into the balance.
    pub fn apply(&mut self, tx: &Transaction) {
        match tx.kind {
            TransactionType::Credit => self.credit_balance += &tx.amount,
            TransactionType::Debit => self.debit_balance += &tx.amount,
        }
        self.net_balance += tx.signed_amount();
        self.dealer_name = tx.dealer_name.clone();
        if tx.timestamp > self.last_updated {
            self.last_updated = tx.timestamp;
        }
    }
}

/// Computes the transaction record and the balance that replaces `current`.
///
/// Stores call this after every read of the transaction is done and before
/// any write.
pub fn post_entry(
    entry: NewTransaction,
    current: Option<Balance>,
    now: NaiveDateTime,
) -> (Transaction, Balance) {
    let mut balance = current
        .unwrap_or_else(|| Balance::opening(&entry.farmer_id, &entry.dealer_id, &entry.dealer_name, now));
    let tx = entry.into_transaction(now);
    balance.apply(&tx);
    balance.last_updated = now;
    (tx, balance)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn at(secs: i64) -> NaiveDateTime {
        chrono::DateTime::from_timestamp(1_710_000_000 + secs, 0)
            .map(|dt| dt.naive_utc())
            .unwrap()
    }

    pub fn decimal(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    pub fn entry(kind: TransactionType, amount: &str) -> NewTransaction {
        NewTransaction {
            farmer_id: "farmer-1".to_string(),
            dealer_id: "dealer-1".to_string(),
            dealer_name: "Sri Feeds".to_string(),
            kind,
            amount: decimal(amount),
            description: "test".to_string(),
            category: "deposit".to_string(),
            order_id: None,
        }
    }

    #[test]
    fn test_transaction_type_parse() {
        assert_eq!("credit".parse::<TransactionType>().unwrap(), TransactionType::Credit);
        assert_eq!("debit".parse::<TransactionType>().unwrap(), TransactionType::Debit);
        assert!(matches!(
            "refund".parse::<TransactionType>(),
            Err(LedgerError::Validation { field: "type", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_amounts() {
        assert!(entry(TransactionType::Credit, "10").validate().is_ok());
        for amount in ["0", "-5", "0.00"] {
            let err = entry(TransactionType::Credit, amount).validate().unwrap_err();
            assert!(matches!(err, LedgerError::Validation { field: "amount", .. }), "{amount}");
        }
    }

    #[test]
    fn test_validate_rejects_missing_ids() {
        let mut e = entry(TransactionType::Credit, "10");
        e.farmer_id = " ".to_string();
        assert!(matches!(e.validate(), Err(LedgerError::Validation { field: "farmer_id", .. })));

        let mut e = entry(TransactionType::Credit, "10");
        e.dealer_id = String::new();
        assert!(matches!(e.validate(), Err(LedgerError::Validation { field: "dealer_id", .. })));
    }

    #[test]
    fn test_post_entry_deposit_then_debit() {
        let (tx, balance) = post_entry(entry(TransactionType::Credit, "1000"), None, at(0));
        assert_eq!(tx.kind, TransactionType::Credit);
        assert_eq!(balance.net_balance, decimal("1000"));

        let (tx, balance) = post_entry(entry(TransactionType::Debit, "400"), Some(balance), at(10));
        assert_eq!(tx.timestamp, at(10));
        assert_eq!(balance.net_balance, decimal("600"));
        assert_eq!(balance.credit_balance, decimal("1000"));
        assert_eq!(balance.debit_balance, decimal("400"));
        assert_eq!(balance.last_updated, at(10));
        assert_eq!(balance.pair_key(), "farmer-1_dealer-1");
    }

    #[test]
    fn test_debit_can_overdraw() {
        let (_, balance) = post_entry(entry(TransactionType::Debit, "250.50"), None, at(0));
        assert_eq!(balance.net_balance, decimal("-250.50"));
        assert!(balance.is_overdraft());
    }
}
