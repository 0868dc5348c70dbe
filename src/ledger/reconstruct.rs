use std::collections::BTreeMap;

use crate::ledger::model::{Balance, Transaction};

/// Recomputes the balance of every farmer-dealer pair from raw transactions.
///
/// The result matches what the incremental aggregator stores for the same set
/// of transactions, whatever order they come in. Balances are sorted by pair
/// key.
pub fn calculate_balances(transactions: &[Transaction]) -> Vec<Balance> {
    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    // the dealer name and timestamp of the latest entry win
    ordered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

    let mut balances: BTreeMap<String, Balance> = BTreeMap::new();
    for tx in ordered {
        balances
            .entry(tx.pair_key())
            .or_insert_with(|| Balance::opening(&tx.farmer_id, &tx.dealer_id, &tx.dealer_name, tx.timestamp))
            .apply(tx);
    }
    balances.into_values().collect()
}
