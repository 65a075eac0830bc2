//! Meal-ticket (carnet) balance aggregation.
//!
//! Purchases are grouped per kid, every roster kid gets an info record with
//! the bought total, then meal-consuming notes are folded in and each record
//! is settled into a credit (`total_left`) or a debit (`total_debit`).
//!
//! Kids missing from the roster never get a record, even when purchases or
//! notes reference them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Kid, KidId, KidNote, Purchase};

/// Purchases keyed by owning kid, each list in input order.
pub type GroupedPurchases<'a> = BTreeMap<KidId, Vec<&'a Purchase>>;

/// Settled ledger keyed by kid id.
pub type KidCarnetInfo = BTreeMap<KidId, CarnetInfo>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarnetInfo {
    pub kid_name: String,
    pub kid_surname: String,
    pub total_bought: i64,
    pub total_used: i64,
    pub total_left: i64,
    pub total_debit: i64,
}

impl CarnetInfo {
    fn for_kid(kid: &Kid) -> Self {
        Self {
            kid_name: kid.name.clone(),
            kid_surname: kid.surname.clone(),
            ..Default::default()
        }
    }

    /// Signed balance: positive is credit, negative is debit.
    pub fn balance(&self) -> i64 {
        self.total_bought - self.total_used
    }

    fn settle(&mut self) {
        let balance = self.balance();
        if balance > 0 {
            self.total_left = balance;
            self.total_debit = 0;
        } else {
            self.total_debit = -balance;
            self.total_left = 0;
        }
    }
}

pub fn group_by_kid(purchases: &[Purchase]) -> GroupedPurchases<'_> {
    let mut grouped = GroupedPurchases::new();
    for p in purchases {
        grouped.entry(p.kid_id).or_default().push(p);
    }
    grouped
}

/// Seeds one record per roster kid with its bought total.
pub fn bootstrap(kids: &[Kid], grouped: &GroupedPurchases<'_>) -> KidCarnetInfo {
    kids.iter()
        .map(|kid| {
            let mut info = CarnetInfo::for_kid(kid);
            info.total_bought = grouped
                .get(&kid.id)
                .map(|ps| ps.iter().map(|p| i64::from(p.quantity)).sum())
                .unwrap_or(0);
            (kid.id, info)
        })
        .collect()
}

/// Counts consumed meals and splits every balance into left/debit.
pub fn settle(info: &mut KidCarnetInfo, notes: &[KidNote]) {
    for note in notes.iter().filter(|n| n.has_meal) {
        if let Some(entry) = info.get_mut(&note.kid_id) {
            entry.total_used += 1;
        }
    }
    for entry in info.values_mut() {
        entry.settle();
    }
}

pub fn compute_carnet_info(purchases: &[Purchase], kids: &[Kid], notes: &[KidNote]) -> KidCarnetInfo {
    let grouped = group_by_kid(purchases);
    let mut info = bootstrap(kids, &grouped);
    settle(&mut info, notes);
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
    }

    fn purchase(id: i64, quantity: i32, kid: i64) -> Purchase {
        Purchase {
            id,
            date: day(),
            quantity,
            kid_id: KidId(kid),
        }
    }

    fn kid(id: i64) -> Kid {
        Kid {
            id: KidId(id),
            name: format!("Name{id}"),
            surname: format!("Surname{id}"),
        }
    }

    fn note(id: i64, kid: i64, has_meal: bool) -> KidNote {
        KidNote {
            id,
            note: "note".into(),
            kid_id: KidId(kid),
            presence: Vec::new(),
            has_meal,
            date: day(),
        }
    }

    fn fixture() -> (Vec<Purchase>, Vec<Kid>, Vec<KidNote>) {
        let purchases = vec![purchase(10, 1, 101), purchase(20, 2, 101), purchase(30, 1, 201)];
        let kids = [101, 102, 201, 301, 401].into_iter().map(kid).collect();
        let notes = vec![
            note(4, 101, true),
            note(5, 101, true),
            note(1, 201, true),
            note(2, 201, true),
            note(3, 201, true),
            note(6, 301, false),
            note(7, 401, true),
        ];
        (purchases, kids, notes)
    }

    fn totals(info: &KidCarnetInfo, id: i64) -> (i64, i64, i64, i64) {
        let i = &info[&KidId(id)];
        (i.total_bought, i.total_used, i.total_left, i.total_debit)
    }

    #[test]
    fn fixture_settles_credit_and_debit() {
        let (purchases, kids, notes) = fixture();
        let info = compute_carnet_info(&purchases, &kids, &notes);

        assert_eq!(info.len(), 5);
        assert_eq!(totals(&info, 101), (3, 2, 1, 0));
        assert_eq!(totals(&info, 102), (0, 0, 0, 0));
        assert_eq!(totals(&info, 201), (1, 3, 0, 2));
        assert_eq!(totals(&info, 301), (0, 0, 0, 0));
        assert_eq!(totals(&info, 401), (0, 1, 0, 1));
        assert_eq!(info[&KidId(101)].kid_name, "Name101");
        assert_eq!(info[&KidId(101)].kid_surname, "Surname101");
    }

    #[test]
    fn grouping_keeps_every_purchase_in_input_order() {
        let purchases = vec![
            purchase(3, 1, 7),
            purchase(1, 4, 9),
            purchase(2, 2, 7),
            purchase(9, 5, 7),
        ];
        let grouped = group_by_kid(&purchases);

        let ids = |k: i64| grouped[&KidId(k)].iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids(7), vec![3, 2, 9]);
        assert_eq!(ids(9), vec![1]);
        let total: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(total, purchases.len());
    }

    #[test]
    fn grouping_empty_input_is_empty() {
        assert!(group_by_kid(&[]).is_empty());
        assert!(compute_carnet_info(&[], &[], &[]).is_empty());
    }

    #[test]
    fn roster_kids_without_activity_get_zeroed_records() {
        let kids = vec![kid(1), kid(2)];
        let info = compute_carnet_info(&[], &kids, &[]);
        assert_eq!(info.len(), 2);
        for entry in info.values() {
            assert_eq!(
                (entry.total_bought, entry.total_used, entry.total_left, entry.total_debit),
                (0, 0, 0, 0)
            );
        }
    }

    #[test]
    fn unknown_kids_are_grouped_but_not_reported() {
        let purchases = vec![purchase(1, 5, 1), purchase(2, 3, 99)];
        let notes = vec![note(1, 98, true), note(2, 1, true)];
        let kids = vec![kid(1)];

        let grouped = group_by_kid(&purchases);
        assert!(grouped.contains_key(&KidId(99)));

        let info = compute_carnet_info(&purchases, &kids, &notes);
        assert_eq!(info.keys().copied().collect::<Vec<_>>(), vec![KidId(1)]);
        assert_eq!(totals(&info, 1), (5, 1, 4, 0));
    }

    #[test]
    fn exact_balance_has_neither_credit_nor_debit() {
        let purchases = vec![purchase(1, 2, 1)];
        let notes = vec![note(1, 1, true), note(2, 1, true), note(3, 1, false)];
        let info = compute_carnet_info(&purchases, &[kid(1)], &notes);
        assert_eq!(totals(&info, 1), (2, 2, 0, 0));
    }

    #[test]
    fn left_and_debit_are_exclusive_and_match_balance() {
        let purchases: Vec<Purchase> = (0..20).map(|i| purchase(i, (i % 4) as i32 + 1, i % 5)).collect();
        let notes: Vec<KidNote> = (0..60).map(|i| note(i, i % 6, i % 3 != 0)).collect();
        let kids: Vec<Kid> = (0..5).map(kid).collect();
        let info = compute_carnet_info(&purchases, &kids, &notes);

        for (id, entry) in &info {
            assert!(entry.total_left == 0 || entry.total_debit == 0, "kid {id}");
            assert!(entry.total_left >= 0 && entry.total_debit >= 0, "kid {id}");
            assert_eq!(entry.total_left - entry.total_debit, entry.balance(), "kid {id}");

            let bought: i64 = purchases
                .iter()
                .filter(|p| p.kid_id == *id)
                .map(|p| i64::from(p.quantity))
                .sum();
            let used = notes.iter().filter(|n| n.kid_id == *id && n.has_meal).count() as i64;
            assert_eq!(entry.total_bought, bought, "kid {id}");
            assert_eq!(entry.total_used, used, "kid {id}");
        }
    }

    #[test]
    fn large_quantities_do_not_overflow() {
        let purchases = vec![purchase(1, i32::MAX, 1), purchase(2, i32::MAX, 1)];
        let info = compute_carnet_info(&purchases, &[kid(1)], &[]);
        assert_eq!(info[&KidId(1)].total_left, 2 * i64::from(i32::MAX));
    }

    #[test]
    fn serializes_with_string_kid_keys() {
        let (purchases, kids, notes) = fixture();
        let info = compute_carnet_info(&purchases, &kids, &notes);
        let value = serde_json::to_value(&info).unwrap();
        let entry = &value["201"];
        assert_eq!(entry["kid_name"], "Name201");
        assert_eq!(entry["total_bought"], 1);
        assert_eq!(entry["total_used"], 3);
        assert_eq!(entry["total_left"], 0);
        assert_eq!(entry["total_debit"], 2);
    }
}
