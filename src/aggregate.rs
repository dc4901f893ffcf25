use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

use crate::amount::Amount;
use crate::inventory::{AlertLevel, InventoryItem};

/// Possible errors to occur during aggregation
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("There are no values to pick a maximum from")]
    EmptyInput,
}

/// Values grouped by key
///
/// Keys iterate in the order they were first seen in the input. Chart labels
/// are taken from this order, so it has to be reproducible.
#[derive(Clone, Debug)]
pub struct Grouped<K, V> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize>,
}

impl<K, V> Grouped<K, V>
    where K: Eq + Hash + Clone
{
    /// Creates a new, empty grouping
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// The value of `key`, inserting `default` if the key is new
    pub fn entry_or(&mut self, key: K, default: V) -> &mut V {
        let position = match self.index.entry(key) {
            Entry::Occupied(o) => *o.get(),
            Entry::Vacant(v) => {
                let position = self.entries.len();
                self.entries.push((v.key().clone(), default));
                v.insert(position);
                position
            }
        };

        &mut self.entries[position].1
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    /// All key value pairs in first-seen order
    pub fn entries(&self) -> &[(K, V)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reorders the groups by key
    /// *This replaces the first-seen order*
    pub fn sort_by_key(&mut self)
        where K: Ord
    {
        self.entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        for (position, (key, _)) in self.entries.iter().enumerate() {
            self.index.insert(key.clone(), position);
        }
    }
}

impl<K, V> Default for Grouped<K, V>
    where K: Eq + Hash + Clone
{
    fn default() -> Self {
        Self::new()
    }
}

/// A value that can be summed up per group
pub trait Summable: Copy + Default {
    /// `None` on overflow
    fn checked_sum(self, other: Self) -> Option<Self>;
}

impl Summable for Amount {
    fn checked_sum(self, other: Self) -> Option<Self> {
        self.checked_add(other)
    }
}

impl Summable for u64 {
    fn checked_sum(self, other: Self) -> Option<Self> {
        self.checked_add(other)
    }
}

/// Sums up a value per key
///
/// A record without a value poisons the sum of its group, which then becomes
/// `None`. So does an overflowing sum. Every other group is unaffected.
pub fn group_sum<I, K, V>(
    records: I,
    key_fn: impl Fn(&I::Item) -> K,
    value_fn: impl Fn(&I::Item) -> Option<V>,
) -> Grouped<K, Option<V>>
    where I: IntoIterator,
          K: Eq + Hash + Clone,
          V: Summable,
{
    let mut grouped = Grouped::new();

    for record in records {
        let value = value_fn(&record);
        let sum = grouped.entry_or(key_fn(&record), Some(V::default()));
        *sum = sum.zip(value).and_then(|(sum, value)| sum.checked_sum(value));
    }

    grouped
}

/// Counts the records per key
pub fn group_count<I, K>(records: I, key_fn: impl Fn(&I::Item) -> K) -> Grouped<K, usize>
    where I: IntoIterator,
          K: Eq + Hash + Clone,
{
    let mut grouped = Grouped::new();

    for record in records {
        *grouped.entry_or(key_fn(&record), 0) += 1;
    }

    grouped
}

/// The `n` greatest items under `compare`, greatest first
///
/// The sort is stable, so items comparing equal keep their input order.
pub fn top_n<T>(items: &[T], compare: impl Fn(&T, &T) -> Ordering, n: usize) -> Vec<&T> {
    let mut ranked = items.iter().collect::<Vec<_>>();
    ranked.sort_by(|a, b| compare(*b, *a));
    ranked.truncate(n);
    ranked
}

/// The group with the greatest value
///
/// On a tie, the group seen first wins. Poisoned sums order below every
/// valid sum, so they are only picked if all sums are poisoned.
pub fn max_by_value<K, V>(grouped: &Grouped<K, V>) -> Result<(&K, &V), AggregateError>
    where K: Eq + Hash + Clone,
          V: Ord,
{
    grouped
        .entries()
        .iter()
        .fold(None, |best: Option<&(K, V)>, entry| match best {
            Some(best) if best.1 >= entry.1 => Some(best),
            _ => Some(entry),
        })
        .map(|(key, value)| (key, value))
        .ok_or(AggregateError::EmptyInput)
}

/// An inventory item at or below its minimum stock
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StockAlert<'a> {
    pub item: &'a InventoryItem,
    pub level: AlertLevel,
}

/// All items that are running low, in inventory order
pub fn low_stock_alerts(inventory: &[InventoryItem]) -> Vec<StockAlert<'_>> {
    inventory
        .iter()
        .filter_map(|item| item.alert_level().map(|level| StockAlert { item, level }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
use crate::inventory::normalize_inventory;
    use crate::sale::{normalize_sales, SaleRecord};
    use crate::table::parse_table;

    fn sales() -> Vec<SaleRecord> {
        let table = parse_table(
            r#"fecha,      producto, categoria, cantidad, total, vendedor, metodo_pago
               2024-07-01, Lapiz,    Escritura,        2,    10,    Maria, Efectivo
               2024-07-01, Cuaderno, Papel,            1,    25,   Carlos, Tarjeta
               2024-07-02, Pluma,    Escritura,        4,    20,    Maria, Tarjeta
               2024-07-03, Hojas,    Papel,            1,     5,    Maria, Efectivo
               2024-07-03, Folder,   Oficina,          3,    15,   Carlos, Efectivo"#,
            b',',
        ).unwrap();
        normalize_sales(&table)
    }

    #[test]
    fn groups_in_first_seen_order() {
        let sales = sales();
        let by_category = group_sum(&sales, |sale| sale.category().to_owned(), |sale| sale.total());

        assert_eq!(
            by_category.entries(),
            [
                ("Escritura".to_owned(), Some(Amount::from_num(30))),
                ("Papel".to_owned(), Some(Amount::from_num(30))),
                ("Oficina".to_owned(), Some(Amount::from_num(15))),
            ],
        );
    }

    #[test]
    fn group_sum_conserves_total() {
        let sales = sales();
        let by_method = group_sum(&sales, |sale| sale.payment_method().to_owned(), |sale| sale.total());

        let grouped = crate::amount::sum(by_method.values().copied());
        let total = crate::amount::sum(sales.iter().map(SaleRecord::total));
        assert_eq!(grouped, total);
        assert_eq!(by_method.len(), 2);
    }

    #[test]
    fn missing_value_poisons_only_its_group() {
        let table = parse_table(
            r#"categoria, total
               A,         10
               B,         oops
               A,         5
               B,         1"#,
            b',',
        ).unwrap();
        let sales = normalize_sales(&table);
        let grouped = group_sum(&sales, |sale| sale.category().to_owned(), |sale| sale.total());

        assert_eq!(grouped.get(&"A".to_owned()), Some(&Some(Amount::from_num(15))));
        assert_eq!(grouped.get(&"B".to_owned()), Some(&None));
    }

    #[test]
    fn overflow_poisons_only_its_group() {
        let table = parse_table(
            r#"categoria, total
               A,         5000000000000000000
               B,         1
               A,         5000000000000000000"#,
            b',',
        ).unwrap();
        let sales = normalize_sales(&table);
        let grouped = group_sum(&sales, |sale| sale.category().to_owned(), |sale| sale.total());

        assert_eq!(grouped.get(&"A".to_owned()), Some(&None));
        assert_eq!(grouped.get(&"B".to_owned()), Some(&Some(Amount::from_num(1))));
    }

    #[test]
    fn counts_per_key() {
        let sales = sales();
        let counts = group_count(&sales, |sale| sale.employee().to_owned());

        assert_eq!(counts.entries(), [("Maria".to_owned(), 3), ("Carlos".to_owned(), 2)]);
    }

    #[test]
    fn sort_by_key_keeps_lookups() {
        let mut grouped = Grouped::new();
        *grouped.entry_or("b", 0) += 1;
        *grouped.entry_or("a", 0) += 2;
        grouped.sort_by_key();

        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(grouped.get(&"a"), Some(&2));
        assert_eq!(grouped.get(&"b"), Some(&1));
    }

    #[derive(Debug, PartialEq)]
    struct Ranked {
        v: u32,
        id: u32,
    }

    #[test]
    fn top_n_is_stable() {
        let items = [
            Ranked { v: 5, id: 1 },
            Ranked { v: 5, id: 2 },
            Ranked { v: 3, id: 3 },
        ];
        let top = top_n(&items, |a, b| a.v.cmp(&b.v), 2);

        assert_eq!(top, [&Ranked { v: 5, id: 1 }, &Ranked { v: 5, id: 2 }]);
    }

    #[test]
    fn top_n_larger_than_input() {
        let items = [3, 1, 2];

        assert_eq!(top_n(&items, u32::cmp, 10), [&3, &2, &1]);
    }

    #[test]
    fn max_prefers_first_seen_on_tie() {
        let sales = sales();
        let by_category = group_sum(&sales, |sale| sale.category().to_owned(), |sale| sale.total());

        let (key, value) = max_by_value(&by_category).unwrap();
        assert_eq!(key, "Escritura");
        assert_eq!(value, &Some(Amount::from_num(30)));
    }

    #[test]
    fn max_of_nothing() {
        let grouped = Grouped::<String, usize>::new();

        assert!(matches!(max_by_value(&grouped), Err(AggregateError::EmptyInput)));
    }

    #[test]
    fn poisoned_sum_never_wins() {
        let mut grouped = Grouped::new();
        *grouped.entry_or("poisoned", None) = None;
        *grouped.entry_or("valid", None) = Some(Amount::from_num(1));

        assert_eq!(max_by_value(&grouped).unwrap().0, &"valid");
    }

    #[test]
    fn low_stock() {
        let table = parse_table(
            r#"producto, stock_actual, stock_minimo
               Agotado,             0,            5
               Bien,               10,            5
               Bajo,                3,            5"#,
            b',',
        ).unwrap();
        let inventory = normalize_inventory(&table);
        let alerts = low_stock_alerts(&inventory);

        let alerts = alerts
            .iter()
            .map(|alert| (alert.item.product(), alert.level))
            .collect::<Vec<_>>();
        assert_eq!(alerts, [("Agotado", AlertLevel::Critical), ("Bajo", AlertLevel::Warning)]);
    }
}
