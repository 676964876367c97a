//! Coffee order form taken by the barista

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SlotForm, extend_sequence, merge_scalar};
use crate::notify::Notification;

/// A coffee order in progress (or completed)
///
/// Serialized with camelCase keys; this is also the on-disk order file format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoffeeOrder {
    /// Drink name (e.g. "latte")
    pub drink_type: Option<String>,
    /// Cup size
    pub size: Option<String>,
    /// Milk choice
    pub milk: Option<String>,
    /// Extras in the order they were requested
    #[serde(default)]
    pub extras: Vec<String>,
    /// Customer name for the cup
    pub name: Option<String>,
}

/// Partial order supplied by `update_order`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderUpdate {
    #[serde(default)]
    pub drink_type: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub milk: Option<String>,
    #[serde(default)]
    pub extras: Option<Vec<String>>,
    #[serde(default)]
    pub name: Option<String>,
}

impl SlotForm for CoffeeOrder {
    type Update = OrderUpdate;
    type Record = Self;

    fn apply_update(&mut self, update: OrderUpdate) {
        merge_scalar(&mut self.drink_type, update.drink_type);
        merge_scalar(&mut self.size, update.size);
        merge_scalar(&mut self.milk, update.milk);
        extend_sequence(&mut self.extras, update.extras);
        merge_scalar(&mut self.name, update.name);
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("drinkType", &self.drink_type),
            ("size", &self.size),
            ("milk", &self.milk),
            ("name", &self.name),
        ]
        .into_iter()
        .filter(|(_, slot)| slot.is_none())
        .map(|(field, _)| field)
        .collect()
    }

    fn to_record(&self, _at: DateTime<Utc>) -> Self {
        self.clone()
    }

    fn notification(record: &Self) -> Notification {
        Notification::OrderComplete {
            order: record.clone(),
        }
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    /// A scalar value as a model might send it, blanks included
    fn arb_scalar() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some(String::new())),
            Just(Some("  ".to_string())),
            "[a-z]{1,8}( [a-z]{1,8})?".prop_map(Some),
        ]
    }

    fn arb_update() -> impl Strategy<Value = OrderUpdate> {
        (
            arb_scalar(),
            arb_scalar(),
            arb_scalar(),
            prop::option::of(prop::collection::vec("[a-z ]{0,10}", 0..4)),
            arb_scalar(),
        )
            .prop_map(|(drink_type, size, milk, extras, name)| OrderUpdate {
                drink_type,
                size,
                milk,
                extras,
                name,
            })
    }

    fn last_non_blank<'a>(values: impl Iterator<Item = &'a Option<String>>) -> Option<String> {
        values
            .flatten()
            .filter(|v| !v.trim().is_empty())
            .last()
            .cloned()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Each scalar holds the last non-blank value sent and extras hold
        /// every item sent, in order.
        #[test]
        fn prop_updates_merge_last_scalar_and_append_extras(
            updates in prop::collection::vec(arb_update(), 0..12)
        ) {
            let mut order = CoffeeOrder::default();
            for update in updates.clone() {
                order.apply_update(update);
            }

            let last = |field: fn(&OrderUpdate) -> &Option<String>| {
                last_non_blank(updates.iter().map(field))
            };
            prop_assert_eq!(order.drink_type.clone(), last(|u| &u.drink_type));
            prop_assert_eq!(order.size.clone(), last(|u| &u.size));
            prop_assert_eq!(order.milk.clone(), last(|u| &u.milk));
            prop_assert_eq!(order.name.clone(), last(|u| &u.name));

            let extras: Vec<String> = updates
                .iter()
                .filter_map(|u| u.extras.clone())
                .flatten()
                .collect();
            prop_assert_eq!(&order.extras, &extras);
        }

        /// Completion depends on the four required slots only, never on extras.
        #[test]
        fn prop_completion_ignores_extras(
            updates in prop::collection::vec(arb_update(), 0..12)
        ) {
            let mut order = CoffeeOrder::default();
            for update in updates {
                order.apply_update(update);
            }

            let required_filled = order.drink_type.is_some()
                && order.size.is_some()
                && order.milk.is_some()
                && order.name.is_some();
            prop_assert_eq!(order.is_complete(), required_filled);
            prop_assert_eq!(order.missing_fields().is_empty(), required_filled);

            let mut without_extras = order.clone();
            without_extras.extras.clear();
            prop_assert_eq!(without_extras.is_complete(), order.is_complete());
        }
    }
}
