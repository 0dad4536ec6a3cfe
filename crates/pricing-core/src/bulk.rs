//! # Bulk Price List Planning
//!
//! Pure preparation steps for the bulk price list update.
//!
//! ```text
//! [UpdatePriceListInput { id, meta.., prices: [..] }, ...]
//!                  │
//!                  │ split + stamp price_list_id
//!                  ▼
//!  metadata: [UpdatePriceList, ...]     prices: [PriceListPriceInput, ...]
//!                                                  │
//!                                                  │ partition by id presence
//!                                    ┌─────────────┴─────────────┐
//!                                    ▼                           ▼
//!                        existing: [UpdateMoneyAmount]   new: [CreateMoneyAmount]
//! ```
//!
//! The result is a [`PriceListUpdatePlan`] the service applies inside one
//! transaction. Partitioning is lossless: every price lands in exactly one
//! side.

use crate::types::{
    CreateMoneyAmount, PriceListPriceInput, UpdateMoneyAmount, UpdatePriceList,
    UpdatePriceListInput,
};

/// Work derived from a batch of price list update inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceListUpdatePlan {
    /// Metadata patches, one per input, in input order.
    pub price_lists: Vec<UpdatePriceList>,
    /// Patches for prices that carried an id.
    pub existing_prices: Vec<UpdateMoneyAmount>,
    /// New prices (no id), each owned by its input's list.
    pub new_prices: Vec<CreateMoneyAmount>,
}

impl PriceListUpdatePlan {
    /// Builds the plan for a batch of inputs.
    pub fn from_inputs(inputs: Vec<UpdatePriceListInput>) -> Self {
        let mut price_lists = Vec::with_capacity(inputs.len());
        let mut prices = Vec::new();

        for input in inputs {
            let (meta, stamped) = input.into_parts();
            price_lists.push(meta);
            prices.extend(stamped);
        }

        let (existing_prices, new_prices) = partition_prices(prices);

        PriceListUpdatePlan {
            price_lists,
            existing_prices,
            new_prices,
        }
    }

    /// Ids of the price lists the plan touches.
    pub fn price_list_ids(&self) -> Vec<String> {
        self.price_lists.iter().map(|p| p.id.clone()).collect()
    }
}

/// Splits prices into updates (with id) and creates (without id).
pub fn partition_prices(
    prices: Vec<PriceListPriceInput>,
) -> (Vec<UpdateMoneyAmount>, Vec<CreateMoneyAmount>) {
    let mut existing = Vec::new();
    let mut new = Vec::new();

    for price in prices {
        match price.id {
            Some(id) => existing.push(UpdateMoneyAmount {
                id,
                currency_code: price.currency_code,
                amount: price.amount,
                min_quantity: price.min_quantity,
                max_quantity: price.max_quantity,
                price_list_id: price.price_list_id.map(Some),
            }),
            None => new.push(CreateMoneyAmount {
                currency_code: price.currency_code.flatten(),
                amount: price.amount.flatten(),
                min_quantity: price.min_quantity.flatten(),
                max_quantity: price.max_quantity.flatten(),
                price_list_id: price.price_list_id,
            }),
        }
    }

    (existing, new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_plan_partitions_by_id_presence() {
        let plan = PriceListUpdatePlan::from_inputs(vec![
            UpdatePriceListInput::new("pl_1")
                .with_price(PriceListPriceInput::existing("ma_1", 1200))
                .with_price(PriceListPriceInput::new("eur", 900)),
            UpdatePriceListInput::new("pl_2").with_price(PriceListPriceInput::new("usd", 300)),
            UpdatePriceListInput::new("pl_3"),
        ]);

        assert_eq!(plan.price_list_ids(), vec!["pl_1", "pl_2", "pl_3"]);

        assert_eq!(plan.existing_prices.len(), 1);
        let existing = &plan.existing_prices[0];
        assert_eq!(existing.id, "ma_1");
        assert_eq!(existing.amount, Some(Some(Money::from_minor(1200))));
        assert_eq!(existing.price_list_id, Some(Some("pl_1".to_string())));
        assert_eq!(existing.currency_code, None);

        assert_eq!(plan.new_prices.len(), 2);
        assert_eq!(plan.new_prices[0].price_list_id.as_deref(), Some("pl_1"));
        assert_eq!(plan.new_prices[0].currency_code.as_deref(), Some("eur"));
        assert_eq!(plan.new_prices[1].price_list_id.as_deref(), Some("pl_2"));
    }

    #[test]
    fn test_empty_batch_yields_empty_plan() {
        let plan = PriceListUpdatePlan::from_inputs(Vec::new());
        assert_eq!(plan, PriceListUpdatePlan::default());
    }

    #[test]
    fn test_explicit_null_on_new_price_is_absent() {
        let price: PriceListPriceInput =
            serde_json::from_str(r#"{"currency_code":"usd","amount":500,"max_quantity":null}"#)
                .unwrap();
        let (existing, new) = partition_prices(vec![price]);

        assert!(existing.is_empty());
        assert_eq!(new[0].max_quantity, None);
        assert_eq!(new[0].amount, Some(Money::from_minor(500)));
    }
}
