//! # Transfer Objects
//!
//! Plain serializable shapes handed back to callers of the pricing service.
//!
//! Projection always goes through `From<&Entity>`, so serializing never
//! touches the entity it reads from. Relations appear only when they were
//! loaded on the entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Currency, MoneyAmount, PriceList, PriceListStatus, PriceListType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyDto {
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub decimal_digits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAmountDto {
    pub id: String,
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyDto>,
    pub amount: Option<Money>,
    pub min_quantity: Option<i64>,
    pub max_quantity: Option<i64>,
    pub price_list_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceListDto {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub list_type: PriceListType,
    pub status: PriceListStatus,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prices: Option<Vec<MoneyAmountDto>>,
}

impl From<&Currency> for CurrencyDto {
    fn from(currency: &Currency) -> Self {
        CurrencyDto {
            code: currency.code.clone(),
            name: currency.name.clone(),
            symbol: currency.symbol.clone(),
            decimal_digits: currency.decimal_digits,
        }
    }
}

impl From<&MoneyAmount> for MoneyAmountDto {
    fn from(money_amount: &MoneyAmount) -> Self {
        MoneyAmountDto {
            id: money_amount.id.clone(),
            currency_code: money_amount.currency_code.clone(),
            currency: money_amount.currency.as_ref().map(CurrencyDto::from),
            amount: money_amount.amount,
            min_quantity: money_amount.min_quantity,
            max_quantity: money_amount.max_quantity,
            price_list_id: money_amount.price_list_id.clone(),
        }
    }
}

impl From<&PriceList> for PriceListDto {
    fn from(price_list: &PriceList) -> Self {
        PriceListDto {
            id: price_list.id.clone(),
            name: price_list.name.clone(),
            description: price_list.description.clone(),
            list_type: price_list.list_type,
            status: price_list.status,
            starts_at: price_list.starts_at,
            ends_at: price_list.ends_at,
            created_at: price_list.created_at,
            updated_at: price_list.updated_at,
            prices: price_list.prices.as_deref().map(to_dtos),
        }
    }
}

/// Projects a slice of entities into transfer objects, preserving order.
pub fn to_dtos<'a, E, D>(entities: &'a [E]) -> Vec<D>
where
    D: From<&'a E>,
{
    entities.iter().map(D::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CreateCurrency, CreateMoneyAmount, CreatePriceList};
    use chrono::TimeZone;

    #[test]
    fn test_money_amount_dto_includes_loaded_currency_only() {
        let mut price = CreateMoneyAmount::new("usd", 1000).into_money_amount("ma_1".into());

        let json = serde_json::to_value(MoneyAmountDto::from(&price)).unwrap();
        assert!(json.get("currency").is_none());
        assert_eq!(json["amount"], 1000);

        price.currency = Some(CreateCurrency::new("usd", "US Dollar", "$").into_currency());
        let dto = MoneyAmountDto::from(&price);
        assert_eq!(dto.currency.unwrap().symbol, "$");
    }

    #[test]
    fn test_price_list_dto_is_pure_projection() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut list = CreatePriceList::new("Summer Sale").into_price_list("pl_1".into(), now);
        list.prices = Some(vec![
            CreateMoneyAmount::new("usd", 1000).into_money_amount("ma_1".into())
        ]);
        let before = list.clone();

        let dtos: Vec<PriceListDto> = to_dtos(std::slice::from_ref(&list));
        assert_eq!(list, before);
        assert_eq!(dtos[0].prices.as_ref().map(Vec::len), Some(1));

        let json = serde_json::to_value(&dtos[0]).unwrap();
        assert_eq!(json["type"], "sale");
        assert_eq!(json["status"], "draft");
        assert!(json.get("deleted_at").is_none());
    }
}
