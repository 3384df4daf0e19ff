//! Cart wire records.

use ksmart::{
    items::{CartLineItem, ItemId, ProductId},
    money::whole_rupiah,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::CartsServiceError;

/// A cart line as the backend sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemRecord {
    /// Cart row id
    pub id: ItemId,

    pub product_id: ProductId,

    #[serde(alias = "product_name")]
    pub name: String,

    /// Unit price in whole rupiah
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: u32,

    /// Unit weight in grams
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight: u32,

    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "bv_or_zero"
    )]
    pub bv: Decimal,

    #[serde(default, deserialize_with = "null_as_default")]
    pub stock: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Missing and `null` numbers both read as zero.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn bv_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(rust_decimal::serde::float_option::deserialize(deserializer)?.unwrap_or_default())
}

impl TryFrom<CartItemRecord> for CartLineItem {
    type Error = CartsServiceError;

    fn try_from(record: CartItemRecord) -> Result<Self, Self::Error> {
        let unit_price =
            ksmart::money::rupiah(record.price).map_err(|source| CartsServiceError::InvalidRecord {
                item: record.id,
                source,
            })?;

        Ok(Self {
            id: record.id,
            product_id: record.product_id,
            name: record.name,
            unit_price,
            quantity: record.quantity,
            unit_weight_grams: record.weight,
            unit_bv: record.bv,
            stock: record.stock,
            variant: record.variant,
        })
    }
}

impl From<&CartLineItem> for CartItemRecord {
    fn from(item: &CartLineItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            name: item.name.clone(),
            price: whole_rupiah(&item.unit_price),
            quantity: item.quantity,
            weight: item.unit_weight_grams,
            bv: item.unit_bv,
            stock: item.stock,
            variant: item.variant.clone(),
        }
    }
}

/// Body for adding units of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCartItem {
    pub user_email: String,
    pub product_id: ProductId,
    pub quantity: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Body for taking units of a product out of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecreaseCartItem {
    pub user_email: String,
    pub product_id: ProductId,
    pub quantity: u32,
}
