//! Shipping wire records.

use ksmart::shipping::{DestinationId, MethodsRequest, OptionsRequest, ShippingOption};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Destination search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationQuery {
    pub keyword: String,
}

/// Carrier lookup query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodsQuery {
    pub receiver_destination_id: DestinationId,

    /// Parcel weight in kilograms
    #[serde(with = "rust_decimal::serde::float")]
    pub weight: Decimal,

    /// Parcel value in whole rupiah
    pub item_value: i64,
}

impl From<&MethodsRequest> for MethodsQuery {
    fn from(request: &MethodsRequest) -> Self {
        Self {
            receiver_destination_id: request.destination_id,
            weight: request.weight_kg,
            item_value: request.item_value,
        }
    }
}

/// Priced options lookup query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionsQuery {
    pub shipper_destination_id: DestinationId,
    pub receiver_destination_id: DestinationId,

    /// Parcel weight in kilograms
    #[serde(with = "rust_decimal::serde::float")]
    pub weight: Decimal,

    /// Parcel value in whole rupiah
    pub item_value: i64,

    /// Cash on delivery
    pub cod: bool,
}

impl OptionsQuery {
    pub fn new(shipper: DestinationId, request: &OptionsRequest, cod: bool) -> Self {
        Self {
            shipper_destination_id: shipper,
            receiver_destination_id: request.destination_id,
            weight: request.weight_kg,
            item_value: request.item_value,
            cod,
        }
    }
}

/// `{shipping_options: [...]}`
#[derive(Debug, Deserialize)]
pub(crate) struct OptionsResponse {
    #[serde(default)]
    pub shipping_options: Vec<ShippingOption>,
}

#[cfg(test)]
mod tests {
    use ksmart::shipping::{Generation, ShippingMethod};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn options_query_sends_weight_as_number() -> TestResult {
        let request = OptionsRequest {
            generation: Generation::default(),
            destination_id: DestinationId(31_555),
            method: ShippingMethod {
                name: "jne".to_string(),
                label: None,
            },
            weight_kg: Decimal::new(75, 2),
            item_value: 130_000,
        };

        let json = serde_json::to_value(OptionsQuery::new(DestinationId(17), &request, true))?;

        assert_eq!(json["shipper_destination_id"], 17);
        assert_eq!(json["receiver_destination_id"], 31_555);
        assert_eq!(json["weight"], 0.75);
        assert_eq!(json["cod"], true);

        Ok(())
    }
}
