//! Shipping Negotiation
//!
//! Sans-IO state machine for choosing how an order ships: destination, then carrier
//! method, then a priced option. Each step gates the next and every upstream change
//! discards what was chosen downstream.
//!
//! Lookups are asynchronous in practice, so the machine hands out requests stamped with a
//! [`Generation`] and only accepts a response whose generation is still current. Any input
//! change bumps the generation, which makes every in-flight response stale.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    aggregate::CartTotals,
    money::{AmountError, Rupiah, rupiah, whole_rupiah},
};

/// Smallest weight ever sent to a rate lookup, in kilograms.
pub const MIN_LOOKUP_WEIGHT_KG: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Identifier of a shipping destination (a sub-district in the rate provider's index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(pub u64);

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A destination returned by the destination search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Provider destination id
    pub id: DestinationId,

    /// Human readable label, e.g. "KEBAYORAN BARU, JAKARTA SELATAN"
    #[serde(default)]
    pub label: String,

    /// Postal code, when the provider knows it
    #[serde(default)]
    pub zip_code: Option<String>,
}

/// A carrier offered for a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    /// Carrier identifier, matched against [`ShippingOption::shipping_name`]
    pub name: String,

    /// Label shown to the member
    #[serde(default)]
    pub label: Option<String>,
}

impl ShippingMethod {
    /// Label shown to the member, falling back to the carrier identifier.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// A priced service of a carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingOption {
    /// Carrier this option belongs to
    pub shipping_name: String,

    /// Service level, e.g. "REG"
    pub service_name: String,

    /// Cost in whole rupiah
    #[serde(default)]
    pub shipping_cost: i64,

    /// Estimated delivery time as reported by the carrier
    #[serde(default)]
    pub etd: Option<String>,
}

impl ShippingOption {
    /// Shipping cost as money.
    ///
    /// # Errors
    ///
    /// Returns an [`AmountError`] if the cost cannot be represented.
    pub fn cost(&self) -> Result<Rupiah, AmountError> {
        rupiah(self.shipping_cost)
    }

    /// Whether this option belongs to a carrier.
    pub fn belongs_to(&self, method: &ShippingMethod) -> bool {
        self.shipping_name.eq_ignore_ascii_case(&method.name)
    }

    /// Label combining carrier and service, e.g. "JNE REG".
    pub fn label(&self) -> String {
        format!("{} {}", self.shipping_name, self.service_name)
    }
}

/// Counter identifying which inputs a request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request for the carriers serving a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodsRequest {
    /// Generation the request belongs to
    pub generation: Generation,

    /// Receiving destination
    pub destination_id: DestinationId,

    /// Parcel weight in kilograms, never below [`MIN_LOOKUP_WEIGHT_KG`]
    pub weight_kg: Decimal,

    /// Declared value of the goods in whole rupiah
    pub item_value: i64,
}

/// Request for the priced options of one carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsRequest {
    /// Generation the request belongs to
    pub generation: Generation,

    /// Receiving destination
    pub destination_id: DestinationId,

    /// Carrier whose options are wanted
    pub method: ShippingMethod,

    /// Parcel weight in kilograms, never below [`MIN_LOOKUP_WEIGHT_KG`]
    pub weight_kg: Decimal,

    /// Declared value of the goods in whole rupiah
    pub item_value: i64,
}

/// A response arrived for inputs that have since changed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("discarded response for generation {received}; current generation is {current}")]
pub struct StaleResponse {
    /// Generation the response was requested under
    pub received: Generation,

    /// Generation at the time the response arrived
    pub current: Generation,
}

/// Errors raised by member selections.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShippingError {
    /// No destination has been chosen yet.
    #[error("choose a destination first")]
    NoDestination,

    /// The chosen carrier is not among the loaded methods.
    #[error("shipping method {0} is not available")]
    UnknownMethod(String),

    /// No carrier has been chosen yet.
    #[error("choose a shipping method first")]
    NoMethod,

    /// The chosen service is not among the loaded options.
    #[error("shipping option {0} is not available")]
    UnknownOption(String),
}

/// Where the negotiation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingState {
    /// Nothing chosen.
    NoDestination,

    /// Destination chosen, carriers not loaded.
    DestinationSelected,

    /// Carriers loaded, none chosen.
    MethodsLoaded,

    /// Carrier chosen, options not loaded.
    MethodSelected,

    /// Options loaded, none chosen.
    OptionsLoaded,

    /// Option chosen; checkout may proceed.
    OptionSelected,
}

/// Everything checkout needs from a completed negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSelection {
    /// Receiving destination
    pub destination: Destination,

    /// Chosen carrier
    pub method: ShippingMethod,

    /// Chosen priced option
    pub option: ShippingOption,
}

/// Shipping negotiation state machine.
#[derive(Debug, Clone, Default)]
pub struct ShippingNegotiation {
    generation: Generation,
    weight_kg: Decimal,
    item_value: i64,
    destination: Option<Destination>,
    methods: Option<Vec<ShippingMethod>>,
    selected_method: Option<ShippingMethod>,
    options: Option<Vec<ShippingOption>>,
    selected_option: Option<ShippingOption>,
}

impl ShippingNegotiation {
    /// Start a negotiation with nothing chosen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> ShippingState {
        if self.destination.is_none() {
            ShippingState::NoDestination
        } else if self.selected_option.is_some() {
            ShippingState::OptionSelected
        } else if self.options.is_some() {
            ShippingState::OptionsLoaded
        } else if self.selected_method.is_some() {
            ShippingState::MethodSelected
        } else if self.methods.is_some() {
            ShippingState::MethodsLoaded
        } else {
            ShippingState::DestinationSelected
        }
    }

    /// Current generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Chosen destination.
    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    /// Loaded carriers; empty until loaded.
    pub fn methods(&self) -> &[ShippingMethod] {
        self.methods.as_deref().unwrap_or_default()
    }

    /// Chosen carrier.
    pub fn selected_method(&self) -> Option<&ShippingMethod> {
        self.selected_method.as_ref()
    }

    /// Loaded options for the chosen carrier; empty until loaded.
    pub fn options(&self) -> &[ShippingOption] {
        self.options.as_deref().unwrap_or_default()
    }

    /// Chosen option.
    pub fn selected_option(&self) -> Option<&ShippingOption> {
        self.selected_option.as_ref()
    }

    /// Destination, carrier and option, once all three are chosen.
    pub fn selection(&self) -> Option<ShippingSelection> {
        Some(ShippingSelection {
            destination: self.destination.clone()?,
            method: self.selected_method.clone()?,
            option: self.selected_option.clone()?,
        })
    }

    /// Update the parcel the rates are quoted for.
    ///
    /// When weight or value actually changed, everything below the destination is
    /// discarded and a fresh carrier lookup is returned if one is possible.
    pub fn set_cart(&mut self, totals: &CartTotals) -> Option<MethodsRequest> {
        let item_value = whole_rupiah(&totals.price);

        if totals.weight_kg == self.weight_kg && item_value == self.item_value {
            return None;
        }

        self.weight_kg = totals.weight_kg;
        self.item_value = item_value;
        self.reset_below_destination();

        self.methods_request()
    }

    /// Choose or clear the destination.
    ///
    /// Always discards everything below the destination and returns a carrier lookup if
    /// the parcel has weight and value.
    pub fn set_destination(&mut self, destination: Option<Destination>) -> Option<MethodsRequest> {
        self.destination = destination;
        self.reset_below_destination();

        self.methods_request()
    }

    /// Apply a carrier lookup response.
    ///
    /// A single carrier is chosen automatically, in which case the options lookup for it is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`StaleResponse`] if the inputs changed since the request was issued; the
    /// response is ignored.
    pub fn apply_methods(
        &mut self,
        generation: Generation,
        methods: Vec<ShippingMethod>,
    ) -> Result<Option<OptionsRequest>, StaleResponse> {
        self.ensure_current(generation)?;

        let only = match methods.as_slice() {
            [only] => Some(only.name.clone()),
            _ => None,
        };

        self.methods = Some(methods);

        match only {
            Some(name) => Ok(self.select_method(&name).ok()),
            None => Ok(None),
        }
    }

    /// Record a failed carrier lookup, leaving an empty carrier list.
    ///
    /// # Errors
    ///
    /// Returns [`StaleResponse`] if the inputs changed since the request was issued.
    pub fn fail_methods(&mut self, generation: Generation) -> Result<(), StaleResponse> {
        self.ensure_current(generation)?;

        self.methods = Some(Vec::new());
        self.reset_below_methods();

        Ok(())
    }

    /// Choose a carrier from the loaded methods and return its options lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::NoDestination`] without a destination, or
    /// [`ShippingError::UnknownMethod`] if the carrier was not offered.
    pub fn select_method(&mut self, name: &str) -> Result<OptionsRequest, ShippingError> {
        let destination_id = self
            .destination
            .as_ref()
            .map(|destination| destination.id)
            .ok_or(ShippingError::NoDestination)?;

        let method = self
            .methods()
            .iter()
            .find(|method| method.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| ShippingError::UnknownMethod(name.to_string()))?;

        self.bump();
        self.reset_below_methods();
        self.selected_method = Some(method.clone());

        Ok(OptionsRequest {
            generation: self.generation,
            destination_id,
            method,
            weight_kg: self.lookup_weight(),
            item_value: self.item_value,
        })
    }

    /// Apply an options lookup response.
    ///
    /// Options for other carriers are dropped and the first remaining option is chosen.
    ///
    /// # Errors
    ///
    /// Returns [`StaleResponse`] if the inputs changed since the request was issued.
    pub fn apply_options(
        &mut self,
        generation: Generation,
        options: Vec<ShippingOption>,
    ) -> Result<Option<&ShippingOption>, StaleResponse> {
        self.ensure_current(generation)?;

        let options: Vec<ShippingOption> = match &self.selected_method {
            Some(method) => options
                .into_iter()
                .filter(|option| option.belongs_to(method))
                .collect(),
            None => Vec::new(),
        };

        self.selected_option = options.first().cloned();
        self.options = Some(options);

        Ok(self.selected_option.as_ref())
    }

    /// Record a failed options lookup, leaving an empty option list.
    ///
    /// # Errors
    ///
    /// Returns [`StaleResponse`] if the inputs changed since the request was issued.
    pub fn fail_options(&mut self, generation: Generation) -> Result<(), StaleResponse> {
        self.ensure_current(generation)?;

        self.options = Some(Vec::new());
        self.selected_option = None;

        Ok(())
    }

    /// Choose a different service among the loaded options.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::NoMethod`] without a carrier, or
    /// [`ShippingError::UnknownOption`] if the service is not among the loaded options.
    pub fn select_option(&mut self, service_name: &str) -> Result<&ShippingOption, ShippingError> {
        if self.selected_method.is_none() {
            return Err(ShippingError::NoMethod);
        }

        let option = self
            .options()
            .iter()
            .find(|option| option.service_name.eq_ignore_ascii_case(service_name))
            .cloned()
            .ok_or_else(|| ShippingError::UnknownOption(service_name.to_string()))?;

        Ok(&*self.selected_option.insert(option))
    }

    fn methods_request(&self) -> Option<MethodsRequest> {
        let destination = self.destination.as_ref()?;

        if self.weight_kg <= Decimal::ZERO || self.item_value <= 0 {
            return None;
        }

        Some(MethodsRequest {
            generation: self.generation,
            destination_id: destination.id,
            weight_kg: self.lookup_weight(),
            item_value: self.item_value,
        })
    }

    fn lookup_weight(&self) -> Decimal {
        self.weight_kg.max(MIN_LOOKUP_WEIGHT_KG)
    }

    fn ensure_current(&self, generation: Generation) -> Result<(), StaleResponse> {
        if generation == self.generation {
            Ok(())
        } else {
            Err(StaleResponse {
                received: generation,
                current: self.generation,
            })
        }
    }

    fn bump(&mut self) {
        self.generation = Generation(self.generation.0.wrapping_add(1));
    }

    fn reset_below_destination(&mut self) {
        self.bump();
        self.methods = None;
        self.reset_below_methods();
    }

    fn reset_below_methods(&mut self) {
        self.selected_method = None;
        self.options = None;
        self.selected_option = None;
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{aggregate::CartTotals, items::test_support::line};

    use super::*;

    fn destination(id: u64) -> Destination {
        Destination {
            id: DestinationId(id),
            label: format!("Destination {id}"),
            zip_code: None,
        }
    }

    fn method(name: &str) -> ShippingMethod {
        ShippingMethod {
            name: name.to_string(),
            label: None,
        }
    }

    fn option(carrier: &str, service: &str, cost: i64) -> ShippingOption {
        ShippingOption {
            shipping_name: carrier.to_string(),
            service_name: service.to_string(),
            shipping_cost: cost,
            etd: None,
        }
    }

    fn totals() -> Result<CartTotals, crate::aggregate::AggregateError> {
        CartTotals::of(&[line(1, 50_000, 2, 40, 10)])
    }

    fn negotiation() -> Result<ShippingNegotiation, crate::aggregate::AggregateError> {
        let mut negotiation = ShippingNegotiation::new();
        negotiation.set_cart(&totals()?);

        Ok(negotiation)
    }

    #[test]
    fn starts_without_destination() {
        let negotiation = ShippingNegotiation::new();

        assert_eq!(negotiation.state(), ShippingState::NoDestination);
        assert!(negotiation.selection().is_none());
    }

    #[test]
    fn destination_issues_methods_request() -> TestResult {
        let mut negotiation = negotiation()?;

        let request = negotiation
            .set_destination(Some(destination(7)))
            .ok_or("expected methods request")?;

        assert_eq!(negotiation.state(), ShippingState::DestinationSelected);
        assert_eq!(request.destination_id, DestinationId(7));
        assert_eq!(request.weight_kg, Decimal::new(5, 1));
        assert_eq!(request.item_value, 100_000);

        Ok(())
    }

    #[test]
    fn empty_cart_does_not_request_methods() {
        let mut negotiation = ShippingNegotiation::new();

        assert!(negotiation.set_destination(Some(destination(7))).is_none());
        assert_eq!(negotiation.state(), ShippingState::DestinationSelected);
    }

    #[test]
    fn light_parcels_are_quoted_at_minimum_weight() -> TestResult {
        let mut item = line(1, 5_000, 1, 1, 10);
        item.unit_weight_grams = 20;

        let mut negotiation = ShippingNegotiation::new();
        negotiation.set_destination(Some(destination(7)));

        let request = negotiation
            .set_cart(&CartTotals::of(&[item])?)
            .ok_or("expected methods request")?;

        assert_eq!(request.weight_kg, MIN_LOOKUP_WEIGHT_KG);

        Ok(())
    }

    #[test]
    fn single_method_is_selected_automatically() -> TestResult {
        let mut negotiation = negotiation()?;
        let request = negotiation
            .set_destination(Some(destination(7)))
            .ok_or("expected methods request")?;

        let options = negotiation.apply_methods(request.generation, vec![method("jne")])?;

        assert_eq!(negotiation.state(), ShippingState::MethodSelected);
        assert_eq!(options.map(|request| request.method), Some(method("jne")));

        Ok(())
    }

    #[test]
    fn several_methods_wait_for_a_choice() -> TestResult {
        let mut negotiation = negotiation()?;
        let request = negotiation
            .set_destination(Some(destination(7)))
            .ok_or("expected methods request")?;

        let options =
            negotiation.apply_methods(request.generation, vec![method("jne"), method("sicepat")])?;

        assert!(options.is_none());
        assert_eq!(negotiation.state(), ShippingState::MethodsLoaded);
        assert_eq!(negotiation.methods().len(), 2);

        Ok(())
    }

    #[test]
    fn options_are_filtered_by_carrier_and_first_selected() -> TestResult {
        let mut negotiation = negotiation()?;
        let request = negotiation
            .set_destination(Some(destination(7)))
            .ok_or("expected methods request")?;

        negotiation.apply_methods(request.generation, vec![method("JNE"), method("SiCepat")])?;
        let options_request = negotiation.select_method("jne")?;

        let selected = negotiation.apply_options(
            options_request.generation,
            vec![
                option("sicepat", "BEST", 9_000),
                option("jne", "REG", 15_000),
                option("JNE", "YES", 30_000),
            ],
        )?;

        assert_eq!(selected, Some(&option("jne", "REG", 15_000)));
        assert_eq!(negotiation.options().len(), 2);
        assert_eq!(negotiation.state(), ShippingState::OptionSelected);

        let chosen = negotiation.select_option("yes")?;
        assert_eq!(chosen.shipping_cost, 30_000);

        Ok(())
    }

    #[test]
    fn new_destination_makes_pending_methods_stale() -> TestResult {
        let mut negotiation = negotiation()?;

        let first = negotiation
            .set_destination(Some(destination(1)))
            .ok_or("expected methods request")?;
        let second = negotiation
            .set_destination(Some(destination(2)))
            .ok_or("expected methods request")?;

        negotiation.apply_methods(second.generation, vec![method("pos"), method("tiki")])?;

        let stale = negotiation.apply_methods(first.generation, vec![method("jne")]);

        assert_eq!(
            stale,
            Err(StaleResponse {
                received: first.generation,
                current: second.generation,
            })
        );
        assert_eq!(negotiation.methods(), &[method("pos"), method("tiki")]);

        Ok(())
    }

    #[test]
    fn cart_change_invalidates_selected_option() -> TestResult {
        let mut negotiation = negotiation()?;
        let request = negotiation
            .set_destination(Some(destination(7)))
            .ok_or("expected methods request")?;

        let options = negotiation
            .apply_methods(request.generation, vec![method("jne")])?
            .ok_or("expected options request")?;
        negotiation.apply_options(options.generation, vec![option("jne", "REG", 15_000)])?;

        assert!(negotiation.selection().is_some());

        let refetch = negotiation.set_cart(&CartTotals::of(&[line(1, 50_000, 3, 40, 10)])?);

        assert!(refetch.is_some());
        assert!(negotiation.selected_option().is_none());
        assert_eq!(negotiation.state(), ShippingState::DestinationSelected);

        let late = negotiation.apply_options(options.generation, vec![option("jne", "REG", 1)]);
        assert!(late.is_err());

        Ok(())
    }

    #[test]
    fn unchanged_cart_keeps_selection() -> TestResult {
        let mut negotiation = negotiation()?;
        negotiation.set_destination(Some(destination(7)));

        assert!(negotiation.set_cart(&totals()?).is_none());

        Ok(())
    }

    #[test]
    fn failed_lookups_leave_empty_lists() -> TestResult {
        let mut negotiation = negotiation()?;
        let request = negotiation
            .set_destination(Some(destination(7)))
            .ok_or("expected methods request")?;

        negotiation.fail_methods(request.generation)?;

        assert_eq!(negotiation.state(), ShippingState::MethodsLoaded);
        assert!(negotiation.methods().is_empty());
        assert_eq!(
            negotiation.select_method("jne"),
            Err(ShippingError::UnknownMethod("jne".to_string()))
        );

        Ok(())
    }

    #[test]
    fn clearing_destination_resets_everything() -> TestResult {
        let mut negotiation = negotiation()?;
        let request = negotiation
            .set_destination(Some(destination(7)))
            .ok_or("expected methods request")?;
        negotiation.apply_methods(request.generation, vec![method("jne")])?;

        assert!(negotiation.set_destination(None).is_none());
        assert_eq!(negotiation.state(), ShippingState::NoDestination);
        assert!(negotiation.methods().is_empty());
        assert!(negotiation.selected_method().is_none());

        Ok(())
    }

    #[test]
    fn option_cost_is_money() -> TestResult {
        assert_eq!(whole_rupiah(&option("jne", "REG", 15_000).cost()?), 15_000);

        Ok(())
    }
}
