//! Order summary
//!
//! Renders the selected lines, their totals and the BV split as a table, the way the
//! checkout review page lays them out.

use std::io;

use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    aggregate::{AggregateError, CartTotals},
    bv::{BvError, BvSplit, allocate},
    checkout::Settlement,
    items::CartLineItem,
    money::{AmountError, Rupiah, whole_rupiah},
};

/// Errors that can occur when rendering a summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Totals could not be computed.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// BV could not be split.
    #[error(transparent)]
    Bv(#[from] BvError),

    /// A line price could not be computed.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Writing the output failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy)]
struct Charges {
    discounted_subtotal: Rupiah,
    shipping_cost: Rupiah,
    gross_amount: Rupiah,
}

/// Summary of a set of cart lines, optionally with settlement charges.
#[derive(Debug, Clone)]
pub struct OrderSummary<'a> {
    items: &'a [CartLineItem],
    totals: CartTotals,
    split: BvSplit,
    charges: Option<Charges>,
}

impl<'a> OrderSummary<'a> {
    /// Summarise lines before shipping is known.
    ///
    /// # Errors
    ///
    /// Returns a [`SummaryError`] if totals or the BV split cannot be computed.
    pub fn for_items(items: &'a [CartLineItem]) -> Result<Self, SummaryError> {
        let totals = CartTotals::of(items)?;
        let split = allocate(totals.bv)?;

        Ok(Self {
            items,
            totals,
            split,
            charges: None,
        })
    }

    /// Summarise the lines of a prepared settlement, including its charges.
    pub fn for_settlement(items: &'a [CartLineItem], settlement: &Settlement) -> Self {
        Self {
            items,
            totals: settlement.totals,
            split: settlement.split,
            charges: Some(Charges {
                discounted_subtotal: settlement.discounted_subtotal,
                shipping_cost: settlement.shipping_cost,
                gross_amount: settlement.gross_amount,
            }),
        }
    }

    /// Totals shown in the summary.
    pub fn totals(&self) -> &CartTotals {
        &self.totals
    }

    /// BV split shown in the summary.
    pub fn split(&self) -> &BvSplit {
        &self.split
    }

    /// Write the summary table and footer.
    ///
    /// # Errors
    ///
    /// Returns a [`SummaryError`] if a line price overflows or the write fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), SummaryError> {
        let mut builder = Builder::default();

        builder.push_record(["Item", "Qty", "Price", "Weight", "BV"]);

        for item in self.items {
            let name = match &item.variant {
                Some(variant) => format!("{} ({variant})", item.name),
                None => item.name.clone(),
            };

            builder.push_record([
                name,
                item.quantity.to_string(),
                format_rupiah(whole_rupiah(&item.line_price()?)),
                format!("{} g", item.line_weight_grams()),
                item.line_bv().normalize().to_string(),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(1..), Alignment::right());

        writeln!(out, "\n{table}")?;

        let mut lines = vec![
            ("Items", self.totals.item_count.to_string()),
            ("Weight", format!("{} kg", self.totals.weight_kg.normalize())),
            ("Subtotal", format_rupiah(whole_rupiah(&self.totals.price))),
        ];

        if let Some(charges) = &self.charges {
            lines.push((
                "After voucher",
                format_rupiah(whole_rupiah(&charges.discounted_subtotal)),
            ));
            lines.push((
                "Shipping",
                format_rupiah(whole_rupiah(&charges.shipping_cost)),
            ));
            lines.push(("Total", format_rupiah(whole_rupiah(&charges.gross_amount))));
        }

        lines.push(("Total BV", self.split.total_bv.normalize().to_string()));
        lines.push(("Plan A BV", self.split.bv_plan_a.normalize().to_string()));
        lines.push(("Plan B BV", self.split.bv_plan_b.normalize().to_string()));

        let label_width = lines
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or_default();

        for (label, value) in &lines {
            writeln!(out, " {label:<label_width$}  {value:>14}")?;
        }

        writeln!(out, " ({})", self.split.rule)?;

        Ok(())
    }
}

/// Format whole rupiah with dot thousand separators, e.g. `Rp 132.000`.
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}
