//! Delivery quantities per region, plant and agent ("Inventory" sheet).

use super::aggregator::percentage;
use crate::config::InventoryConfig;
use crate::models::CategorizedRecord;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryRow {
    pub region: String,
    pub plant: String,
    pub agent: String,
    /// Summed quantity per unit, aligned with [`InventoryView::units`].
    pub quantities: Vec<f64>,
    /// Each quantity as a share of that unit's global sum.
    pub percentages: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryView {
    pub units: Vec<String>,
    pub rows: Vec<InventoryRow>,
    /// Global sum per unit.
    pub totals: Vec<f64>,
}

/// Pivot delivery quantities into sums per unit.
///
/// A row takes part when its description contains a filter keyword and its
/// unit is listed by that same filter, whatever its category; the first
/// matching filter decides. Rows are ordered by (region, plant, agent).
pub fn inventory_by_unit(records: &[CategorizedRecord], config: &InventoryConfig) -> InventoryView {
    let units = config.units();
    let mut cells: BTreeMap<(&str, &str, &str), Vec<f64>> = BTreeMap::new();

    for record in records {
        let unit = record.incident.base_unit.trim();
        let matched = config.filters.iter().find(|f| {
            record.description().contains(f.keyword.as_str()) && f.units.iter().any(|u| u == unit)
        });
        let Some(column) = matched.and_then(|_| units.iter().position(|u| u == unit)) else {
            continue;
        };

        let key = (
            record.coordinator.region.as_str(),
            record.plant(),
            record.agent(),
        );
        cells.entry(key).or_insert_with(|| vec![0.0; units.len()])[column] +=
            record.incident.delivery_quantity;
    }

    let mut totals = vec![0.0; units.len()];
    for quantities in cells.values() {
        for (total, q) in totals.iter_mut().zip(quantities) {
            *total += q;
        }
    }

    let rows = cells
        .into_iter()
        .map(|((region, plant, agent), quantities)| InventoryRow {
            region: region.to_string(),
            plant: plant.to_string(),
            agent: agent.to_string(),
            percentages: quantities
                .iter()
                .zip(&totals)
                .map(|(q, total)| percentage(*q, *total))
                .collect(),
            quantities,
        })
        .collect();

    InventoryView { units, rows, totals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::categorized;
    use crate::models::Category;

    fn inventory(region: &str, plant: &str, description: &str, unit: &str, qty: f64) -> CategorizedRecord {
        let mut record = categorized("CAMVELEZ", plant, description, Category::Inventory);
        record.coordinator.region = region.to_string();
        record.incident.base_unit = unit.to_string();
        record.incident.delivery_quantity = qty;
        record
    }

    #[test]
    fn test_inventory_pivot() {
        let records = vec![
            inventory("South", "100", "JWS/APEX - Ticket not Goods Issued", "TON", 30.0),
            inventory("South", "100", "JWS/APEX - Ticket not Goods Issued", "TON", 10.0),
            inventory("North", "200", "JWS/APEX - Ticket not Goods Issued", "TO", 5.0),
            inventory("North", "200", "COMMAND - Ticket not Goods Issued", "YD3", 12.0),
            inventory("South", "300", "COMMAND - Ticket not Goods Issued", "YD3", 4.0),
            // unit not allowed for its keyword
            inventory("South", "300", "COMMAND - Ticket not Goods Issued", "TON", 99.0),
            inventory("South", "300", "JWS/APEX - Ticket not Goods Issued", "YD3", 99.0),
        ];

        let view = inventory_by_unit(&records, &InventoryConfig::default());

        assert_eq!(view.units, vec!["TON", "TO", "YD3"]);
        assert_eq!(view.totals, vec![40.0, 5.0, 16.0]);
        assert_eq!(view.rows.len(), 3);

        let north = &view.rows[0];
        assert_eq!((north.region.as_str(), north.plant.as_str()), ("North", "200"));
        assert_eq!(north.quantities, vec![0.0, 5.0, 12.0]);
        assert_eq!(north.percentages, vec![0.0, 100.0, 75.0]);

        let south = &view.rows[1];
        assert_eq!(south.plant, "100");
        assert_eq!(south.quantities, vec![40.0, 0.0, 0.0]);
        assert_eq!(south.percentages[0], 100.0);

        for column in 0..view.units.len() {
            let sum: f64 = view.rows.iter().map(|r| r.percentages[column]).sum();
            assert!((sum - 100.0).abs() <= 0.01 * view.rows.len() as f64);
        }
    }

    #[test]
    fn test_rows_of_any_category_are_pivoted() {
        let mut pricing = inventory("South", "100", "JWS/APEX - Pricing Incomplete", "TON", 7.0);
        pricing.category = Category::Pricing;
        let mut contract = inventory("South", "200", "COMMAND - Assign Contract", "YD3", 3.0);
        contract.category = Category::Contract;
        let mut unmatched = inventory("South", "300", "Manual entry", "TON", 50.0);
        unmatched.category = Category::Other;

        let view = inventory_by_unit(&[pricing, contract, unmatched], &InventoryConfig::default());

        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.totals, vec![7.0, 0.0, 3.0]);
        assert_eq!(view.rows[0].quantities, vec![7.0, 0.0, 0.0]);
        assert_eq!(view.rows[0].percentages[0], 100.0);
        assert_eq!(view.rows[1].percentages[2], 100.0);
    }

    #[test]
    fn test_zero_total_yields_zero_percentage() {
        let records = vec![inventory("South", "100", "COMMAND - Ticket not Goods Issued", "YD3", 0.0)];
        let view = inventory_by_unit(&records, &InventoryConfig::default());
        assert_eq!(view.rows[0].percentages, vec![0.0, 0.0, 0.0]);
    }
}
