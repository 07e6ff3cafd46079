//! Lease rate factor lookup.
//!
//! Pricing resolves a factor by walking an explicit, asset-type specific list of
//! candidate keys, most specific first, and taking the first row that defines
//! the requested term. The generic "strip the last `-segment`" walk in
//! [`inheritance_preview`] only feeds the admin table view and is never used to
//! price an item.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::pricing::models::{AssetType, CalculationItem, Condition, RateRow, USED_ASSET_KEY};

/// A factor together with the key that supplied it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFactor {
    pub key: String,
    pub factor: f64,
}

/// Ordered rate keys to try for an item, most specific first
pub fn candidate_keys(item: &CalculationItem) -> Vec<String> {
    if item.condition == Condition::Used {
        return vec![USED_ASSET_KEY.to_string()];
    }

    let asset = item.asset_type.as_str();
    let brand = item.brand.as_deref().filter(|b| !b.is_empty());
    let os = item.os.as_deref().filter(|o| !o.is_empty());

    match item.asset_type {
        AssetType::Mobile => {
            let mut keys = Vec::with_capacity(2);
            if let Some(os) = os {
                keys.push(format!("{}-{}", asset, os));
            }
            keys.push(asset.to_string());
            keys
        }
        _ => {
            let mut keys = Vec::with_capacity(3);
            if let Some(brand) = brand {
                if let Some(os) = os {
                    keys.push(format!("{}-{}-{}", asset, brand, os));
                }
                keys.push(format!("{}-{}", asset, brand));
            }
            keys.push(asset.to_string());
            keys
        }
    }
}

/// First candidate whose row defines `term`
pub fn resolve_factor(
    rates: &BTreeMap<String, RateRow>,
    candidates: &[String],
    term: u32,
) -> Option<ResolvedFactor> {
    candidates.iter().find_map(|key| {
        rates
            .get(key)
            .and_then(|row| row.get(&term))
            .map(|factor| ResolvedFactor {
                key: key.clone(),
                factor: *factor,
            })
    })
}

/// Base factor for an item, or 0 when no candidate defines the term
pub fn base_factor(rates: &BTreeMap<String, RateRow>, item: &CalculationItem, term: u32) -> f64 {
    let candidates = candidate_keys(item);
    match resolve_factor(rates, &candidates, term) {
        Some(resolved) => resolved.factor,
        None => {
            warn!(
                asset_type = item.asset_type.as_str(),
                term,
                candidates = ?candidates,
                "No lease rate factor defined for item, pricing at 0"
            );
            0.0
        }
    }
}

/// Parent of a rate key, e.g. `Laptop-HP-Windows` -> `Laptop-HP`
pub fn parent_key(key: &str) -> Option<&str> {
    key.rfind('-').map(|idx| &key[..idx])
}

/// Effective factors for a key as the admin table displays them: every term
/// defined on the key or any ancestor, tagged with the key that supplies it.
pub fn inheritance_preview(
    rates: &BTreeMap<String, RateRow>,
    key: &str,
) -> BTreeMap<u32, ResolvedFactor> {
    let mut preview = BTreeMap::new();
    let mut current = Some(key);

    while let Some(k) = current {
        if let Some(row) = rates.get(k) {
            for (term, factor) in row {
                preview.entry(*term).or_insert_with(|| ResolvedFactor {
                    key: k.to_string(),
                    factor: *factor,
                });
            }
        }
        current = parent_key(k);
    }

    preview
}
