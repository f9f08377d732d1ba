use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

fn selector(strategy: SelectionStrategy, weights: &BTreeMap<String, f64>) -> TargetSelector {
    TargetSelector::with_rng(
        strategy,
        names(&["a", "b", "c"]),
        names(&["http://one", "http://two"]),
        weights,
        StdRng::seed_from_u64(7),
    )
}

fn pick_endpoints(selector: &TargetSelector, count: usize) -> Result<Vec<String>, String> {
    (0..count)
        .map(|_| {
            selector
                .select()
                .map(|selection| selection.endpoint.to_owned())
                .ok_or_else(|| "Expected a selection".to_owned())
        })
        .collect()
}

#[test]
fn round_robin_cycles_in_order() -> Result<(), String> {
    let selector = selector(SelectionStrategy::RoundRobin, &BTreeMap::new());
    let picked = pick_endpoints(&selector, 6)?;
    if picked != names(&["a", "b", "c", "a", "b", "c"]) {
        return Err(format!("Unexpected order: {:?}", picked));
    }
    Ok(())
}

#[test]
fn base_urls_rotate_independently() -> Result<(), String> {
    let selector = selector(SelectionStrategy::Random, &BTreeMap::new());
    let mut seen = Vec::new();
    for _ in 0..4 {
        let selection = selector.select().ok_or("Expected a selection")?;
        seen.push(selection.base_url.to_owned());
    }
    if seen != names(&["http://one", "http://two", "http://one", "http://two"]) {
        return Err(format!("Unexpected base urls: {:?}", seen));
    }
    Ok(())
}

#[test]
fn random_only_picks_known_names() -> Result<(), String> {
    let selector = selector(SelectionStrategy::Random, &BTreeMap::new());
    let picked = pick_endpoints(&selector, 300)?;
    for name in ["a", "b", "c"] {
        if !picked.iter().any(|item| item == name) {
            return Err(format!("{} never picked", name));
        }
    }
    Ok(())
}

#[test]
fn weighted_only_picks_weighted_subset() -> Result<(), String> {
    let mut weights = BTreeMap::new();
    weights.insert("b".to_owned(), 1.0);
    weights.insert("c".to_owned(), 3.0);
    let selector = selector(SelectionStrategy::Weighted, &weights);
    let picked = pick_endpoints(&selector, 4_000)?;
    if picked.iter().any(|name| name == "a") {
        return Err("Unweighted endpoint was picked".to_owned());
    }
    let heavy = picked.iter().filter(|name| *name == "c").count();
    if !(2_800..=3_200).contains(&heavy) {
        return Err(format!("Weighted share off: {} of 4000", heavy));
    }
    Ok(())
}

#[test]
fn weighted_without_weights_falls_back_to_round_robin() -> Result<(), String> {
    let selector = selector(SelectionStrategy::Weighted, &BTreeMap::new());
    let picked = pick_endpoints(&selector, 4)?;
    if picked != names(&["a", "b", "c", "a"]) {
        return Err(format!("Unexpected order: {:?}", picked));
    }
    Ok(())
}

#[test]
fn weighted_with_zero_total_falls_back_to_round_robin() -> Result<(), String> {
    let mut weights = BTreeMap::new();
    weights.insert("a".to_owned(), 0.0);
    weights.insert("b".to_owned(), 0.0);
    let selector = selector(SelectionStrategy::Weighted, &weights);
    let picked = pick_endpoints(&selector, 3)?;
    if picked != names(&["a", "b", "c"]) {
        return Err(format!("Unexpected order: {:?}", picked));
    }
    Ok(())
}

#[test]
fn empty_lists_select_nothing() -> Result<(), String> {
    let selector = TargetSelector::with_rng(
        SelectionStrategy::RoundRobin,
        Vec::new(),
        names(&["http://one"]),
        &BTreeMap::new(),
        StdRng::seed_from_u64(1),
    );
    if selector.select().is_some() {
        return Err("Expected no selection without endpoints".to_owned());
    }
    Ok(())
}

#[test]
fn concurrent_round_robin_stays_balanced() -> Result<(), String> {
    let selector = std::sync::Arc::new(selector(SelectionStrategy::RoundRobin, &BTreeMap::new()));
    let mut handles = Vec::new();
    for _ in 0..3 {
        let shared = std::sync::Arc::clone(&selector);
        handles.push(std::thread::spawn(move || pick_endpoints(&shared, 100)));
    }
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for handle in handles {
        let picked = handle
            .join()
            .map_err(|panic| format!("selector thread panicked: {:?}", panic))??;
        for name in picked {
            let entry = counts.entry(name).or_insert(0);
            *entry = entry.saturating_add(1);
        }
    }
    if counts.values().any(|count| *count != 100) {
        return Err(format!("Unbalanced counts: {:?}", counts));
    }
    Ok(())
}

#[test]
fn strategy_names_round_trip_through_serde() -> Result<(), String> {
    let parsed: SelectionStrategy =
        serde_json::from_str("\"roundRobin\"").map_err(|err| err.to_string())?;
    if parsed != SelectionStrategy::RoundRobin || parsed.as_str() != "roundRobin" {
        return Err(format!("Unexpected strategy: {:?}", parsed));
    }
    Ok(())
}
