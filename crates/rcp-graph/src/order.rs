use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::binding::ProviderRecord;
use crate::error::GraphError;

/// Order a deployment's components so producers run before their consumers
/// (§4.6). `consumers` is the map returned by [`crate::resolve_bindings`].
/// Ties are broken by component name, ascending, so ordering is identical
/// across runs with the same input.
pub fn order_components(
    component_names: &[String],
    consumers: &HashMap<String, HashMap<String, ProviderRecord>>,
) -> Result<Vec<String>, GraphError> {
    // Deterministic node indices: iterate names in sorted order.
    let sorted_names: BTreeSet<&String> = component_names.iter().collect();
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut index_of: BTreeMap<&str, NodeIndex> = BTreeMap::new();
    for name in &sorted_names {
        index_of.insert(name.as_str(), graph.add_node(name.as_str()));
    }

    let mut in_degree: BTreeMap<&str, usize> = sorted_names.iter().map(|n| (n.as_str(), 0)).collect();
    let mut edges_from: BTreeMap<&str, BTreeSet<&str>> = sorted_names.iter().map(|n| (n.as_str(), BTreeSet::new())).collect();

    for name in &sorted_names {
        if let Some(deps) = consumers.get(name.as_str()) {
            for provider in deps.values() {
                let producer = provider.provider_component.as_str();
                let consumer = name.as_str();
                if producer == consumer {
                    continue;
                }
                if edges_from.get_mut(producer).map(|set| set.insert(consumer)).unwrap_or(false) {
                    graph.add_edge(index_of[producer], index_of[consumer], ());
                    *in_degree.get_mut(consumer).unwrap() += 1;
                }
            }
        }
    }

    if is_cyclic_directed(&graph) {
        let cyclic: Vec<String> = sorted_names.iter().map(|n| n.to_string()).collect();
        return Err(GraphError::CycleDetected(cyclic));
    }

    // Kahn's algorithm with a lexicographically-ordered ready set for
    // deterministic tie-breaking.
    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&n, _)| n)
        .collect();
    let mut remaining_in_degree = in_degree.clone();
    let mut order = Vec::with_capacity(sorted_names.len());

    while let Some(&next) = ready.iter().next() {
        ready.remove(next);
        order.push(next.to_string());
        for &consumer in &edges_from[next] {
            let deg = remaining_in_degree.get_mut(consumer).unwrap();
            *deg -= 1;
            if *deg == 0 {
                ready.insert(consumer);
            }
        }
    }

    if order.len() != sorted_names.len() {
        // Should be unreachable given the cycle check above.
        let cyclic: Vec<String> = sorted_names.iter().map(|n| n.to_string()).collect();
        return Err(GraphError::CycleDetected(cyclic));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, kind: &str, owner: &str) -> ProviderRecord {
        ProviderRecord { name: name.into(), kind: kind.into(), provider_component: owner.into() }
    }

    #[test]
    fn producer_ordered_before_consumer() {
        let mut consumers = HashMap::new();
        consumers.insert("web".to_string(), HashMap::from([("db".to_string(), provider("db", "postgres", "database"))]));
        consumers.insert("database".to_string(), HashMap::new());

        let order = order_components(&["web".to_string(), "database".to_string()], &consumers).unwrap();
        let pos_db = order.iter().position(|n| n == "database").unwrap();
        let pos_web = order.iter().position(|n| n == "web").unwrap();
        assert!(pos_db < pos_web);
    }

    #[test]
    fn ties_broken_lexicographically() {
        let consumers = HashMap::new();
        let order = order_components(&["zeta".to_string(), "alpha".to_string(), "mid".to_string()], &consumers).unwrap();
        assert_eq!(order, vec!["alpha".to_string(), "mid".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn cycle_is_detected() {
        let mut consumers = HashMap::new();
        consumers.insert("a".to_string(), HashMap::from([("b-bind".to_string(), provider("b-bind", "x", "b"))]));
        consumers.insert("b".to_string(), HashMap::from([("a-bind".to_string(), provider("a-bind", "x", "a"))]));

        let err = order_components(&["a".to_string(), "b".to_string()], &consumers).unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected(_)));
    }

    #[test]
    fn self_dependency_is_not_an_edge() {
        let mut consumers = HashMap::new();
        consumers.insert("solo".to_string(), HashMap::from([("own".to_string(), provider("own", "x", "solo"))]));
        let order = order_components(&["solo".to_string()], &consumers).unwrap();
        assert_eq!(order, vec!["solo".to_string()]);
    }
}
