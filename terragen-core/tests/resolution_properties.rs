//! Property tests for resolution ordering over random graphs

use proptest::prelude::*;
use terragen_core::{ContainerError, DependencyGraph};

fn node_name(index: usize) -> String {
    format!("t{index}")
}

/// Random DAGs: node `i` may only depend on nodes with a smaller index, so
/// the generated graph is acyclic by construction.
fn arb_dag() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (2usize..12).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    proptest::collection::vec(0..i, 0..=i.min(3))
                        .prop_map(|mut deps| {
                            deps.sort_unstable();
                            deps.dedup();
                            deps
                        })
                        .boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

proptest! {
    #[test]
    fn every_dependency_precedes_its_dependent(dag in arb_dag()) {
        let mut graph = DependencyGraph::new();
        for (node, deps) in dag.iter().enumerate() {
            graph.set_dependencies(
                node_name(node),
                deps.iter().map(|d| node_name(*d)).collect(),
            );
        }

        let order = graph.topological_sort().unwrap();
        prop_assert_eq!(order.len(), dag.len());

        for (node, deps) in dag.iter().enumerate() {
            let node_pos = order.iter().position(|n| *n == node_name(node)).unwrap();
            for dep in deps {
                let dep_pos = order.iter().position(|n| *n == node_name(*dep)).unwrap();
                prop_assert!(
                    dep_pos < node_pos,
                    "dependency {} must precede {}",
                    node_name(*dep),
                    node_name(node)
                );
            }
        }
    }

    #[test]
    fn a_ring_never_yields_an_order(ring_len in 2usize..8, tail_len in 0usize..4) {
        let mut graph = DependencyGraph::new();

        // The ring itself: t0 -> t1 -> ... -> t(n-1) -> t0
        for i in 0..ring_len {
            graph.set_dependencies(
                node_name(i),
                vec![node_name((i + 1) % ring_len)],
            );
        }
        // An acyclic tail hanging off the ring must not mask the cycle.
        for i in 0..tail_len {
            let node = ring_len + i;
            graph.set_dependencies(node_name(node), vec![node_name(node - 1)]);
        }

        match graph.topological_sort() {
            Err(ContainerError::CircularDependency { path }) => {
                prop_assert!(path.len() >= 2);
                prop_assert_eq!(path.first(), path.last());
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
            Ok(order) => prop_assert!(false, "cyclic graph produced an order: {:?}", order),
        }
    }
}
