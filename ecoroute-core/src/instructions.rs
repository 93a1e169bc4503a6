//! Turn-by-turn text for a route.

use crate::geodesy::initial_bearing;
use crate::network::RoadNetwork;
use crate::search::Route;

/// Label used for edges without a name or reference.
pub const UNNAMED_ROAD: &str = "unnamed road";

/// Builds human-readable steps from a route.
///
/// Consecutive edges sharing a label form one step. The first step reads
/// "Head onto X"; later steps turn right when the clockwise bearing change
/// from the previous step is under 180 degrees and left otherwise.
///
/// # Examples
/// ```
/// use ecoroute_core::{EdgeId, InstructionGenerator, NodeId, Route};
/// use ecoroute_core::test_support::three_node_path;
///
/// let network = three_node_path();
/// let route = Route {
///     nodes: vec![NodeId(1), NodeId(2), NodeId(3)],
///     edges: vec![EdgeId(0), EdgeId(1)],
/// };
/// let steps = InstructionGenerator::generate(&network, &route);
/// assert_eq!(steps[0], "Head onto Naberezhne Highway");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct InstructionGenerator;

impl InstructionGenerator {
    /// Steps for `route`; empty for routes without edges.
    #[must_use]
    pub fn generate(network: &RoadNetwork, route: &Route) -> Vec<String> {
        let mut steps = Vec::new();
        let mut previous: Option<(&str, f64)> = None;

        for &id in &route.edges {
            let Some(edge) = network.edge(id) else {
                continue;
            };
            let (Some(from), Some(to)) = (network.node(edge.source), network.node(edge.target))
            else {
                continue;
            };
            let label = edge.label().unwrap_or(UNNAMED_ROAD);
            let bearing = initial_bearing(from.location, to.location);
            match previous {
                Some((prev_label, _)) if prev_label == label => continue,
                Some((_, prev_bearing)) => {
                    let delta = (bearing - prev_bearing + 360.0) % 360.0;
                    let side = if delta < 180.0 { "right" } else { "left" };
                    steps.push(format!("Turn {side} onto {label}"));
                }
                None => steps.push(format!("Head onto {label}")),
            }
            previous = Some((label, bearing));
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Edge, EdgeId, Node, RoadClass};
    use rstest::rstest;

    fn route(edges: &[usize]) -> Route {
        Route {
            nodes: Vec::new(),
            edges: edges.iter().map(|&e| EdgeId(e)).collect(),
        }
    }

    /// East along one street, then north or south onto another.
    fn corner() -> RoadNetwork {
        RoadNetwork::new(
            vec![
                Node::new(1, 0.0, 0.0),
                Node::new(2, 0.01, 0.0),
                Node::new(3, 0.02, 0.0),
                Node::new(4, 0.02, 0.01),
                Node::new(5, 0.02, -0.01),
            ],
            vec![
                Edge::new(1, 2, 1100.0, RoadClass::Primary).with_name("Volodymyrska"),
                Edge::new(2, 3, 1100.0, RoadClass::Primary).with_name("Volodymyrska"),
                Edge::new(3, 4, 1100.0, RoadClass::Residential).with_reference("T1001"),
                Edge::new(3, 5, 1100.0, RoadClass::Residential),
            ],
        )
        .expect("network")
    }

    #[rstest]
    fn merges_steps_on_the_same_road() {
        let steps = InstructionGenerator::generate(&corner(), &route(&[0, 1]));
        assert_eq!(steps, vec!["Head onto Volodymyrska".to_owned()]);
    }

    #[rstest]
    fn turning_north_from_east_is_left() {
        let steps = InstructionGenerator::generate(&corner(), &route(&[0, 1, 2]));
        assert_eq!(steps[1], "Turn left onto T1001");
    }

    #[rstest]
    fn turning_south_from_east_is_right() {
        let steps = InstructionGenerator::generate(&corner(), &route(&[0, 1, 3]));
        assert_eq!(steps[1], "Turn right onto unnamed road");
    }

    #[rstest]
    fn empty_routes_have_no_steps() {
        assert!(InstructionGenerator::generate(&corner(), &Route::empty()).is_empty());
    }
}
