//! In-memory networks and collaborator doubles used by unit, behaviour and
//! documentation tests.

use std::collections::HashMap;

use geo::{Coord, Intersects, Rect};

use crate::geodesy::haversine_m;
use crate::network::{Edge, Node, RoadClass, RoadNetwork};
use crate::poi::PointOfInterest;
use crate::providers::{
    FuelCatalog, Geocoder, GraphLoadError, GraphProvider, PoiProvider, PoiQueryConfig,
    PoiQueryError,
};
use crate::vehicle::{ConsumptionRate, VehicleSpec};

const SPACING: f64 = 0.01;

fn build(nodes: Vec<Node>, edges: Vec<Edge>) -> RoadNetwork {
    RoadNetwork::new(nodes, edges).expect("fixture network is valid")
}

/// A one-way path `1 -> 2 -> 3` heading east along the equator.
///
/// The first hop is 1000 m of motorway, the second 500 m of residential
/// street.
#[must_use]
pub fn three_node_path() -> RoadNetwork {
    build(
        vec![
            Node::new(1, 0.0, 0.0),
            Node::new(2, 0.01, 0.0),
            Node::new(3, 0.02, 0.0),
        ],
        vec![
            Edge::new(1, 2, 1000.0, RoadClass::Motorway).with_name("Naberezhne Highway"),
            Edge::new(2, 3, 500.0, RoadClass::Residential).with_name("Sahaidachnoho Street"),
        ],
    )
}

/// Two bidirectional components with no road between them.
#[must_use]
pub fn disconnected_pair() -> RoadNetwork {
    build(
        vec![
            Node::new(1, 0.0, 0.0),
            Node::new(2, 0.01, 0.0),
            Node::new(3, 1.0, 1.0),
            Node::new(4, 1.01, 1.0),
        ],
        vec![
            Edge::new(1, 2, 1110.0, RoadClass::Primary),
            Edge::new(2, 1, 1110.0, RoadClass::Primary),
            Edge::new(3, 4, 1110.0, RoadClass::Primary),
            Edge::new(4, 3, 1110.0, RoadClass::Primary),
        ],
    )
}

/// Two parallel one-way roads between the same pair of nodes.
///
/// Key 0 is a short residential street; key 1 is a longer motorway that
/// burns less fuel.
#[must_use]
pub fn parallel_pair() -> RoadNetwork {
    build(
        vec![Node::new(1, 0.0, 0.0), Node::new(2, 0.01, 0.0)],
        vec![
            Edge::new(1, 2, 1000.0, RoadClass::Residential),
            Edge::new(1, 2, 1100.0, RoadClass::Motorway).with_key(1),
        ],
    )
}

fn lattice<C, P>(rows: usize, cols: usize, class_of: C, pois_of: P) -> RoadNetwork
where
    C: Fn(usize, usize, bool) -> RoadClass,
    P: Fn(usize, usize, bool) -> u32,
{
    let id = |row: usize, col: usize| (row * cols + col + 1) as u64;
    let mut nodes = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            nodes.push(Node::new(
                id(row, col),
                col as f64 * SPACING,
                row as f64 * SPACING,
            ));
        }
    }
    let mut edges = Vec::new();
    let mut connect = |from: (usize, usize), to: (usize, usize), horizontal: bool| {
        let a = Coord {
            x: from.1 as f64 * SPACING,
            y: from.0 as f64 * SPACING,
        };
        let b = Coord {
            x: to.1 as f64 * SPACING,
            y: to.0 as f64 * SPACING,
        };
        let length = haversine_m(a, b);
        let class = class_of(from.0, from.1, horizontal);
        let pois = pois_of(from.0, from.1, horizontal);
        for (s, t) in [(from, to), (to, from)] {
            edges.push(
                Edge::new(id(s.0, s.1), id(t.0, t.1), length, class).with_poi_count(pois),
            );
        }
    };
    for row in 0..rows {
        for col in 0..cols {
            if col + 1 < cols {
                connect((row, col), (row, col + 1), true);
            }
            if row + 1 < rows {
                connect((row, col), (row + 1, col), false);
            }
        }
    }
    build(nodes, edges)
}

/// A bidirectional `rows x cols` grid with 0.01 degree spacing.
///
/// Node ids are `row * cols + col + 1`; node `1` sits at the origin.
#[must_use]
pub fn grid(rows: usize, cols: usize) -> RoadNetwork {
    lattice(
        rows,
        cols,
        |row, col, _| match (row + col) % 3 {
            0 => RoadClass::Primary,
            1 => RoadClass::Secondary,
            _ => RoadClass::Residential,
        },
        |_, _, _| 0,
    )
}

/// A 3 x 3 grid where the cheapest, fastest and most interesting routes
/// from the origin to `(0.02, 0.02)` differ.
///
/// The southern and eastern edges form a motorway ring, the centre is
/// residential and the western column carries points of interest.
#[must_use]
pub fn detour_grid() -> RoadNetwork {
    lattice(
        3,
        3,
        |row, col, horizontal| match (row, col, horizontal) {
            (0, _, true) | (_, 2, false) => RoadClass::Motorway,
            (_, 0, false) | (2, _, true) => RoadClass::Tertiary,
            _ => RoadClass::Residential,
        },
        |row, col, horizontal| match (row, col, horizontal) {
            (_, 0, false) => 6,
            (2, _, true) => 3,
            (1, 1, _) => 1,
            _ => 0,
        },
    )
}

/// Fuel catalogue returning the same figure for every vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedFuelCatalog(pub f64);

impl FuelCatalog for FixedFuelCatalog {
    fn lookup(&self, _vehicle: &VehicleSpec) -> Option<ConsumptionRate> {
        ConsumptionRate::new(self.0).ok()
    }
}

/// Geocoder answering from a fixed table of addresses.
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    places: HashMap<String, Coord<f64>>,
}

impl StaticGeocoder {
    /// Create a geocoder knowing `places`.
    pub fn new<'a, I>(places: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Coord<f64>)>,
    {
        Self {
            places: places
                .into_iter()
                .map(|(name, at)| (name.to_owned(), at))
                .collect(),
        }
    }
}

impl Geocoder for StaticGeocoder {
    fn geocode(&self, address: &str) -> Option<Coord<f64>> {
        self.places.get(address).copied()
    }
}

/// In-memory [`PoiProvider`] performing a linear scan.
#[derive(Debug, Clone, Default)]
pub struct MemoryPoiProvider {
    pois: Vec<PointOfInterest>,
}

impl MemoryPoiProvider {
    /// Create a provider from a collection of points of interest.
    pub fn with_pois<I>(pois: I) -> Self
    where
        I: IntoIterator<Item = PointOfInterest>,
    {
        Self {
            pois: pois.into_iter().collect(),
        }
    }
}

impl PoiProvider for MemoryPoiProvider {
    fn pois_in_bbox(
        &self,
        bbox: &Rect<f64>,
        query: &PoiQueryConfig,
    ) -> Result<Vec<PointOfInterest>, PoiQueryError> {
        Ok(self
            .pois
            .iter()
            // `Intersects` treats boundary points as inside the rectangle.
            .filter(|p| bbox.intersects(&p.location) && p.has_tag(&query.key, &query.value))
            .cloned()
            .collect())
    }
}

/// A [`PoiProvider`] whose service is always down.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingPoiProvider;

impl PoiProvider for FailingPoiProvider {
    fn pois_in_bbox(
        &self,
        _bbox: &Rect<f64>,
        _query: &PoiQueryConfig,
    ) -> Result<Vec<PointOfInterest>, PoiQueryError> {
        Err(PoiQueryError::Unavailable {
            source: "connection refused".into(),
        })
    }
}

/// [`GraphProvider`] serving networks registered by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraphProvider {
    areas: HashMap<String, RoadNetwork>,
}

impl MemoryGraphProvider {
    /// Register `network` under `area`.
    #[must_use]
    pub fn with_area(mut self, area: &str, network: RoadNetwork) -> Self {
        self.areas.insert(area.to_owned(), network);
        self
    }
}

impl GraphProvider for MemoryGraphProvider {
    fn load(&self, area: &str) -> Result<RoadNetwork, GraphLoadError> {
        self.areas
            .get(area)
            .cloned()
            .ok_or_else(|| GraphLoadError::Unavailable {
                area: area.to_owned(),
                source: format!("no network registered for `{area}`").into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NodeId;
    use rstest::rstest;

    #[rstest]
    fn grid_numbers_nodes_row_major() {
        let network = grid(2, 3);
        assert_eq!(network.node_count(), 6);
        assert_eq!(network.edge_count(), 14);
        let last = network.node(NodeId(6)).expect("node");
        assert_eq!((last.location.x, last.location.y), (0.02, 0.01));
    }

    #[rstest]
    fn detour_grid_is_fully_connected() {
        let network = detour_grid();
        assert_eq!(network.node_count(), 9);
        assert_eq!(network.edge_count(), 24);
        assert!(network.edges().iter().any(|e| e.poi_count > 0));
    }

    #[rstest]
    fn graph_provider_serves_registered_areas() {
        let provider = MemoryGraphProvider::default().with_area("kyiv", three_node_path());
        assert!(provider.load("kyiv").is_ok());
        assert!(provider.load("lviv").is_err());
    }
}
