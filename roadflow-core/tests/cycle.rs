use geo::Point;
use roadflow_core::{matching::TOO_DISTANT, prelude::*};

const CYCLE: &str = "2024_05_06_08_15_00";

/// A <-> B <-> C along a street heading east, plus the one-way B -> D north.
const STREET: &str = r#"{
    "nodes": [
        { "id": 1, "lat": 36.7150, "lon": -4.4700 },
        { "id": 2, "lat": 36.7150, "lon": -4.4690 },
        { "id": 3, "lat": 36.7150, "lon": -4.4680 },
        { "id": 4, "lat": 36.7160, "lon": -4.4690 }
    ],
    "links": [
        { "source": 1, "target": 2, "osmid": 100, "maxspeed": "50", "name": "Calle Larga" },
        { "source": 2, "target": 1, "osmid": 100, "maxspeed": "50", "reversed": true },
        { "source": 2, "target": 3, "osmid": 101 },
        { "source": 3, "target": 2, "osmid": 101, "reversed": true },
        { "source": 2, "target": 4, "osmid": 102, "oneway": true }
    ]
}"#;

struct Fixture {
    network: RoadNetwork,
    neighbors: NeighborIndex,
    tree: EdgeRTree,
    corrections: CorrectionTable,
}

impl Fixture {
    fn new(network: RoadNetwork, rules: &[CorrectionRule]) -> Self {
        let corrections = CorrectionTable::resolve(rules, &network).unwrap();
        Self {
            neighbors: NeighborIndex::build(&network),
            tree: EdgeRTree::build(&network),
            corrections,
            network,
        }
    }

    fn street() -> Self {
        Self::new(roadflow_core::loading::network_from_json_str(STREET).unwrap(), &[])
    }

    fn engine(&self) -> FusionEngine<'_, EdgeRTree> {
        FusionEngine::new(
            &self.network,
            &self.neighbors,
            &self.tree,
            &self.corrections,
            EngineConfig::default(),
        )
        .unwrap()
    }

    fn edge(&self, from: i64, to: i64) -> petgraph::graph::EdgeIndex {
        self.network.edge_index(&EdgeKey::new(from, to, 0)).unwrap()
    }
}

fn segment(id: usize, start: (f64, f64), end: (f64, f64), level: f64) -> MeasuredSegment {
    MeasuredSegment::new(id, Point::new(start.0, start.1), Point::new(end.0, end.1), level)
}

#[test]
fn westbound_measurement_lands_on_reverse_twin_and_diffuses() {
    let fixture = Fixture::street();
    let engine = fixture.engine();

    // 40 m heading west, 2 m north of A-B
    let westbound = segment(0, (-4.46955, 36.71502), (-4.46995, 36.71502), 0.35);
    let outcome = engine.run_cycle(CYCLE, &[westbound]).unwrap();

    let diag = &outcome.diagnostics[0];
    assert_eq!(diag.error, None);
    assert_eq!(diag.splits, Some(3));
    assert!((diag.distance_m - 2.0).abs() < 1e-3);
    assert_eq!(diag.aiming.as_str(), "west");

    let b_to_a = fixture.edge(2, 1);
    assert_eq!(outcome.matches.len(), 3);
    assert!(outcome.matches.iter().all(|m| m.edge == b_to_a));
    assert!(outcome.matches.iter().all(|m| m.segment >= 1));

    let snapshot = &outcome.snapshot;
    assert!(snapshot.get(b_to_a).is_measured);
    assert_eq!(snapshot.traffic_level(b_to_a), Some(0.35));
    assert_eq!(snapshot.measured_count(), 1);

    let a_to_b = fixture.edge(1, 2);
    assert!(!snapshot.get(a_to_b).is_measured);
    assert!((snapshot.traffic_level(a_to_b).unwrap() - 0.35).abs() < 1e-9);
    assert_eq!(snapshot.informed_count(), fixture.network.edge_count());
    assert!(outcome.diffusion.converged);
}

#[test]
fn distant_segment_is_dropped() {
    let fixture = Fixture::street();
    let engine = fixture.engine();

    // 12 m north of B-C
    let distant = segment(0, (-4.4686, 36.71512), (-4.4684, 36.71512), 0.9);
    let outcome = engine.run_cycle(CYCLE, &[distant]).unwrap();

    let diag = &outcome.diagnostics[0];
    assert_eq!(diag.error, Some(TOO_DISTANT));
    assert_eq!(diag.splits, None);
    assert!((diag.distance_m - 12.0).abs() < 1e-3);
    assert!([EdgeKey::new(2, 3, 0), EdgeKey::new(3, 2, 0)].contains(&diag.nearest_edge));

    assert!(outcome.matches.is_empty());
    assert_eq!(outcome.snapshot.measured_count(), 0);
    assert_eq!(outcome.snapshot.traffic_level(fixture.edge(2, 3)), None);
    assert_eq!(outcome.snapshot.informed_count(), 0);
}

#[test]
fn oneway_edge_keeps_its_direction() {
    let fixture = Fixture::street();
    let engine = fixture.engine();

    // 10 m heading south along the one-way B -> D
    let southbound = segment(0, (-4.46898, 36.7155), (-4.46898, 36.7154), 0.6);
    let outcome = engine.run_cycle(CYCLE, &[southbound]).unwrap();

    assert_eq!(outcome.diagnostics[0].splits, Some(-1));
    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].edge, fixture.edge(2, 4));
    assert_eq!(outcome.matches[0].segment, 0);
}

#[test]
fn correction_rule_redirects_and_echoes() {
    // 1 -> 2 is a one-way ramp heading east that attracts westbound
    // measurements of the parallel carriageway 3 -> 4 -> 5
    let mut b = RoadNetworkBuilder::new();
    b.add_node(1, 0.0, 0.0).unwrap();
    b.add_node(2, 0.0, 0.001).unwrap();
    b.add_node(3, 0.0001, 0.001).unwrap();
    b.add_node(4, 0.0001, 0.0).unwrap();
    b.add_node(5, 0.0001, -0.001).unwrap();
    let oneway = |osmid| EdgeAttributes {
        oneway: true,
        osmid: Some(osmid),
        ..EdgeAttributes::default()
    };
    b.add_edge(1, 2, 0, oneway(77)).unwrap();
    b.add_edge(3, 4, 0, oneway(78)).unwrap();
    b.add_edge(4, 5, 0, oneway(78)).unwrap();

    let rules = roadflow_core::loading::corrections_from_json_str(
        r#"[{ "from": 1, "to": 2, "osmid": 77,
              "replacement": { "from": 3, "to": 4 },
              "collateral": [{ "from": 4, "to": 5 }] }]"#,
    )
    .unwrap();
    let fixture = Fixture::new(b.build(), &rules);
    let engine = fixture.engine();

    let westbound = segment(0, (0.0006, 0.00002), (0.0004, 0.00002), 0.45);
    let eastbound = segment(1, (0.0002, -0.00002), (0.0003, -0.00002), 0.8);
    let outcome = engine.run_cycle(CYCLE, &[westbound, eastbound]).unwrap();

    let ramp = fixture.edge(1, 2);
    let carriageway = fixture.edge(3, 4);
    let continuation = fixture.edge(4, 5);

    assert_eq!(outcome.matches[0].edge, carriageway);
    assert_eq!(outcome.matches[0].collateral, vec![continuation]);
    assert_eq!(outcome.matches[1].edge, ramp);

    let snapshot = &outcome.snapshot;
    assert_eq!(snapshot.traffic_level(carriageway), Some(0.45));
    assert_eq!(snapshot.traffic_level(continuation), Some(0.45));
    assert!(snapshot.get(continuation).is_measured);
    assert_eq!(snapshot.traffic_level(ramp), Some(0.8));
}

#[test]
fn cycles_do_not_leak_into_each_other() {
    let fixture = Fixture::street();
    let engine = fixture.engine();

    let eastbound = segment(0, (-4.4699, 36.71501), (-4.4698, 36.71501), 0.5);
    let first = engine.run_cycle(CYCLE, &[eastbound]).unwrap();
    assert_eq!(first.snapshot.measured_count(), 1);

    let second = engine.run_cycle("2024_05_06_08_20_00", &[]).unwrap();
    assert_eq!(second.snapshot.measured_count(), 0);
    assert_eq!(second.snapshot.informed_count(), 0);
    assert_eq!(second.snapshot.cycle_id(), "2024_05_06_08_20_00");
}

#[test]
fn tiles_to_stored_document() {
    let fixture = Fixture::street();
    let engine = fixture.engine();

    let tile = DecodedTile::from_json_str(
        r#"{ "Traffic flow": { "extent": 4096, "features": [
            { "geometry": { "type": "LineString", "coordinates": [[3890, 20], [205, 20]] },
              "properties": { "traffic_level": 0.7 } },
            { "geometry": { "type": "Point", "coordinates": [100, 100] },
              "properties": { "traffic_level": 0.1 } }
        ] } }"#,
    )
    .unwrap();
    let bounds = TileBounds {
        west: -4.4700,
        south: 36.7150,
        east: -4.4690,
        north: 36.7160,
    };

    let outcome = engine.run_tiles(CYCLE, [(&tile, bounds)]).unwrap();
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].splits, Some(6));
    assert!(outcome.snapshot.get(fixture.edge(2, 1)).is_measured);

    let document = outcome.to_document(&fixture.network).unwrap();
    assert_eq!(document.meta.day_of_week, "Monday");
    assert_eq!(document.links.len(), fixture.network.edge_count());

    let link = document
        .links
        .iter()
        .find(|l| l.source == 2 && l.target == 1)
        .unwrap();
    assert!(link.api_data);
    assert_eq!(link.traffic_level, Some(0.7));
    assert!((link.current_speed - 35.0).abs() < 1e-9);

    let mut sink: Vec<SnapshotDocument> = Vec::new();
    sink.store(&document).unwrap();
    assert_eq!(sink[0].meta.filename, CYCLE);

    let geojson = diagnostics_to_geojson(&outcome.diagnostics).unwrap();
    assert_eq!(geojson.features.len(), 1);
}
