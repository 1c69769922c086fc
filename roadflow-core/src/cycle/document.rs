//! Storable form of a cycle snapshot

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

use crate::{Error, RoadNetwork, TrafficLevel, model::CycleSnapshot};

/// Format of cycle identifiers, e.g. `2024_05_06_08_15_00`
pub const CYCLE_ID_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Time fields derived from a cycle id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleMeta {
    pub filename: String,
    pub datetime: NaiveDateTime,
    pub hour_minute_string: String,
    pub hour_int: u32,
    pub minute_int: u32,
    pub day_of_week: String,
    pub hour_float: f64,
    pub automated: bool,
}

impl CycleMeta {
    /// Parse a cycle id. A trailing file extension is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCycleId`] if the id does not follow
    /// [`CYCLE_ID_FORMAT`].
    pub fn from_cycle_id(cycle_id: &str) -> Result<Self, Error> {
        let stem = cycle_id.split('.').next().unwrap_or(cycle_id);
        let datetime = NaiveDateTime::parse_from_str(stem, CYCLE_ID_FORMAT)
            .map_err(|e| Error::InvalidCycleId(format!("{cycle_id}: {e}")))?;

        Ok(Self {
            filename: cycle_id.to_string(),
            datetime,
            hour_minute_string: datetime.format("%H:%M").to_string(),
            hour_int: datetime.hour(),
            minute_int: datetime.minute(),
            day_of_week: datetime.format("%A").to_string(),
            hour_float: f64::from(datetime.hour()) + f64::from(datetime.minute()) / 60.0,
            automated: true,
        })
    }
}

/// One edge of the stored network with its cycle value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotLink {
    pub source: i64,
    pub target: i64,
    pub key: u32,
    pub osmid: Option<i64>,
    pub name: Option<String>,
    pub traffic_level: Option<TrafficLevel>,
    /// Value comes from a direct measurement
    pub api_data: bool,
    /// `maxspeed * traffic_level`
    pub current_speed: f64,
}

/// Network plus cycle snapshot as handed to persistence, stripped of
/// geometry and other static edge attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotDocument {
    #[serde(flatten)]
    pub meta: CycleMeta,
    pub links: Vec<SnapshotLink>,
}

impl SnapshotDocument {
    /// # Errors
    ///
    /// Returns [`Error::InvalidCycleId`] if the snapshot's cycle id cannot be
    /// parsed, and [`Error::InvalidData`] if the snapshot belongs to another
    /// network.
    pub fn build(network: &RoadNetwork, snapshot: &CycleSnapshot) -> Result<Self, Error> {
        if snapshot.len() != network.edge_count() {
            return Err(Error::InvalidData(format!(
                "Snapshot has {} entries for a network of {} edges",
                snapshot.len(),
                network.edge_count()
            )));
        }
        let meta = CycleMeta::from_cycle_id(snapshot.cycle_id())?;

        let links = snapshot
            .iter()
            .map(|(edge, entry)| {
                let key = network.edge_key(edge);
                let road = network.edge(edge);
                // Unparsable limits count as 0, missing levels as free flow
                let maxspeed = road.maxspeed_kph().unwrap_or(0.0);
                SnapshotLink {
                    source: key.from,
                    target: key.to,
                    key: key.key,
                    osmid: road.osmid,
                    name: road.name.clone(),
                    traffic_level: entry.traffic_level,
                    api_data: entry.is_measured,
                    current_speed: maxspeed * entry.traffic_level.unwrap_or(1.0),
                }
            })
            .collect();

        Ok(Self { meta, links })
    }
}

/// Consumer of finished cycle documents
pub trait SnapshotSink {
    /// # Errors
    ///
    /// Returns an error if the document could not be stored.
    fn store(&mut self, document: &SnapshotDocument) -> Result<(), Error>;
}

impl SnapshotSink for Vec<SnapshotDocument> {
    fn store(&mut self, document: &SnapshotDocument) -> Result<(), Error> {
        self.push(document.clone());
        Ok(())
    }
}
