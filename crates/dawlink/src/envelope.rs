//! Envelope and envelope point proxies.

use crate::entity::{host_entity, HostEntity};
use crate::error::Result;
use crate::list::{ordinal_element, HostList, ListElement};
use crate::locator::{ChildKind, EntityKind, Locator};
use crate::protocol::{ops, CallRequest, FromValue, PointInfo, PointUpdate, Value};
use crate::session::Session;
use crate::track::Track;

host_entity! {
    /// An automation envelope on a track.
    Envelope => EntityKind::Envelope
}

host_entity! {
    /// One point of an envelope, addressed by index.
    EnvelopePoint => EntityKind::EnvelopePoint
}

pub type EnvelopeList = HostList<Envelope>;
pub type EnvelopePointList = HostList<EnvelopePoint>;

impl Envelope {
    pub fn name(&self) -> Result<String> {
        self.invoke(ops::ENVELOPE_GET_NAME, [])
    }

    /// Parent track, as a locator-only back-reference.
    pub fn track(&self) -> Result<Track> {
        self.invoke_entity(ops::ENVELOPE_GET_TRACK, [])
    }

    pub fn point_count(&self) -> Result<u32> {
        self.invoke(ops::ENVELOPE_COUNT_POINTS, [])
    }

    pub fn points(&self) -> EnvelopePointList {
        HostList::new(self.session().clone(), self.locator().clone())
    }

    pub fn add_point(&self, position: f64, value: f64) -> Result<EnvelopePoint> {
        self.invoke_entity(
            ops::ENVELOPE_ADD_POINT,
            [Value::from(position), Value::from(value)],
        )
    }

    /// Envelope value at `time`, interpolated between points.
    pub fn value_at(&self, time: f64) -> Result<f64> {
        self.invoke(ops::ENVELOPE_EVALUATE, [Value::from(time)])
    }
}

impl ListElement for Envelope {
    const COUNT_METHOD: &'static str = ops::TRACK_COUNT_ENVELOPES;

    type Fetched = Envelope;

    fn fetch_request(parent: &Locator, index: u32) -> CallRequest {
        CallRequest::new(parent.clone(), ops::TRACK_GET_ENVELOPE, [Value::from(index)])
    }

    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self> {
        let value = session.call(
            parent.clone(),
            ops::TRACK_GET_ENVELOPE,
            [Value::from(index)],
        )?;
        session.rehydrate(value)
    }

    fn fetched_from_value(session: &Session, value: Value) -> Result<Self::Fetched> {
        session.rehydrate(value)
    }
}

impl EnvelopePoint {
    /// Position, value and shape in one dispatch.
    pub fn info(&self) -> Result<PointInfo> {
        self.invoke(ops::ENVELOPE_POINT_GET, [])
    }

    pub fn set(&self, update: PointUpdate) -> Result<()> {
        self.invoke(ops::ENVELOPE_POINT_SET, [Value::from(update)])
    }

    pub fn delete(&self) -> Result<()> {
        self.invoke(ops::ENVELOPE_POINT_DELETE, [])
    }
}

impl ListElement for EnvelopePoint {
    const COUNT_METHOD: &'static str = ops::ENVELOPE_COUNT_POINTS;

    type Fetched = PointInfo;

    fn fetch_request(parent: &Locator, index: u32) -> CallRequest {
        CallRequest::new(
            Locator::child(parent.clone(), ChildKind::EnvelopePoint, index),
            ops::ENVELOPE_POINT_GET,
            [],
        )
    }

    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self> {
        ordinal_element(session, parent, ChildKind::EnvelopePoint, index)
    }

    fn fetched_from_value(_session: &Session, value: Value) -> Result<Self::Fetched> {
        Ok(PointInfo::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{shared, MemoryHost};
    use crate::protocol::PointShape;
    use crate::session::Session;

    fn envelope() -> Envelope {
        let session = Session::in_host(shared(MemoryHost::new()));
        let track = session
            .current_project()
            .unwrap()
            .add_track(0, "Synth")
            .unwrap();
        track.envelope_by_name("Volume").unwrap()
    }

    #[test]
    fn test_tracks_carry_a_volume_envelope() {
        let session = Session::in_host(shared(MemoryHost::new()));
        let track = session
            .current_project()
            .unwrap()
            .add_track(0, "Synth")
            .unwrap();
        assert_eq!(track.envelopes().len().unwrap(), 1);
        assert_eq!(track.envelopes().get(0).unwrap().name().unwrap(), "Volume");
    }

    #[test]
    fn test_points_and_evaluation() {
        let envelope = envelope();
        envelope.add_point(0.0, 0.0).unwrap();
        envelope.add_point(4.0, 1.0).unwrap();

        assert_eq!(envelope.point_count().unwrap(), 2);
        assert_eq!(envelope.value_at(2.0).unwrap(), 0.5);

        let infos = envelope.points().fetch_all().unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].position, 4.0);
    }

    #[test]
    fn test_point_update_changes_shape() {
        let envelope = envelope();
        let point = envelope.add_point(0.0, 0.5).unwrap();
        point
            .set(PointUpdate {
                shape: Some(PointShape::Square),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(point.info().unwrap().shape, PointShape::Square);
    }

    #[test]
    fn test_envelope_back_reference() {
        let session = Session::in_host(shared(MemoryHost::new()));
        let track = session
            .current_project()
            .unwrap()
            .add_track(0, "Synth")
            .unwrap();
        let envelope = track.envelope_by_name("Volume").unwrap();
        assert_eq!(envelope.track().unwrap(), track);
    }
}
