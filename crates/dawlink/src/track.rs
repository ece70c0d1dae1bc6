//! Track proxy.

use crate::entity::{host_entity, HostEntity};
use crate::envelope::{Envelope, EnvelopeList};
use crate::error::Result;
use crate::fx::{Fx, FxList};
use crate::item::{Item, ItemList};
use crate::list::{HostList, ListElement};
use crate::locator::{EntityKind, Locator};
use crate::project::Project;
use crate::protocol::{ops, CallRequest, Value};
use crate::session::Session;

host_entity! {
    /// A track in a project.
    Track => EntityKind::Track
}

pub type TrackList = HostList<Track>;

impl Track {
    /// Track name ("MASTER" for the master track in hosts that have one).
    pub fn name(&self) -> Result<String> {
        self.invoke(ops::TRACK_GET_NAME, [])
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        self.invoke(ops::TRACK_SET_NAME, [Value::from(name)])
    }

    pub fn volume(&self) -> Result<f64> {
        self.invoke(ops::TRACK_GET_VOLUME, [])
    }

    pub fn set_volume(&self, volume: f64) -> Result<()> {
        self.invoke(ops::TRACK_SET_VOLUME, [Value::from(volume)])
    }

    /// Pan between -1.0 (left) and 1.0 (right).
    pub fn pan(&self) -> Result<f64> {
        self.invoke(ops::TRACK_GET_PAN, [])
    }

    pub fn set_pan(&self, pan: f64) -> Result<()> {
        self.invoke(ops::TRACK_SET_PAN, [Value::from(pan)])
    }

    /// Track color as an RGB triple.
    pub fn color(&self) -> Result<(u8, u8, u8)> {
        self.invoke(ops::TRACK_GET_COLOR, [])
    }

    pub fn set_color(&self, (r, g, b): (u8, u8, u8)) -> Result<()> {
        self.invoke(
            ops::TRACK_SET_COLOR,
            [Value::from(r), Value::from(g), Value::from(b)],
        )
    }

    pub fn is_selected(&self) -> Result<bool> {
        self.invoke(ops::TRACK_IS_SELECTED, [])
    }

    pub fn set_selected(&self, selected: bool) -> Result<()> {
        self.invoke(ops::TRACK_SET_SELECTED, [Value::from(selected)])
    }

    pub fn select(&self) -> Result<()> {
        self.set_selected(true)
    }

    pub fn unselect(&self) -> Result<()> {
        self.set_selected(false)
    }

    /// Delete the track. Further operations on this proxy (or any other
    /// proxy holding the same locator) fail with a resolution error.
    pub fn delete(&self) -> Result<()> {
        self.invoke(ops::TRACK_DELETE, [])
    }

    pub fn item_count(&self) -> Result<u32> {
        self.invoke(ops::TRACK_COUNT_ITEMS, [])
    }

    pub fn item(&self, index: u32) -> Result<Item> {
        self.invoke_entity(ops::TRACK_GET_ITEM, [Value::from(index)])
    }

    /// Create a new item and return it.
    pub fn add_item(&self, position: f64, length: f64) -> Result<Item> {
        self.invoke_entity(
            ops::TRACK_ADD_ITEM,
            [Value::from(position), Value::from(length)],
        )
    }

    pub fn items(&self) -> ItemList {
        HostList::new(self.session().clone(), self.locator().clone())
    }

    pub fn envelopes(&self) -> EnvelopeList {
        HostList::new(self.session().clone(), self.locator().clone())
    }

    pub fn envelope_by_name(&self, name: &str) -> Result<Envelope> {
        self.invoke_entity(ops::TRACK_GET_ENVELOPE_BY_NAME, [Value::from(name)])
    }

    pub fn fxs(&self) -> FxList {
        HostList::new(self.session().clone(), self.locator().clone())
    }

    pub fn add_fx(&self, name: &str) -> Result<Fx> {
        self.invoke_entity(ops::TRACK_ADD_FX, [Value::from(name)])
    }

    /// Parent project, as a locator-only back-reference.
    pub fn project(&self) -> Result<Project> {
        self.invoke_entity(ops::TRACK_GET_PROJECT, [])
    }
}

impl ListElement for Track {
    const COUNT_METHOD: &'static str = ops::PROJECT_COUNT_TRACKS;

    type Fetched = Track;

    fn fetch_request(parent: &Locator, index: u32) -> CallRequest {
        CallRequest::new(parent.clone(), ops::PROJECT_GET_TRACK, [Value::from(index)])
    }

    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self> {
        let value = session.call(parent.clone(), ops::PROJECT_GET_TRACK, [Value::from(index)])?;
        session.rehydrate(value)
    }

    fn fetched_from_value(session: &Session, value: Value) -> Result<Self::Fetched> {
        session.rehydrate(value)
    }
}
