//! Media item proxy.

use crate::audio_accessor::AudioAccessor;
use crate::entity::{host_entity, HostEntity};
use crate::error::Result;
use crate::list::{HostList, ListElement};
use crate::locator::{EntityKind, Locator};
use crate::protocol::{ops, CallRequest, Value};
use crate::session::Session;
use crate::take::{Take, TakeList};
use crate::track::Track;

host_entity! {
    /// A media item on a track.
    Item => EntityKind::Item
}

pub type ItemList = HostList<Item>;

impl Item {
    /// Item start position in seconds.
    pub fn position(&self) -> Result<f64> {
        self.invoke(ops::ITEM_GET_POSITION, [])
    }

    pub fn set_position(&self, position: f64) -> Result<()> {
        self.invoke(ops::ITEM_SET_POSITION, [Value::from(position)])
    }

    pub fn length(&self) -> Result<f64> {
        self.invoke(ops::ITEM_GET_LENGTH, [])
    }

    pub fn set_length(&self, length: f64) -> Result<()> {
        self.invoke(ops::ITEM_SET_LENGTH, [Value::from(length)])
    }

    pub fn active_take(&self) -> Result<Take> {
        self.invoke_entity(ops::ITEM_GET_ACTIVE_TAKE, [])
    }

    pub fn take(&self, index: u32) -> Result<Take> {
        self.invoke_entity(ops::ITEM_GET_TAKE, [Value::from(index)])
    }

    pub fn add_take(&self) -> Result<Take> {
        self.invoke_entity(ops::ITEM_ADD_TAKE, [])
    }

    pub fn takes(&self) -> TakeList {
        HostList::new(self.session().clone(), self.locator().clone())
    }

    pub fn delete(&self) -> Result<()> {
        self.invoke(ops::ITEM_DELETE, [])
    }

    /// Parent track, as a locator-only back-reference.
    pub fn track(&self) -> Result<Track> {
        self.invoke_entity(ops::ITEM_GET_TRACK, [])
    }

    /// Open a streaming accessor over this item's audio. The host-side
    /// handle is not garbage-collected; prefer `with_audio_accessor`,
    /// which guarantees release on all exit paths.
    pub fn create_audio_accessor(&self) -> Result<AudioAccessor> {
        self.invoke_entity(ops::ITEM_CREATE_AUDIO_ACCESSOR, [])
    }

    /// Scoped accessor acquisition: the accessor is released when `f`
    /// returns, whether it succeeded or failed.
    pub fn with_audio_accessor<R>(
        &self,
        f: impl FnOnce(&AudioAccessor) -> Result<R>,
    ) -> Result<R> {
        let accessor = self.create_audio_accessor()?;
        let result = f(&accessor);
        let released = accessor.release();
        match result {
            Ok(value) => released.map(|()| value),
            Err(err) => Err(err),
        }
    }
}

impl ListElement for Item {
    const COUNT_METHOD: &'static str = ops::TRACK_COUNT_ITEMS;

    type Fetched = Item;

    fn fetch_request(parent: &Locator, index: u32) -> CallRequest {
        CallRequest::new(parent.clone(), ops::TRACK_GET_ITEM, [Value::from(index)])
    }

    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self> {
        let value = session.call(parent.clone(), ops::TRACK_GET_ITEM, [Value::from(index)])?;
        session.rehydrate(value)
    }

    fn fetched_from_value(session: &Session, value: Value) -> Result<Self::Fetched> {
        session.rehydrate(value)
    }
}
