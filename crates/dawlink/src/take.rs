//! Take proxy.

use crate::entity::{host_entity, HostEntity};
use crate::error::Result;
use crate::item::Item;
use crate::list::{HostList, ListElement};
use crate::locator::{EntityKind, Locator};
use crate::midi::{Cc, CcList, Note, NoteList, TextSysex, TextSysexList};
use crate::protocol::{ops, CallRequest, CcSpec, NoteSpec, TextSysexSpec, Value};
use crate::session::Session;

host_entity! {
    /// A take inside a media item.
    Take => EntityKind::Take
}

pub type TakeList = HostList<Take>;

impl Take {
    pub fn name(&self) -> Result<String> {
        self.invoke(ops::TAKE_GET_NAME, [])
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        self.invoke(ops::TAKE_SET_NAME, [Value::from(name)])
    }

    /// Parent item, as a locator-only back-reference.
    pub fn item(&self) -> Result<Item> {
        self.invoke_entity(ops::TAKE_GET_ITEM, [])
    }

    pub fn notes(&self) -> NoteList {
        HostList::new(self.session().clone(), self.locator().clone())
    }

    pub fn ccs(&self) -> CcList {
        HostList::new(self.session().clone(), self.locator().clone())
    }

    pub fn text_sysex_events(&self) -> TextSysexList {
        HostList::new(self.session().clone(), self.locator().clone())
    }

    pub fn add_note(&self, spec: NoteSpec) -> Result<Note> {
        self.invoke_entity(ops::TAKE_ADD_NOTE, [Value::from(spec)])
    }

    /// Insert several notes as one batch request. Not atomic: a failure
    /// mid-batch keeps the notes inserted before it.
    pub fn add_notes(&self, specs: &[NoteSpec]) -> Result<Vec<Note>> {
        let calls = specs
            .iter()
            .map(|spec| {
                CallRequest::new(
                    self.locator().clone(),
                    ops::TAKE_ADD_NOTE,
                    [Value::from(spec.clone())],
                )
            })
            .collect();
        self.session()
            .batch(calls)?
            .into_iter()
            .map(|value| self.session().rehydrate(value))
            .collect()
    }

    pub fn add_cc(&self, spec: CcSpec) -> Result<Cc> {
        self.invoke_entity(ops::TAKE_ADD_CC, [Value::from(spec)])
    }

    pub fn add_text_sysex(&self, spec: TextSysexSpec) -> Result<TextSysex> {
        self.invoke_entity(ops::TAKE_ADD_TEXT_SYSEX, [Value::from(spec)])
    }

    /// Re-sort MIDI events by time. Event indices (and therefore ordinal
    /// locators issued before the sort) may change.
    pub fn sort_events(&self) -> Result<()> {
        self.invoke(ops::TAKE_SORT_EVENTS, [])
    }
}

impl ListElement for Take {
    const COUNT_METHOD: &'static str = ops::ITEM_COUNT_TAKES;

    type Fetched = Take;

    fn fetch_request(parent: &Locator, index: u32) -> CallRequest {
        CallRequest::new(parent.clone(), ops::ITEM_GET_TAKE, [Value::from(index)])
    }

    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self> {
        let value = session.call(parent.clone(), ops::ITEM_GET_TAKE, [Value::from(index)])?;
        session.rehydrate(value)
    }

    fn fetched_from_value(session: &Session, value: Value) -> Result<Self::Fetched> {
        session.rehydrate(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{shared, MemoryHost};
    use crate::session::Session;

    fn note_spec(start: f64, pitch: u8) -> NoteSpec {
        NoteSpec {
            start,
            end: start + 0.5,
            channel: 0,
            pitch,
            velocity: 96,
            selected: false,
            muted: false,
        }
    }

    fn take() -> Take {
        let session = Session::in_host(shared(MemoryHost::new()));
        let track = session
            .current_project()
            .unwrap()
            .add_track(0, "MIDI")
            .unwrap();
        track.add_item(0.0, 8.0).unwrap().active_take().unwrap()
    }

    #[test]
    fn test_name_roundtrip() {
        let take = take();
        take.set_name("take 1").unwrap();
        assert_eq!(take.name().unwrap(), "take 1");
    }

    #[test]
    fn test_add_notes_batch_matches_singles() {
        let take = take();
        let notes = take
            .add_notes(&[note_spec(0.0, 60), note_spec(1.0, 64), note_spec(2.0, 67)])
            .unwrap();
        assert_eq!(notes.len(), 3);
        assert_eq!(take.notes().len().unwrap(), 3);
        assert_eq!(notes[1], take.notes().get(1).unwrap());
    }

    #[test]
    fn test_sort_events_reorders_indices() {
        let take = take();
        take.add_note(note_spec(4.0, 72)).unwrap();
        take.add_note(note_spec(1.0, 60)).unwrap();
        take.sort_events().unwrap();

        let infos = take.notes().fetch_all().unwrap();
        assert_eq!(infos[0].pitch, 60);
        assert_eq!(infos[1].pitch, 72);
    }
}
