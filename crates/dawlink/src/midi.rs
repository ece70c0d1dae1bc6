//! MIDI event proxies: notes, control changes, text/sysex events.
//!
//! Events are ordinal children of their take: the locator is the take
//! locator plus an index specific to the event type (a note and a CC can
//! share an index). `info` reads every property in a single dispatch,
//! which is the efficient form when querying more than one field.

use crate::entity::{host_entity, HostEntity};
use crate::error::Result;
use crate::list::{ordinal_element, HostList, ListElement};
use crate::locator::{ChildKind, EntityKind, Locator};
use crate::protocol::{
    ops, CallRequest, CcSpec, CcUpdate, FromValue, NoteSpec, NoteUpdate, TextSysexSpec,
    TextSysexUpdate, Value,
};
use crate::session::Session;

host_entity! {
    /// A MIDI note.
    Note => EntityKind::Note
}

host_entity! {
    /// A MIDI control change event.
    Cc => EntityKind::Cc
}

host_entity! {
    /// A text or sysex meta event.
    TextSysex => EntityKind::TextSysex
}

pub type NoteList = HostList<Note>;
pub type CcList = HostList<Cc>;
pub type TextSysexList = HostList<TextSysex>;

impl Note {
    /// All note properties in one dispatch.
    pub fn info(&self) -> Result<NoteSpec> {
        self.invoke(ops::NOTE_GET, [])
    }

    pub fn pitch(&self) -> Result<u8> {
        Ok(self.info()?.pitch)
    }

    pub fn velocity(&self) -> Result<u8> {
        Ok(self.info()?.velocity)
    }

    pub fn start(&self) -> Result<f64> {
        Ok(self.info()?.start)
    }

    pub fn end(&self) -> Result<f64> {
        Ok(self.info()?.end)
    }

    /// Apply the present fields of `update`, leaving the rest untouched.
    pub fn set(&self, update: NoteUpdate) -> Result<()> {
        self.invoke(ops::NOTE_SET, [Value::from(update)])
    }

    pub fn delete(&self) -> Result<()> {
        self.invoke(ops::NOTE_DELETE, [])
    }
}

impl ListElement for Note {
    const COUNT_METHOD: &'static str = ops::TAKE_COUNT_NOTES;

    type Fetched = NoteSpec;

    fn fetch_request(parent: &Locator, index: u32) -> CallRequest {
        CallRequest::new(
            Locator::child(parent.clone(), ChildKind::Note, index),
            ops::NOTE_GET,
            [],
        )
    }

    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self> {
        ordinal_element(session, parent, ChildKind::Note, index)
    }

    fn fetched_from_value(_session: &Session, value: Value) -> Result<Self::Fetched> {
        Ok(NoteSpec::from_value(value)?)
    }
}

impl Cc {
    /// All CC properties in one dispatch.
    pub fn info(&self) -> Result<CcSpec> {
        self.invoke(ops::CC_GET, [])
    }

    pub fn channel(&self) -> Result<u8> {
        Ok(self.info()?.channel)
    }

    pub fn controller(&self) -> Result<u8> {
        Ok(self.info()?.controller)
    }

    pub fn value(&self) -> Result<u8> {
        Ok(self.info()?.value)
    }

    pub fn set(&self, update: CcUpdate) -> Result<()> {
        self.invoke(ops::CC_SET, [Value::from(update)])
    }

    pub fn delete(&self) -> Result<()> {
        self.invoke(ops::CC_DELETE, [])
    }
}

impl ListElement for Cc {
    const COUNT_METHOD: &'static str = ops::TAKE_COUNT_CC;

    type Fetched = CcSpec;

    fn fetch_request(parent: &Locator, index: u32) -> CallRequest {
        CallRequest::new(
            Locator::child(parent.clone(), ChildKind::Cc, index),
            ops::CC_GET,
            [],
        )
    }

    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self> {
        ordinal_element(session, parent, ChildKind::Cc, index)
    }

    fn fetched_from_value(_session: &Session, value: Value) -> Result<Self::Fetched> {
        Ok(CcSpec::from_value(value)?)
    }
}

impl TextSysex {
    pub fn info(&self) -> Result<TextSysexSpec> {
        self.invoke(ops::TEXT_SYSEX_GET, [])
    }

    pub fn set(&self, update: TextSysexUpdate) -> Result<()> {
        self.invoke(ops::TEXT_SYSEX_SET, [Value::from(update)])
    }

    pub fn delete(&self) -> Result<()> {
        self.invoke(ops::TEXT_SYSEX_DELETE, [])
    }
}

impl ListElement for TextSysex {
    const COUNT_METHOD: &'static str = ops::TAKE_COUNT_TEXT_SYSEX;

    type Fetched = TextSysexSpec;

    fn fetch_request(parent: &Locator, index: u32) -> CallRequest {
        CallRequest::new(
            Locator::child(parent.clone(), ChildKind::TextSysex, index),
            ops::TEXT_SYSEX_GET,
            [],
        )
    }

    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self> {
        ordinal_element(session, parent, ChildKind::TextSysex, index)
    }

    fn fetched_from_value(_session: &Session, value: Value) -> Result<Self::Fetched> {
        Ok(TextSysexSpec::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::host::{shared, MemoryHost};
    use crate::session::Session;
    use crate::take::Take;

    fn take_with_notes(pitches: &[u8]) -> Take {
        let session = Session::in_host(shared(MemoryHost::new()));
        let take = session
            .current_project()
            .unwrap()
            .add_track(0, "MIDI")
            .unwrap()
            .add_item(0.0, 8.0)
            .unwrap()
            .active_take()
            .unwrap();
        for (i, pitch) in pitches.iter().enumerate() {
            take.add_note(NoteSpec {
                start: i as f64,
                end: i as f64 + 0.5,
                channel: 0,
                pitch: *pitch,
                velocity: 100,
                selected: false,
                muted: false,
            })
            .unwrap();
        }
        take
    }

    #[test]
    fn test_bulk_fetch_equals_sequential_fetches() {
        let take = take_with_notes(&[60, 62, 64, 65, 67]);
        let list = take.notes();

        let bulk = list.fetch_all().unwrap();
        let sequential: Vec<NoteSpec> = (0..list.len().unwrap())
            .map(|i| list.get(i).unwrap().info().unwrap())
            .collect();
        assert_eq!(bulk, sequential);
    }

    #[test]
    fn test_set_applies_only_present_fields() {
        let take = take_with_notes(&[60]);
        let note = take.notes().get(0).unwrap();
        note.set(NoteUpdate {
            velocity: Some(40),
            ..Default::default()
        })
        .unwrap();

        let info = note.info().unwrap();
        assert_eq!(info.velocity, 40);
        assert_eq!(info.pitch, 60);
        assert_eq!(info.start, 0.0);
    }

    #[test]
    fn test_out_of_range_index_is_stale_locator() {
        let take = take_with_notes(&[60]);
        let err = take.notes().get(5).unwrap_err();
        assert!(matches!(err, BridgeError::LocatorResolution { .. }));
    }

    #[test]
    fn test_deleted_note_shrinks_list() {
        let take = take_with_notes(&[60, 62]);
        take.notes().get(0).unwrap().delete().unwrap();
        assert_eq!(take.notes().len().unwrap(), 1);
        assert_eq!(take.notes().get(0).unwrap().pitch().unwrap(), 62);
    }

    #[test]
    fn test_cc_and_text_sysex_roundtrip() {
        let take = take_with_notes(&[]);
        let cc = take
            .add_cc(CcSpec {
                position: 0.5,
                channel: 1,
                controller: 7,
                value: 90,
                selected: false,
                muted: false,
            })
            .unwrap();
        assert_eq!(cc.controller().unwrap(), 7);
        cc.set(CcUpdate {
            value: Some(127),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cc.value().unwrap(), 127);

        let event = take
            .add_text_sysex(TextSysexSpec {
                position: 1.0,
                kind: 1,
                message: b"verse".to_vec(),
                selected: false,
                muted: false,
            })
            .unwrap();
        assert_eq!(event.info().unwrap().message, b"verse".to_vec());
    }

    #[test]
    fn test_note_and_cc_lists_are_independent() {
        let take = take_with_notes(&[60]);
        take.add_cc(CcSpec {
            position: 0.0,
            channel: 0,
            controller: 1,
            value: 10,
            selected: false,
            muted: false,
        })
        .unwrap();

        assert_eq!(take.notes().len().unwrap(), 1);
        assert_eq!(take.ccs().len().unwrap(), 1);
        assert_eq!(take.text_sysex_events().len().unwrap(), 0);
    }
}
