//! Serializable identity for host-side entities.
//!
//! A locator is the minimal value needed to re-find an entity inside the
//! host: an identifier string for first-class objects, an index plus parent
//! locator for ordinal children, an opaque handle for windows and streaming
//! accessors. Locators carry no cached attributes and are never mutated in
//! place; equal contents denote the same entity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag for ordinal children addressed as `parent[index]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChildKind {
    FxParam,
    EnvelopePoint,
    Note,
    Cc,
    TextSysex,
    Marker,
    Region,
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChildKind::FxParam => "param",
            ChildKind::EnvelopePoint => "point",
            ChildKind::Note => "note",
            ChildKind::Cc => "cc",
            ChildKind::TextSysex => "textsysex",
            ChildKind::Marker => "marker",
            ChildKind::Region => "region",
        };
        f.write_str(name)
    }
}

/// The kind of entity a locator refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Host,
    Project,
    Track,
    Item,
    Take,
    Fx,
    FxParam,
    Envelope,
    EnvelopePoint,
    Note,
    Cc,
    TextSysex,
    Marker,
    Region,
    Window,
    AudioAccessor,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Host => "host",
            EntityKind::Project => "project",
            EntityKind::Track => "track",
            EntityKind::Item => "item",
            EntityKind::Take => "take",
            EntityKind::Fx => "fx",
            EntityKind::FxParam => "param",
            EntityKind::Envelope => "envelope",
            EntityKind::EnvelopePoint => "point",
            EntityKind::Note => "note",
            EntityKind::Cc => "cc",
            EntityKind::TextSysex => "textsysex",
            EntityKind::Marker => "marker",
            EntityKind::Region => "region",
            EntityKind::Window => "window",
            EntityKind::AudioAccessor => "accessor",
        };
        f.write_str(name)
    }
}

/// Serializable identity of a host-side entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locator {
    /// The host application itself (entry point for current-project and
    /// window queries).
    Host,
    Project {
        id: String,
    },
    Track {
        id: String,
    },
    Item {
        id: String,
    },
    Take {
        id: String,
    },
    Fx {
        id: String,
    },
    Envelope {
        id: String,
    },
    /// Ordinal child of another entity, addressed by index.
    Child {
        parent: Box<Locator>,
        kind: ChildKind,
        index: u32,
    },
    /// Opaque platform window handle.
    Window {
        handle: u64,
    },
    /// Host-side streaming audio handle. Not garbage-collected: it lives
    /// until explicitly released.
    AudioAccessor {
        handle: u64,
    },
}

impl Locator {
    pub fn child(parent: Locator, kind: ChildKind, index: u32) -> Self {
        Locator::Child {
            parent: Box::new(parent),
            kind,
            index,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Locator::Host => EntityKind::Host,
            Locator::Project { .. } => EntityKind::Project,
            Locator::Track { .. } => EntityKind::Track,
            Locator::Item { .. } => EntityKind::Item,
            Locator::Take { .. } => EntityKind::Take,
            Locator::Fx { .. } => EntityKind::Fx,
            Locator::Envelope { .. } => EntityKind::Envelope,
            Locator::Child { kind, .. } => match kind {
                ChildKind::FxParam => EntityKind::FxParam,
                ChildKind::EnvelopePoint => EntityKind::EnvelopePoint,
                ChildKind::Note => EntityKind::Note,
                ChildKind::Cc => EntityKind::Cc,
                ChildKind::TextSysex => EntityKind::TextSysex,
                ChildKind::Marker => EntityKind::Marker,
                ChildKind::Region => EntityKind::Region,
            },
            Locator::Window { .. } => EntityKind::Window,
            Locator::AudioAccessor { .. } => EntityKind::AudioAccessor,
        }
    }

    /// Parent locator for ordinal children, `None` otherwise.
    pub fn parent(&self) -> Option<&Locator> {
        match self {
            Locator::Child { parent, .. } => Some(parent),
            _ => None,
        }
    }

    /// Ordinal index for child locators, `None` otherwise.
    pub fn index(&self) -> Option<u32> {
        match self {
            Locator::Child { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Host => write!(f, "host"),
            Locator::Project { id } => write!(f, "project:{id}"),
            Locator::Track { id } => write!(f, "track:{id}"),
            Locator::Item { id } => write!(f, "item:{id}"),
            Locator::Take { id } => write!(f, "take:{id}"),
            Locator::Fx { id } => write!(f, "fx:{id}"),
            Locator::Envelope { id } => write!(f, "envelope:{id}"),
            Locator::Child {
                parent,
                kind,
                index,
            } => write!(f, "{parent}/{kind}[{index}]"),
            Locator::Window { handle } => write!(f, "window:{handle:#x}"),
            Locator::AudioAccessor { handle } => write!(f, "accessor:{handle}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_locator() -> Locator {
        Locator::child(
            Locator::Take {
                id: "take-7".into(),
            },
            ChildKind::Note,
            3,
        )
    }

    #[test]
    fn test_serialize_roundtrip_is_identity() {
        let locators = vec![
            Locator::Host,
            Locator::Project { id: "main".into() },
            Locator::Track {
                id: "track-1".into(),
            },
            note_locator(),
            Locator::Window { handle: 0x2a },
            Locator::AudioAccessor { handle: 9 },
        ];
        for locator in locators {
            let encoded = bincode::serialize(&locator).unwrap();
            let decoded: Locator = bincode::deserialize(&encoded).unwrap();
            assert_eq!(decoded, locator);
        }
    }

    #[test]
    fn test_equal_contents_denote_same_entity() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let a = note_locator();
        let b = note_locator();
        assert_eq!(a, b);

        let mut ha = DefaultHasher::new();
        let mut hb = DefaultHasher::new();
        a.hash(&mut ha);
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn test_kind_of_child_follows_child_kind() {
        assert_eq!(note_locator().kind(), EntityKind::Note);
        let point = Locator::child(
            Locator::Envelope { id: "env-1".into() },
            ChildKind::EnvelopePoint,
            0,
        );
        assert_eq!(point.kind(), EntityKind::EnvelopePoint);
    }

    #[test]
    fn test_display_names_parent_chain() {
        assert_eq!(note_locator().to_string(), "take:take-7/note[3]");
        assert_eq!(
            Locator::Window { handle: 0x2a }.to_string(),
            "window:0x2a"
        );
    }

    #[test]
    fn test_parent_and_index_accessors() {
        let note = note_locator();
        assert_eq!(
            note.parent(),
            Some(&Locator::Take {
                id: "take-7".into()
            })
        );
        assert_eq!(note.index(), Some(3));
        assert_eq!(Locator::Host.parent(), None);
        assert_eq!(Locator::Host.index(), None);
    }
}
