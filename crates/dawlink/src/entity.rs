//! Base abstraction for entity proxies.
//!
//! Every concrete entity owns exactly one locator plus the session it was
//! created under, caches nothing, and is re-creatable at will from its
//! locator. Equality and hashing are defined purely in terms of locator
//! equality, never proxy identity.

use crate::error::{BridgeError, Result};
use crate::locator::{EntityKind, Locator};
use crate::protocol::{FromValue, Value};
use crate::session::Session;

pub trait HostEntity: Sized {
    const KIND: EntityKind;

    /// Construct without kind checking. Prefer `from_locator`.
    fn from_parts(session: Session, locator: Locator) -> Self;

    fn locator(&self) -> &Locator;

    fn session(&self) -> &Session;

    /// Rebuild a proxy from a locator, rejecting kind mismatches.
    fn from_locator(session: Session, locator: Locator) -> Result<Self> {
        if locator.kind() == Self::KIND {
            Ok(Self::from_parts(session, locator))
        } else {
            Err(BridgeError::UnsupportedType {
                context: format!("expected {} locator, got {}", Self::KIND, locator),
            })
        }
    }

    /// One dispatch call on this entity, with a typed result.
    fn invoke<R: FromValue>(
        &self,
        method: &'static str,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<R> {
        let value = self.session().call(self.locator().clone(), method, args)?;
        Ok(R::from_value(value)?)
    }

    /// One dispatch call whose result is a locator, rehydrated into a
    /// typed proxy under this entity's session.
    fn invoke_entity<E: HostEntity>(
        &self,
        method: &'static str,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<E> {
        let value = self.session().call(self.locator().clone(), method, args)?;
        self.session().rehydrate(value)
    }
}

/// Define an entity proxy: a session plus a locator, with locator-only
/// equality and hashing.
macro_rules! host_entity {
    ($(#[$meta:meta])* $name:ident => $kind:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            session: $crate::session::Session,
            locator: $crate::locator::Locator,
        }

        impl $crate::entity::HostEntity for $name {
            const KIND: $crate::locator::EntityKind = $kind;

            fn from_parts(
                session: $crate::session::Session,
                locator: $crate::locator::Locator,
            ) -> Self {
                Self { session, locator }
            }

            fn locator(&self) -> &$crate::locator::Locator {
                &self.locator
            }

            fn session(&self) -> &$crate::session::Session {
                &self.session
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.locator == other.locator
            }
        }

        impl Eq for $name {}

        impl std::hash::Hash for $name {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash(&self.locator, state);
            }
        }
    };
}

pub(crate) use host_entity;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{shared, MemoryHost};
    use crate::track::Track;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn track_locator(id: &str) -> Locator {
        Locator::Track { id: id.into() }
    }

    #[test]
    fn test_proxies_with_equal_locators_are_equal() {
        // Two proxies from different sessions still denote the same entity.
        let a = Track::from_locator(
            Session::in_host(shared(MemoryHost::new())),
            track_locator("track-1"),
        )
        .unwrap();
        let b = Track::from_locator(Session::disconnected(), track_locator("track-1")).unwrap();
        assert_eq!(a, b);

        let mut ha = DefaultHasher::new();
        let mut hb = DefaultHasher::new();
        a.hash(&mut ha);
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn test_proxies_with_different_locators_differ() {
        let session = Session::disconnected();
        let a = Track::from_locator(session.clone(), track_locator("track-1")).unwrap();
        let b = Track::from_locator(session, track_locator("track-2")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_locator_rejects_kind_mismatch() {
        let err = Track::from_locator(
            Session::disconnected(),
            Locator::Item { id: "item-1".into() },
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedType { .. }));
    }
}
