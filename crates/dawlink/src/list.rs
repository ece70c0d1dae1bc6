//! Lazily-evaluated collections over host-side sequences.
//!
//! A list is parameterized by its parent locator and caches nothing:
//! `len` and element access dispatch against live host state, so a list
//! queried twice may yield different results if the host changed in
//! between. `fetch_all` is the bulk form — one batch request carrying a
//! per-index read for every element, executed in index order.

use crate::entity::HostEntity;
use crate::error::{BridgeError, Result};
use crate::locator::{ChildKind, Locator};
use crate::protocol::{CallRequest, FromValue, Value};
use crate::session::Session;
use std::fmt;
use std::marker::PhantomData;

/// Element of a locator-parameterized list.
pub trait ListElement: HostEntity {
    /// Count operation dispatched on the parent locator.
    const COUNT_METHOD: &'static str;

    /// What a bulk fetch yields per element.
    type Fetched;

    /// The per-index read used by `fetch_all` (and equivalent to one
    /// sequential single-element fetch).
    fn fetch_request(parent: &Locator, index: u32) -> CallRequest;

    /// Materialize the element proxy at `index` against live state.
    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self>;

    /// Decode one bulk-fetched value.
    fn fetched_from_value(session: &Session, value: Value) -> Result<Self::Fetched>;
}

/// Ordered, index-addressable view over a host-side sequence.
pub struct HostList<T: ListElement> {
    session: Session,
    parent: Locator,
    _element: PhantomData<T>,
}

impl<T: ListElement> HostList<T> {
    pub(crate) fn new(session: Session, parent: Locator) -> Self {
        Self {
            session,
            parent,
            _element: PhantomData,
        }
    }

    pub fn parent(&self) -> &Locator {
        &self.parent
    }

    /// Live element count.
    pub fn len(&self) -> Result<u32> {
        let value = self
            .session
            .call(self.parent.clone(), T::COUNT_METHOD, [])?;
        Ok(u32::from_value(value)?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Element at `index` against live state.
    pub fn get(&self, index: u32) -> Result<T> {
        T::element(&self.session, &self.parent, index)
    }

    /// Lazy, restartable iteration. Each step re-reads live host state;
    /// call `iter` again to restart.
    pub fn iter(&self) -> ListIter<'_, T> {
        ListIter {
            list: self,
            index: 0,
            done: false,
        }
    }

    /// Fetch every element in ONE batch request, executed in index order.
    /// Equivalent to `len` sequential single-element fetches, minus the
    /// per-element round trips.
    pub fn fetch_all(&self) -> Result<Vec<T::Fetched>> {
        let len = self.len()?;
        if len == 0 {
            return Ok(Vec::new());
        }
        let calls = (0..len)
            .map(|index| T::fetch_request(&self.parent, index))
            .collect();
        let values = self.session.batch(calls)?;
        values
            .into_iter()
            .map(|value| T::fetched_from_value(&self.session, value))
            .collect()
    }
}

impl<T: ListElement> Clone for HostList<T> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            parent: self.parent.clone(),
            _element: PhantomData,
        }
    }
}

impl<T: ListElement> fmt::Debug for HostList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostList")
            .field("parent", &self.parent)
            .finish()
    }
}

/// Iterator over a `HostList`. Fuses after the first error.
pub struct ListIter<'a, T: ListElement> {
    list: &'a HostList<T>,
    index: u32,
    done: bool,
}

impl<T: ListElement> Iterator for ListIter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let len = match self.list.len() {
            Ok(len) => len,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };
        if self.index >= len {
            self.done = true;
            return None;
        }
        let element = self.list.get(self.index);
        if element.is_err() {
            self.done = true;
        }
        self.index += 1;
        Some(element)
    }
}

/// Element constructor for ordinal children: bounds-check against the live
/// count, then build the child locator. An out-of-range index is a stale
/// locator, not a default value.
pub(crate) fn ordinal_element<T: ListElement>(
    session: &Session,
    parent: &Locator,
    kind: ChildKind,
    index: u32,
) -> Result<T> {
    let value = session.call(parent.clone(), T::COUNT_METHOD, [])?;
    let len = u32::from_value(value)?;
    if index >= len {
        return Err(BridgeError::LocatorResolution {
            locator: Locator::child(parent.clone(), kind, index).to_string(),
        });
    }
    T::from_locator(session.clone(), Locator::child(parent.clone(), kind, index))
}
