//! Marker and region proxies.
//!
//! Both are ordinal children of their project. Deleting one shifts the
//! indices of those after it; ordinal locators issued earlier then refer
//! to different entries, which is the documented identity model for
//! ordinal children.

use crate::entity::{host_entity, HostEntity};
use crate::error::Result;
use crate::list::{ordinal_element, HostList, ListElement};
use crate::locator::{ChildKind, EntityKind, Locator};
use crate::protocol::{
    ops, CallRequest, FromValue, MarkerInfo, MarkerUpdate, RegionInfo, RegionUpdate, Value,
};
use crate::session::Session;

host_entity! {
    /// A project marker.
    Marker => EntityKind::Marker
}

host_entity! {
    /// A project region.
    Region => EntityKind::Region
}

pub type MarkerList = HostList<Marker>;
pub type RegionList = HostList<Region>;

impl Marker {
    pub fn info(&self) -> Result<MarkerInfo> {
        self.invoke(ops::MARKER_GET, [])
    }

    pub fn position(&self) -> Result<f64> {
        Ok(self.info()?.position)
    }

    pub fn name(&self) -> Result<String> {
        Ok(self.info()?.name)
    }

    pub fn set(&self, update: MarkerUpdate) -> Result<()> {
        self.invoke(ops::MARKER_SET, [Value::from(update)])
    }

    pub fn set_position(&self, position: f64) -> Result<()> {
        self.set(MarkerUpdate {
            position: Some(position),
            ..Default::default()
        })
    }

    pub fn delete(&self) -> Result<()> {
        self.invoke(ops::MARKER_DELETE, [])
    }
}

impl ListElement for Marker {
    const COUNT_METHOD: &'static str = ops::PROJECT_COUNT_MARKERS;

    type Fetched = MarkerInfo;

    fn fetch_request(parent: &Locator, index: u32) -> CallRequest {
        CallRequest::new(
            Locator::child(parent.clone(), ChildKind::Marker, index),
            ops::MARKER_GET,
            [],
        )
    }

    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self> {
        ordinal_element(session, parent, ChildKind::Marker, index)
    }

    fn fetched_from_value(_session: &Session, value: Value) -> Result<Self::Fetched> {
        Ok(MarkerInfo::from_value(value)?)
    }
}

impl Region {
    pub fn info(&self) -> Result<RegionInfo> {
        self.invoke(ops::REGION_GET, [])
    }

    pub fn start(&self) -> Result<f64> {
        Ok(self.info()?.start)
    }

    pub fn end(&self) -> Result<f64> {
        Ok(self.info()?.end)
    }

    pub fn name(&self) -> Result<String> {
        Ok(self.info()?.name)
    }

    pub fn set(&self, update: RegionUpdate) -> Result<()> {
        self.invoke(ops::REGION_SET, [Value::from(update)])
    }

    pub fn set_bounds(&self, start: f64, end: f64) -> Result<()> {
        self.set(RegionUpdate {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        })
    }

    pub fn delete(&self) -> Result<()> {
        self.invoke(ops::REGION_DELETE, [])
    }
}

impl ListElement for Region {
    const COUNT_METHOD: &'static str = ops::PROJECT_COUNT_REGIONS;

    type Fetched = RegionInfo;

    fn fetch_request(parent: &Locator, index: u32) -> CallRequest {
        CallRequest::new(
            Locator::child(parent.clone(), ChildKind::Region, index),
            ops::REGION_GET,
            [],
        )
    }

    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self> {
        ordinal_element(session, parent, ChildKind::Region, index)
    }

    fn fetched_from_value(_session: &Session, value: Value) -> Result<Self::Fetched> {
        Ok(RegionInfo::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::host::{shared, MemoryHost};
    use crate::project::Project;
    use crate::session::Session;

    fn project() -> Project {
        Session::in_host(shared(MemoryHost::new()))
            .current_project()
            .unwrap()
    }

    #[test]
    fn test_marker_edit_roundtrip() {
        let project = project();
        let marker = project.add_marker(3.0, "bridge").unwrap();
        assert_eq!(marker.position().unwrap(), 3.0);

        marker.set_position(5.0).unwrap();
        assert_eq!(marker.position().unwrap(), 5.0);
        assert_eq!(marker.name().unwrap(), "bridge");
    }

    #[test]
    fn test_region_bounds_roundtrip() {
        let project = project();
        let region = project.add_region(0.0, 8.0, "intro").unwrap();
        region.set_bounds(1.0, 9.0).unwrap();

        let info = region.info().unwrap();
        assert_eq!(info.start, 1.0);
        assert_eq!(info.end, 9.0);
        assert_eq!(info.name, "intro");
    }

    #[test]
    fn test_deleted_marker_locator_goes_stale() {
        let project = project();
        let marker = project.add_marker(1.0, "only").unwrap();
        marker.delete().unwrap();

        assert!(matches!(
            marker.info().unwrap_err(),
            BridgeError::LocatorResolution { .. }
        ));
    }
}
