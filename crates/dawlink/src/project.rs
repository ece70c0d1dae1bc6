//! Project proxy.

use crate::entity::{host_entity, HostEntity};
use crate::error::Result;
use crate::list::HostList;
use crate::locator::EntityKind;
use crate::marker::{Marker, MarkerList, Region, RegionList};
use crate::protocol::{ops, Value};
use crate::track::{Track, TrackList};

host_entity! {
    /// A project open in the host.
    Project => EntityKind::Project
}

impl Project {
    pub fn name(&self) -> Result<String> {
        self.invoke(ops::PROJECT_GET_NAME, [])
    }

    pub fn track_count(&self) -> Result<u32> {
        self.invoke(ops::PROJECT_COUNT_TRACKS, [])
    }

    pub fn track(&self, index: u32) -> Result<Track> {
        self.invoke_entity(ops::PROJECT_GET_TRACK, [Value::from(index)])
    }

    /// Insert a track at `index` and return its proxy.
    pub fn add_track(&self, index: u32, name: &str) -> Result<Track> {
        self.invoke_entity(ops::PROJECT_ADD_TRACK, [Value::from(index), Value::from(name)])
    }

    pub fn tracks(&self) -> TrackList {
        HostList::new(self.session().clone(), self.locator().clone())
    }

    pub fn marker_count(&self) -> Result<u32> {
        self.invoke(ops::PROJECT_COUNT_MARKERS, [])
    }

    pub fn add_marker(&self, position: f64, name: &str) -> Result<Marker> {
        self.invoke_entity(
            ops::PROJECT_ADD_MARKER,
            [Value::from(position), Value::from(name)],
        )
    }

    pub fn markers(&self) -> MarkerList {
        HostList::new(self.session().clone(), self.locator().clone())
    }

    pub fn region_count(&self) -> Result<u32> {
        self.invoke(ops::PROJECT_COUNT_REGIONS, [])
    }

    pub fn add_region(&self, start: f64, end: f64, name: &str) -> Result<Region> {
        self.invoke_entity(
            ops::PROJECT_ADD_REGION,
            [Value::from(start), Value::from(end), Value::from(name)],
        )
    }

    pub fn regions(&self) -> RegionList {
        HostList::new(self.session().clone(), self.locator().clone())
    }

    /// Edit cursor position in seconds.
    pub fn cursor_position(&self) -> Result<f64> {
        self.invoke(ops::PROJECT_GET_CURSOR, [])
    }

    pub fn set_cursor_position(&self, position: f64) -> Result<()> {
        self.invoke(ops::PROJECT_SET_CURSOR, [Value::from(position)])
    }

    pub fn play(&self) -> Result<()> {
        self.invoke(ops::PROJECT_PLAY, [])
    }

    pub fn stop(&self) -> Result<()> {
        self.invoke(ops::PROJECT_STOP, [])
    }

    pub fn is_playing(&self) -> Result<bool> {
        self.invoke(ops::PROJECT_IS_PLAYING, [])
    }

    /// Undo the last action. Surfaces the host's refusal message when
    /// there is nothing to undo.
    pub fn undo(&self) -> Result<()> {
        self.invoke(ops::PROJECT_UNDO, [])
    }

    pub fn redo(&self) -> Result<()> {
        self.invoke(ops::PROJECT_REDO, [])
    }

    /// Extended state value stored under `(section, key)`. A missing key
    /// surfaces as a host failure.
    pub fn ext_state(&self, section: &str, key: &str) -> Result<String> {
        self.invoke(
            ops::PROJECT_GET_EXT_STATE,
            [Value::from(section), Value::from(key)],
        )
    }

    pub fn set_ext_state(&self, section: &str, key: &str, value: &str) -> Result<()> {
        self.invoke(
            ops::PROJECT_SET_EXT_STATE,
            [Value::from(section), Value::from(key), Value::from(value)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::host::{shared, MemoryHost};
    use crate::session::Session;

    fn project() -> Project {
        Session::in_host(shared(MemoryHost::new()))
            .current_project()
            .unwrap()
    }

    #[test]
    fn test_add_track_then_enumerate() {
        let project = project();
        project.add_track(0, "Drums").unwrap();
        project.add_track(1, "Bass").unwrap();

        assert_eq!(project.track_count().unwrap(), 2);
        let names: Vec<String> = project
            .tracks()
            .iter()
            .map(|track| track.unwrap().name().unwrap())
            .collect();
        assert_eq!(names, ["Drums", "Bass"]);
    }

    #[test]
    fn test_cursor_and_transport_state() {
        let project = project();
        project.set_cursor_position(12.5).unwrap();
        assert_eq!(project.cursor_position().unwrap(), 12.5);

        assert!(!project.is_playing().unwrap());
        project.play().unwrap();
        assert!(project.is_playing().unwrap());
        project.stop().unwrap();
        assert!(!project.is_playing().unwrap());
    }

    #[test]
    fn test_undo_surfaces_host_message() {
        let project = project();
        let err = project.undo().unwrap_err();
        match err {
            BridgeError::RemoteExecution { message } => assert_eq!(message, "Can't undo."),
            other => panic!("expected RemoteExecution, got {other:?}"),
        }
    }

    #[test]
    fn test_undo_reverts_volume_edit() {
        let project = project();
        let track = project.add_track(0, "Keys").unwrap();
        track.set_volume(0.3).unwrap();
        project.undo().unwrap();
        assert_eq!(track.volume().unwrap(), 1.0);
        project.redo().unwrap();
        assert_eq!(track.volume().unwrap(), 0.3);
    }

    #[test]
    fn test_ext_state_roundtrip() {
        let project = project();
        project.set_ext_state("mytool", "last_preset", "warm").unwrap();
        assert_eq!(project.ext_state("mytool", "last_preset").unwrap(), "warm");

        let err = project.ext_state("mytool", "missing").unwrap_err();
        assert!(matches!(err, BridgeError::RemoteExecution { .. }));
    }

    #[test]
    fn test_markers_and_regions() {
        let project = project();
        project.add_marker(1.0, "verse").unwrap();
        project.add_marker(8.0, "chorus").unwrap();
        project.add_region(0.0, 16.0, "song").unwrap();

        assert_eq!(project.marker_count().unwrap(), 2);
        assert_eq!(project.region_count().unwrap(), 1);

        let infos = project.markers().fetch_all().unwrap();
        assert_eq!(infos[0].name, "verse");
        assert_eq!(infos[1].position, 8.0);
    }
}
