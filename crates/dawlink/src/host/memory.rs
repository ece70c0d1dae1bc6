//! In-memory host graph.
//!
//! A complete `HostApi` implementation over plain collections. Backs the
//! test suite in both execution modes and the standalone `dawlink-server`
//! binary, so clients can be developed without a DAW. Undo is snapshot
//! based: every edit checkpoints the whole graph, which is cheap at this
//! scale and keeps undo/redo exact.

use super::{HostApi, HostError, HostResult};
use crate::locator::EntityKind;
use crate::protocol::{
    CcSpec, CcUpdate, MarkerInfo, MarkerUpdate, NoteSpec, NoteUpdate, PointInfo, PointShape,
    PointUpdate, RegionInfo, RegionUpdate, TextSysexSpec, TextSysexUpdate,
};
use std::collections::HashMap;

const SAMPLE_RATE: f64 = 44_100.0;

/// Handle of the host's main window.
pub const MAIN_WINDOW: u64 = 1;

#[derive(Debug, Clone)]
struct ProjectState {
    name: String,
    tracks: Vec<String>,
    markers: Vec<MarkerInfo>,
    regions: Vec<RegionInfo>,
    cursor: f64,
    playing: bool,
}

#[derive(Debug, Clone)]
struct TrackState {
    project: String,
    name: String,
    volume: f64,
    pan: f64,
    color: (u8, u8, u8),
    selected: bool,
    items: Vec<String>,
    envelopes: Vec<String>,
    fx: Vec<String>,
}

#[derive(Debug, Clone)]
struct ItemState {
    track: String,
    position: f64,
    length: f64,
    takes: Vec<String>,
    active_take: u32,
}

#[derive(Debug, Clone)]
struct TakeState {
    item: String,
    name: String,
    notes: Vec<NoteSpec>,
    ccs: Vec<CcSpec>,
    text_events: Vec<TextSysexSpec>,
}

#[derive(Debug, Clone)]
struct FxState {
    name: String,
    enabled: bool,
    preset: String,
    params: Vec<(String, f64)>,
}

#[derive(Debug, Clone)]
struct EnvelopeState {
    track: String,
    name: String,
    points: Vec<PointInfo>,
}

#[derive(Debug, Clone, Default)]
struct Graph {
    projects: HashMap<String, ProjectState>,
    tracks: HashMap<String, TrackState>,
    items: HashMap<String, ItemState>,
    takes: HashMap<String, TakeState>,
    fx: HashMap<String, FxState>,
    envelopes: HashMap<String, EnvelopeState>,
}

#[derive(Debug, Clone)]
struct AccessorState {
    start: f64,
    end: f64,
}

/// In-memory host.
pub struct MemoryHost {
    graph: Graph,
    current: String,
    undo: Vec<(String, Graph)>,
    redo: Vec<(String, Graph)>,
    ext_state: HashMap<(String, String, String), String>,
    windows: HashMap<u64, String>,
    accessors: HashMap<u64, AccessorState>,
    release_count: u64,
    next_id: u64,
}

impl MemoryHost {
    pub fn new() -> Self {
        let mut projects = HashMap::new();
        projects.insert(
            "main".to_string(),
            ProjectState {
                name: "Untitled".to_string(),
                tracks: Vec::new(),
                markers: Vec::new(),
                regions: Vec::new(),
                cursor: 0.0,
                playing: false,
            },
        );
        let mut windows = HashMap::new();
        windows.insert(MAIN_WINDOW, "Main".to_string());
        Self {
            graph: Graph {
                projects,
                ..Graph::default()
            },
            current: "main".to_string(),
            undo: Vec::new(),
            redo: Vec::new(),
            ext_state: HashMap::new(),
            windows,
            accessors: HashMap::new(),
            release_count: 0,
            next_id: 0,
        }
    }

    /// How many accessor handles have been explicitly released.
    pub fn release_count(&self) -> u64 {
        self.release_count
    }

    /// How many accessor handles are still open.
    pub fn live_accessor_count(&self) -> usize {
        self.accessors.len()
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn fresh_handle(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Snapshot the graph before an edit.
    fn checkpoint(&mut self, label: &str) {
        self.undo.push((label.to_string(), self.graph.clone()));
        self.redo.clear();
    }

    fn project_ref(&self, id: &str) -> HostResult<&ProjectState> {
        self.graph
            .projects
            .get(id)
            .ok_or_else(|| HostError::no_such(EntityKind::Project, id))
    }

    fn project_mut(&mut self, id: &str) -> HostResult<&mut ProjectState> {
        self.graph
            .projects
            .get_mut(id)
            .ok_or_else(|| HostError::no_such(EntityKind::Project, id))
    }

    fn track_ref(&self, id: &str) -> HostResult<&TrackState> {
        self.graph
            .tracks
            .get(id)
            .ok_or_else(|| HostError::no_such(EntityKind::Track, id))
    }

    fn track_mut_ref(&mut self, id: &str) -> HostResult<&mut TrackState> {
        self.graph
            .tracks
            .get_mut(id)
            .ok_or_else(|| HostError::no_such(EntityKind::Track, id))
    }

    fn item_ref(&self, id: &str) -> HostResult<&ItemState> {
        self.graph
            .items
            .get(id)
            .ok_or_else(|| HostError::no_such(EntityKind::Item, id))
    }

    fn item_mut_ref(&mut self, id: &str) -> HostResult<&mut ItemState> {
        self.graph
            .items
            .get_mut(id)
            .ok_or_else(|| HostError::no_such(EntityKind::Item, id))
    }

    fn take_ref(&self, id: &str) -> HostResult<&TakeState> {
        self.graph
            .takes
            .get(id)
            .ok_or_else(|| HostError::no_such(EntityKind::Take, id))
    }

    fn take_mut_ref(&mut self, id: &str) -> HostResult<&mut TakeState> {
        self.graph
            .takes
            .get_mut(id)
            .ok_or_else(|| HostError::no_such(EntityKind::Take, id))
    }

    fn fx_ref(&self, id: &str) -> HostResult<&FxState> {
        self.graph
            .fx
            .get(id)
            .ok_or_else(|| HostError::no_such(EntityKind::Fx, id))
    }

    fn fx_mut_ref(&mut self, id: &str) -> HostResult<&mut FxState> {
        self.graph
            .fx
            .get_mut(id)
            .ok_or_else(|| HostError::no_such(EntityKind::Fx, id))
    }

    fn envelope_ref(&self, id: &str) -> HostResult<&EnvelopeState> {
        self.graph
            .envelopes
            .get(id)
            .ok_or_else(|| HostError::no_such(EntityKind::Envelope, id))
    }

    fn envelope_mut_ref(&mut self, id: &str) -> HostResult<&mut EnvelopeState> {
        self.graph
            .envelopes
            .get_mut(id)
            .ok_or_else(|| HostError::no_such(EntityKind::Envelope, id))
    }

    fn accessor_ref(&self, handle: u64) -> HostResult<&AccessorState> {
        self.accessors
            .get(&handle)
            .ok_or_else(|| HostError::no_such(EntityKind::AudioAccessor, handle.to_string()))
    }

    fn note_index(take: &TakeState, take_id: &str, index: u32) -> HostResult<usize> {
        let index = index as usize;
        if index >= take.notes.len() {
            return Err(HostError::no_such(
                EntityKind::Note,
                format!("{take_id}[{index}]"),
            ));
        }
        Ok(index)
    }

    fn cc_index(take: &TakeState, take_id: &str, index: u32) -> HostResult<usize> {
        let index = index as usize;
        if index >= take.ccs.len() {
            return Err(HostError::no_such(
                EntityKind::Cc,
                format!("{take_id}[{index}]"),
            ));
        }
        Ok(index)
    }

    fn text_index(take: &TakeState, take_id: &str, index: u32) -> HostResult<usize> {
        let index = index as usize;
        if index >= take.text_events.len() {
            return Err(HostError::no_such(
                EntityKind::TextSysex,
                format!("{take_id}[{index}]"),
            ));
        }
        Ok(index)
    }

    fn remove_track_cascade(graph: &mut Graph, track_id: &str) {
        if let Some(track) = graph.tracks.remove(track_id) {
            if let Some(project) = graph.projects.get_mut(&track.project) {
                project.tracks.retain(|t| t != track_id);
            }
            for item_id in &track.items {
                if let Some(item) = graph.items.remove(item_id) {
                    for take_id in &item.takes {
                        graph.takes.remove(take_id);
                    }
                }
            }
            for fx_id in &track.fx {
                graph.fx.remove(fx_id);
            }
            for envelope_id in &track.envelopes {
                graph.envelopes.remove(envelope_id);
            }
        }
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostApi for MemoryHost {
    // =========================================================================
    // Host
    // =========================================================================

    fn current_project(&self) -> HostResult<String> {
        Ok(self.current.clone())
    }

    fn host_version(&self) -> HostResult<String> {
        Ok(format!("dawlink-memory {}", env!("CARGO_PKG_VERSION")))
    }

    fn main_window(&self) -> HostResult<u64> {
        Ok(MAIN_WINDOW)
    }

    // =========================================================================
    // Project
    // =========================================================================

    fn project_name(&self, project: &str) -> HostResult<String> {
        Ok(self.project_ref(project)?.name.clone())
    }

    fn count_tracks(&self, project: &str) -> HostResult<u32> {
        Ok(self.project_ref(project)?.tracks.len() as u32)
    }

    fn track_at(&self, project: &str, index: u32) -> HostResult<String> {
        let tracks = &self.project_ref(project)?.tracks;
        tracks
            .get(index as usize)
            .cloned()
            .ok_or_else(|| HostError::no_such(EntityKind::Track, format!("{project}[{index}]")))
    }

    fn add_track(&mut self, project: &str, index: u32, name: &str) -> HostResult<String> {
        self.project_ref(project)?;
        self.checkpoint("add track");
        let track_id = self.fresh_id("track");
        let envelope_id = self.fresh_id("envelope");
        self.graph.envelopes.insert(
            envelope_id.clone(),
            EnvelopeState {
                track: track_id.clone(),
                name: "Volume".to_string(),
                points: Vec::new(),
            },
        );
        self.graph.tracks.insert(
            track_id.clone(),
            TrackState {
                project: project.to_string(),
                name: name.to_string(),
                volume: 1.0,
                pan: 0.0,
                color: (0, 0, 0),
                selected: false,
                items: Vec::new(),
                envelopes: vec![envelope_id],
                fx: Vec::new(),
            },
        );
        let tracks = &mut self.project_mut(project)?.tracks;
        let index = (index as usize).min(tracks.len());
        tracks.insert(index, track_id.clone());
        Ok(track_id)
    }

    fn count_markers(&self, project: &str) -> HostResult<u32> {
        Ok(self.project_ref(project)?.markers.len() as u32)
    }

    fn add_marker(&mut self, project: &str, position: f64, name: &str) -> HostResult<u32> {
        self.project_ref(project)?;
        self.checkpoint("add marker");
        let markers = &mut self.project_mut(project)?.markers;
        markers.push(MarkerInfo {
            position,
            name: name.to_string(),
        });
        Ok((markers.len() - 1) as u32)
    }

    fn count_regions(&self, project: &str) -> HostResult<u32> {
        Ok(self.project_ref(project)?.regions.len() as u32)
    }

    fn add_region(&mut self, project: &str, start: f64, end: f64, name: &str) -> HostResult<u32> {
        self.project_ref(project)?;
        self.checkpoint("add region");
        let regions = &mut self.project_mut(project)?.regions;
        regions.push(RegionInfo {
            start,
            end,
            name: name.to_string(),
        });
        Ok((regions.len() - 1) as u32)
    }

    fn cursor_position(&self, project: &str) -> HostResult<f64> {
        Ok(self.project_ref(project)?.cursor)
    }

    fn set_cursor_position(&mut self, project: &str, position: f64) -> HostResult<()> {
        self.project_mut(project)?.cursor = position;
        Ok(())
    }

    fn play(&mut self, project: &str) -> HostResult<()> {
        self.project_mut(project)?.playing = true;
        Ok(())
    }

    fn stop(&mut self, project: &str) -> HostResult<()> {
        self.project_mut(project)?.playing = false;
        Ok(())
    }

    fn is_playing(&self, project: &str) -> HostResult<bool> {
        Ok(self.project_ref(project)?.playing)
    }

    fn undo(&mut self, project: &str) -> HostResult<()> {
        self.project_ref(project)?;
        match self.undo.pop() {
            Some((label, snapshot)) => {
                let current = std::mem::replace(&mut self.graph, snapshot);
                self.redo.push((label, current));
                Ok(())
            }
            None => Err(HostError::failed("Can't undo.")),
        }
    }

    fn redo(&mut self, project: &str) -> HostResult<()> {
        self.project_ref(project)?;
        match self.redo.pop() {
            Some((label, snapshot)) => {
                let current = std::mem::replace(&mut self.graph, snapshot);
                self.undo.push((label, current));
                Ok(())
            }
            None => Err(HostError::failed("Can't redo.")),
        }
    }

    fn ext_state(&self, project: &str, section: &str, key: &str) -> HostResult<String> {
        self.project_ref(project)?;
        self.ext_state
            .get(&(
                project.to_string(),
                section.to_string(),
                key.to_string(),
            ))
            .cloned()
            .ok_or_else(|| {
                HostError::failed(format!(
                    "undefined extended state for key {key} in section {section}"
                ))
            })
    }

    fn set_ext_state(
        &mut self,
        project: &str,
        section: &str,
        key: &str,
        value: &str,
    ) -> HostResult<()> {
        self.project_ref(project)?;
        self.ext_state.insert(
            (
                project.to_string(),
                section.to_string(),
                key.to_string(),
            ),
            value.to_string(),
        );
        Ok(())
    }

    // =========================================================================
    // Track
    // =========================================================================

    fn track_name(&self, track: &str) -> HostResult<String> {
        Ok(self.track_ref(track)?.name.clone())
    }

    fn set_track_name(&mut self, track: &str, name: &str) -> HostResult<()> {
        self.track_ref(track)?;
        self.checkpoint("rename track");
        self.track_mut_ref(track)?.name = name.to_string();
        Ok(())
    }

    fn track_volume(&self, track: &str) -> HostResult<f64> {
        Ok(self.track_ref(track)?.volume)
    }

    fn set_track_volume(&mut self, track: &str, volume: f64) -> HostResult<()> {
        self.track_ref(track)?;
        self.checkpoint("set track volume");
        self.track_mut_ref(track)?.volume = volume;
        Ok(())
    }

    fn track_pan(&self, track: &str) -> HostResult<f64> {
        Ok(self.track_ref(track)?.pan)
    }

    fn set_track_pan(&mut self, track: &str, pan: f64) -> HostResult<()> {
        self.track_ref(track)?;
        self.checkpoint("set track pan");
        self.track_mut_ref(track)?.pan = pan;
        Ok(())
    }

    fn track_color(&self, track: &str) -> HostResult<(u8, u8, u8)> {
        Ok(self.track_ref(track)?.color)
    }

    fn set_track_color(&mut self, track: &str, color: (u8, u8, u8)) -> HostResult<()> {
        self.track_ref(track)?;
        self.checkpoint("set track color");
        self.track_mut_ref(track)?.color = color;
        Ok(())
    }

    fn track_selected(&self, track: &str) -> HostResult<bool> {
        Ok(self.track_ref(track)?.selected)
    }

    fn set_track_selected(&mut self, track: &str, selected: bool) -> HostResult<()> {
        self.track_ref(track)?;
        self.checkpoint("select track");
        self.track_mut_ref(track)?.selected = selected;
        Ok(())
    }

    fn delete_track(&mut self, track: &str) -> HostResult<()> {
        self.track_ref(track)?;
        self.checkpoint("delete track");
        Self::remove_track_cascade(&mut self.graph, track);
        Ok(())
    }

    fn count_items(&self, track: &str) -> HostResult<u32> {
        Ok(self.track_ref(track)?.items.len() as u32)
    }

    fn item_at(&self, track: &str, index: u32) -> HostResult<String> {
        self.track_ref(track)?
            .items
            .get(index as usize)
            .cloned()
            .ok_or_else(|| HostError::no_such(EntityKind::Item, format!("{track}[{index}]")))
    }

    fn add_item(&mut self, track: &str, position: f64, length: f64) -> HostResult<String> {
        self.track_ref(track)?;
        self.checkpoint("add item");
        let item_id = self.fresh_id("item");
        let take_id = self.fresh_id("take");
        self.graph.takes.insert(
            take_id.clone(),
            TakeState {
                item: item_id.clone(),
                name: String::new(),
                notes: Vec::new(),
                ccs: Vec::new(),
                text_events: Vec::new(),
            },
        );
        self.graph.items.insert(
            item_id.clone(),
            ItemState {
                track: track.to_string(),
                position,
                length,
                takes: vec![take_id],
                active_take: 0,
            },
        );
        self.track_mut_ref(track)?.items.push(item_id.clone());
        Ok(item_id)
    }

    fn count_envelopes(&self, track: &str) -> HostResult<u32> {
        Ok(self.track_ref(track)?.envelopes.len() as u32)
    }

    fn envelope_at(&self, track: &str, index: u32) -> HostResult<String> {
        self.track_ref(track)?
            .envelopes
            .get(index as usize)
            .cloned()
            .ok_or_else(|| HostError::no_such(EntityKind::Envelope, format!("{track}[{index}]")))
    }

    fn envelope_by_name(&self, track: &str, name: &str) -> HostResult<String> {
        let track_state = self.track_ref(track)?;
        track_state
            .envelopes
            .iter()
            .find(|id| {
                self.graph
                    .envelopes
                    .get(*id)
                    .is_some_and(|e| e.name == name)
            })
            .cloned()
            .ok_or_else(|| HostError::no_such(EntityKind::Envelope, format!("{track}:{name}")))
    }

    fn count_fx(&self, track: &str) -> HostResult<u32> {
        Ok(self.track_ref(track)?.fx.len() as u32)
    }

    fn fx_at(&self, track: &str, index: u32) -> HostResult<String> {
        self.track_ref(track)?
            .fx
            .get(index as usize)
            .cloned()
            .ok_or_else(|| HostError::no_such(EntityKind::Fx, format!("{track}[{index}]")))
    }

    fn add_fx(&mut self, track: &str, name: &str) -> HostResult<String> {
        self.track_ref(track)?;
        self.checkpoint("add fx");
        let fx_id = self.fresh_id("fx");
        self.graph.fx.insert(
            fx_id.clone(),
            FxState {
                name: name.to_string(),
                enabled: true,
                preset: String::new(),
                params: vec![("Wet".to_string(), 1.0), ("Dry".to_string(), 0.0)],
            },
        );
        self.track_mut_ref(track)?.fx.push(fx_id.clone());
        Ok(fx_id)
    }

    fn track_project(&self, track: &str) -> HostResult<String> {
        Ok(self.track_ref(track)?.project.clone())
    }

    // =========================================================================
    // Item
    // =========================================================================

    fn item_position(&self, item: &str) -> HostResult<f64> {
        Ok(self.item_ref(item)?.position)
    }

    fn set_item_position(&mut self, item: &str, position: f64) -> HostResult<()> {
        self.item_ref(item)?;
        self.checkpoint("move item");
        self.item_mut_ref(item)?.position = position;
        Ok(())
    }

    fn item_length(&self, item: &str) -> HostResult<f64> {
        Ok(self.item_ref(item)?.length)
    }

    fn set_item_length(&mut self, item: &str, length: f64) -> HostResult<()> {
        self.item_ref(item)?;
        self.checkpoint("resize item");
        self.item_mut_ref(item)?.length = length;
        Ok(())
    }

    fn active_take(&self, item: &str) -> HostResult<String> {
        let state = self.item_ref(item)?;
        state
            .takes
            .get(state.active_take as usize)
            .cloned()
            .ok_or_else(|| HostError::no_such(EntityKind::Take, format!("{item}:active")))
    }

    fn count_takes(&self, item: &str) -> HostResult<u32> {
        Ok(self.item_ref(item)?.takes.len() as u32)
    }

    fn take_at(&self, item: &str, index: u32) -> HostResult<String> {
        self.item_ref(item)?
            .takes
            .get(index as usize)
            .cloned()
            .ok_or_else(|| HostError::no_such(EntityKind::Take, format!("{item}[{index}]")))
    }

    fn add_take(&mut self, item: &str) -> HostResult<String> {
        self.item_ref(item)?;
        self.checkpoint("add take");
        let take_id = self.fresh_id("take");
        self.graph.takes.insert(
            take_id.clone(),
            TakeState {
                item: item.to_string(),
                name: String::new(),
                notes: Vec::new(),
                ccs: Vec::new(),
                text_events: Vec::new(),
            },
        );
        self.item_mut_ref(item)?.takes.push(take_id.clone());
        Ok(take_id)
    }

    fn delete_item(&mut self, item: &str) -> HostResult<()> {
        self.item_ref(item)?;
        self.checkpoint("delete item");
        if let Some(state) = self.graph.items.remove(item) {
            for take_id in &state.takes {
                self.graph.takes.remove(take_id);
            }
            if let Some(track) = self.graph.tracks.get_mut(&state.track) {
                track.items.retain(|i| i != item);
            }
        }
        Ok(())
    }

    fn item_track(&self, item: &str) -> HostResult<String> {
        Ok(self.item_ref(item)?.track.clone())
    }

    fn create_audio_accessor(&mut self, item: &str) -> HostResult<u64> {
        let state = self.item_ref(item)?;
        let (start, end) = (0.0, state.length);
        let handle = self.fresh_handle();
        self.accessors.insert(handle, AccessorState { start, end });
        Ok(handle)
    }

    // =========================================================================
    // Take & MIDI events
    // =========================================================================

    fn take_name(&self, take: &str) -> HostResult<String> {
        Ok(self.take_ref(take)?.name.clone())
    }

    fn set_take_name(&mut self, take: &str, name: &str) -> HostResult<()> {
        self.take_ref(take)?;
        self.checkpoint("rename take");
        self.take_mut_ref(take)?.name = name.to_string();
        Ok(())
    }

    fn take_item(&self, take: &str) -> HostResult<String> {
        Ok(self.take_ref(take)?.item.clone())
    }

    fn count_notes(&self, take: &str) -> HostResult<u32> {
        Ok(self.take_ref(take)?.notes.len() as u32)
    }

    fn count_cc(&self, take: &str) -> HostResult<u32> {
        Ok(self.take_ref(take)?.ccs.len() as u32)
    }

    fn count_text_sysex(&self, take: &str) -> HostResult<u32> {
        Ok(self.take_ref(take)?.text_events.len() as u32)
    }

    fn add_note(&mut self, take: &str, spec: &NoteSpec) -> HostResult<u32> {
        self.take_ref(take)?;
        self.checkpoint("add note");
        let notes = &mut self.take_mut_ref(take)?.notes;
        notes.push(spec.clone());
        Ok((notes.len() - 1) as u32)
    }

    fn add_cc(&mut self, take: &str, spec: &CcSpec) -> HostResult<u32> {
        self.take_ref(take)?;
        self.checkpoint("add cc");
        let ccs = &mut self.take_mut_ref(take)?.ccs;
        ccs.push(spec.clone());
        Ok((ccs.len() - 1) as u32)
    }

    fn add_text_sysex(&mut self, take: &str, spec: &TextSysexSpec) -> HostResult<u32> {
        self.take_ref(take)?;
        self.checkpoint("add text/sysex event");
        let events = &mut self.take_mut_ref(take)?.text_events;
        events.push(spec.clone());
        Ok((events.len() - 1) as u32)
    }

    fn sort_events(&mut self, take: &str) -> HostResult<()> {
        self.take_ref(take)?;
        self.checkpoint("sort events");
        let state = self.take_mut_ref(take)?;
        state.notes.sort_by(|a, b| a.start.total_cmp(&b.start));
        state.ccs.sort_by(|a, b| a.position.total_cmp(&b.position));
        state
            .text_events
            .sort_by(|a, b| a.position.total_cmp(&b.position));
        Ok(())
    }

    fn note_info(&self, take: &str, index: u32) -> HostResult<NoteSpec> {
        let state = self.take_ref(take)?;
        let index = Self::note_index(state, take, index)?;
        Ok(state.notes[index].clone())
    }

    fn set_note(&mut self, take: &str, index: u32, update: &NoteUpdate) -> HostResult<()> {
        let state = self.take_ref(take)?;
        let index = Self::note_index(state, take, index)?;
        self.checkpoint("edit note");
        let note = &mut self.take_mut_ref(take)?.notes[index];
        if let Some(start) = update.start {
            note.start = start;
        }
        if let Some(end) = update.end {
            note.end = end;
        }
        if let Some(channel) = update.channel {
            note.channel = channel;
        }
        if let Some(pitch) = update.pitch {
            note.pitch = pitch;
        }
        if let Some(velocity) = update.velocity {
            note.velocity = velocity;
        }
        if let Some(selected) = update.selected {
            note.selected = selected;
        }
        if let Some(muted) = update.muted {
            note.muted = muted;
        }
        Ok(())
    }

    fn delete_note(&mut self, take: &str, index: u32) -> HostResult<()> {
        let state = self.take_ref(take)?;
        let index = Self::note_index(state, take, index)?;
        self.checkpoint("delete note");
        self.take_mut_ref(take)?.notes.remove(index);
        Ok(())
    }

    fn cc_info(&self, take: &str, index: u32) -> HostResult<CcSpec> {
        let state = self.take_ref(take)?;
        let index = Self::cc_index(state, take, index)?;
        Ok(state.ccs[index].clone())
    }

    fn set_cc(&mut self, take: &str, index: u32, update: &CcUpdate) -> HostResult<()> {
        let state = self.take_ref(take)?;
        let index = Self::cc_index(state, take, index)?;
        self.checkpoint("edit cc");
        let cc = &mut self.take_mut_ref(take)?.ccs[index];
        if let Some(position) = update.position {
            cc.position = position;
        }
        if let Some(channel) = update.channel {
            cc.channel = channel;
        }
        if let Some(controller) = update.controller {
            cc.controller = controller;
        }
        if let Some(value) = update.value {
            cc.value = value;
        }
        if let Some(selected) = update.selected {
            cc.selected = selected;
        }
        if let Some(muted) = update.muted {
            cc.muted = muted;
        }
        Ok(())
    }

    fn delete_cc(&mut self, take: &str, index: u32) -> HostResult<()> {
        let state = self.take_ref(take)?;
        let index = Self::cc_index(state, take, index)?;
        self.checkpoint("delete cc");
        self.take_mut_ref(take)?.ccs.remove(index);
        Ok(())
    }

    fn text_sysex_info(&self, take: &str, index: u32) -> HostResult<TextSysexSpec> {
        let state = self.take_ref(take)?;
        let index = Self::text_index(state, take, index)?;
        Ok(state.text_events[index].clone())
    }

    fn set_text_sysex(
        &mut self,
        take: &str,
        index: u32,
        update: &TextSysexUpdate,
    ) -> HostResult<()> {
        let state = self.take_ref(take)?;
        let index = Self::text_index(state, take, index)?;
        self.checkpoint("edit text/sysex event");
        let event = &mut self.take_mut_ref(take)?.text_events[index];
        if let Some(position) = update.position {
            event.position = position;
        }
        if let Some(kind) = update.kind {
            event.kind = kind;
        }
        if let Some(message) = &update.message {
            event.message = message.clone();
        }
        if let Some(selected) = update.selected {
            event.selected = selected;
        }
        if let Some(muted) = update.muted {
            event.muted = muted;
        }
        Ok(())
    }

    fn delete_text_sysex(&mut self, take: &str, index: u32) -> HostResult<()> {
        let state = self.take_ref(take)?;
        let index = Self::text_index(state, take, index)?;
        self.checkpoint("delete text/sysex event");
        self.take_mut_ref(take)?.text_events.remove(index);
        Ok(())
    }

    // =========================================================================
    // FX
    // =========================================================================

    fn fx_name(&self, fx: &str) -> HostResult<String> {
        Ok(self.fx_ref(fx)?.name.clone())
    }

    fn fx_enabled(&self, fx: &str) -> HostResult<bool> {
        Ok(self.fx_ref(fx)?.enabled)
    }

    fn set_fx_enabled(&mut self, fx: &str, enabled: bool) -> HostResult<()> {
        self.fx_ref(fx)?;
        self.checkpoint("toggle fx");
        self.fx_mut_ref(fx)?.enabled = enabled;
        Ok(())
    }

    fn fx_preset(&self, fx: &str) -> HostResult<String> {
        Ok(self.fx_ref(fx)?.preset.clone())
    }

    fn set_fx_preset(&mut self, fx: &str, preset: &str) -> HostResult<()> {
        self.fx_ref(fx)?;
        self.checkpoint("set fx preset");
        self.fx_mut_ref(fx)?.preset = preset.to_string();
        Ok(())
    }

    fn count_fx_params(&self, fx: &str) -> HostResult<u32> {
        Ok(self.fx_ref(fx)?.params.len() as u32)
    }

    fn delete_fx(&mut self, fx: &str) -> HostResult<()> {
        self.fx_ref(fx)?;
        self.checkpoint("delete fx");
        self.graph.fx.remove(fx);
        for track in self.graph.tracks.values_mut() {
            track.fx.retain(|f| f != fx);
        }
        Ok(())
    }

    fn fx_param_name(&self, fx: &str, index: u32) -> HostResult<String> {
        self.fx_ref(fx)?
            .params
            .get(index as usize)
            .map(|(name, _)| name.clone())
            .ok_or_else(|| HostError::no_such(EntityKind::FxParam, format!("{fx}[{index}]")))
    }

    fn fx_param_value(&self, fx: &str, index: u32) -> HostResult<f64> {
        self.fx_ref(fx)?
            .params
            .get(index as usize)
            .map(|(_, value)| *value)
            .ok_or_else(|| HostError::no_such(EntityKind::FxParam, format!("{fx}[{index}]")))
    }

    fn set_fx_param_value(&mut self, fx: &str, index: u32, value: f64) -> HostResult<()> {
        let state = self.fx_ref(fx)?;
        if index as usize >= state.params.len() {
            return Err(HostError::no_such(
                EntityKind::FxParam,
                format!("{fx}[{index}]"),
            ));
        }
        self.checkpoint("set fx param");
        self.fx_mut_ref(fx)?.params[index as usize].1 = value;
        Ok(())
    }

    // =========================================================================
    // Envelope
    // =========================================================================

    fn envelope_name(&self, envelope: &str) -> HostResult<String> {
        Ok(self.envelope_ref(envelope)?.name.clone())
    }

    fn envelope_track(&self, envelope: &str) -> HostResult<String> {
        Ok(self.envelope_ref(envelope)?.track.clone())
    }

    fn count_envelope_points(&self, envelope: &str) -> HostResult<u32> {
        Ok(self.envelope_ref(envelope)?.points.len() as u32)
    }

    fn add_envelope_point(&mut self, envelope: &str, position: f64, value: f64) -> HostResult<u32> {
        self.envelope_ref(envelope)?;
        self.checkpoint("add envelope point");
        let points = &mut self.envelope_mut_ref(envelope)?.points;
        points.push(PointInfo {
            position,
            value,
            shape: PointShape::Linear,
        });
        points.sort_by(|a, b| a.position.total_cmp(&b.position));
        let index = points
            .iter()
            .position(|p| p.position == position && p.value == value)
            .unwrap_or(points.len() - 1);
        Ok(index as u32)
    }

    fn envelope_value_at(&self, envelope: &str, time: f64) -> HostResult<f64> {
        let points = &self.envelope_ref(envelope)?.points;
        if points.is_empty() {
            return Ok(0.0);
        }
        let mut previous = &points[0];
        if time <= previous.position {
            return Ok(previous.value);
        }
        for point in &points[1..] {
            if time < point.position {
                return Ok(match previous.shape {
                    PointShape::Square => previous.value,
                    _ => {
                        let span = point.position - previous.position;
                        let t = (time - previous.position) / span;
                        previous.value + (point.value - previous.value) * t
                    }
                });
            }
            previous = point;
        }
        Ok(previous.value)
    }

    fn envelope_point(&self, envelope: &str, index: u32) -> HostResult<PointInfo> {
        self.envelope_ref(envelope)?
            .points
            .get(index as usize)
            .cloned()
            .ok_or_else(|| {
                HostError::no_such(EntityKind::EnvelopePoint, format!("{envelope}[{index}]"))
            })
    }

    fn set_envelope_point(
        &mut self,
        envelope: &str,
        index: u32,
        update: &PointUpdate,
    ) -> HostResult<()> {
        let state = self.envelope_ref(envelope)?;
        if index as usize >= state.points.len() {
            return Err(HostError::no_such(
                EntityKind::EnvelopePoint,
                format!("{envelope}[{index}]"),
            ));
        }
        self.checkpoint("edit envelope point");
        let point = &mut self.envelope_mut_ref(envelope)?.points[index as usize];
        if let Some(position) = update.position {
            point.position = position;
        }
        if let Some(value) = update.value {
            point.value = value;
        }
        if let Some(shape) = update.shape {
            point.shape = shape;
        }
        Ok(())
    }

    fn delete_envelope_point(&mut self, envelope: &str, index: u32) -> HostResult<()> {
        let state = self.envelope_ref(envelope)?;
        if index as usize >= state.points.len() {
            return Err(HostError::no_such(
                EntityKind::EnvelopePoint,
                format!("{envelope}[{index}]"),
            ));
        }
        self.checkpoint("delete envelope point");
        self.envelope_mut_ref(envelope)?.points.remove(index as usize);
        Ok(())
    }

    // =========================================================================
    // Markers & regions
    // =========================================================================

    fn marker_info(&self, project: &str, index: u32) -> HostResult<MarkerInfo> {
        self.project_ref(project)?
            .markers
            .get(index as usize)
            .cloned()
            .ok_or_else(|| HostError::no_such(EntityKind::Marker, format!("{project}[{index}]")))
    }

    fn set_marker(&mut self, project: &str, index: u32, update: &MarkerUpdate) -> HostResult<()> {
        let state = self.project_ref(project)?;
        if index as usize >= state.markers.len() {
            return Err(HostError::no_such(
                EntityKind::Marker,
                format!("{project}[{index}]"),
            ));
        }
        self.checkpoint("edit marker");
        let marker = &mut self.project_mut(project)?.markers[index as usize];
        if let Some(position) = update.position {
            marker.position = position;
        }
        if let Some(name) = &update.name {
            marker.name = name.clone();
        }
        Ok(())
    }

    fn delete_marker(&mut self, project: &str, index: u32) -> HostResult<()> {
        let state = self.project_ref(project)?;
        if index as usize >= state.markers.len() {
            return Err(HostError::no_such(
                EntityKind::Marker,
                format!("{project}[{index}]"),
            ));
        }
        self.checkpoint("delete marker");
        self.project_mut(project)?.markers.remove(index as usize);
        Ok(())
    }

    fn region_info(&self, project: &str, index: u32) -> HostResult<RegionInfo> {
        self.project_ref(project)?
            .regions
            .get(index as usize)
            .cloned()
            .ok_or_else(|| HostError::no_such(EntityKind::Region, format!("{project}[{index}]")))
    }

    fn set_region(&mut self, project: &str, index: u32, update: &RegionUpdate) -> HostResult<()> {
        let state = self.project_ref(project)?;
        if index as usize >= state.regions.len() {
            return Err(HostError::no_such(
                EntityKind::Region,
                format!("{project}[{index}]"),
            ));
        }
        self.checkpoint("edit region");
        let region = &mut self.project_mut(project)?.regions[index as usize];
        if let Some(start) = update.start {
            region.start = start;
        }
        if let Some(end) = update.end {
            region.end = end;
        }
        if let Some(name) = &update.name {
            region.name = name.clone();
        }
        Ok(())
    }

    fn delete_region(&mut self, project: &str, index: u32) -> HostResult<()> {
        let state = self.project_ref(project)?;
        if index as usize >= state.regions.len() {
            return Err(HostError::no_such(
                EntityKind::Region,
                format!("{project}[{index}]"),
            ));
        }
        self.checkpoint("delete region");
        self.project_mut(project)?.regions.remove(index as usize);
        Ok(())
    }

    // =========================================================================
    // Windows
    // =========================================================================

    fn window_title(&self, handle: u64) -> HostResult<String> {
        self.windows
            .get(&handle)
            .cloned()
            .ok_or_else(|| HostError::no_such(EntityKind::Window, format!("{handle:#x}")))
    }

    fn refresh_window(&mut self, handle: u64) -> HostResult<()> {
        if !self.windows.contains_key(&handle) {
            return Err(HostError::no_such(EntityKind::Window, format!("{handle:#x}")));
        }
        Ok(())
    }

    // =========================================================================
    // Audio accessors
    // =========================================================================

    fn accessor_start_time(&self, handle: u64) -> HostResult<f64> {
        Ok(self.accessor_ref(handle)?.start)
    }

    fn accessor_end_time(&self, handle: u64) -> HostResult<f64> {
        Ok(self.accessor_ref(handle)?.end)
    }

    fn read_accessor(&self, handle: u64, start: f64, frames: u32) -> HostResult<Vec<f64>> {
        let state = self.accessor_ref(handle)?;
        if start < state.start {
            return Err(HostError::failed(format!(
                "read window starts before accessor range ({start} < {})",
                state.start
            )));
        }
        let first_frame = (start * SAMPLE_RATE) as u64;
        let end_frame = (state.end * SAMPLE_RATE) as u64;
        // Deterministic ramp inside the accessor range, silence beyond it.
        let samples = (0..u64::from(frames))
            .map(|i| {
                let frame = first_frame + i;
                if frame < end_frame {
                    (frame % 1000) as f64 / 1000.0
                } else {
                    0.0
                }
            })
            .collect();
        Ok(samples)
    }

    fn release_accessor(&mut self, handle: u64) -> HostResult<()> {
        if self.accessors.remove(&handle).is_none() {
            return Err(HostError::no_such(
                EntityKind::AudioAccessor,
                handle.to_string(),
            ));
        }
        self.release_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_with_track() -> (MemoryHost, String) {
        let mut host = MemoryHost::new();
        let track = host.add_track("main", 0, "Drums").unwrap();
        (host, track)
    }

    #[test]
    fn test_add_track_registers_in_project_order() {
        let mut host = MemoryHost::new();
        let first = host.add_track("main", 0, "A").unwrap();
        let second = host.add_track("main", 0, "B").unwrap();
        assert_eq!(host.count_tracks("main").unwrap(), 2);
        assert_eq!(host.track_at("main", 0).unwrap(), second);
        assert_eq!(host.track_at("main", 1).unwrap(), first);
    }

    #[test]
    fn test_unknown_ids_are_no_such_entity() {
        let host = MemoryHost::new();
        assert!(matches!(
            host.track_volume("track-99"),
            Err(HostError::NoSuchEntity { .. })
        ));
        assert!(matches!(
            host.project_name("side"),
            Err(HostError::NoSuchEntity { .. })
        ));
    }

    #[test]
    fn test_delete_track_cascades() {
        let (mut host, track) = host_with_track();
        let item = host.add_item(&track, 0.0, 4.0).unwrap();
        let take = host.active_take(&item).unwrap();
        host.delete_track(&track).unwrap();

        assert!(matches!(
            host.track_name(&track),
            Err(HostError::NoSuchEntity { .. })
        ));
        assert!(matches!(
            host.item_position(&item),
            Err(HostError::NoSuchEntity { .. })
        ));
        assert!(matches!(
            host.take_name(&take),
            Err(HostError::NoSuchEntity { .. })
        ));
        assert_eq!(host.count_tracks("main").unwrap(), 0);
    }

    #[test]
    fn test_undo_restores_previous_graph() {
        let (mut host, track) = host_with_track();
        host.set_track_volume(&track, 0.25).unwrap();
        host.undo("main").unwrap();
        assert_eq!(host.track_volume(&track).unwrap(), 1.0);
        host.redo("main").unwrap();
        assert_eq!(host.track_volume(&track).unwrap(), 0.25);
    }

    #[test]
    fn test_undo_on_empty_stack_reports_host_message() {
        let mut host = MemoryHost::new();
        let err = host.undo("main").unwrap_err();
        assert_eq!(err, HostError::failed("Can't undo."));
        let err = host.redo("main").unwrap_err();
        assert_eq!(err, HostError::failed("Can't redo."));
    }

    #[test]
    fn test_ext_state_roundtrip_and_missing_key() {
        let mut host = MemoryHost::new();
        host.set_ext_state("main", "tool", "last", "42").unwrap();
        assert_eq!(host.ext_state("main", "tool", "last").unwrap(), "42");
        let err = host.ext_state("main", "tool", "other").unwrap_err();
        assert!(matches!(err, HostError::Failed(_)));
    }

    #[test]
    fn test_note_ordering_survives_sort() {
        let (mut host, track) = host_with_track();
        let item = host.add_item(&track, 0.0, 4.0).unwrap();
        let take = host.active_take(&item).unwrap();
        let mut note = NoteSpec {
            start: 2.0,
            end: 2.5,
            channel: 0,
            pitch: 64,
            velocity: 90,
            selected: false,
            muted: false,
        };
        host.add_note(&take, &note).unwrap();
        note.start = 1.0;
        note.pitch = 60;
        host.add_note(&take, &note).unwrap();

        host.sort_events(&take).unwrap();
        assert_eq!(host.note_info(&take, 0).unwrap().pitch, 60);
        assert_eq!(host.note_info(&take, 1).unwrap().pitch, 64);
    }

    #[test]
    fn test_envelope_value_interpolates() {
        let (mut host, track) = host_with_track();
        let envelope = host.envelope_by_name(&track, "Volume").unwrap();
        host.add_envelope_point(&envelope, 0.0, 0.0).unwrap();
        host.add_envelope_point(&envelope, 2.0, 1.0).unwrap();

        assert_eq!(host.envelope_value_at(&envelope, -1.0).unwrap(), 0.0);
        assert_eq!(host.envelope_value_at(&envelope, 1.0).unwrap(), 0.5);
        assert_eq!(host.envelope_value_at(&envelope, 5.0).unwrap(), 1.0);
    }

    #[test]
    fn test_envelope_square_shape_holds_value() {
        let (mut host, track) = host_with_track();
        let envelope = host.envelope_by_name(&track, "Volume").unwrap();
        host.add_envelope_point(&envelope, 0.0, 0.2).unwrap();
        host.add_envelope_point(&envelope, 2.0, 0.8).unwrap();
        host.set_envelope_point(
            &envelope,
            0,
            &PointUpdate {
                shape: Some(PointShape::Square),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(host.envelope_value_at(&envelope, 1.9).unwrap(), 0.2);
        assert_eq!(host.envelope_value_at(&envelope, 2.1).unwrap(), 0.8);
    }

    #[test]
    fn test_accessor_lifecycle_and_double_release() {
        let (mut host, track) = host_with_track();
        let item = host.add_item(&track, 0.0, 1.0).unwrap();
        let handle = host.create_audio_accessor(&item).unwrap();
        assert_eq!(host.live_accessor_count(), 1);

        let samples = host.read_accessor(handle, 0.0, 8).unwrap();
        assert_eq!(samples.len(), 8);

        host.release_accessor(handle).unwrap();
        assert_eq!(host.release_count(), 1);
        assert_eq!(host.live_accessor_count(), 0);
        assert!(matches!(
            host.release_accessor(handle),
            Err(HostError::NoSuchEntity { .. })
        ));
    }

    #[test]
    fn test_read_past_accessor_end_is_silence() {
        let (mut host, track) = host_with_track();
        let item = host.add_item(&track, 0.0, 1.0 / SAMPLE_RATE).unwrap();
        let handle = host.create_audio_accessor(&item).unwrap();
        let samples = host.read_accessor(handle, 0.0, 4).unwrap();
        // One frame of audio, then silence.
        assert_eq!(&samples[1..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fx_params_bounds_checked() {
        let (mut host, track) = host_with_track();
        let fx = host.add_fx(&track, "ReaComp").unwrap();
        assert_eq!(host.count_fx_params(&fx).unwrap(), 2);
        assert!(host.set_fx_param_value(&fx, 0, 0.4).is_ok());
        assert!(matches!(
            host.set_fx_param_value(&fx, 9, 0.4),
            Err(HostError::NoSuchEntity { .. })
        ));
    }
}
