//! The host operation surface.
//!
//! `HostApi` is the closed, statically enumerated set of operations the
//! bridge can invoke against the host's live object graph — one typed
//! method per operation, no open-ended forwarding. It is also the alternate
//! binding surface: code already running inside the host may call it
//! directly and gets results indistinguishable from the bridged path.

mod memory;

pub use memory::{MemoryHost, MAIN_WINDOW};

use crate::locator::EntityKind;
use crate::protocol::{
    CcSpec, CcUpdate, MarkerInfo, MarkerUpdate, NoteSpec, NoteUpdate, PointInfo, PointUpdate,
    RegionInfo, RegionUpdate, TextSysexSpec, TextSysexUpdate,
};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// Host-level failure. `NoSuchEntity` marks a stale locator and is never
/// papered over with a default value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("no live host entity for {kind}:{id}")]
    NoSuchEntity { kind: EntityKind, id: String },

    #[error("{0}")]
    Failed(String),
}

impl HostError {
    pub fn no_such(kind: EntityKind, id: impl Into<String>) -> Self {
        HostError::NoSuchEntity {
            kind,
            id: id.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        HostError::Failed(message.into())
    }
}

pub type HostResult<T> = Result<T, HostError>;

/// Shared handle to a host graph. The mutex is the sole point of mutual
/// exclusion for concurrent bridged requests.
pub type SharedHost = Arc<Mutex<dyn HostApi>>;

/// Wrap a host implementation for use by sessions and the call server.
pub fn shared(host: impl HostApi + 'static) -> SharedHost {
    Arc::new(Mutex::new(host))
}

/// Operations on the host's live object graph.
///
/// Identifier arguments are the id fields of the corresponding locators;
/// ordinal children are addressed by parent id plus index. Implementations
/// report unknown ids and out-of-range indices as `NoSuchEntity`.
pub trait HostApi: Send {
    // =========================================================================
    // Host
    // =========================================================================

    fn current_project(&self) -> HostResult<String>;
    fn host_version(&self) -> HostResult<String>;
    fn main_window(&self) -> HostResult<u64>;

    // =========================================================================
    // Project
    // =========================================================================

    fn project_name(&self, project: &str) -> HostResult<String>;
    fn count_tracks(&self, project: &str) -> HostResult<u32>;
    /// Track id at `index`.
    fn track_at(&self, project: &str, index: u32) -> HostResult<String>;
    /// Insert a track at `index`; returns its id.
    fn add_track(&mut self, project: &str, index: u32, name: &str) -> HostResult<String>;
    fn count_markers(&self, project: &str) -> HostResult<u32>;
    /// Returns the new marker's index.
    fn add_marker(&mut self, project: &str, position: f64, name: &str) -> HostResult<u32>;
    fn count_regions(&self, project: &str) -> HostResult<u32>;
    fn add_region(&mut self, project: &str, start: f64, end: f64, name: &str) -> HostResult<u32>;
    fn cursor_position(&self, project: &str) -> HostResult<f64>;
    fn set_cursor_position(&mut self, project: &str, position: f64) -> HostResult<()>;
    fn play(&mut self, project: &str) -> HostResult<()>;
    fn stop(&mut self, project: &str) -> HostResult<()>;
    fn is_playing(&self, project: &str) -> HostResult<bool>;
    fn undo(&mut self, project: &str) -> HostResult<()>;
    fn redo(&mut self, project: &str) -> HostResult<()>;
    fn ext_state(&self, project: &str, section: &str, key: &str) -> HostResult<String>;
    fn set_ext_state(
        &mut self,
        project: &str,
        section: &str,
        key: &str,
        value: &str,
    ) -> HostResult<()>;

    // =========================================================================
    // Track
    // =========================================================================

    fn track_name(&self, track: &str) -> HostResult<String>;
    fn set_track_name(&mut self, track: &str, name: &str) -> HostResult<()>;
    fn track_volume(&self, track: &str) -> HostResult<f64>;
    fn set_track_volume(&mut self, track: &str, volume: f64) -> HostResult<()>;
    fn track_pan(&self, track: &str) -> HostResult<f64>;
    fn set_track_pan(&mut self, track: &str, pan: f64) -> HostResult<()>;
    fn track_color(&self, track: &str) -> HostResult<(u8, u8, u8)>;
    fn set_track_color(&mut self, track: &str, color: (u8, u8, u8)) -> HostResult<()>;
    fn track_selected(&self, track: &str) -> HostResult<bool>;
    fn set_track_selected(&mut self, track: &str, selected: bool) -> HostResult<()>;
    fn delete_track(&mut self, track: &str) -> HostResult<()>;
    fn count_items(&self, track: &str) -> HostResult<u32>;
    fn item_at(&self, track: &str, index: u32) -> HostResult<String>;
    fn add_item(&mut self, track: &str, position: f64, length: f64) -> HostResult<String>;
    fn count_envelopes(&self, track: &str) -> HostResult<u32>;
    fn envelope_at(&self, track: &str, index: u32) -> HostResult<String>;
    fn envelope_by_name(&self, track: &str, name: &str) -> HostResult<String>;
    fn count_fx(&self, track: &str) -> HostResult<u32>;
    fn fx_at(&self, track: &str, index: u32) -> HostResult<String>;
    fn add_fx(&mut self, track: &str, name: &str) -> HostResult<String>;
    fn track_project(&self, track: &str) -> HostResult<String>;

    // =========================================================================
    // Item
    // =========================================================================

    fn item_position(&self, item: &str) -> HostResult<f64>;
    fn set_item_position(&mut self, item: &str, position: f64) -> HostResult<()>;
    fn item_length(&self, item: &str) -> HostResult<f64>;
    fn set_item_length(&mut self, item: &str, length: f64) -> HostResult<()>;
    fn active_take(&self, item: &str) -> HostResult<String>;
    fn count_takes(&self, item: &str) -> HostResult<u32>;
    fn take_at(&self, item: &str, index: u32) -> HostResult<String>;
    fn add_take(&mut self, item: &str) -> HostResult<String>;
    fn delete_item(&mut self, item: &str) -> HostResult<()>;
    fn item_track(&self, item: &str) -> HostResult<String>;
    /// Open a streaming accessor over the item's audio; returns the host
    /// handle. The handle lives until `release_accessor`.
    fn create_audio_accessor(&mut self, item: &str) -> HostResult<u64>;

    // =========================================================================
    // Take & MIDI events
    // =========================================================================

    fn take_name(&self, take: &str) -> HostResult<String>;
    fn set_take_name(&mut self, take: &str, name: &str) -> HostResult<()>;
    fn take_item(&self, take: &str) -> HostResult<String>;
    fn count_notes(&self, take: &str) -> HostResult<u32>;
    fn count_cc(&self, take: &str) -> HostResult<u32>;
    fn count_text_sysex(&self, take: &str) -> HostResult<u32>;
    /// Returns the new event's index.
    fn add_note(&mut self, take: &str, spec: &NoteSpec) -> HostResult<u32>;
    fn add_cc(&mut self, take: &str, spec: &CcSpec) -> HostResult<u32>;
    fn add_text_sysex(&mut self, take: &str, spec: &TextSysexSpec) -> HostResult<u32>;
    fn sort_events(&mut self, take: &str) -> HostResult<()>;
    fn note_info(&self, take: &str, index: u32) -> HostResult<NoteSpec>;
    fn set_note(&mut self, take: &str, index: u32, update: &NoteUpdate) -> HostResult<()>;
    fn delete_note(&mut self, take: &str, index: u32) -> HostResult<()>;
    fn cc_info(&self, take: &str, index: u32) -> HostResult<CcSpec>;
    fn set_cc(&mut self, take: &str, index: u32, update: &CcUpdate) -> HostResult<()>;
    fn delete_cc(&mut self, take: &str, index: u32) -> HostResult<()>;
    fn text_sysex_info(&self, take: &str, index: u32) -> HostResult<TextSysexSpec>;
    fn set_text_sysex(
        &mut self,
        take: &str,
        index: u32,
        update: &TextSysexUpdate,
    ) -> HostResult<()>;
    fn delete_text_sysex(&mut self, take: &str, index: u32) -> HostResult<()>;

    // =========================================================================
    // FX
    // =========================================================================

    fn fx_name(&self, fx: &str) -> HostResult<String>;
    fn fx_enabled(&self, fx: &str) -> HostResult<bool>;
    fn set_fx_enabled(&mut self, fx: &str, enabled: bool) -> HostResult<()>;
    fn fx_preset(&self, fx: &str) -> HostResult<String>;
    fn set_fx_preset(&mut self, fx: &str, preset: &str) -> HostResult<()>;
    fn count_fx_params(&self, fx: &str) -> HostResult<u32>;
    fn delete_fx(&mut self, fx: &str) -> HostResult<()>;
    fn fx_param_name(&self, fx: &str, index: u32) -> HostResult<String>;
    fn fx_param_value(&self, fx: &str, index: u32) -> HostResult<f64>;
    fn set_fx_param_value(&mut self, fx: &str, index: u32, value: f64) -> HostResult<()>;

    // =========================================================================
    // Envelope
    // =========================================================================

    fn envelope_name(&self, envelope: &str) -> HostResult<String>;
    fn envelope_track(&self, envelope: &str) -> HostResult<String>;
    fn count_envelope_points(&self, envelope: &str) -> HostResult<u32>;
    fn add_envelope_point(&mut self, envelope: &str, position: f64, value: f64) -> HostResult<u32>;
    /// Envelope value at `time`, interpolated between points.
    fn envelope_value_at(&self, envelope: &str, time: f64) -> HostResult<f64>;
    fn envelope_point(&self, envelope: &str, index: u32) -> HostResult<PointInfo>;
    fn set_envelope_point(
        &mut self,
        envelope: &str,
        index: u32,
        update: &PointUpdate,
    ) -> HostResult<()>;
    fn delete_envelope_point(&mut self, envelope: &str, index: u32) -> HostResult<()>;

    // =========================================================================
    // Markers & regions
    // =========================================================================

    fn marker_info(&self, project: &str, index: u32) -> HostResult<MarkerInfo>;
    fn set_marker(&mut self, project: &str, index: u32, update: &MarkerUpdate) -> HostResult<()>;
    fn delete_marker(&mut self, project: &str, index: u32) -> HostResult<()>;
    fn region_info(&self, project: &str, index: u32) -> HostResult<RegionInfo>;
    fn set_region(&mut self, project: &str, index: u32, update: &RegionUpdate) -> HostResult<()>;
    fn delete_region(&mut self, project: &str, index: u32) -> HostResult<()>;

    // =========================================================================
    // Windows
    // =========================================================================

    fn window_title(&self, handle: u64) -> HostResult<String>;
    fn refresh_window(&mut self, handle: u64) -> HostResult<()>;

    // =========================================================================
    // Audio accessors
    // =========================================================================

    fn accessor_start_time(&self, handle: u64) -> HostResult<f64>;
    fn accessor_end_time(&self, handle: u64) -> HostResult<f64>;
    /// Read `frames` samples starting at `start` seconds.
    fn read_accessor(&self, handle: u64, start: f64, frames: u32) -> HostResult<Vec<f64>>;
    /// Free the host-side handle. Further use of the handle fails with
    /// `NoSuchEntity`.
    fn release_accessor(&mut self, handle: u64) -> HostResult<()>;
}
