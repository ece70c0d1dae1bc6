//! Wire protocol for the distant call bridge.
//!
//! A request is a (locator, method, arguments) triple; a response is a
//! tagged success/failure union. Primitive values pass through unchanged,
//! entities travel as locators and are rehydrated into proxies on the
//! receiving side. Anything else is rejected before a request is sent.

use crate::locator::Locator;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::path::PathBuf;

/// Stack-first argument vector (typical calls carry zero to three values).
pub type ArgVec = SmallVec<[Value; 4]>;

fn default_call_timeout() -> u64 {
    5000
}

// =============================================================================
// Values
// =============================================================================

/// The closed set of transmissible argument and result types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Seq(Vec<Value>),
    Map(Vec<(String, Value)>),
    Locator(Locator),
}

impl Value {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(data.into())
    }

    /// Look up a key in a `Map` value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Seq(_) => "seq",
            Value::Map(_) => "map",
            Value::Locator(_) => "locator",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Locator> for Value {
    fn from(v: Locator) -> Self {
        Value::Locator(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Seq(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Seq(v.into_iter().map(Value::Float).collect())
    }
}

/// Extraction failure. Folded into `BridgeError::UnsupportedType` at the
/// bridge boundary.
#[derive(Debug, Clone)]
pub struct TypeError(pub String);

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TypeError> for crate::error::BridgeError {
    fn from(err: TypeError) -> Self {
        crate::error::BridgeError::UnsupportedType { context: err.0 }
    }
}

fn mismatch(expected: &str, got: &Value) -> TypeError {
    TypeError(format!("expected {expected}, got {}", got.type_name()))
}

/// Typed extraction from a wire value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, TypeError>;
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Null => Ok(()),
            other => Err(mismatch("null", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Int(v) => Ok(v),
            other => Err(mismatch("int", &other)),
        }
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        let raw = i64::from_value(value)?;
        u32::try_from(raw).map_err(|_| TypeError(format!("int {raw} out of range for u32")))
    }
}

impl FromValue for u8 {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        let raw = i64::from_value(value)?;
        u8::try_from(raw).map_err(|_| TypeError(format!("int {raw} out of range for u8")))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Str(v) => Ok(v),
            other => Err(mismatch("str", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Bytes(v) => Ok(v),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl FromValue for Locator {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Locator(v) => Ok(v),
            other => Err(mismatch("locator", &other)),
        }
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Seq(items) => Ok(items),
            other => Err(mismatch("seq", &other)),
        }
    }
}

impl FromValue for Vec<f64> {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        let items: Vec<Value> = Vec::from_value(value)?;
        items.into_iter().map(f64::from_value).collect()
    }
}

impl FromValue for (u8, u8, u8) {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        let parts: Vec<Value> = Vec::from_value(value)?;
        match <[Value; 3]>::try_from(parts) {
            Ok([r, g, b]) => Ok((
                u8::from_value(r)?,
                u8::from_value(g)?,
                u8::from_value(b)?,
            )),
            Err(parts) => Err(TypeError(format!(
                "expected 3-element color seq, got {} element(s)",
                parts.len()
            ))),
        }
    }
}

fn required<T: FromValue>(map: &Value, key: &str) -> Result<T, TypeError> {
    let value = map
        .get(key)
        .cloned()
        .ok_or_else(|| TypeError(format!("missing field `{key}`")))?;
    T::from_value(value).map_err(|e| TypeError(format!("field `{key}`: {e}")))
}

fn optional<T: FromValue>(map: &Value, key: &str) -> Result<Option<T>, TypeError> {
    match map.get(key) {
        None => Ok(None),
        Some(value) => T::from_value(value.clone())
            .map(Some)
            .map_err(|e| TypeError(format!("field `{key}`: {e}"))),
    }
}

fn push_entry(entries: &mut Vec<(String, Value)>, key: &str, value: impl Into<Value>) {
    entries.push((key.to_string(), value.into()));
}

fn push_optional(entries: &mut Vec<(String, Value)>, key: &str, value: Option<impl Into<Value>>) {
    if let Some(value) = value {
        push_entry(entries, key, value);
    }
}

// =============================================================================
// Domain records carried as map values
// =============================================================================

/// A MIDI note: creation spec and single-dispatch read result.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSpec {
    pub start: f64,
    pub end: f64,
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
    pub selected: bool,
    pub muted: bool,
}

impl From<NoteSpec> for Value {
    fn from(spec: NoteSpec) -> Self {
        let mut entries = Vec::with_capacity(7);
        push_entry(&mut entries, "start", spec.start);
        push_entry(&mut entries, "end", spec.end);
        push_entry(&mut entries, "channel", spec.channel);
        push_entry(&mut entries, "pitch", spec.pitch);
        push_entry(&mut entries, "velocity", spec.velocity);
        push_entry(&mut entries, "selected", spec.selected);
        push_entry(&mut entries, "muted", spec.muted);
        Value::Map(entries)
    }
}

impl FromValue for NoteSpec {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(NoteSpec {
            start: required(&value, "start")?,
            end: required(&value, "end")?,
            channel: required(&value, "channel")?,
            pitch: required(&value, "pitch")?,
            velocity: required(&value, "velocity")?,
            selected: required(&value, "selected")?,
            muted: required(&value, "muted")?,
        })
    }
}

/// Partial note update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteUpdate {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub channel: Option<u8>,
    pub pitch: Option<u8>,
    pub velocity: Option<u8>,
    pub selected: Option<bool>,
    pub muted: Option<bool>,
}

impl From<NoteUpdate> for Value {
    fn from(update: NoteUpdate) -> Self {
        let mut entries = Vec::new();
        push_optional(&mut entries, "start", update.start);
        push_optional(&mut entries, "end", update.end);
        push_optional(&mut entries, "channel", update.channel);
        push_optional(&mut entries, "pitch", update.pitch);
        push_optional(&mut entries, "velocity", update.velocity);
        push_optional(&mut entries, "selected", update.selected);
        push_optional(&mut entries, "muted", update.muted);
        Value::Map(entries)
    }
}

impl FromValue for NoteUpdate {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(NoteUpdate {
            start: optional(&value, "start")?,
            end: optional(&value, "end")?,
            channel: optional(&value, "channel")?,
            pitch: optional(&value, "pitch")?,
            velocity: optional(&value, "velocity")?,
            selected: optional(&value, "selected")?,
            muted: optional(&value, "muted")?,
        })
    }
}

/// A MIDI control change event.
#[derive(Debug, Clone, PartialEq)]
pub struct CcSpec {
    pub position: f64,
    pub channel: u8,
    pub controller: u8,
    pub value: u8,
    pub selected: bool,
    pub muted: bool,
}

impl From<CcSpec> for Value {
    fn from(spec: CcSpec) -> Self {
        let mut entries = Vec::with_capacity(6);
        push_entry(&mut entries, "position", spec.position);
        push_entry(&mut entries, "channel", spec.channel);
        push_entry(&mut entries, "controller", spec.controller);
        push_entry(&mut entries, "value", spec.value);
        push_entry(&mut entries, "selected", spec.selected);
        push_entry(&mut entries, "muted", spec.muted);
        Value::Map(entries)
    }
}

impl FromValue for CcSpec {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(CcSpec {
            position: required(&value, "position")?,
            channel: required(&value, "channel")?,
            controller: required(&value, "controller")?,
            value: required(&value, "value")?,
            selected: required(&value, "selected")?,
            muted: required(&value, "muted")?,
        })
    }
}

/// Partial control change update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CcUpdate {
    pub position: Option<f64>,
    pub channel: Option<u8>,
    pub controller: Option<u8>,
    pub value: Option<u8>,
    pub selected: Option<bool>,
    pub muted: Option<bool>,
}

impl From<CcUpdate> for Value {
    fn from(update: CcUpdate) -> Self {
        let mut entries = Vec::new();
        push_optional(&mut entries, "position", update.position);
        push_optional(&mut entries, "channel", update.channel);
        push_optional(&mut entries, "controller", update.controller);
        push_optional(&mut entries, "value", update.value);
        push_optional(&mut entries, "selected", update.selected);
        push_optional(&mut entries, "muted", update.muted);
        Value::Map(entries)
    }
}

impl FromValue for CcUpdate {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(CcUpdate {
            position: optional(&value, "position")?,
            channel: optional(&value, "channel")?,
            controller: optional(&value, "controller")?,
            value: optional(&value, "value")?,
            selected: optional(&value, "selected")?,
            muted: optional(&value, "muted")?,
        })
    }
}

/// Text or sysex meta event. `kind` follows host conventions: -1 sysex,
/// 1..=14 MIDI text event types, 15 notation.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSysexSpec {
    pub position: f64,
    pub kind: i64,
    pub message: Vec<u8>,
    pub selected: bool,
    pub muted: bool,
}

impl From<TextSysexSpec> for Value {
    fn from(spec: TextSysexSpec) -> Self {
        let mut entries = Vec::with_capacity(5);
        push_entry(&mut entries, "position", spec.position);
        push_entry(&mut entries, "kind", spec.kind);
        entries.push(("message".to_string(), Value::Bytes(spec.message)));
        push_entry(&mut entries, "selected", spec.selected);
        push_entry(&mut entries, "muted", spec.muted);
        Value::Map(entries)
    }
}

impl FromValue for TextSysexSpec {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(TextSysexSpec {
            position: required(&value, "position")?,
            kind: required(&value, "kind")?,
            message: required(&value, "message")?,
            selected: required(&value, "selected")?,
            muted: required(&value, "muted")?,
        })
    }
}

/// Partial text/sysex update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextSysexUpdate {
    pub position: Option<f64>,
    pub kind: Option<i64>,
    pub message: Option<Vec<u8>>,
    pub selected: Option<bool>,
    pub muted: Option<bool>,
}

impl From<TextSysexUpdate> for Value {
    fn from(update: TextSysexUpdate) -> Self {
        let mut entries = Vec::new();
        push_optional(&mut entries, "position", update.position);
        push_optional(&mut entries, "kind", update.kind);
        if let Some(message) = update.message {
            entries.push(("message".to_string(), Value::Bytes(message)));
        }
        push_optional(&mut entries, "selected", update.selected);
        push_optional(&mut entries, "muted", update.muted);
        Value::Map(entries)
    }
}

impl FromValue for TextSysexUpdate {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(TextSysexUpdate {
            position: optional(&value, "position")?,
            kind: optional(&value, "kind")?,
            message: optional(&value, "message")?,
            selected: optional(&value, "selected")?,
            muted: optional(&value, "muted")?,
        })
    }
}

/// Envelope point transition shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointShape {
    Linear,
    Square,
    SlowStartEnd,
    FastStart,
    FastEnd,
    Bezier,
}

impl PointShape {
    pub fn as_i64(self) -> i64 {
        match self {
            PointShape::Linear => 0,
            PointShape::Square => 1,
            PointShape::SlowStartEnd => 2,
            PointShape::FastStart => 3,
            PointShape::FastEnd => 4,
            PointShape::Bezier => 5,
        }
    }

    pub fn from_i64(raw: i64) -> Result<Self, TypeError> {
        match raw {
            0 => Ok(PointShape::Linear),
            1 => Ok(PointShape::Square),
            2 => Ok(PointShape::SlowStartEnd),
            3 => Ok(PointShape::FastStart),
            4 => Ok(PointShape::FastEnd),
            5 => Ok(PointShape::Bezier),
            other => Err(TypeError(format!("unknown point shape {other}"))),
        }
    }
}

impl From<PointShape> for Value {
    fn from(shape: PointShape) -> Self {
        Value::Int(shape.as_i64())
    }
}

impl FromValue for PointShape {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        PointShape::from_i64(i64::from_value(value)?)
    }
}

/// An envelope point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointInfo {
    pub position: f64,
    pub value: f64,
    pub shape: PointShape,
}

impl From<PointInfo> for Value {
    fn from(info: PointInfo) -> Self {
        let mut entries = Vec::with_capacity(3);
        push_entry(&mut entries, "position", info.position);
        push_entry(&mut entries, "value", info.value);
        push_entry(&mut entries, "shape", info.shape);
        Value::Map(entries)
    }
}

impl FromValue for PointInfo {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(PointInfo {
            position: required(&value, "position")?,
            value: required(&value, "value")?,
            shape: required(&value, "shape")?,
        })
    }
}

/// Partial envelope point update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointUpdate {
    pub position: Option<f64>,
    pub value: Option<f64>,
    pub shape: Option<PointShape>,
}

impl From<PointUpdate> for Value {
    fn from(update: PointUpdate) -> Self {
        let mut entries = Vec::new();
        push_optional(&mut entries, "position", update.position);
        push_optional(&mut entries, "value", update.value);
        push_optional(&mut entries, "shape", update.shape);
        Value::Map(entries)
    }
}

impl FromValue for PointUpdate {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(PointUpdate {
            position: optional(&value, "position")?,
            value: optional(&value, "value")?,
            shape: optional(&value, "shape")?,
        })
    }
}

/// A project marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerInfo {
    pub position: f64,
    pub name: String,
}

impl From<MarkerInfo> for Value {
    fn from(info: MarkerInfo) -> Self {
        let mut entries = Vec::with_capacity(2);
        push_entry(&mut entries, "position", info.position);
        push_entry(&mut entries, "name", info.name);
        Value::Map(entries)
    }
}

impl FromValue for MarkerInfo {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(MarkerInfo {
            position: required(&value, "position")?,
            name: required(&value, "name")?,
        })
    }
}

/// Partial marker update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerUpdate {
    pub position: Option<f64>,
    pub name: Option<String>,
}

impl From<MarkerUpdate> for Value {
    fn from(update: MarkerUpdate) -> Self {
        let mut entries = Vec::new();
        push_optional(&mut entries, "position", update.position);
        push_optional(&mut entries, "name", update.name);
        Value::Map(entries)
    }
}

impl FromValue for MarkerUpdate {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(MarkerUpdate {
            position: optional(&value, "position")?,
            name: optional(&value, "name")?,
        })
    }
}

/// A project region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionInfo {
    pub start: f64,
    pub end: f64,
    pub name: String,
}

impl From<RegionInfo> for Value {
    fn from(info: RegionInfo) -> Self {
        let mut entries = Vec::with_capacity(3);
        push_entry(&mut entries, "start", info.start);
        push_entry(&mut entries, "end", info.end);
        push_entry(&mut entries, "name", info.name);
        Value::Map(entries)
    }
}

impl FromValue for RegionInfo {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(RegionInfo {
            start: required(&value, "start")?,
            end: required(&value, "end")?,
            name: required(&value, "name")?,
        })
    }
}

/// Partial region update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionUpdate {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub name: Option<String>,
}

impl From<RegionUpdate> for Value {
    fn from(update: RegionUpdate) -> Self {
        let mut entries = Vec::new();
        push_optional(&mut entries, "start", update.start);
        push_optional(&mut entries, "end", update.end);
        push_optional(&mut entries, "name", update.name);
        Value::Map(entries)
    }
}

impl FromValue for RegionUpdate {
    fn from_value(value: Value) -> Result<Self, TypeError> {
        Ok(RegionUpdate {
            start: optional(&value, "start")?,
            end: optional(&value, "end")?,
            name: optional(&value, "name")?,
        })
    }
}

// =============================================================================
// Requests and responses
// =============================================================================

/// One operation on one target entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    pub target: Locator,
    pub method: String,
    pub args: ArgVec,
}

impl CallRequest {
    pub fn new(
        target: Locator,
        method: impl Into<String>,
        args: impl IntoIterator<Item = Value>,
    ) -> Self {
        Self {
            target,
            method: method.into(),
            args: args.into_iter().collect(),
        }
    }
}

/// Client to host message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HostRequest {
    Call(CallRequest),
    /// Batch descriptor: executed in order, stops at the first failure.
    /// Writes applied before the failure stay applied.
    Batch(Vec<CallRequest>),
}

/// Failure classification carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    RemoteExecution,
    LocatorResolution,
    UnsupportedType,
}

/// Host to client message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HostResponse {
    Success(Value),
    BatchSuccess(Vec<Value>),
    Failure { kind: FailureKind, message: String },
}

// =============================================================================
// Method names (the closed dispatch table)
// =============================================================================

/// Method names understood by the fixed dispatch table. Every concrete
/// entity operation reduces to one of these; there is no open-ended
/// forwarding.
pub mod ops {
    pub const HOST_CURRENT_PROJECT: &str = "Host.GetCurrentProject";
    pub const HOST_VERSION: &str = "Host.Version";
    pub const HOST_MAIN_WINDOW: &str = "Host.GetMainWindow";

    pub const PROJECT_GET_NAME: &str = "Project.GetName";
    pub const PROJECT_COUNT_TRACKS: &str = "Project.CountTracks";
    pub const PROJECT_GET_TRACK: &str = "Project.GetTrack";
    pub const PROJECT_ADD_TRACK: &str = "Project.AddTrack";
    pub const PROJECT_COUNT_MARKERS: &str = "Project.CountMarkers";
    pub const PROJECT_ADD_MARKER: &str = "Project.AddMarker";
    pub const PROJECT_COUNT_REGIONS: &str = "Project.CountRegions";
    pub const PROJECT_ADD_REGION: &str = "Project.AddRegion";
    pub const PROJECT_GET_CURSOR: &str = "Project.GetCursorPosition";
    pub const PROJECT_SET_CURSOR: &str = "Project.SetCursorPosition";
    pub const PROJECT_PLAY: &str = "Project.Play";
    pub const PROJECT_STOP: &str = "Project.Stop";
    pub const PROJECT_IS_PLAYING: &str = "Project.IsPlaying";
    pub const PROJECT_UNDO: &str = "Project.Undo";
    pub const PROJECT_REDO: &str = "Project.Redo";
    pub const PROJECT_GET_EXT_STATE: &str = "Project.GetExtState";
    pub const PROJECT_SET_EXT_STATE: &str = "Project.SetExtState";

    pub const TRACK_GET_NAME: &str = "Track.GetName";
    pub const TRACK_SET_NAME: &str = "Track.SetName";
    pub const TRACK_GET_VOLUME: &str = "Track.GetVolume";
    pub const TRACK_SET_VOLUME: &str = "Track.SetVolume";
    pub const TRACK_GET_PAN: &str = "Track.GetPan";
    pub const TRACK_SET_PAN: &str = "Track.SetPan";
    pub const TRACK_GET_COLOR: &str = "Track.GetColor";
    pub const TRACK_SET_COLOR: &str = "Track.SetColor";
    pub const TRACK_IS_SELECTED: &str = "Track.IsSelected";
    pub const TRACK_SET_SELECTED: &str = "Track.SetSelected";
    pub const TRACK_DELETE: &str = "Track.Delete";
    pub const TRACK_COUNT_ITEMS: &str = "Track.CountItems";
    pub const TRACK_GET_ITEM: &str = "Track.GetItem";
    pub const TRACK_ADD_ITEM: &str = "Track.AddItem";
    pub const TRACK_COUNT_ENVELOPES: &str = "Track.CountEnvelopes";
    pub const TRACK_GET_ENVELOPE: &str = "Track.GetEnvelope";
    pub const TRACK_GET_ENVELOPE_BY_NAME: &str = "Track.GetEnvelopeByName";
    pub const TRACK_COUNT_FX: &str = "Track.CountFx";
    pub const TRACK_GET_FX: &str = "Track.GetFx";
    pub const TRACK_ADD_FX: &str = "Track.AddFx";
    pub const TRACK_GET_PROJECT: &str = "Track.GetProject";

    pub const ITEM_GET_POSITION: &str = "Item.GetPosition";
    pub const ITEM_SET_POSITION: &str = "Item.SetPosition";
    pub const ITEM_GET_LENGTH: &str = "Item.GetLength";
    pub const ITEM_SET_LENGTH: &str = "Item.SetLength";
    pub const ITEM_GET_ACTIVE_TAKE: &str = "Item.GetActiveTake";
    pub const ITEM_COUNT_TAKES: &str = "Item.CountTakes";
    pub const ITEM_GET_TAKE: &str = "Item.GetTake";
    pub const ITEM_ADD_TAKE: &str = "Item.AddTake";
    pub const ITEM_DELETE: &str = "Item.Delete";
    pub const ITEM_GET_TRACK: &str = "Item.GetTrack";
    pub const ITEM_CREATE_AUDIO_ACCESSOR: &str = "Item.CreateAudioAccessor";

    pub const TAKE_GET_NAME: &str = "Take.GetName";
    pub const TAKE_SET_NAME: &str = "Take.SetName";
    pub const TAKE_COUNT_NOTES: &str = "Take.CountNotes";
    pub const TAKE_COUNT_CC: &str = "Take.CountCc";
    pub const TAKE_COUNT_TEXT_SYSEX: &str = "Take.CountTextSysex";
    pub const TAKE_ADD_NOTE: &str = "Take.AddNote";
    pub const TAKE_ADD_CC: &str = "Take.AddCc";
    pub const TAKE_ADD_TEXT_SYSEX: &str = "Take.AddTextSysex";
    pub const TAKE_SORT_EVENTS: &str = "Take.SortEvents";
    pub const TAKE_GET_ITEM: &str = "Take.GetItem";

    pub const NOTE_GET: &str = "Note.Get";
    pub const NOTE_SET: &str = "Note.Set";
    pub const NOTE_DELETE: &str = "Note.Delete";

    pub const CC_GET: &str = "Cc.Get";
    pub const CC_SET: &str = "Cc.Set";
    pub const CC_DELETE: &str = "Cc.Delete";

    pub const TEXT_SYSEX_GET: &str = "TextSysex.Get";
    pub const TEXT_SYSEX_SET: &str = "TextSysex.Set";
    pub const TEXT_SYSEX_DELETE: &str = "TextSysex.Delete";

    pub const FX_GET_NAME: &str = "Fx.GetName";
    pub const FX_IS_ENABLED: &str = "Fx.IsEnabled";
    pub const FX_SET_ENABLED: &str = "Fx.SetEnabled";
    pub const FX_GET_PRESET: &str = "Fx.GetPreset";
    pub const FX_SET_PRESET: &str = "Fx.SetPreset";
    pub const FX_COUNT_PARAMS: &str = "Fx.CountParams";
    pub const FX_DELETE: &str = "Fx.Delete";

    pub const FX_PARAM_GET_NAME: &str = "FxParam.GetName";
    pub const FX_PARAM_GET_VALUE: &str = "FxParam.GetValue";
    pub const FX_PARAM_SET_VALUE: &str = "FxParam.SetValue";

    pub const ENVELOPE_GET_NAME: &str = "Envelope.GetName";
    pub const ENVELOPE_GET_TRACK: &str = "Envelope.GetTrack";
    pub const ENVELOPE_COUNT_POINTS: &str = "Envelope.CountPoints";
    pub const ENVELOPE_ADD_POINT: &str = "Envelope.AddPoint";
    pub const ENVELOPE_EVALUATE: &str = "Envelope.Evaluate";

    pub const ENVELOPE_POINT_GET: &str = "EnvelopePoint.Get";
    pub const ENVELOPE_POINT_SET: &str = "EnvelopePoint.Set";
    pub const ENVELOPE_POINT_DELETE: &str = "EnvelopePoint.Delete";

    pub const MARKER_GET: &str = "Marker.Get";
    pub const MARKER_SET: &str = "Marker.Set";
    pub const MARKER_DELETE: &str = "Marker.Delete";

    pub const REGION_GET: &str = "Region.Get";
    pub const REGION_SET: &str = "Region.Set";
    pub const REGION_DELETE: &str = "Region.Delete";

    pub const WINDOW_GET_TITLE: &str = "Window.GetTitle";
    pub const WINDOW_REFRESH: &str = "Window.Refresh";

    pub const ACCESSOR_START_TIME: &str = "AudioAccessor.GetStartTime";
    pub const ACCESSOR_END_TIME: &str = "AudioAccessor.GetEndTime";
    pub const ACCESSOR_READ: &str = "AudioAccessor.ReadSamples";
    pub const ACCESSOR_RELEASE: &str = "AudioAccessor.Release";
}

// =============================================================================
// Configuration
// =============================================================================

/// Transport configuration for external sessions and the call server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub socket_path: PathBuf,
    pub connect_timeout_ms: u64,
    #[serde(default = "default_call_timeout")]
    pub call_timeout_ms: u64,
    /// Retry budget for transient transport failures. Host-reported
    /// failures are never retried.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            socket_path: std::env::temp_dir().join("dawlink.sock"),
            connect_timeout_ms: 2000,
            call_timeout_ms: 5000,
            max_retries: 3,
            retry_backoff_ms: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::ChildKind;
    use smallvec::smallvec;

    #[test]
    fn test_request_serialization() {
        let request = HostRequest::Call(CallRequest {
            target: Locator::Track {
                id: "track-1".into(),
            },
            method: ops::TRACK_SET_VOLUME.to_string(),
            args: smallvec![Value::Float(0.8)],
        });

        let encoded = bincode::serialize(&request).unwrap();
        let decoded: HostRequest = bincode::deserialize(&encoded).unwrap();

        match decoded {
            HostRequest::Call(call) => {
                assert_eq!(
                    call.target,
                    Locator::Track {
                        id: "track-1".into()
                    }
                );
                assert_eq!(call.method, ops::TRACK_SET_VOLUME);
                assert_eq!(call.args.as_slice(), &[Value::Float(0.8)]);
            }
            _ => panic!("Wrong request variant"),
        }
    }

    #[test]
    fn test_response_serialization_with_nested_locator() {
        let response = HostResponse::Success(Value::Seq(vec![
            Value::Locator(Locator::Track { id: "a".into() }),
            Value::Locator(Locator::Track { id: "b".into() }),
        ]));

        let encoded = bincode::serialize(&response).unwrap();
        let decoded: HostResponse = bincode::deserialize(&encoded).unwrap();

        match decoded {
            HostResponse::Success(Value::Seq(items)) => {
                assert_eq!(items.len(), 2);
                assert_eq!(
                    items[0],
                    Value::Locator(Locator::Track { id: "a".into() })
                );
            }
            _ => panic!("Wrong response variant"),
        }
    }

    #[test]
    fn test_failure_serialization_keeps_kind_and_message() {
        let response = HostResponse::Failure {
            kind: FailureKind::RemoteExecution,
            message: "Can't redo.".to_string(),
        };

        let encoded = bincode::serialize(&response).unwrap();
        let decoded: HostResponse = bincode::deserialize(&encoded).unwrap();

        match decoded {
            HostResponse::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::RemoteExecution);
                assert_eq!(message, "Can't redo.");
            }
            _ => panic!("Wrong response variant"),
        }
    }

    #[test]
    fn test_note_spec_value_roundtrip() {
        let spec = NoteSpec {
            start: 0.5,
            end: 1.0,
            channel: 2,
            pitch: 60,
            velocity: 100,
            selected: true,
            muted: false,
        };
        let value = Value::from(spec.clone());
        let restored = NoteSpec::from_value(value).unwrap();
        assert_eq!(restored, spec);
    }

    #[test]
    fn test_partial_update_omits_absent_fields() {
        let update = NoteUpdate {
            pitch: Some(64),
            ..Default::default()
        };
        let value = Value::from(update);
        assert!(value.get("pitch").is_some());
        assert!(value.get("start").is_none());

        let restored = NoteUpdate::from_value(value).unwrap();
        assert_eq!(restored.pitch, Some(64));
        assert_eq!(restored.start, None);
    }

    #[test]
    fn test_extraction_mismatch_reports_types() {
        let err = f64::from_value(Value::Str("loud".into())).unwrap_err();
        assert!(err.to_string().contains("expected float"));
        assert!(err.to_string().contains("str"));

        let err = u8::from_value(Value::Int(300)).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_float_extraction_accepts_integral_values() {
        assert_eq!(f64::from_value(Value::Int(3)).unwrap(), 3.0);
    }

    #[test]
    fn test_point_shape_rejects_unknown_discriminant() {
        assert!(PointShape::from_i64(6).is_err());
        assert_eq!(PointShape::from_i64(5).unwrap(), PointShape::Bezier);
    }

    #[test]
    fn test_request_json_shape_is_readable() {
        // The wire format is bincode; JSON is only used here to pin the
        // structural shape of a request for humans.
        let request = CallRequest::new(
            Locator::child(
                Locator::Take {
                    id: "take-1".into(),
                },
                ChildKind::Note,
                0,
            ),
            ops::NOTE_GET,
            [],
        );
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("Note.Get"));
        assert!(json.contains("take-1"));
    }

    #[test]
    fn test_bridge_config_default() {
        let config = BridgeConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.call_timeout_ms, 5000);
        assert!(config.socket_path.ends_with("dawlink.sock"));
    }
}
