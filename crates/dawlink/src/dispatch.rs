//! The fixed method table.
//!
//! `execute` resolves a request's target locator against the live host
//! graph, matches the method name against the closed table, extracts the
//! arguments and invokes the corresponding `HostApi` operation. Both the
//! in-host session path and the call server go through this module, which
//! is what makes the two execution modes observably identical.

use crate::error::BridgeError;
use crate::host::{HostApi, HostError};
use crate::locator::{ChildKind, Locator};
use crate::protocol::{
    ops, CallRequest, CcSpec, CcUpdate, FailureKind, FromValue, HostRequest, HostResponse,
    MarkerUpdate, NoteSpec, NoteUpdate, PointUpdate, RegionUpdate, TextSysexSpec, TextSysexUpdate,
    Value,
};

/// Server-side failure, convertible both to a wire `Failure` response and
/// (on the in-host path) directly to a `BridgeError`.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    Resolution { locator: String },
    Execution { message: String },
    Unsupported { context: String },
}

impl DispatchError {
    pub fn into_failure(self) -> HostResponse {
        let (kind, message) = self.into_parts();
        HostResponse::Failure { kind, message }
    }

    fn into_failure_at(self, index: usize) -> HostResponse {
        let (kind, message) = self.into_parts();
        HostResponse::Failure {
            kind,
            message: format!("batch call {index}: {message}"),
        }
    }

    fn into_parts(self) -> (FailureKind, String) {
        match self {
            DispatchError::Resolution { locator } => (FailureKind::LocatorResolution, locator),
            DispatchError::Execution { message } => (FailureKind::RemoteExecution, message),
            DispatchError::Unsupported { context } => (FailureKind::UnsupportedType, context),
        }
    }
}

impl From<DispatchError> for BridgeError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Resolution { locator } => BridgeError::LocatorResolution { locator },
            DispatchError::Execution { message } => BridgeError::RemoteExecution { message },
            DispatchError::Unsupported { context } => BridgeError::UnsupportedType { context },
        }
    }
}

fn host_err(err: HostError) -> DispatchError {
    match err {
        HostError::NoSuchEntity { kind, id } => DispatchError::Resolution {
            locator: format!("{kind}:{id}"),
        },
        HostError::Failed(message) => DispatchError::Execution { message },
    }
}

fn wrong_target(request: &CallRequest, expected: &str) -> DispatchError {
    DispatchError::Unsupported {
        context: format!(
            "{} expects a {expected} locator, got {}",
            request.method, request.target
        ),
    }
}

fn host_target(request: &CallRequest) -> Result<(), DispatchError> {
    match &request.target {
        Locator::Host => Ok(()),
        _ => Err(wrong_target(request, "host")),
    }
}

fn project_id<'a>(request: &'a CallRequest) -> Result<&'a str, DispatchError> {
    match &request.target {
        Locator::Project { id } => Ok(id),
        _ => Err(wrong_target(request, "project")),
    }
}

fn track_id<'a>(request: &'a CallRequest) -> Result<&'a str, DispatchError> {
    match &request.target {
        Locator::Track { id } => Ok(id),
        _ => Err(wrong_target(request, "track")),
    }
}

fn item_id<'a>(request: &'a CallRequest) -> Result<&'a str, DispatchError> {
    match &request.target {
        Locator::Item { id } => Ok(id),
        _ => Err(wrong_target(request, "item")),
    }
}

fn take_id<'a>(request: &'a CallRequest) -> Result<&'a str, DispatchError> {
    match &request.target {
        Locator::Take { id } => Ok(id),
        _ => Err(wrong_target(request, "take")),
    }
}

fn fx_id<'a>(request: &'a CallRequest) -> Result<&'a str, DispatchError> {
    match &request.target {
        Locator::Fx { id } => Ok(id),
        _ => Err(wrong_target(request, "fx")),
    }
}

fn envelope_id<'a>(request: &'a CallRequest) -> Result<&'a str, DispatchError> {
    match &request.target {
        Locator::Envelope { id } => Ok(id),
        _ => Err(wrong_target(request, "envelope")),
    }
}

fn window_handle(request: &CallRequest) -> Result<u64, DispatchError> {
    match &request.target {
        Locator::Window { handle } => Ok(*handle),
        _ => Err(wrong_target(request, "window")),
    }
}

fn accessor_handle(request: &CallRequest) -> Result<u64, DispatchError> {
    match &request.target {
        Locator::AudioAccessor { handle } => Ok(*handle),
        _ => Err(wrong_target(request, "audio accessor")),
    }
}

fn child_of<'a>(
    request: &'a CallRequest,
    kind: ChildKind,
) -> Result<(&'a Locator, u32), DispatchError> {
    match &request.target {
        Locator::Child {
            parent,
            kind: actual,
            index,
        } if *actual == kind => Ok((parent, *index)),
        _ => Err(wrong_target(request, &kind.to_string())),
    }
}

fn take_child<'a>(
    request: &'a CallRequest,
    kind: ChildKind,
) -> Result<(&'a str, u32), DispatchError> {
    let (parent, index) = child_of(request, kind)?;
    match parent {
        Locator::Take { id } => Ok((id, index)),
        _ => Err(wrong_target(request, "take-parented child")),
    }
}

fn fx_child<'a>(request: &'a CallRequest) -> Result<(&'a str, u32), DispatchError> {
    let (parent, index) = child_of(request, ChildKind::FxParam)?;
    match parent {
        Locator::Fx { id } => Ok((id, index)),
        _ => Err(wrong_target(request, "fx-parented param")),
    }
}

fn envelope_child<'a>(request: &'a CallRequest) -> Result<(&'a str, u32), DispatchError> {
    let (parent, index) = child_of(request, ChildKind::EnvelopePoint)?;
    match parent {
        Locator::Envelope { id } => Ok((id, index)),
        _ => Err(wrong_target(request, "envelope-parented point")),
    }
}

fn project_child<'a>(
    request: &'a CallRequest,
    kind: ChildKind,
) -> Result<(&'a str, u32), DispatchError> {
    let (parent, index) = child_of(request, kind)?;
    match parent {
        Locator::Project { id } => Ok((id, index)),
        _ => Err(wrong_target(request, "project-parented child")),
    }
}

fn expect_args(request: &CallRequest, n: usize) -> Result<(), DispatchError> {
    if request.args.len() == n {
        Ok(())
    } else {
        Err(DispatchError::Unsupported {
            context: format!(
                "{} expects {n} argument(s), got {}",
                request.method,
                request.args.len()
            ),
        })
    }
}

fn arg<T: FromValue>(request: &CallRequest, index: usize) -> Result<T, DispatchError> {
    let value = request
        .args
        .get(index)
        .cloned()
        .ok_or_else(|| DispatchError::Unsupported {
            context: format!("{} is missing argument {index}", request.method),
        })?;
    T::from_value(value).map_err(|e| DispatchError::Unsupported {
        context: format!("{} argument {index}: {e}", request.method),
    })
}

/// Execute one call against the host graph.
pub fn execute(host: &mut dyn HostApi, request: &CallRequest) -> Result<Value, DispatchError> {
    tracing::trace!(method = %request.method, target = %request.target, "execute");
    match request.method.as_str() {
        // =====================================================================
        // Host
        // =====================================================================
        ops::HOST_CURRENT_PROJECT => {
            host_target(request)?;
            expect_args(request, 0)?;
            let id = host.current_project().map_err(host_err)?;
            Ok(Value::Locator(Locator::Project { id }))
        }
        ops::HOST_VERSION => {
            host_target(request)?;
            expect_args(request, 0)?;
            Ok(Value::Str(host.host_version().map_err(host_err)?))
        }
        ops::HOST_MAIN_WINDOW => {
            host_target(request)?;
            expect_args(request, 0)?;
            let handle = host.main_window().map_err(host_err)?;
            Ok(Value::Locator(Locator::Window { handle }))
        }

        // =====================================================================
        // Project
        // =====================================================================
        ops::PROJECT_GET_NAME => {
            let id = project_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Str(host.project_name(id).map_err(host_err)?))
        }
        ops::PROJECT_COUNT_TRACKS => {
            let id = project_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.count_tracks(id).map_err(host_err)?))
        }
        ops::PROJECT_GET_TRACK => {
            let id = project_id(request)?;
            expect_args(request, 1)?;
            let index: u32 = arg(request, 0)?;
            let track = host.track_at(id, index).map_err(host_err)?;
            Ok(Value::Locator(Locator::Track { id: track }))
        }
        ops::PROJECT_ADD_TRACK => {
            let id = project_id(request)?;
            expect_args(request, 2)?;
            let index: u32 = arg(request, 0)?;
            let name: String = arg(request, 1)?;
            let track = host.add_track(id, index, &name).map_err(host_err)?;
            Ok(Value::Locator(Locator::Track { id: track }))
        }
        ops::PROJECT_COUNT_MARKERS => {
            let id = project_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.count_markers(id).map_err(host_err)?))
        }
        ops::PROJECT_ADD_MARKER => {
            let id = project_id(request)?;
            expect_args(request, 2)?;
            let position: f64 = arg(request, 0)?;
            let name: String = arg(request, 1)?;
            let index = host.add_marker(id, position, &name).map_err(host_err)?;
            Ok(Value::Locator(Locator::child(
                request.target.clone(),
                ChildKind::Marker,
                index,
            )))
        }
        ops::PROJECT_COUNT_REGIONS => {
            let id = project_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.count_regions(id).map_err(host_err)?))
        }
        ops::PROJECT_ADD_REGION => {
            let id = project_id(request)?;
            expect_args(request, 3)?;
            let start: f64 = arg(request, 0)?;
            let end: f64 = arg(request, 1)?;
            let name: String = arg(request, 2)?;
            let index = host.add_region(id, start, end, &name).map_err(host_err)?;
            Ok(Value::Locator(Locator::child(
                request.target.clone(),
                ChildKind::Region,
                index,
            )))
        }
        ops::PROJECT_GET_CURSOR => {
            let id = project_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Float(host.cursor_position(id).map_err(host_err)?))
        }
        ops::PROJECT_SET_CURSOR => {
            let id = project_id(request)?;
            expect_args(request, 1)?;
            let position: f64 = arg(request, 0)?;
            host.set_cursor_position(id, position).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::PROJECT_PLAY => {
            let id = project_id(request)?;
            expect_args(request, 0)?;
            host.play(id).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::PROJECT_STOP => {
            let id = project_id(request)?;
            expect_args(request, 0)?;
            host.stop(id).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::PROJECT_IS_PLAYING => {
            let id = project_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Bool(host.is_playing(id).map_err(host_err)?))
        }
        ops::PROJECT_UNDO => {
            let id = project_id(request)?;
            expect_args(request, 0)?;
            host.undo(id).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::PROJECT_REDO => {
            let id = project_id(request)?;
            expect_args(request, 0)?;
            host.redo(id).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::PROJECT_GET_EXT_STATE => {
            let id = project_id(request)?;
            expect_args(request, 2)?;
            let section: String = arg(request, 0)?;
            let key: String = arg(request, 1)?;
            Ok(Value::Str(
                host.ext_state(id, &section, &key).map_err(host_err)?,
            ))
        }
        ops::PROJECT_SET_EXT_STATE => {
            let id = project_id(request)?;
            expect_args(request, 3)?;
            let section: String = arg(request, 0)?;
            let key: String = arg(request, 1)?;
            let value: String = arg(request, 2)?;
            host.set_ext_state(id, &section, &key, &value)
                .map_err(host_err)?;
            Ok(Value::Null)
        }

        // =====================================================================
        // Track
        // =====================================================================
        ops::TRACK_GET_NAME => {
            let id = track_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Str(host.track_name(id).map_err(host_err)?))
        }
        ops::TRACK_SET_NAME => {
            let id = track_id(request)?;
            expect_args(request, 1)?;
            let name: String = arg(request, 0)?;
            host.set_track_name(id, &name).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::TRACK_GET_VOLUME => {
            let id = track_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Float(host.track_volume(id).map_err(host_err)?))
        }
        ops::TRACK_SET_VOLUME => {
            let id = track_id(request)?;
            expect_args(request, 1)?;
            let volume: f64 = arg(request, 0)?;
            host.set_track_volume(id, volume).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::TRACK_GET_PAN => {
            let id = track_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Float(host.track_pan(id).map_err(host_err)?))
        }
        ops::TRACK_SET_PAN => {
            let id = track_id(request)?;
            expect_args(request, 1)?;
            let pan: f64 = arg(request, 0)?;
            host.set_track_pan(id, pan).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::TRACK_GET_COLOR => {
            let id = track_id(request)?;
            expect_args(request, 0)?;
            let (r, g, b) = host.track_color(id).map_err(host_err)?;
            Ok(Value::Seq(vec![
                Value::from(r),
                Value::from(g),
                Value::from(b),
            ]))
        }
        ops::TRACK_SET_COLOR => {
            let id = track_id(request)?;
            expect_args(request, 3)?;
            let r: u8 = arg(request, 0)?;
            let g: u8 = arg(request, 1)?;
            let b: u8 = arg(request, 2)?;
            host.set_track_color(id, (r, g, b)).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::TRACK_IS_SELECTED => {
            let id = track_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Bool(host.track_selected(id).map_err(host_err)?))
        }
        ops::TRACK_SET_SELECTED => {
            let id = track_id(request)?;
            expect_args(request, 1)?;
            let selected: bool = arg(request, 0)?;
            host.set_track_selected(id, selected).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::TRACK_DELETE => {
            let id = track_id(request)?;
            expect_args(request, 0)?;
            host.delete_track(id).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::TRACK_COUNT_ITEMS => {
            let id = track_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.count_items(id).map_err(host_err)?))
        }
        ops::TRACK_GET_ITEM => {
            let id = track_id(request)?;
            expect_args(request, 1)?;
            let index: u32 = arg(request, 0)?;
            let item = host.item_at(id, index).map_err(host_err)?;
            Ok(Value::Locator(Locator::Item { id: item }))
        }
        ops::TRACK_ADD_ITEM => {
            let id = track_id(request)?;
            expect_args(request, 2)?;
            let position: f64 = arg(request, 0)?;
            let length: f64 = arg(request, 1)?;
            let item = host.add_item(id, position, length).map_err(host_err)?;
            Ok(Value::Locator(Locator::Item { id: item }))
        }
        ops::TRACK_COUNT_ENVELOPES => {
            let id = track_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.count_envelopes(id).map_err(host_err)?))
        }
        ops::TRACK_GET_ENVELOPE => {
            let id = track_id(request)?;
            expect_args(request, 1)?;
            let index: u32 = arg(request, 0)?;
            let envelope = host.envelope_at(id, index).map_err(host_err)?;
            Ok(Value::Locator(Locator::Envelope { id: envelope }))
        }
        ops::TRACK_GET_ENVELOPE_BY_NAME => {
            let id = track_id(request)?;
            expect_args(request, 1)?;
            let name: String = arg(request, 0)?;
            let envelope = host.envelope_by_name(id, &name).map_err(host_err)?;
            Ok(Value::Locator(Locator::Envelope { id: envelope }))
        }
        ops::TRACK_COUNT_FX => {
            let id = track_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.count_fx(id).map_err(host_err)?))
        }
        ops::TRACK_GET_FX => {
            let id = track_id(request)?;
            expect_args(request, 1)?;
            let index: u32 = arg(request, 0)?;
            let fx = host.fx_at(id, index).map_err(host_err)?;
            Ok(Value::Locator(Locator::Fx { id: fx }))
        }
        ops::TRACK_ADD_FX => {
            let id = track_id(request)?;
            expect_args(request, 1)?;
            let name: String = arg(request, 0)?;
            let fx = host.add_fx(id, &name).map_err(host_err)?;
            Ok(Value::Locator(Locator::Fx { id: fx }))
        }
        ops::TRACK_GET_PROJECT => {
            let id = track_id(request)?;
            expect_args(request, 0)?;
            let project = host.track_project(id).map_err(host_err)?;
            Ok(Value::Locator(Locator::Project { id: project }))
        }

        // =====================================================================
        // Item
        // =====================================================================
        ops::ITEM_GET_POSITION => {
            let id = item_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Float(host.item_position(id).map_err(host_err)?))
        }
        ops::ITEM_SET_POSITION => {
            let id = item_id(request)?;
            expect_args(request, 1)?;
            let position: f64 = arg(request, 0)?;
            host.set_item_position(id, position).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::ITEM_GET_LENGTH => {
            let id = item_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Float(host.item_length(id).map_err(host_err)?))
        }
        ops::ITEM_SET_LENGTH => {
            let id = item_id(request)?;
            expect_args(request, 1)?;
            let length: f64 = arg(request, 0)?;
            host.set_item_length(id, length).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::ITEM_GET_ACTIVE_TAKE => {
            let id = item_id(request)?;
            expect_args(request, 0)?;
            let take = host.active_take(id).map_err(host_err)?;
            Ok(Value::Locator(Locator::Take { id: take }))
        }
        ops::ITEM_COUNT_TAKES => {
            let id = item_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.count_takes(id).map_err(host_err)?))
        }
        ops::ITEM_GET_TAKE => {
            let id = item_id(request)?;
            expect_args(request, 1)?;
            let index: u32 = arg(request, 0)?;
            let take = host.take_at(id, index).map_err(host_err)?;
            Ok(Value::Locator(Locator::Take { id: take }))
        }
        ops::ITEM_ADD_TAKE => {
            let id = item_id(request)?;
            expect_args(request, 0)?;
            let take = host.add_take(id).map_err(host_err)?;
            Ok(Value::Locator(Locator::Take { id: take }))
        }
        ops::ITEM_DELETE => {
            let id = item_id(request)?;
            expect_args(request, 0)?;
            host.delete_item(id).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::ITEM_GET_TRACK => {
            let id = item_id(request)?;
            expect_args(request, 0)?;
            let track = host.item_track(id).map_err(host_err)?;
            Ok(Value::Locator(Locator::Track { id: track }))
        }
        ops::ITEM_CREATE_AUDIO_ACCESSOR => {
            let id = item_id(request)?;
            expect_args(request, 0)?;
            let handle = host.create_audio_accessor(id).map_err(host_err)?;
            Ok(Value::Locator(Locator::AudioAccessor { handle }))
        }

        // =====================================================================
        // Take & MIDI events
        // =====================================================================
        ops::TAKE_GET_NAME => {
            let id = take_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Str(host.take_name(id).map_err(host_err)?))
        }
        ops::TAKE_SET_NAME => {
            let id = take_id(request)?;
            expect_args(request, 1)?;
            let name: String = arg(request, 0)?;
            host.set_take_name(id, &name).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::TAKE_GET_ITEM => {
            let id = take_id(request)?;
            expect_args(request, 0)?;
            let item = host.take_item(id).map_err(host_err)?;
            Ok(Value::Locator(Locator::Item { id: item }))
        }
        ops::TAKE_COUNT_NOTES => {
            let id = take_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.count_notes(id).map_err(host_err)?))
        }
        ops::TAKE_COUNT_CC => {
            let id = take_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.count_cc(id).map_err(host_err)?))
        }
        ops::TAKE_COUNT_TEXT_SYSEX => {
            let id = take_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.count_text_sysex(id).map_err(host_err)?))
        }
        ops::TAKE_ADD_NOTE => {
            let id = take_id(request)?;
            expect_args(request, 1)?;
            let spec: NoteSpec = arg(request, 0)?;
            let index = host.add_note(id, &spec).map_err(host_err)?;
            Ok(Value::Locator(Locator::child(
                request.target.clone(),
                ChildKind::Note,
                index,
            )))
        }
        ops::TAKE_ADD_CC => {
            let id = take_id(request)?;
            expect_args(request, 1)?;
            let spec: CcSpec = arg(request, 0)?;
            let index = host.add_cc(id, &spec).map_err(host_err)?;
            Ok(Value::Locator(Locator::child(
                request.target.clone(),
                ChildKind::Cc,
                index,
            )))
        }
        ops::TAKE_ADD_TEXT_SYSEX => {
            let id = take_id(request)?;
            expect_args(request, 1)?;
            let spec: TextSysexSpec = arg(request, 0)?;
            let index = host.add_text_sysex(id, &spec).map_err(host_err)?;
            Ok(Value::Locator(Locator::child(
                request.target.clone(),
                ChildKind::TextSysex,
                index,
            )))
        }
        ops::TAKE_SORT_EVENTS => {
            let id = take_id(request)?;
            expect_args(request, 0)?;
            host.sort_events(id).map_err(host_err)?;
            Ok(Value::Null)
        }

        ops::NOTE_GET => {
            let (take, index) = take_child(request, ChildKind::Note)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.note_info(take, index).map_err(host_err)?))
        }
        ops::NOTE_SET => {
            let (take, index) = take_child(request, ChildKind::Note)?;
            expect_args(request, 1)?;
            let update: NoteUpdate = arg(request, 0)?;
            host.set_note(take, index, &update).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::NOTE_DELETE => {
            let (take, index) = take_child(request, ChildKind::Note)?;
            expect_args(request, 0)?;
            host.delete_note(take, index).map_err(host_err)?;
            Ok(Value::Null)
        }

        ops::CC_GET => {
            let (take, index) = take_child(request, ChildKind::Cc)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.cc_info(take, index).map_err(host_err)?))
        }
        ops::CC_SET => {
            let (take, index) = take_child(request, ChildKind::Cc)?;
            expect_args(request, 1)?;
            let update: CcUpdate = arg(request, 0)?;
            host.set_cc(take, index, &update).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::CC_DELETE => {
            let (take, index) = take_child(request, ChildKind::Cc)?;
            expect_args(request, 0)?;
            host.delete_cc(take, index).map_err(host_err)?;
            Ok(Value::Null)
        }

        ops::TEXT_SYSEX_GET => {
            let (take, index) = take_child(request, ChildKind::TextSysex)?;
            expect_args(request, 0)?;
            Ok(Value::from(
                host.text_sysex_info(take, index).map_err(host_err)?,
            ))
        }
        ops::TEXT_SYSEX_SET => {
            let (take, index) = take_child(request, ChildKind::TextSysex)?;
            expect_args(request, 1)?;
            let update: TextSysexUpdate = arg(request, 0)?;
            host.set_text_sysex(take, index, &update).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::TEXT_SYSEX_DELETE => {
            let (take, index) = take_child(request, ChildKind::TextSysex)?;
            expect_args(request, 0)?;
            host.delete_text_sysex(take, index).map_err(host_err)?;
            Ok(Value::Null)
        }

        // =====================================================================
        // FX
        // =====================================================================
        ops::FX_GET_NAME => {
            let id = fx_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Str(host.fx_name(id).map_err(host_err)?))
        }
        ops::FX_IS_ENABLED => {
            let id = fx_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Bool(host.fx_enabled(id).map_err(host_err)?))
        }
        ops::FX_SET_ENABLED => {
            let id = fx_id(request)?;
            expect_args(request, 1)?;
            let enabled: bool = arg(request, 0)?;
            host.set_fx_enabled(id, enabled).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::FX_GET_PRESET => {
            let id = fx_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Str(host.fx_preset(id).map_err(host_err)?))
        }
        ops::FX_SET_PRESET => {
            let id = fx_id(request)?;
            expect_args(request, 1)?;
            let preset: String = arg(request, 0)?;
            host.set_fx_preset(id, &preset).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::FX_COUNT_PARAMS => {
            let id = fx_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(host.count_fx_params(id).map_err(host_err)?))
        }
        ops::FX_DELETE => {
            let id = fx_id(request)?;
            expect_args(request, 0)?;
            host.delete_fx(id).map_err(host_err)?;
            Ok(Value::Null)
        }

        ops::FX_PARAM_GET_NAME => {
            let (fx, index) = fx_child(request)?;
            expect_args(request, 0)?;
            Ok(Value::Str(host.fx_param_name(fx, index).map_err(host_err)?))
        }
        ops::FX_PARAM_GET_VALUE => {
            let (fx, index) = fx_child(request)?;
            expect_args(request, 0)?;
            Ok(Value::Float(
                host.fx_param_value(fx, index).map_err(host_err)?,
            ))
        }
        ops::FX_PARAM_SET_VALUE => {
            let (fx, index) = fx_child(request)?;
            expect_args(request, 1)?;
            let value: f64 = arg(request, 0)?;
            host.set_fx_param_value(fx, index, value).map_err(host_err)?;
            Ok(Value::Null)
        }

        // =====================================================================
        // Envelope
        // =====================================================================
        ops::ENVELOPE_GET_NAME => {
            let id = envelope_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::Str(host.envelope_name(id).map_err(host_err)?))
        }
        ops::ENVELOPE_GET_TRACK => {
            let id = envelope_id(request)?;
            expect_args(request, 0)?;
            let track = host.envelope_track(id).map_err(host_err)?;
            Ok(Value::Locator(Locator::Track { id: track }))
        }
        ops::ENVELOPE_COUNT_POINTS => {
            let id = envelope_id(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(
                host.count_envelope_points(id).map_err(host_err)?,
            ))
        }
        ops::ENVELOPE_ADD_POINT => {
            let id = envelope_id(request)?;
            expect_args(request, 2)?;
            let position: f64 = arg(request, 0)?;
            let value: f64 = arg(request, 1)?;
            let index = host
                .add_envelope_point(id, position, value)
                .map_err(host_err)?;
            Ok(Value::Locator(Locator::child(
                request.target.clone(),
                ChildKind::EnvelopePoint,
                index,
            )))
        }
        ops::ENVELOPE_EVALUATE => {
            let id = envelope_id(request)?;
            expect_args(request, 1)?;
            let time: f64 = arg(request, 0)?;
            Ok(Value::Float(
                host.envelope_value_at(id, time).map_err(host_err)?,
            ))
        }

        ops::ENVELOPE_POINT_GET => {
            let (envelope, index) = envelope_child(request)?;
            expect_args(request, 0)?;
            Ok(Value::from(
                host.envelope_point(envelope, index).map_err(host_err)?,
            ))
        }
        ops::ENVELOPE_POINT_SET => {
            let (envelope, index) = envelope_child(request)?;
            expect_args(request, 1)?;
            let update: PointUpdate = arg(request, 0)?;
            host.set_envelope_point(envelope, index, &update)
                .map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::ENVELOPE_POINT_DELETE => {
            let (envelope, index) = envelope_child(request)?;
            expect_args(request, 0)?;
            host.delete_envelope_point(envelope, index)
                .map_err(host_err)?;
            Ok(Value::Null)
        }

        // =====================================================================
        // Markers & regions
        // =====================================================================
        ops::MARKER_GET => {
            let (project, index) = project_child(request, ChildKind::Marker)?;
            expect_args(request, 0)?;
            Ok(Value::from(
                host.marker_info(project, index).map_err(host_err)?,
            ))
        }
        ops::MARKER_SET => {
            let (project, index) = project_child(request, ChildKind::Marker)?;
            expect_args(request, 1)?;
            let update: MarkerUpdate = arg(request, 0)?;
            host.set_marker(project, index, &update).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::MARKER_DELETE => {
            let (project, index) = project_child(request, ChildKind::Marker)?;
            expect_args(request, 0)?;
            host.delete_marker(project, index).map_err(host_err)?;
            Ok(Value::Null)
        }

        ops::REGION_GET => {
            let (project, index) = project_child(request, ChildKind::Region)?;
            expect_args(request, 0)?;
            Ok(Value::from(
                host.region_info(project, index).map_err(host_err)?,
            ))
        }
        ops::REGION_SET => {
            let (project, index) = project_child(request, ChildKind::Region)?;
            expect_args(request, 1)?;
            let update: RegionUpdate = arg(request, 0)?;
            host.set_region(project, index, &update).map_err(host_err)?;
            Ok(Value::Null)
        }
        ops::REGION_DELETE => {
            let (project, index) = project_child(request, ChildKind::Region)?;
            expect_args(request, 0)?;
            host.delete_region(project, index).map_err(host_err)?;
            Ok(Value::Null)
        }

        // =====================================================================
        // Windows
        // =====================================================================
        ops::WINDOW_GET_TITLE => {
            let handle = window_handle(request)?;
            expect_args(request, 0)?;
            Ok(Value::Str(host.window_title(handle).map_err(host_err)?))
        }
        ops::WINDOW_REFRESH => {
            let handle = window_handle(request)?;
            expect_args(request, 0)?;
            host.refresh_window(handle).map_err(host_err)?;
            Ok(Value::Null)
        }

        // =====================================================================
        // Audio accessors
        // =====================================================================
        ops::ACCESSOR_START_TIME => {
            let handle = accessor_handle(request)?;
            expect_args(request, 0)?;
            Ok(Value::Float(
                host.accessor_start_time(handle).map_err(host_err)?,
            ))
        }
        ops::ACCESSOR_END_TIME => {
            let handle = accessor_handle(request)?;
            expect_args(request, 0)?;
            Ok(Value::Float(
                host.accessor_end_time(handle).map_err(host_err)?,
            ))
        }
        ops::ACCESSOR_READ => {
            let handle = accessor_handle(request)?;
            expect_args(request, 2)?;
            let start: f64 = arg(request, 0)?;
            let frames: u32 = arg(request, 1)?;
            let samples = host
                .read_accessor(handle, start, frames)
                .map_err(host_err)?;
            Ok(Value::from(samples))
        }
        ops::ACCESSOR_RELEASE => {
            let handle = accessor_handle(request)?;
            expect_args(request, 0)?;
            host.release_accessor(handle).map_err(host_err)?;
            Ok(Value::Null)
        }

        other => Err(DispatchError::Unsupported {
            context: format!("unknown method {other}"),
        }),
    }
}

/// Execute a wire request, including batch sequencing.
///
/// Batch calls run in order and stop at the first failure; calls applied
/// before the failure stay applied.
pub fn execute_request(host: &mut dyn HostApi, request: &HostRequest) -> HostResponse {
    match request {
        HostRequest::Call(call) => match execute(host, call) {
            Ok(value) => HostResponse::Success(value),
            Err(err) => err.into_failure(),
        },
        HostRequest::Batch(calls) => {
            let mut results = Vec::with_capacity(calls.len());
            for (index, call) in calls.iter().enumerate() {
                match execute(host, call) {
                    Ok(value) => results.push(value),
                    Err(err) => return err.into_failure_at(index),
                }
            }
            HostResponse::BatchSuccess(results)
        }
    }
}
