//! Remote control bridge for a DAW host's object graph.
//!
//! Every host entity (project, track, item, take, FX, envelope, MIDI
//! event, window) is represented by a proxy wrapping a serializable
//! locator. Operations on a proxy route through its session: directly
//! against the host API when running inside the host, or across an IPC
//! channel to the in-host call server (`dawlink-server`) when running
//! externally — with identical observable semantics in both modes.
//!
//! ## Usage
//!
//! ```ignore
//! use dawlink::{BridgeConfig, Session};
//!
//! // External process: connect to the in-host call server.
//! let session = Session::connect(BridgeConfig::default())?;
//!
//! let project = session.current_project()?;
//! let track = project.add_track(0, "Drums")?;
//! track.set_volume(0.8)?;
//!
//! // Same calls, same results, when running inside the host:
//! // let session = Session::in_host(host);
//! ```

pub mod error;
pub use error::{BridgeError, Result};

mod locator;
pub use locator::{ChildKind, EntityKind, Locator};

pub mod protocol;
pub use protocol::{
    BridgeConfig, CallRequest, CcSpec, CcUpdate, FailureKind, FromValue, HostRequest,
    HostResponse, MarkerInfo, MarkerUpdate, NoteSpec, NoteUpdate, PointInfo, PointShape,
    PointUpdate, RegionInfo, RegionUpdate, TextSysexSpec, TextSysexUpdate, Value,
};

pub mod transport;

pub mod host;
pub use host::{shared, HostApi, HostError, HostResult, MemoryHost, SharedHost};

pub mod dispatch;

mod session;
pub use session::{Session, SessionMode};

mod remote;

mod entity;
pub use entity::HostEntity;

mod list;
pub use list::{HostList, ListElement, ListIter};

mod project;
pub use project::Project;

mod track;
pub use track::{Track, TrackList};

mod item;
pub use item::{Item, ItemList};

mod take;
pub use take::{Take, TakeList};

mod midi;
pub use midi::{Cc, CcList, Note, NoteList, TextSysex, TextSysexList};

mod fx;
pub use fx::{Fx, FxList, FxParam, FxParamsList};

mod envelope;
pub use envelope::{Envelope, EnvelopeList, EnvelopePoint, EnvelopePointList};

mod marker;
pub use marker::{Marker, MarkerList, Region, RegionList};

mod window;
pub use window::Window;

mod audio_accessor;
pub use audio_accessor::AudioAccessor;
