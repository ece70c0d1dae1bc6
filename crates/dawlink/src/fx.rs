//! FX and FX parameter proxies.

use crate::entity::{host_entity, HostEntity};
use crate::error::Result;
use crate::list::{ordinal_element, HostList, ListElement};
use crate::locator::{ChildKind, EntityKind, Locator};
use crate::protocol::{ops, CallRequest, FromValue, Value};
use crate::session::Session;

host_entity! {
    /// An FX instance on a track.
    Fx => EntityKind::Fx
}

host_entity! {
    /// One parameter of an FX instance, addressed by index.
    FxParam => EntityKind::FxParam
}

pub type FxList = HostList<Fx>;
pub type FxParamsList = HostList<FxParam>;

impl Fx {
    pub fn name(&self) -> Result<String> {
        self.invoke(ops::FX_GET_NAME, [])
    }

    pub fn is_enabled(&self) -> Result<bool> {
        self.invoke(ops::FX_IS_ENABLED, [])
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.invoke(ops::FX_SET_ENABLED, [Value::from(enabled)])
    }

    pub fn enable(&self) -> Result<()> {
        self.set_enabled(true)
    }

    pub fn disable(&self) -> Result<()> {
        self.set_enabled(false)
    }

    pub fn preset(&self) -> Result<String> {
        self.invoke(ops::FX_GET_PRESET, [])
    }

    pub fn set_preset(&self, preset: &str) -> Result<()> {
        self.invoke(ops::FX_SET_PRESET, [Value::from(preset)])
    }

    pub fn param_count(&self) -> Result<u32> {
        self.invoke(ops::FX_COUNT_PARAMS, [])
    }

    pub fn params(&self) -> FxParamsList {
        HostList::new(self.session().clone(), self.locator().clone())
    }

    pub fn delete(&self) -> Result<()> {
        self.invoke(ops::FX_DELETE, [])
    }
}

impl ListElement for Fx {
    const COUNT_METHOD: &'static str = ops::TRACK_COUNT_FX;

    type Fetched = Fx;

    fn fetch_request(parent: &Locator, index: u32) -> CallRequest {
        CallRequest::new(parent.clone(), ops::TRACK_GET_FX, [Value::from(index)])
    }

    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self> {
        let value = session.call(parent.clone(), ops::TRACK_GET_FX, [Value::from(index)])?;
        session.rehydrate(value)
    }

    fn fetched_from_value(session: &Session, value: Value) -> Result<Self::Fetched> {
        session.rehydrate(value)
    }
}

impl FxParam {
    pub fn name(&self) -> Result<String> {
        self.invoke(ops::FX_PARAM_GET_NAME, [])
    }

    /// Normalized parameter value.
    pub fn value(&self) -> Result<f64> {
        self.invoke(ops::FX_PARAM_GET_VALUE, [])
    }

    pub fn set_value(&self, value: f64) -> Result<()> {
        self.invoke(ops::FX_PARAM_SET_VALUE, [Value::from(value)])
    }
}

impl ListElement for FxParam {
    const COUNT_METHOD: &'static str = ops::FX_COUNT_PARAMS;

    type Fetched = f64;

    fn fetch_request(parent: &Locator, index: u32) -> CallRequest {
        CallRequest::new(
            Locator::child(parent.clone(), ChildKind::FxParam, index),
            ops::FX_PARAM_GET_VALUE,
            [],
        )
    }

    fn element(session: &Session, parent: &Locator, index: u32) -> Result<Self> {
        ordinal_element(session, parent, ChildKind::FxParam, index)
    }

    fn fetched_from_value(_session: &Session, value: Value) -> Result<Self::Fetched> {
        Ok(f64::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::host::{shared, MemoryHost};
    use crate::session::Session;

    fn fx() -> Fx {
        let session = Session::in_host(shared(MemoryHost::new()));
        session
            .current_project()
            .unwrap()
            .add_track(0, "Bus")
            .unwrap()
            .add_fx("ReaComp")
            .unwrap()
    }

    #[test]
    fn test_enable_disable() {
        let fx = fx();
        assert!(fx.is_enabled().unwrap());
        fx.disable().unwrap();
        assert!(!fx.is_enabled().unwrap());
        fx.enable().unwrap();
        assert!(fx.is_enabled().unwrap());
    }

    #[test]
    fn test_preset_roundtrip() {
        let fx = fx();
        fx.set_preset("gentle").unwrap();
        assert_eq!(fx.preset().unwrap(), "gentle");
    }

    #[test]
    fn test_param_access_and_bulk_values() {
        let fx = fx();
        let params = fx.params();
        assert_eq!(params.len().unwrap(), fx.param_count().unwrap());

        let wet = params.get(0).unwrap();
        assert_eq!(wet.name().unwrap(), "Wet");
        wet.set_value(0.25).unwrap();

        let values = params.fetch_all().unwrap();
        assert_eq!(values, vec![0.25, 0.0]);
    }

    #[test]
    fn test_deleted_fx_params_raise() {
        let fx = fx();
        let wet = fx.params().get(0).unwrap();
        fx.delete().unwrap();

        assert!(matches!(
            wet.value().unwrap_err(),
            BridgeError::LocatorResolution { .. }
        ));
    }
}
