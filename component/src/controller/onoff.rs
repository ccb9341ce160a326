use crate::api::{ComponentApi, ComponentConfig, RefConfig};
use crate::common::{
    is_numeric_guid, read_as_f64, resolve_point_reference, ComponentState, PointRef,
};
use crate::factory::{ComponentCreateContext, ComponentFactoryEntry};
use foxtail_error::{ComponentError, Error};
use foxtail_point::{
    read_value, write_value, Basic, Bool, LockRequest, PointApi, PointDatabase, PointValue,
    StatefulAlloc, Uint64,
};
use std::sync::Arc;

/// On/off controller with optional hysteresis and minimum on/off times.
///
/// Inputs are keyed by their `var` role: `PV` and `SP` are required and may
/// be any numeric type; `HON`/`HOFF` (hysteresis, same domain as PV),
/// `MON`/`MOFF` (minimum times in microseconds, Uint64), and `RST` (Bool,
/// rising edge resets to the initial state) are optional. Outputs: `O`
/// (required) and `/O` (optional), both Bool.
///
/// Initial state is `PV > SP`. Turning on requires `PV > SP + HON` with at
/// least `MON` elapsed since the last transition; turning off requires
/// `PV < SP - HOFF` with at least `MOFF` elapsed.
///
/// The controller keeps three internal stateful points in the HA arena so
/// its state survives a high-availability handover: the current on state,
/// the transition timer mark, and the previous reset level.
pub struct OnOff {
    state: ComponentState,
    pv: PointRef,
    sp: PointRef,
    hon: Option<PointRef>,
    hoff: Option<PointRef>,
    mon: Option<PointRef>,
    moff: Option<PointRef>,
    rst: Option<PointRef>,
    out: PointRef,
    out_not: Option<PointRef>,
    current_state: Arc<Bool>,
    timer_marker: Arc<Uint64>,
    prev_reset: Arc<Bool>,
}

impl OnOff {
    pub const GUID: &'static str = "fec7f73f-982b-4adb-a6c7-837a457b2822";
    pub const TYPE_NAME: &'static str = "Foxtail::Component::Controller::OnOff";

    /// Internal stateful points kept on the HA arena.
    pub const HA_STATEFUL_NUM_POINTS: usize = 3;
    /// HA arena bytes those points occupy.
    pub const HA_STATEFUL_BYTES: usize =
        2 * Basic::<bool>::STATEFUL_BYTES + Basic::<u64>::STATEFUL_BYTES;

    /// Internal points are not registered in the point database.
    const INTERNAL_ID: u32 = u32::MAX;

    pub fn create(
        config: &ComponentConfig,
        ctx: &ComponentCreateContext,
    ) -> Result<Box<dyn ComponentApi>, Error> {
        let name = config.name.clone().unwrap_or_default();

        let mut pv = None;
        let mut sp = None;
        let mut hon = None;
        let mut hoff = None;
        let mut mon = None;
        let mut moff = None;
        let mut rst = None;
        for reference in &config.inputs {
            let slot = match reference.var.as_deref() {
                Some("PV") => &mut pv,
                Some("SP") => &mut sp,
                Some("HON") => &mut hon,
                Some("HOFF") => &mut hoff,
                Some("MON") => &mut mon,
                Some("MOFF") => &mut moff,
                Some("RST") => &mut rst,
                _ => return Err(ComponentError::BadInputVariable.into()),
            };
            if slot.is_some() {
                return Err(ComponentError::BadInputVariable.into());
            }
            *slot = Some(Self::reference(reference)?);
        }
        let pv = pv.ok_or(ComponentError::BadInputVariable)?;
        let sp = sp.ok_or(ComponentError::BadInputVariable)?;

        let mut out = None;
        let mut out_not = None;
        for reference in &config.outputs {
            let slot = match reference.var.as_deref() {
                Some("O") => &mut out,
                Some("/O") => &mut out_not,
                _ => return Err(ComponentError::BadInputVariable.into()),
            };
            if slot.is_some() {
                return Err(ComponentError::BadInputVariable.into());
            }
            *slot = Some(Self::reference(reference)?);
        }
        let out = out.ok_or(ComponentError::IncorrectNumOutputRefs)?;

        let alloc = StatefulAlloc::Arena(ctx.ha_arena);
        let current_state = Arc::new(Bool::new(
            Self::INTERNAL_ID,
            format!("{name}.state"),
            alloc.slot(Basic::<bool>::STATEFUL_BYTES)
                .map_err(|_| ComponentError::InternalPointCreateError)?,
            None,
        ));
        let timer_marker = Arc::new(Uint64::new(
            Self::INTERNAL_ID,
            format!("{name}.timerMark"),
            alloc.slot(Basic::<u64>::STATEFUL_BYTES)
                .map_err(|_| ComponentError::InternalPointCreateError)?,
            None,
        ));
        let prev_reset = Arc::new(Bool::new(
            Self::INTERNAL_ID,
            format!("{name}.prevReset"),
            alloc.slot(Basic::<bool>::STATEFUL_BYTES)
                .map_err(|_| ComponentError::InternalPointCreateError)?,
            None,
        ));

        Ok(Box::new(OnOff {
            state: ComponentState::new(name),
            pv,
            sp,
            hon,
            hoff,
            mon,
            moff,
            rst,
            out,
            out_not,
            current_state,
            timer_marker,
            prev_reset,
        }))
    }

    pub fn factory_entry() -> ComponentFactoryEntry {
        ComponentFactoryEntry {
            guid: Self::GUID,
            type_name: Self::TYPE_NAME,
            create: Self::create,
        }
    }

    fn reference(config: &RefConfig) -> Result<PointRef, Error> {
        config
            .id_ref
            .map(PointRef::Unresolved)
            .ok_or_else(|| ComponentError::BadInputReference.into())
    }

    fn invalidate_outputs(&self) {
        if let Some(point) = self.out.point() {
            point.set_invalid(LockRequest::NoRequest);
        }
        if let Some(reference) = &self.out_not {
            if let Some(point) = reference.point() {
                point.set_invalid(LockRequest::NoRequest);
            }
        }
    }

    fn resolve_all(&mut self, point_db: &PointDatabase) -> Result<(), Error> {
        resolve_point_reference(&mut self.pv, point_db, ComponentError::UnresolvedInputReference)?;
        resolve_point_reference(&mut self.sp, point_db, ComponentError::UnresolvedInputReference)?;
        for optional in [
            &mut self.hon,
            &mut self.hoff,
            &mut self.mon,
            &mut self.moff,
            &mut self.rst,
        ]
        .into_iter()
        .flatten()
        {
            resolve_point_reference(optional, point_db, ComponentError::UnresolvedInputReference)?;
        }
        resolve_point_reference(
            &mut self.out,
            point_db,
            ComponentError::UnresolvedOutputReference,
        )?;
        if let Some(out_not) = &mut self.out_not {
            resolve_point_reference(
                out_not,
                point_db,
                ComponentError::UnresolvedOutputReference,
            )?;
        }

        // PV, SP, and the hysteresis inputs are numeric; timers are Uint64;
        // RST and the outputs are Bool.
        for numeric in [Some(&self.pv), Some(&self.sp), self.hon.as_ref(), self.hoff.as_ref()]
            .into_iter()
            .flatten()
        {
            let point = numeric.point().ok_or(ComponentError::UnresolvedInputReference)?;
            if !is_numeric_guid(point.type_guid()) {
                return Err(ComponentError::InputReferenceBadType.into());
            }
        }
        for timer in [self.mon.as_ref(), self.moff.as_ref()].into_iter().flatten() {
            let point = timer.point().ok_or(ComponentError::UnresolvedInputReference)?;
            if point.type_guid() != <u64 as PointValue>::GUID {
                return Err(ComponentError::InputReferenceBadType.into());
            }
        }
        if let Some(rst) = &self.rst {
            let point = rst.point().ok_or(ComponentError::UnresolvedInputReference)?;
            if point.type_guid() != <bool as PointValue>::GUID {
                return Err(ComponentError::InputReferenceBadType.into());
            }
        }
        for output in [Some(&self.out), self.out_not.as_ref()].into_iter().flatten() {
            let point = output.point().ok_or(ComponentError::UnresolvedOutputReference)?;
            if point.type_guid() != <bool as PointValue>::GUID {
                return Err(ComponentError::OutputReferenceBadType.into());
            }
        }
        Ok(())
    }

    /// Read an optional numeric input. `Ok(None)` means "configured but
    /// invalid"; an unconfigured input yields the default.
    fn read_optional_f64(reference: &Option<PointRef>, default: f64) -> Result<Option<f64>, Error> {
        match reference {
            None => Ok(Some(default)),
            Some(r) => {
                let point = r.point().ok_or(ComponentError::NotStarted)?;
                read_as_f64(point.as_ref())
            }
        }
    }

    fn read_optional_u64(reference: &Option<PointRef>) -> Result<Option<u64>, Error> {
        match reference {
            None => Ok(Some(0)),
            Some(r) => {
                let point = r.point().ok_or(ComponentError::NotStarted)?;
                read_value::<u64>(point.as_ref())
            }
        }
    }
}

impl std::fmt::Debug for OnOff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnOff").field("name", &self.name()).finish()
    }
}

impl ComponentApi for OnOff {
    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<(), Error> {
        self.resolve_all(point_db)
            .map_err(|e| self.state.latch_error(e))
    }

    fn start(&self, now_usec: u64) -> Result<(), Error> {
        self.state.start()?;
        // Back to the initial state on every start.
        self.reset(now_usec);
        Ok(())
    }

    fn reset(&self, now_usec: u64) {
        self.current_state.set_invalid(LockRequest::NoRequest);
        self.timer_marker.write(now_usec, LockRequest::NoRequest);
        self.prev_reset.write(false, LockRequest::NoRequest);
    }

    fn stop(&self) {
        self.state.stop()
    }

    fn execute(&self, now_usec: u64) -> Result<(), Error> {
        self.state.check_runnable()?;

        let pv_point = self.pv.point().ok_or(ComponentError::NotStarted)?;
        let sp_point = self.sp.point().ok_or(ComponentError::NotStarted)?;

        let inputs = (
            read_as_f64(pv_point.as_ref())?,
            read_as_f64(sp_point.as_ref())?,
            Self::read_optional_f64(&self.hon, 0.0)?,
            Self::read_optional_f64(&self.hoff, 0.0)?,
            Self::read_optional_u64(&self.mon)?,
            Self::read_optional_u64(&self.moff)?,
        );
        let (Some(pv), Some(sp), Some(hon), Some(hoff), Some(mon), Some(moff)) = inputs else {
            self.invalidate_outputs();
            return Ok(());
        };

        if let Some(rst) = &self.rst {
            let point = rst.point().ok_or(ComponentError::NotStarted)?;
            let Some(reset) = read_value::<bool>(point.as_ref())? else {
                self.invalidate_outputs();
                return Ok(());
            };
            let rising = reset && self.prev_reset.read() == Some(false);
            self.prev_reset.write(reset, LockRequest::NoRequest);
            if rising {
                self.current_state.set_invalid(LockRequest::NoRequest);
                self.timer_marker.write(now_usec, LockRequest::NoRequest);
            }
        }

        let on = match self.current_state.read() {
            None => {
                let initial = pv > sp;
                self.timer_marker.write(now_usec, LockRequest::NoRequest);
                initial
            }
            Some(current) => {
                let mark = self.timer_marker.read().unwrap_or(now_usec);
                let delta = now_usec.saturating_sub(mark);
                if !current && pv > sp + hon && delta >= mon {
                    self.timer_marker.write(now_usec, LockRequest::NoRequest);
                    true
                } else if current && pv < sp - hoff && delta >= moff {
                    self.timer_marker.write(now_usec, LockRequest::NoRequest);
                    false
                } else {
                    current
                }
            }
        };
        self.current_state.write(on, LockRequest::NoRequest);

        let out_point = self.out.point().ok_or(ComponentError::NotStarted)?;
        write_value(out_point.as_ref(), on, LockRequest::NoRequest)?;
        if let Some(out_not) = &self.out_not {
            let point = out_not.point().ok_or(ComponentError::NotStarted)?;
            write_value(point.as_ref(), !on, LockRequest::NoRequest)?;
        }
        Ok(())
    }

    fn type_guid(&self) -> &'static str {
        Self::GUID
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn name(&self) -> &str {
        self.state.name()
    }

    fn error_code(&self) -> Option<Error> {
        self.state.error_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::test_support::Fixture;
    use serde_json::json;

    fn controller_config() -> ComponentConfig {
        serde_json::from_value(json!({
            "name": "cooling",
            "type": OnOff::GUID,
            "inputs": [
                { "var": "PV",   "type": "708745fa-cef6-4364-abad-063a40f35cbc", "idRef": 1 },
                { "var": "SP",   "type": "708745fa-cef6-4364-abad-063a40f35cbc", "idRef": 2 },
                { "var": "HON",  "type": "708745fa-cef6-4364-abad-063a40f35cbc", "idRef": 3 },
                { "var": "HOFF", "type": "708745fa-cef6-4364-abad-063a40f35cbc", "idRef": 4 },
                { "var": "MON",  "type": "b3c4d5e6-1f79-4a8b-bc2d-9e0f1a2b3c12", "idRef": 5 },
                { "var": "RST",  "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "idRef": 6 },
            ],
            "outputs": [
                { "var": "O",  "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "idRef": 7 },
                { "var": "/O", "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "idRef": 8 },
            ]
        }))
        .unwrap()
    }

    struct Rig {
        fixture: Fixture,
        controller: Box<dyn ComponentApi>,
    }

    impl Rig {
        fn new() -> Self {
            let fixture = Fixture::new();
            for id in [1, 2, 3, 4] {
                fixture.float_point(id);
            }
            fixture.uint64_point(5);
            fixture.bool_point(6);
            fixture.bool_point(7);
            fixture.bool_point(8);

            let mut controller = OnOff::create(&controller_config(), &fixture.ctx()).unwrap();
            controller.resolve_references(&fixture.point_db).unwrap();

            let rig = Rig { fixture, controller };
            rig.setf(2, 70.0); // SP
            rig.setf(3, 1.0); // HON
            rig.setf(4, 1.0); // HOFF
            rig.setu64(5, 0); // MON
            rig.setb(6, false); // RST
            rig
        }

        fn setf(&self, id: u32, v: f32) {
            let pt = self.fixture.point_db.lookup_by_id(id).unwrap();
            write_value(pt.as_ref(), v, LockRequest::NoRequest).unwrap();
        }

        fn setu64(&self, id: u32, v: u64) {
            let pt = self.fixture.point_db.lookup_by_id(id).unwrap();
            write_value(pt.as_ref(), v, LockRequest::NoRequest).unwrap();
        }

        fn setb(&self, id: u32, v: bool) {
            let pt = self.fixture.point_db.lookup_by_id(id).unwrap();
            write_value(pt.as_ref(), v, LockRequest::NoRequest).unwrap();
        }

        fn outputs(&self) -> (Option<bool>, Option<bool>) {
            let o = self.fixture.point_db.lookup_by_id(7).unwrap();
            let o_not = self.fixture.point_db.lookup_by_id(8).unwrap();
            (
                read_value::<bool>(o.as_ref()).unwrap(),
                read_value::<bool>(o_not.as_ref()).unwrap(),
            )
        }
    }

    #[test]
    fn initial_state_is_pv_above_sp() {
        let rig = Rig::new();
        rig.controller.start(0).unwrap();

        rig.setf(1, 75.0); // PV > SP
        rig.controller.execute(1_000).unwrap();
        assert_eq!(rig.outputs(), (Some(true), Some(false)));
    }

    #[test]
    fn hysteresis_gates_the_transitions() {
        let rig = Rig::new();
        rig.controller.start(0).unwrap();

        rig.setf(1, 69.0); // initial: off
        rig.controller.execute(1_000).unwrap();
        assert_eq!(rig.outputs(), (Some(false), Some(true)));

        // Above SP but inside the on-hysteresis band: still off.
        rig.setf(1, 70.5);
        rig.controller.execute(2_000).unwrap();
        assert_eq!(rig.outputs(), (Some(false), Some(true)));

        rig.setf(1, 71.5);
        rig.controller.execute(3_000).unwrap();
        assert_eq!(rig.outputs(), (Some(true), Some(false)));

        // Below SP but inside the off-hysteresis band: still on.
        rig.setf(1, 69.5);
        rig.controller.execute(4_000).unwrap();
        assert_eq!(rig.outputs(), (Some(true), Some(false)));

        rig.setf(1, 68.5);
        rig.controller.execute(5_000).unwrap();
        assert_eq!(rig.outputs(), (Some(false), Some(true)));
    }

    #[test]
    fn minimum_on_time_blocks_early_turn_on() {
        let rig = Rig::new();
        rig.setu64(5, 10_000); // MON
        rig.controller.start(0).unwrap();

        rig.setf(1, 69.0); // initial: off at t=1ms
        rig.controller.execute(1_000).unwrap();

        rig.setf(1, 75.0);
        rig.controller.execute(5_000).unwrap(); // only 4ms since the mark
        assert_eq!(rig.outputs(), (Some(false), Some(true)));

        rig.controller.execute(12_000).unwrap();
        assert_eq!(rig.outputs(), (Some(true), Some(false)));
    }

    #[test]
    fn reset_rising_edge_recomputes_the_initial_state() {
        let rig = Rig::new();
        rig.controller.start(0).unwrap();

        rig.setf(1, 75.0);
        rig.controller.execute(1_000).unwrap();
        assert_eq!(rig.outputs(), (Some(true), Some(false)));

        rig.setf(1, 70.5); // inside both bands: state would hold
        rig.setb(6, true); // rising edge
        rig.controller.execute(2_000).unwrap();
        assert_eq!(rig.outputs(), (Some(true), Some(false))); // 70.5 > 70

        rig.setf(1, 69.9);
        rig.setb(6, false);
        rig.controller.execute(3_000).unwrap();
        rig.setb(6, true); // another rising edge
        rig.controller.execute(4_000).unwrap();
        assert_eq!(rig.outputs(), (Some(false), Some(true))); // 69.9 < 70
    }

    #[test]
    fn reset_hook_recomputes_the_initial_state() {
        let rig = Rig::new();
        rig.controller.start(0).unwrap();

        rig.setf(1, 75.0);
        rig.controller.execute(1_000).unwrap();
        assert_eq!(rig.outputs(), (Some(true), Some(false)));

        // Inside both hysteresis bands the state would hold; the reset hook
        // forces the initial-state computation instead.
        rig.setf(1, 69.9);
        rig.controller.reset(2_000);
        rig.controller.execute(3_000).unwrap();
        assert_eq!(rig.outputs(), (Some(false), Some(true)));
    }

    #[test]
    fn invalid_input_invalidates_both_outputs() {
        let rig = Rig::new();
        rig.controller.start(0).unwrap();

        rig.setf(1, 75.0);
        rig.controller.execute(1_000).unwrap();

        let pv = rig.fixture.point_db.lookup_by_id(1).unwrap();
        pv.set_invalid(LockRequest::NoRequest);
        rig.controller.execute(2_000).unwrap();
        assert_eq!(rig.outputs(), (None, None));
    }
}
