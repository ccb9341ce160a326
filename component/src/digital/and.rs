use crate::api::{ComponentApi, ComponentConfig};
use crate::common::{
    parse_point_references, resolve_point_references, validate_reference_types, ComponentState,
    PointRef,
};
use crate::factory::{ComponentCreateContext, ComponentFactoryEntry};
use foxtail_error::{ComponentError, Error};
use foxtail_point::{read_value, write_value, LockRequest, PointDatabase, PointValue};

/// AND gate: 2..=16 Bool inputs, 1..=4 Bool outputs, each output optionally
/// negated.
pub struct And {
    state: ComponentState,
    inputs: Vec<PointRef>,
    outputs: Vec<PointRef>,
    output_negated: Vec<bool>,
}

impl And {
    pub const GUID: &'static str = "e62e395c-d27a-4821-bba9-aa1e6de42a05";
    pub const TYPE_NAME: &'static str = "Foxtail::Component::Digital::And";

    const MAX_INPUTS: usize = 16;
    const MAX_OUTPUTS: usize = 4;

    pub fn create(
        config: &ComponentConfig,
        _ctx: &ComponentCreateContext,
    ) -> Result<Box<dyn ComponentApi>, Error> {
        let inputs = parse_point_references(
            &config.inputs,
            2,
            Self::MAX_INPUTS,
            ComponentError::IncorrectNumInputRefs,
            ComponentError::BadInputReference,
        )?;
        let outputs = parse_point_references(
            &config.outputs,
            1,
            Self::MAX_OUTPUTS,
            ComponentError::IncorrectNumOutputRefs,
            ComponentError::BadOutputReference,
        )?;
        let output_negated = config
            .outputs
            .iter()
            .map(|r| r.negate.unwrap_or(false))
            .collect();

        Ok(Box::new(And {
            state: ComponentState::new(config.name.clone().unwrap_or_default()),
            inputs,
            outputs,
            output_negated,
        }))
    }

    pub fn factory_entry() -> ComponentFactoryEntry {
        ComponentFactoryEntry {
            guid: Self::GUID,
            type_name: Self::TYPE_NAME,
            create: Self::create,
        }
    }

    fn invalidate_outputs(&self) {
        for output in &self.outputs {
            if let Some(point) = output.point() {
                point.set_invalid(LockRequest::NoRequest);
            }
        }
    }
}

impl std::fmt::Debug for And {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("And").field("name", &self.name()).finish()
    }
}

impl ComponentApi for And {
    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<(), Error> {
        if let Err(e) = resolve_point_references(
            &mut self.inputs,
            point_db,
            ComponentError::UnresolvedInputReference,
        ) {
            return Err(self.state.latch_error(e));
        }
        if let Err(e) = resolve_point_references(
            &mut self.outputs,
            point_db,
            ComponentError::UnresolvedOutputReference,
        ) {
            return Err(self.state.latch_error(e));
        }
        if let Err(e) = validate_reference_types(
            &self.inputs,
            <bool as PointValue>::GUID,
            ComponentError::InputReferenceBadType,
        ) {
            return Err(self.state.latch_error(e));
        }
        if let Err(e) = validate_reference_types(
            &self.outputs,
            <bool as PointValue>::GUID,
            ComponentError::OutputReferenceBadType,
        ) {
            return Err(self.state.latch_error(e));
        }
        Ok(())
    }

    fn start(&self, _now_usec: u64) -> Result<(), Error> {
        self.state.start()
    }

    fn stop(&self) {
        self.state.stop()
    }

    fn execute(&self, _now_usec: u64) -> Result<(), Error> {
        self.state.check_runnable()?;

        let mut output_val = true;
        for input in &self.inputs {
            let point = input.point().ok_or(ComponentError::NotStarted)?;
            match read_value::<bool>(point.as_ref())? {
                Some(v) => output_val &= v,
                None => {
                    self.invalidate_outputs();
                    return Ok(());
                }
            }
        }

        for (output, negated) in self.outputs.iter().zip(&self.output_negated) {
            let point = output.point().ok_or(ComponentError::NotStarted)?;
            let final_out = if *negated { !output_val } else { output_val };
            write_value(point.as_ref(), final_out, LockRequest::NoRequest)?;
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
    use foxtail_point::PointApi;
    use crate::factory::test_support::Fixture;
    use serde_json::json;

    fn and_config(negate: bool) -> ComponentConfig {
        serde_json::from_value(json!({
            "name": "AND #1",
            "type": And::GUID,
            "inputs": [
                { "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "idRef": 1 },
                { "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "idRef": 2 },
            ],
            "outputs": [
                { "type": "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0", "idRef": 3, "negate": negate },
            ]
        }))
        .unwrap()
    }

    #[test]
    fn ands_all_inputs() {
        let fixture = Fixture::new();
        let p1 = fixture.bool_point(1);
        let p2 = fixture.bool_point(2);
        let p3 = fixture.bool_point(3);

        let mut gate = And::create(&and_config(false), &fixture.ctx()).unwrap();
        gate.resolve_references(&fixture.point_db).unwrap();
        gate.start(0).unwrap();

        p1.write(true, LockRequest::NoRequest);
        p2.write(true, LockRequest::NoRequest);
        gate.execute(0).unwrap();
        assert_eq!(p3.read(), Some(true));

        p2.write(false, LockRequest::NoRequest);
        gate.execute(0).unwrap();
        assert_eq!(p3.read(), Some(false));
    }

    #[test]
    fn invalid_input_invalidates_outputs_without_error() {
        let fixture = Fixture::new();
        let p1 = fixture.bool_point(1);
        let _p2 = fixture.bool_point(2); // stays invalid
        let p3 = fixture.bool_point(3);

        let mut gate = And::create(&and_config(false), &fixture.ctx()).unwrap();
        gate.resolve_references(&fixture.point_db).unwrap();
        gate.start(0).unwrap();

        p1.write(true, LockRequest::NoRequest);
        p3.write(true, LockRequest::NoRequest);
        gate.execute(0).unwrap();
        assert!(p3.is_not_valid());
        assert!(gate.error_code().is_none());
    }

    #[test]
    fn negated_output() {
        let fixture = Fixture::new();
        let p1 = fixture.bool_point(1);
        let p2 = fixture.bool_point(2);
        let p3 = fixture.bool_point(3);

        let mut gate = And::create(&and_config(true), &fixture.ctx()).unwrap();
        gate.resolve_references(&fixture.point_db).unwrap();
        gate.start(0).unwrap();

        p1.write(true, LockRequest::NoRequest);
        p2.write(true, LockRequest::NoRequest);
        gate.execute(0).unwrap();
        assert_eq!(p3.read(), Some(false));
    }

    #[test]
    fn unresolved_reference_latches_an_error() {
        let fixture = Fixture::new();
        let _p1 = fixture.bool_point(1);
        // Point 2 and 3 never created.

        let mut gate = And::create(&and_config(false), &fixture.ctx()).unwrap();
        let err = gate.resolve_references(&fixture.point_db).unwrap_err();
        assert_eq!(err.code_name(), "UNRESOLVED_INPUT_REFERENCE");
        assert!(gate.start(0).is_err());
    }

    #[test]
    fn wrong_input_type_is_rejected() {
        let fixture = Fixture::new();
        let _p1 = fixture.uint8_point(1);
        let _p2 = fixture.bool_point(2);
        let _p3 = fixture.bool_point(3);

        let mut gate = And::create(&and_config(false), &fixture.ctx()).unwrap();
        let err = gate.resolve_references(&fixture.point_db).unwrap_err();
        assert_eq!(err.code_name(), "INPUT_REFERENCE_BAD_TYPE");
    }
}
