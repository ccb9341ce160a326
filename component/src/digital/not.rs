use crate::api::{ComponentApi, ComponentConfig};
use crate::common::{
    parse_point_references, resolve_point_references, validate_reference_types, ComponentState,
    PointRef,
};
use crate::factory::{ComponentCreateContext, ComponentFactoryEntry};
use foxtail_error::{ComponentError, Error};
use foxtail_point::{read_value, write_value, LockRequest, PointDatabase, PointValue};

/// NOT gate: N Bool inputs inverted pairwise into N Bool outputs.
pub struct Not {
    state: ComponentState,
    inputs: Vec<PointRef>,
    outputs: Vec<PointRef>,
}

impl Not {
    pub const GUID: &'static str = "31d8a613-bc99-4d0d-a96f-4b4dc9b0cc6f";
    pub const TYPE_NAME: &'static str = "Foxtail::Component::Digital::Not";

    const MAX_PAIRS: usize = 16;

    pub fn create(
        config: &ComponentConfig,
        _ctx: &ComponentCreateContext,
    ) -> Result<Box<dyn ComponentApi>, Error> {
        let inputs = parse_point_references(
            &config.inputs,
            1,
            Self::MAX_PAIRS,
            ComponentError::IncorrectNumInputRefs,
            ComponentError::BadInputReference,
        )?;
        let outputs = parse_point_references(
            &config.outputs,
            1,
            Self::MAX_PAIRS,
            ComponentError::IncorrectNumOutputRefs,
            ComponentError::BadOutputReference,
        )?;
        if inputs.len() != outputs.len() {
            return Err(ComponentError::MismatchedInputsOutputs.into());
        }

        Ok(Box::new(Not {
            state: ComponentState::new(config.name.clone().unwrap_or_default()),
            inputs,
            outputs,
        }))
    }

    pub fn factory_entry() -> ComponentFactoryEntry {
        ComponentFactoryEntry {
            guid: Self::GUID,
            type_name: Self::TYPE_NAME,
            create: Self::create,
        }
    }
}

impl std::fmt::Debug for Not {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Not").field("name", &self.name()).finish()
    }
}

impl ComponentApi for Not {
    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<(), Error> {
        let result = resolve_point_references(
            &mut self.inputs,
            point_db,
            ComponentError::UnresolvedInputReference,
        )
        .and_then(|_| {
            resolve_point_references(
                &mut self.outputs,
                point_db,
                ComponentError::UnresolvedOutputReference,
            )
        })
        .and_then(|_| {
            validate_reference_types(
                &self.inputs,
                <bool as PointValue>::GUID,
                ComponentError::InputReferenceBadType,
            )
        })
        .and_then(|_| {
            validate_reference_types(
                &self.outputs,
                <bool as PointValue>::GUID,
                ComponentError::OutputReferenceBadType,
            )
        });
        result.map_err(|e| self.state.latch_error(e))
    }

    fn start(&self, _now_usec: u64) -> Result<(), Error> {
        self.state.start()
    }

    fn stop(&self) {
        self.state.stop()
    }

    fn execute(&self, _now_usec: u64) -> Result<(), Error> {
        self.state.check_runnable()?;

        for (input, output) in self.inputs.iter().zip(&self.outputs) {
            let in_point = input.point().ok_or(ComponentError::NotStarted)?;
            let out_point = output.point().ok_or(ComponentError::NotStarted)?;
            match read_value::<bool>(in_point.as_ref())? {
                Some(v) => write_value(out_point.as_ref(), !v, LockRequest::NoRequest)?,
                None => out_point.set_invalid(LockRequest::NoRequest),
            }
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

    #[test]
    fn inverts_pairwise_and_propagates_invalid_per_pair() {
        let fixture = Fixture::new();
        let i1 = fixture.bool_point(1);
        let _i2 = fixture.bool_point(2); // stays invalid
        let o1 = fixture.bool_point(3);
        let o2 = fixture.bool_point(4);
        o2.write(true, LockRequest::NoRequest);

        let config: ComponentConfig = serde_json::from_value(json!({
            "type": Not::GUID,
            "inputs": [
                { "idRef": 1 }, { "idRef": 2 },
            ],
            "outputs": [
                { "idRef": 3 }, { "idRef": 4 },
            ]
        }))
        .unwrap();

        let mut gate = Not::create(&config, &fixture.ctx()).unwrap();
        gate.resolve_references(&fixture.point_db).unwrap();
        gate.start(0).unwrap();

        i1.write(true, LockRequest::NoRequest);
        gate.execute(0).unwrap();
        assert_eq!(o1.read(), Some(false));
        assert!(o2.is_not_valid());
    }

    #[test]
    fn mismatched_pair_counts_are_rejected() {
        let fixture = Fixture::new();
        let config: ComponentConfig = serde_json::from_value(json!({
            "type": Not::GUID,
            "inputs": [ { "idRef": 1 } ],
            "outputs": [ { "idRef": 2 }, { "idRef": 3 } ]
        }))
        .unwrap();

        let err = Not::create(&config, &fixture.ctx()).unwrap_err();
        assert_eq!(err.code_name(), "MISMATCHED_INPUTS_OUTPUTS");
    }
}
