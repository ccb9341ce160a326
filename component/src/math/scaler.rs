use crate::api::{ComponentApi, ComponentConfig};
use crate::common::{
    parse_point_references, resolve_point_references, validate_reference_types, ComponentState,
    PointRef,
};
use crate::factory::{ComponentCreateContext, ComponentFactoryEntry};
use foxtail_error::{ComponentError, Error};
use foxtail_point::{read_value, write_value, LockRequest, PointDatabase, PointValue};

#[derive(Clone, Copy)]
struct Konstants {
    m: f32,
    b: f32,
}

/// mx+b scaler: Float inputs paired 1:1 with Float outputs, each pair with
/// its own `m`/`b` constants from the input reference entry.
pub struct Scaler {
    state: ComponentState,
    inputs: Vec<PointRef>,
    outputs: Vec<PointRef>,
    konstants: Vec<Konstants>,
}

impl Scaler {
    pub const GUID: &'static str = "0eb51702-677f-4022-91ab-bc84efcc4ed1";
    pub const TYPE_NAME: &'static str = "Foxtail::Component::Math::Scaler";

    const MAX_PAIRS: usize = 8;

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

        let konstants = config
            .inputs
            .iter()
            .map(|r| match (r.m, r.b) {
                (Some(m), Some(b)) => Ok(Konstants {
                    m: m as f32,
                    b: b as f32,
                }),
                _ => Err(ComponentError::MissingRequiredField),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Box::new(Scaler {
            state: ComponentState::new(config.name.clone().unwrap_or_default()),
            inputs,
            outputs,
            konstants,
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

impl std::fmt::Debug for Scaler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scaler").field("name", &self.name()).finish()
    }
}

impl ComponentApi for Scaler {
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
                <f32 as PointValue>::GUID,
                ComponentError::InputReferenceBadType,
            )
        })
        .and_then(|_| {
            validate_reference_types(
                &self.outputs,
                <f32 as PointValue>::GUID,
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

        for (i, (input, output)) in self.inputs.iter().zip(&self.outputs).enumerate() {
            let in_point = input.point().ok_or(ComponentError::NotStarted)?;
            let out_point = output.point().ok_or(ComponentError::NotStarted)?;
            match read_value::<f32>(in_point.as_ref())? {
                Some(v) => {
                    let k = self.konstants[i];
                    write_value(out_point.as_ref(), k.m * v + k.b, LockRequest::NoRequest)?;
                }
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

    fn scaler_config() -> ComponentConfig {
        serde_json::from_value(json!({
            "name": "eng units",
            "type": Scaler::GUID,
            "inputs": [
                { "type": "708745fa-cef6-4364-abad-063a40f35cbc", "idRef": 1, "m": 100.0, "b": -5.0 },
            ],
            "outputs": [
                { "type": "708745fa-cef6-4364-abad-063a40f35cbc", "idRef": 2 },
            ]
        }))
        .unwrap()
    }

    #[test]
    fn applies_mx_plus_b() {
        let fixture = Fixture::new();
        let input = fixture.float_point(1);
        let output = fixture.float_point(2);

        let mut scaler = Scaler::create(&scaler_config(), &fixture.ctx()).unwrap();
        scaler.resolve_references(&fixture.point_db).unwrap();
        scaler.start(0).unwrap();

        input.write(2.0, LockRequest::NoRequest);
        scaler.execute(0).unwrap();
        assert_eq!(output.read(), Some(195.0));
    }

    #[test]
    fn invalid_input_invalidates_the_paired_output() {
        let fixture = Fixture::new();
        let _input = fixture.float_point(1);
        let output = fixture.float_point(2);
        output.write(1.0, LockRequest::NoRequest);

        let mut scaler = Scaler::create(&scaler_config(), &fixture.ctx()).unwrap();
        scaler.resolve_references(&fixture.point_db).unwrap();
        scaler.start(0).unwrap();

        scaler.execute(0).unwrap();
        assert!(output.is_not_valid());
    }

    #[test]
    fn missing_konstants_are_rejected() {
        let fixture = Fixture::new();
        let config: ComponentConfig = serde_json::from_value(json!({
            "type": Scaler::GUID,
            "inputs": [ { "type": "708745fa-cef6-4364-abad-063a40f35cbc", "idRef": 1, "m": 2.0 } ],
            "outputs": [ { "type": "708745fa-cef6-4364-abad-063a40f35cbc", "idRef": 2 } ]
        }))
        .unwrap();

        let err = Scaler::create(&config, &fixture.ctx()).unwrap_err();
        assert_eq!(err.code_name(), "MISSING_REQUIRED_FIELD");
    }
}
