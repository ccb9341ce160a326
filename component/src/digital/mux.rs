use crate::api::{ComponentApi, ComponentConfig};
use crate::common::{
    parse_point_references, resolve_point_references, validate_reference_types, ComponentState,
    PointRef,
};
use crate::factory::{ComponentCreateContext, ComponentFactoryEntry};
use foxtail_error::{ComponentError, Error};
use foxtail_point::{
    integer_attributes, read_value, IntegerAttributes, LockRequest, PointDatabase, PointValue,
};

/// Multiplexer: Bool inputs gathered by bit offset into one integer output.
/// The output value starts from zero each cycle; every input contributes
/// its (optionally negated) bit.
pub struct Mux {
    state: ComponentState,
    inputs: Vec<PointRef>,
    output: Vec<PointRef>,
    bit_offsets: Vec<u8>,
    input_negated: Vec<bool>,
    attributes: &'static IntegerAttributes,
}

impl Mux {
    pub const GUID: &'static str = "d60f2daf-9709-42d6-ba92-b76f641eb930";
    pub const TYPE_NAME: &'static str = "Foxtail::Component::Digital::Mux";

    pub fn create(
        config: &ComponentConfig,
        _ctx: &ComponentCreateContext,
    ) -> Result<Box<dyn ComponentApi>, Error> {
        let output = parse_point_references(
            &config.outputs,
            1,
            1,
            ComponentError::IncorrectNumOutputRefs,
            ComponentError::BadOutputReference,
        )?;

        let output_guid = config.outputs[0]
            .type_guid
            .as_deref()
            .ok_or(ComponentError::OutputReferenceBadType)?;
        let attributes =
            integer_attributes(output_guid).ok_or(ComponentError::InvalidInputType)?;

        let inputs = parse_point_references(
            &config.inputs,
            1,
            attributes.num_bits as usize,
            ComponentError::IncorrectNumInputRefs,
            ComponentError::BadInputReference,
        )?;

        let mut bit_offsets = Vec::with_capacity(inputs.len());
        let mut input_negated = Vec::with_capacity(inputs.len());
        for reference in &config.inputs {
            let bit = reference.bit.ok_or(ComponentError::InvalidBitOffset)?;
            if bit >= attributes.num_bits {
                return Err(ComponentError::InvalidBitOffset.into());
            }
            bit_offsets.push(bit);
            input_negated.push(reference.negate.unwrap_or(false));
        }

        Ok(Box::new(Mux {
            state: ComponentState::new(config.name.clone().unwrap_or_default()),
            inputs,
            output,
            bit_offsets,
            input_negated,
            attributes,
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

impl std::fmt::Debug for Mux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mux").field("name", &self.name()).finish()
    }
}

impl ComponentApi for Mux {
    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<(), Error> {
        let expected_output = self.attributes.guid;
        let result = resolve_point_references(
            &mut self.inputs,
            point_db,
            ComponentError::UnresolvedInputReference,
        )
        .and_then(|_| {
            resolve_point_references(
                &mut self.output,
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
                &self.output,
                expected_output,
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

        let out_point = self.output[0].point().ok_or(ComponentError::NotStarted)?;

        let mut value = 0u64;
        for (i, input) in self.inputs.iter().enumerate() {
            let point = input.point().ok_or(ComponentError::NotStarted)?;
            match read_value::<bool>(point.as_ref())? {
                Some(v) => {
                    let bit = if self.input_negated[i] { !v } else { v };
                    if bit {
                        value |= 1u64 << self.bit_offsets[i];
                    }
                }
                None => {
                    out_point.set_invalid(LockRequest::NoRequest);
                    return Ok(());
                }
            }
        }

        (self.attributes.write_from_u64)(out_point.as_ref(), value, LockRequest::NoRequest)?;
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
    fn gathers_bits_into_an_integer() {
        let fixture = Fixture::new();
        let b0 = fixture.bool_point(1);
        let b3 = fixture.bool_point(2);
        let out = fixture.uint8_point(3);

        let config: ComponentConfig = serde_json::from_value(json!({
            "type": Mux::GUID,
            "inputs": [
                { "idRef": 1, "bit": 0 },
                { "idRef": 2, "bit": 3, "negate": true },
            ],
            "outputs": [
                { "type": "a9f6c3d2-7e15-48b4-9c0a-d2b8e4f615c7", "idRef": 3 },
            ]
        }))
        .unwrap();

        let mut mux = Mux::create(&config, &fixture.ctx()).unwrap();
        mux.resolve_references(&fixture.point_db).unwrap();
        mux.start(0).unwrap();

        b0.write(true, LockRequest::NoRequest);
        b3.write(false, LockRequest::NoRequest); // negated: contributes bit 3
        mux.execute(0).unwrap();
        assert_eq!(out.read(), Some(0b0000_1001));

        b3.set_invalid(LockRequest::NoRequest);
        mux.execute(0).unwrap();
        assert!(out.is_not_valid());
    }
}
