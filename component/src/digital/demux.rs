use crate::api::{ComponentApi, ComponentConfig};
use crate::common::{
    parse_point_references, resolve_point_references, validate_reference_types, ComponentState,
    PointRef,
};
use crate::factory::{ComponentCreateContext, ComponentFactoryEntry};
use foxtail_error::{ComponentError, Error};
use foxtail_point::{
    integer_attributes, write_value, IntegerAttributes, LockRequest, PointDatabase, PointValue,
};

/// Demultiplexer: one integer input fanned out to Bool outputs by bit
/// offset, each output optionally negated. Accepts any integer point type;
/// the input GUID comes from the reference entry.
pub struct Demux {
    state: ComponentState,
    input: Vec<PointRef>,
    outputs: Vec<PointRef>,
    bit_offsets: Vec<u8>,
    output_negated: Vec<bool>,
    attributes: &'static IntegerAttributes,
}

impl Demux {
    pub const GUID: &'static str = "8c55aa52-3bc8-4b8a-ad73-c434a0bbd4b4";
    pub const TYPE_NAME: &'static str = "Foxtail::Component::Digital::Demux";

    pub fn create(
        config: &ComponentConfig,
        _ctx: &ComponentCreateContext,
    ) -> Result<Box<dyn ComponentApi>, Error> {
        let input = parse_point_references(
            &config.inputs,
            1,
            1,
            ComponentError::IncorrectNumInputRefs,
            ComponentError::BadInputReference,
        )?;

        let input_guid = config.inputs[0]
            .type_guid
            .as_deref()
            .ok_or(ComponentError::InputReferenceBadType)?;
        let attributes =
            integer_attributes(input_guid).ok_or(ComponentError::InvalidInputType)?;

        let outputs = parse_point_references(
            &config.outputs,
            1,
            attributes.num_bits as usize,
            ComponentError::IncorrectNumOutputRefs,
            ComponentError::BadOutputReference,
        )?;
        if outputs.len() > attributes.num_bits as usize {
            return Err(ComponentError::OutputBitsExceedInput.into());
        }

        let mut bit_offsets = Vec::with_capacity(outputs.len());
        let mut output_negated = Vec::with_capacity(outputs.len());
        for reference in &config.outputs {
            let bit = reference.bit.ok_or(ComponentError::InvalidBitOffset)?;
            if bit >= attributes.num_bits {
                return Err(ComponentError::InvalidBitOffset.into());
            }
            bit_offsets.push(bit);
            output_negated.push(reference.negate.unwrap_or(false));
        }

        Ok(Box::new(Demux {
            state: ComponentState::new(config.name.clone().unwrap_or_default()),
            input,
            outputs,
            bit_offsets,
            output_negated,
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

    fn invalidate_outputs(&self) {
        for output in &self.outputs {
            if let Some(point) = output.point() {
                point.set_invalid(LockRequest::NoRequest);
            }
        }
    }
}

impl std::fmt::Debug for Demux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Demux").field("name", &self.name()).finish()
    }
}

impl ComponentApi for Demux {
    fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<(), Error> {
        let expected_input = self.attributes.guid;
        let result = resolve_point_references(
            &mut self.input,
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
                &self.input,
                expected_input,
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

        let in_point = self.input[0].point().ok_or(ComponentError::NotStarted)?;
        let in_value = match (self.attributes.read_as_u64)(in_point.as_ref())? {
            Some(v) => v,
            None => {
                self.invalidate_outputs();
                return Ok(());
            }
        };

        for (i, output) in self.outputs.iter().enumerate() {
            let point = output.point().ok_or(ComponentError::NotStarted)?;
            let bit_set = in_value & (1u64 << self.bit_offsets[i]) != 0;
            let final_out = if self.output_negated[i] { !bit_set } else { bit_set };
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
