use crate::config::CardConfig;
use crate::factory::CardCreateContext;
use foxtail_error::{CardError, Error};
use foxtail_point::{Bank, IdKey, LockRequest, PointDescriptor};
use parking_lot::Mutex;

/// The six logical banks every card owns.
///
/// Internal and register banks live in the card-stateful arena. Virtual
/// input banks also live there; virtual *output* banks live in the
/// HA-stateful arena so their contents survive a high-availability
/// handover.
pub struct CardBanks {
    pub internal_inputs: Bank,
    pub register_inputs: Bank,
    pub virtual_inputs: Bank,
    pub internal_outputs: Bank,
    pub register_outputs: Bank,
    pub virtual_outputs: Bank,
}

struct CardState {
    error: Option<Error>,
    started: bool,
}

/// Shared plumbing for concrete cards: identity, the bank sextet, the
/// register lock, and the latched error/started state machine.
pub struct CardCommon {
    id: u16,
    name: String,
    slot: u16,
    banks: CardBanks,
    /// Guards the IO-register banks against concurrent driver access.
    register_lock: Mutex<()>,
    state: Mutex<CardState>,
}

impl CardCommon {
    /// Validate the descriptor's common fields: id, slot, name, type GUID.
    pub fn parse_common(config: &CardConfig, expected_guid: &str) -> Result<(u16, u16, String), Error> {
        if config.type_guid != expected_guid {
            return Err(CardError::GuidWrongType.into());
        }
        let id = config.id.ok_or(CardError::MissingId)?;
        let slot = config.slot.ok_or(CardError::MissingSlot)?;
        let name = config.name.clone().ok_or(CardError::MissingName)?;
        Ok((id, slot, name))
    }

    /// Build the bank sextet from the card's channel descriptors.
    ///
    /// Each direction produces three layout-equivalent banks keyed by `id`,
    /// `ioRegId`, and `internalId`. Setters are attached to the IO-register
    /// points only (an `initial` block describes initial *register* state).
    /// Internal banks are built from the descriptors that carry
    /// `internalId`; cards without double buffering simply omit the key.
    pub fn build_banks(
        ctx: &CardCreateContext,
        inputs: &[PointDescriptor],
        outputs: &[PointDescriptor],
    ) -> Result<CardBanks, Error> {
        let internal_in: Vec<PointDescriptor> = inputs
            .iter()
            .filter(|d| d.internal_id.is_some())
            .cloned()
            .collect();
        let internal_out: Vec<PointDescriptor> = outputs
            .iter()
            .filter(|d| d.internal_id.is_some())
            .cloned()
            .collect();

        let build = |descs: &[PointDescriptor], key: IdKey, setters: bool, ha: bool| {
            let arena = if ha { ctx.ha_arena } else { ctx.card_arena };
            Bank::build(
                ctx.point_factory,
                descs,
                key,
                setters,
                arena,
                ctx.card_arena,
                ctx.point_db,
            )
        };

        Ok(CardBanks {
            internal_inputs: build(&internal_in, IdKey::InternalId, false, false)?,
            register_inputs: build(inputs, IdKey::IoRegId, true, false)?,
            virtual_inputs: build(inputs, IdKey::Id, false, false)?,
            internal_outputs: build(&internal_out, IdKey::InternalId, false, false)?,
            register_outputs: build(outputs, IdKey::IoRegId, true, false)?,
            virtual_outputs: build(outputs, IdKey::Id, false, true)?,
        })
    }

    pub fn new(id: u16, slot: u16, name: String, banks: CardBanks) -> Self {
        CardCommon {
            id,
            name,
            slot,
            banks,
            register_lock: Mutex::new(()),
            state: Mutex::new(CardState {
                error: None,
                started: false,
            }),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> u16 {
        self.slot
    }

    pub fn banks(&self) -> &CardBanks {
        &self.banks
    }

    pub fn error_code(&self) -> Option<Error> {
        self.state.lock().error.clone()
    }

    pub fn set_error(&self, error: Error) {
        let mut state = self.state.lock();
        if state.error.is_none() {
            state.error = Some(error);
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Establish initial register state from the IO-register setters, then
    /// transition to running.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock();
        if state.started || state.error.is_some() {
            return false;
        }

        {
            let _guard = self.register_lock.lock();
            for point in self.banks.register_inputs.points() {
                point.update_from_setter(LockRequest::NoRequest);
            }
            for point in self.banks.register_outputs.points() {
                point.update_from_setter(LockRequest::NoRequest);
            }
        }

        state.started = true;
        true
    }

    pub fn stop(&self) {
        self.state.lock().started = false;
    }

    /// Block-copy IO-register inputs into the virtual input bank.
    pub fn scan_inputs(&self) -> bool {
        if !self.runnable() {
            return false;
        }
        let _guard = self.register_lock.lock();
        self.banks
            .virtual_inputs
            .copy_stateful_memory_from_bank(&self.banks.register_inputs)
            .is_ok()
    }

    /// Block-copy the virtual output bank into the IO-register outputs.
    pub fn flush_outputs(&self) -> bool {
        if !self.runnable() {
            return false;
        }
        let _guard = self.register_lock.lock();
        self.banks
            .register_outputs
            .copy_stateful_memory_from_bank(&self.banks.virtual_outputs)
            .is_ok()
    }

    /// Driver-side hook: publish internal inputs to the IO registers.
    pub fn update_input_registers(&self) -> bool {
        let _guard = self.register_lock.lock();
        self.banks
            .register_inputs
            .copy_stateful_memory_from_bank(&self.banks.internal_inputs)
            .is_ok()
    }

    /// Driver-side hook: read back the IO-register outputs.
    pub fn read_output_registers(&self) -> bool {
        let _guard = self.register_lock.lock();
        self.banks
            .internal_outputs
            .copy_stateful_memory_from_bank(&self.banks.register_outputs)
            .is_ok()
    }

    /// Run `f` with the register lock held. For driver/test code touching
    /// the register banks directly.
    pub fn with_register_lock<R>(&self, f: impl FnOnce(&CardBanks) -> R) -> R {
        let _guard = self.register_lock.lock();
        f(&self.banks)
    }

    fn runnable(&self) -> bool {
        let state = self.state.lock();
        state.error.is_none() && state.started
    }
}
