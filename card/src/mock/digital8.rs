use crate::api::CardApi;
use crate::common::{CardCommon, CardBanks};
use crate::config::CardConfig;
use crate::factory::{CardCreateContext, CardFactoryEntry};
use foxtail_error::{CardError, Error};
use foxtail_point::{read_value, write_value, LockRequest, PointDescriptor, PointValue};
use std::any::Any;
use std::sync::Arc;

/// Mocked IO card with 8 digital inputs and 8 digital outputs, each
/// direction exposed as a single `Uint8` point on channel 1.
///
/// `set_inputs`/`get_outputs` are thread safe so a test or console can
/// drive the card the way a driver would: through the IO registers, under
/// the register lock.
pub struct Digital8 {
    common: CardCommon,
}

impl Digital8 {
    pub const GUID: &'static str = "59d33888-62c7-45b2-a4d4-9dbc55914ed3";
    pub const TYPE_NAME: &'static str = "Foxtail::Card::Mock::Digital8";

    /// One descriptor per direction: the byte is the channel.
    const MAX_DESCRIPTORS: usize = 1;

    pub fn create(
        config: &CardConfig,
        ctx: &CardCreateContext,
    ) -> Result<Arc<dyn CardApi>, Error> {
        let (id, slot, name) = CardCommon::parse_common(config, Self::GUID)?;

        Self::validate_channels(&config.points.inputs)?;
        Self::validate_channels(&config.points.outputs)?;

        let banks = CardCommon::build_banks(ctx, &config.points.inputs, &config.points.outputs)?;
        Ok(Arc::new(Digital8 {
            common: CardCommon::new(id, slot, name, banks),
        }))
    }

    pub fn factory_entry() -> CardFactoryEntry {
        CardFactoryEntry {
            guid: Self::GUID,
            type_name: Self::TYPE_NAME,
            create: Self::create,
        }
    }

    fn validate_channels(descriptors: &[PointDescriptor]) -> Result<(), Error> {
        if descriptors.len() > Self::MAX_DESCRIPTORS {
            return Err(CardError::TooManyChannels.into());
        }
        for desc in descriptors {
            // The single byte-wide channel is always channel 1.
            if desc.channel != Some(1) {
                return Err(CardError::BadChannelAssignments.into());
            }
            if desc.type_guid != <u8 as PointValue>::GUID {
                return Err(CardError::WrongPointType.into());
            }
        }
        Ok(())
    }

    /// Emulate the hardware driving the 8 input signals.
    pub fn set_inputs(&self, value: u8) {
        self.common.with_register_lock(|banks: &CardBanks| {
            if let Some(point) = banks.register_inputs.point_at(0) {
                let _ = write_value(point.as_ref(), value, LockRequest::NoRequest);
            }
        })
    }

    /// Emulate the hardware sampling the 8 output signals. `None` when the
    /// output register is invalid (or the card has no outputs).
    pub fn get_outputs(&self) -> Option<u8> {
        self.common.with_register_lock(|banks: &CardBanks| {
            let point = banks.register_outputs.point_at(0)?;
            read_value::<u8>(point.as_ref()).ok().flatten()
        })
    }
}

impl std::fmt::Debug for Digital8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Digital8").field("name", &self.name()).finish()
    }
}

impl CardApi for Digital8 {
    fn card_id(&self) -> u16 {
        self.common.id()
    }

    fn name(&self) -> &str {
        self.common.name()
    }

    fn slot_number(&self) -> u16 {
        self.common.slot()
    }

    fn type_guid(&self) -> &'static str {
        Self::GUID
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn error_code(&self) -> Option<Error> {
        self.common.error_code()
    }

    fn is_started(&self) -> bool {
        self.common.is_started()
    }

    fn start(&self, _now_usec: u64) -> bool {
        self.common.start()
    }

    fn stop(&self) {
        self.common.stop()
    }

    fn scan_inputs(&self, _now_usec: u64) -> bool {
        self.common.scan_inputs()
    }

    fn flush_outputs(&self, _now_usec: u64) -> bool {
        self.common.flush_outputs()
    }

    fn banks(&self) -> &CardBanks {
        self.common.banks()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
