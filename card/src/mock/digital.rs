use crate::api::CardApi;
use crate::common::{CardBanks, CardCommon};
use crate::config::CardConfig;
use crate::factory::{CardCreateContext, CardFactoryEntry};
use foxtail_error::{CardError, Error};
use foxtail_point::{read_value, write_value, LockRequest, PointDescriptor, PointValue};
use std::any::Any;
use std::sync::Arc;

/// Mocked IO card with up to 32 digital input and 32 digital output
/// signals, one Bool point per channel.
///
/// Unlike [`Digital8`](crate::mock::Digital8), every signal is its own
/// descriptor, so channel numbers matter: they must be 1-based, within
/// range, and unique per direction.
pub struct Digital {
    common: CardCommon,
    input_channels: Vec<u16>,
    output_channels: Vec<u16>,
}

impl Digital {
    pub const GUID: &'static str = "6eab3b0d-6d8a-4dc5-9c28-f1e7a20b45d9";
    pub const TYPE_NAME: &'static str = "Foxtail::Card::Mock::Digital";

    pub const MAX_CHANNELS: usize = 32;

    pub fn create(
        config: &CardConfig,
        ctx: &CardCreateContext,
    ) -> Result<Arc<dyn CardApi>, Error> {
        let (id, slot, name) = CardCommon::parse_common(config, Self::GUID)?;

        let input_channels = Self::validate_channels(&config.points.inputs)?;
        let output_channels = Self::validate_channels(&config.points.outputs)?;

        let banks = CardCommon::build_banks(ctx, &config.points.inputs, &config.points.outputs)?;
        Ok(Arc::new(Digital {
            common: CardCommon::new(id, slot, name, banks),
            input_channels,
            output_channels,
        }))
    }

    pub fn factory_entry() -> CardFactoryEntry {
        CardFactoryEntry {
            guid: Self::GUID,
            type_name: Self::TYPE_NAME,
            create: Self::create,
        }
    }

    fn validate_channels(descriptors: &[PointDescriptor]) -> Result<Vec<u16>, Error> {
        if descriptors.len() > Self::MAX_CHANNELS {
            return Err(CardError::TooManyChannels.into());
        }
        let mut channels = Vec::with_capacity(descriptors.len());
        for desc in descriptors {
            let channel = desc.channel.unwrap_or(0);
            if channel == 0 || channel as usize > Self::MAX_CHANNELS {
                return Err(CardError::BadChannelAssignments.into());
            }
            if channels.contains(&channel) {
                return Err(CardError::BadChannelAssignments.into());
            }
            if desc.type_guid != <bool as PointValue>::GUID {
                return Err(CardError::WrongPointType.into());
            }
            channels.push(channel);
        }
        Ok(channels)
    }

    /// Emulate the hardware driving one input signal.
    pub fn set_input(&self, channel: u16, value: bool) -> bool {
        let Some(index) = self.input_channels.iter().position(|c| *c == channel) else {
            return false;
        };
        self.common.with_register_lock(|banks: &CardBanks| {
            match banks.register_inputs.point_at(index) {
                Some(point) => {
                    write_value(point.as_ref(), value, LockRequest::NoRequest).is_ok()
                }
                None => false,
            }
        })
    }

    /// Emulate the hardware sampling one output signal. `None` when the
    /// channel is unknown or its register is invalid.
    pub fn get_output(&self, channel: u16) -> Option<bool> {
        let index = self.output_channels.iter().position(|c| *c == channel)?;
        self.common.with_register_lock(|banks: &CardBanks| {
            let point = banks.register_outputs.point_at(index)?;
            read_value::<bool>(point.as_ref()).ok().flatten()
        })
    }
}

impl std::fmt::Debug for Digital {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Digital").field("name", &self.name()).finish()
    }
}

impl CardApi for Digital {
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
