use crate::common::CardBanks;
use foxtail_error::Error;
use std::any::Any;

/// Object-safe card surface driven by Scanners and operator tooling.
pub trait CardApi: Send + Sync + std::fmt::Debug {
    fn card_id(&self) -> u16;

    fn name(&self) -> &str;

    /// Hardware position in the node's physical chassis.
    fn slot_number(&self) -> u16;

    fn type_guid(&self) -> &'static str;

    fn type_name(&self) -> &'static str;

    /// Latched error, if any. A card with a latched error never starts.
    fn error_code(&self) -> Option<Error>;

    fn is_started(&self) -> bool;

    /// Apply IO-register setters and transition to running. Returns false
    /// when already started or when an error is latched.
    fn start(&self, now_usec: u64) -> bool;

    fn stop(&self);

    /// Copy the IO-register input bank into the virtual input bank.
    fn scan_inputs(&self, now_usec: u64) -> bool;

    /// Copy the virtual output bank into the IO-register output bank.
    fn flush_outputs(&self, now_usec: u64) -> bool;

    /// The card's six-bank sextet. This is the HA hook for card state: an
    /// external collaborator snapshots/restores the virtual-output bank
    /// through the bank copy APIs. Register banks still require the card's
    /// register lock (use the concrete card's accessors).
    fn banks(&self) -> &CardBanks;

    fn as_any(&self) -> &dyn Any;
}
