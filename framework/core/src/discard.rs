/// Returned when the result of a polling cycle arrives after its session was invalidated.
///
/// This is not a failure of the device or the collector. The session that started the cycle no
/// longer exists, so the result is dropped instead of being applied to whichever session replaced
/// it.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
#[display("Cycle {cycle} of session {epoch} was discarded because the session ended")]
pub struct CycleDiscarded {
    pub epoch: u64,
    pub cycle: u64,
}

impl CycleDiscarded {
    pub fn new(epoch: u64, cycle: u64) -> Self {
        Self { epoch, cycle }
    }
}
