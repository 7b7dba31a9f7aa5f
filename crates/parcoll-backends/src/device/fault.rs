//! Sticky fault state and the fail-fast exit

use parking_lot::Mutex;

use crate::error::DeviceFault;

/// Pending faults of one device, one slot per [`crate::FaultClass`].
///
/// The first fault of a class wins; later ones are logged and dropped until
/// the slot is taken.
#[derive(Debug, Default)]
pub(crate) struct FaultRegister {
    asynchronous: Mutex<Option<DeviceFault>>,
    execution: Mutex<Option<DeviceFault>>,
}

impl FaultRegister {
    pub(crate) fn raise_async(&self, fault: DeviceFault) {
        Self::raise(&self.asynchronous, fault);
    }

    pub(crate) fn raise_execution(&self, fault: DeviceFault) {
        Self::raise(&self.execution, fault);
    }

    pub(crate) fn take_async(&self) -> Option<DeviceFault> {
        self.asynchronous.lock().take()
    }

    pub(crate) fn take_execution(&self) -> Option<DeviceFault> {
        self.execution.lock().take()
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.asynchronous.lock().is_some() || self.execution.lock().is_some()
    }

    fn raise(slot: &Mutex<Option<DeviceFault>>, fault: DeviceFault) {
        let mut pending = slot.lock();
        match pending.as_ref() {
            Some(first) => tracing::debug!(%first, dropped = %fault, "fault already pending"),
            None => {
                tracing::debug!(%fault, "device fault raised");
                *pending = Some(fault);
            }
        }
    }
}

/// Report a fault surfaced by a device check and terminate the process.
///
/// Nothing about the device state can be trusted after a fault, so the
/// process aborts without unwinding.
pub fn fail_fast(operation: &str, fault: &DeviceFault) -> ! {
    tracing::error!(operation, class = ?fault.class(), kernel = fault.kernel(), %fault, "device fault, aborting");
    eprintln!("parcoll: device fault during {operation}: {fault}");
    std::process::abort()
}
