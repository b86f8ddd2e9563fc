// Capacity module - CPU-count based slot computation

use crate::error::{Result, SimherdError};
use sysinfo::System;

/// Number of logical cores visible to the process
pub fn available_cores() -> usize {
    let system = System::new_all();
    system.cpus().len()
}

/// Compute the number of slots for a given per-slot core reservation.
///
/// Capacity is the integer division `available / cores_per_slot`; a machine
/// that cannot host a single slot is an error.
pub fn slot_count(available: usize, cores_per_slot: usize) -> Result<usize> {
    let slots = available / cores_per_slot.max(1);

    if slots == 0 {
        return Err(SimherdError::InsufficientCores {
            available,
            required: cores_per_slot,
        });
    }

    Ok(slots)
}

/// Detect the slot count for this machine
pub fn detect_slot_count(cores_per_slot: usize) -> Result<usize> {
    slot_count(available_cores(), cores_per_slot)
}
