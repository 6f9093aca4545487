//! Lock-free transport command queue
//!
//! The sync group is single-threaded: it lives on the thread that owns the
//! host media elements. Other threads (a MIDI controller, a network remote)
//! queue transport commands through an `rtrb` ring buffer instead, and the
//! group applies them at its next [`SyncGroup::process_commands`] call.
//!
//! ```ignore
//! let (mut tx, mut rx) = command_channel();
//!
//! // Controller thread (never blocks)
//! tx.push(TransportCommand::Seek(42.0)).ok();
//!
//! // Loop thread
//! group.process_commands(&mut rx);
//! ```
//!
//! [`SyncGroup::process_commands`]: crate::group::SyncGroup::process_commands

/// Commands mirroring the group's public transport API
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportCommand {
    Play,
    Pause,
    /// Seek every track to a position in seconds
    Seek(f64),
    SetPlaybackRate(f64),
    SetLoop(bool),
    SetDisabled(bool),
}

/// Capacity of the command queue
///
/// Transport commands come from human gestures; a scrub burst is the
/// largest realistic batch between two loop turns.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Producer for the controlling thread, consumer for the sync loop
pub fn command_channel() -> (
    rtrb::Producer<TransportCommand>,
    rtrb::Consumer<TransportCommand>,
) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_arrive_in_order() {
        let (mut tx, mut rx) = command_channel();
        tx.push(TransportCommand::Seek(12.5)).unwrap();
        tx.push(TransportCommand::Play).unwrap();

        assert_eq!(rx.pop().unwrap(), TransportCommand::Seek(12.5));
        assert_eq!(rx.pop().unwrap(), TransportCommand::Play);
        assert!(rx.pop().is_err());
    }

    #[test]
    fn test_full_queue_rejects_without_blocking() {
        let (mut tx, _rx) = command_channel();
        for _ in 0..COMMAND_QUEUE_CAPACITY {
            tx.push(TransportCommand::Pause).unwrap();
        }
        assert!(tx.push(TransportCommand::Play).is_err());
    }

    #[test]
    fn test_command_size() {
        // Commands are copied through the ring buffer; keep them small
        let size = std::mem::size_of::<TransportCommand>();
        assert!(size <= 16, "TransportCommand is {} bytes, expected <= 16", size);
    }
}
