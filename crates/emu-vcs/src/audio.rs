//! Audio hand-off to the host.
//!
//! The TIA produces one unsigned 8-bit sample every 114 colour clocks. The
//! core pushes them into a bounded lock-free ring; the host's audio thread
//! pops them at its own pace. Underflow replays the last value so gaps do
//! not click; overflow drops the incoming sample and counts the overrun.

use log::trace;
use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapRb,
};

/// Ring capacity in samples. At roughly 31.4 kHz this is a generous
/// fraction of a second of slack.
pub const DEFAULT_CAPACITY: usize = 8192;

/// Create a connected producer/consumer pair.
#[must_use]
pub fn audio_ring(capacity: usize) -> (AudioProducer, AudioConsumer) {
    let ring = HeapRb::<u8>::new(capacity);
    let (producer, consumer) = ring.split();
    (
        AudioProducer {
            producer,
            overruns: 0,
        },
        AudioConsumer {
            consumer,
            last: 0x00,
        },
    )
}

/// Core-side handle: samples go in here as the TIA mixes them.
pub struct AudioProducer {
    producer: ringbuf::HeapProd<u8>,
    overruns: u64,
}

impl AudioProducer {
    pub fn push(&mut self, sample: u8) {
        if self.producer.try_push(sample).is_err() {
            self.overruns += 1;
            trace!("audio ring overrun ({} total)", self.overruns);
        }
    }

    /// Samples dropped because the host was not keeping up.
    #[must_use]
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

/// Host-side handle, safe to move to the audio thread.
pub struct AudioConsumer {
    consumer: ringbuf::HeapCons<u8>,
    last: u8,
}

impl AudioConsumer {
    /// Pop one sample, replaying the last value on underflow.
    pub fn pop(&mut self) -> u8 {
        match self.consumer.try_pop() {
            Some(sample) => {
                self.last = sample;
                sample
            }
            None => self.last,
        }
    }

    /// Fill a host buffer.
    pub fn fill(&mut self, buffer: &mut [u8]) {
        for slot in buffer {
            *slot = self.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_round_trip() {
        let (mut producer, mut consumer) = audio_ring(16);
        producer.push(0x10);
        producer.push(0x20);
        assert_eq!(consumer.pop(), 0x10);
        assert_eq!(consumer.pop(), 0x20);
    }

    #[test]
    fn underflow_replays_last_value() {
        let (mut producer, mut consumer) = audio_ring(16);
        producer.push(0x42);
        assert_eq!(consumer.pop(), 0x42);
        assert_eq!(consumer.pop(), 0x42);
        assert_eq!(consumer.pop(), 0x42);
    }

    #[test]
    fn overflow_counts_overruns() {
        let (mut producer, _consumer) = audio_ring(4);
        for i in 0..10 {
            producer.push(i);
        }
        assert!(producer.overruns() > 0);
    }
}
