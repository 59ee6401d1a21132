//! Latest-value handoff of analyzed spectra from a capture thread to a
//! render/query thread.
//!
//! The producer copies each finished spectrum into a shared slot and bumps a
//! sequence number while holding the slot lock. The consumer checks the
//! sequence without locking and only takes the lock to copy a spectrum it
//! has not seen. A reader therefore never observes a half-written spectrum,
//! and the sequence tells it how many frames it missed in between.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::Spectrum;

#[derive(Debug, Default)]
struct Slot {
    latest: Mutex<Option<Spectrum>>,
    sequence: AtomicU64,
    closed: AtomicBool,
}

pub fn handoff() -> (SpectrumPublisher, SpectrumSubscriber) {
    let shared = Arc::new(Slot::default());
    (
        SpectrumPublisher {
            shared: Arc::clone(&shared),
        },
        SpectrumSubscriber {
            shared,
            last_seen: 0,
        },
    )
}

/// Producer half. Dropping it marks the stream finished.
#[derive(Debug)]
pub struct SpectrumPublisher {
    shared: Arc<Slot>,
}

impl SpectrumPublisher {
    /// Copy `spectrum` into the slot; returns its sequence number (from 1).
    pub fn publish(&self, spectrum: &Spectrum) -> u64 {
        let mut slot = self.shared.latest.lock();
        match slot.as_mut() {
            Some(existing) => existing.clone_from(spectrum),
            None => *slot = Some(spectrum.clone()),
        }
        self.shared.sequence.fetch_add(1, Ordering::Release) + 1
    }

    pub fn published(&self) -> u64 {
        self.shared.sequence.load(Ordering::Acquire)
    }

    pub fn close(self) {}
}

impl Drop for SpectrumPublisher {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
    }
}

#[derive(Debug, Clone)]
pub struct PolledFrame {
    pub spectrum: Spectrum,
    /// Sequence number assigned by the publisher.
    pub sequence: u64,
    /// Frames published since the previous poll that were never observed.
    pub skipped: u64,
}

/// Consumer half.
#[derive(Debug)]
pub struct SpectrumSubscriber {
    shared: Arc<Slot>,
    last_seen: u64,
}

impl SpectrumSubscriber {
    /// Newest spectrum if one was published since the last successful poll.
    pub fn poll(&mut self) -> Option<PolledFrame> {
        if self.shared.sequence.load(Ordering::Acquire) == self.last_seen {
            return None;
        }

        let slot = self.shared.latest.lock();
        // stable while the lock is held
        let sequence = self.shared.sequence.load(Ordering::Acquire);
        let spectrum = slot.as_ref()?.clone();
        drop(slot);

        let skipped = sequence - self.last_seen - 1;
        self.last_seen = sequence;
        Some(PolledFrame {
            spectrum,
            sequence,
            skipped,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Publisher gone and its final frame already polled.
    pub fn is_finished(&self) -> bool {
        // closed first: everything published before close is then visible
        self.is_closed() && self.shared.sequence.load(Ordering::Acquire) == self.last_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(tag: u64) -> Spectrum {
        let mut s = Spectrum::silent(8, 800);
        s.max_power = tag as f32;
        s.bins[1].power = tag as f32;
        s
    }

    #[test]
    fn nothing_to_poll_before_publish() {
        let (_publisher, mut subscriber) = handoff();
        assert!(subscriber.poll().is_none());
        assert!(!subscriber.is_closed());
    }

    #[test]
    fn delivers_each_frame_once() {
        let (publisher, mut subscriber) = handoff();
        assert_eq!(publisher.publish(&tagged(7)), 1);

        let frame = subscriber.poll().unwrap();
        assert_eq!(frame.sequence, 1);
        assert_eq!(frame.skipped, 0);
        assert_eq!(frame.spectrum, tagged(7));
        assert!(subscriber.poll().is_none());
    }

    #[test]
    fn reports_skipped_frames() {
        let (publisher, mut subscriber) = handoff();
        for tag in 1..=3 {
            publisher.publish(&tagged(tag));
        }
        let frame = subscriber.poll().unwrap();
        assert_eq!(frame.sequence, 3);
        assert_eq!(frame.skipped, 2);
        assert_eq!(frame.spectrum.max_power, 3.0);
        assert_eq!(publisher.published(), 3);
    }

    #[test]
    fn finished_only_after_final_frame_is_read() {
        let (publisher, mut subscriber) = handoff();
        publisher.publish(&tagged(1));
        publisher.close();
        assert!(subscriber.is_closed());
        assert!(!subscriber.is_finished());
        assert!(subscriber.poll().is_some());
        assert!(subscriber.is_finished());
    }

    #[test]
    fn consistent_frames_across_threads() {
        const TOTAL: u64 = 2000;
        let (publisher, mut subscriber) = handoff();

        let producer = std::thread::spawn(move || {
            for tag in 1..=TOTAL {
                publisher.publish(&tagged(tag));
            }
        });

        let mut delivered = 0;
        let mut skipped = 0;
        let mut last = 0;
        while !subscriber.is_finished() {
            if let Some(frame) = subscriber.poll() {
                assert!(frame.sequence > last);
                // slot content always matches the sequence it was read with
                assert_eq!(frame.spectrum.max_power, frame.sequence as f32);
                assert_eq!(frame.spectrum.bins[1].power, frame.sequence as f32);
                last = frame.sequence;
                delivered += 1;
                skipped += frame.skipped;
            } else {
                std::thread::yield_now();
            }
        }
        producer.join().unwrap();

        assert_eq!(last, TOTAL);
        assert_eq!(delivered + skipped, TOTAL);
    }
}
