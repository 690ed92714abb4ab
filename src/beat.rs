//! Beat channel between the audio clock and the display clock.

/*
Beat Broadcaster
================

Two clocks, one bridge:

    audio clock                          display clock
    ───────────                          ─────────────
    sequencer kick ─→ BeatPublisher ──rtrb──→ BeatBroadcaster::tick()
                                                 │ drain → publish(time, velocity)
    kit filter ─→ beat window (128) ─────────────┤ nothing drained → energy × 0.98,
                                                 │   implicit detection on the window
                                                 ↓
                                         energy scalar + subscriber callbacks

The audio side only ever pushes into a lock-free ring: O(1), never blocks,
and drops the event if the display side has fallen a whole ring behind.
Everything else happens on the display clock.

Energy
------

    publish(v):        energy = min(1, energy + v × 0.5)
    tick, no beats:    energy = energy × 0.98
                       if mean|window| > 0.5 and energy < 0.5:
                           publish(now, mean|window|)

A tick that drains an explicit beat does not decay; the beat replaces the
decay for that frame. The 0.5 threshold gives hysteresis: a loud window only
counts as a beat once the energy from the last one has mostly died away.

Subscribers
-----------

Registration hands back a `BeatSubscription` holding an opaque token.
Unregistering removes exactly that entry, even if the same callback was
registered twice. Dispatch snapshots the registry and checks each entry's
liveness flag right before calling it, so:

  * registering or unregistering from inside a callback is fine,
  * once `unregister` returns, that callback is never called again.

A panicking callback is caught and logged; the rest still run.
*/

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::dsp::modulate::mean_abs;

pub const ENERGY_DECAY: f32 = 0.98;
pub const BEAT_THRESHOLD: f32 = 0.5;
/// Share of a beat's velocity added to the energy.
pub const ENERGY_BOOST: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    /// Audio-clock seconds.
    pub time: f64,
    pub velocity: f32,
}

type Callback = Arc<dyn Fn(f64, f32) + Send + Sync>;

struct Entry {
    token: u64,
    alive: Arc<AtomicBool>,
    callback: Callback,
}

type Registry = Arc<Mutex<Vec<Entry>>>;

fn lock(registry: &Mutex<Vec<Entry>>) -> MutexGuard<'_, Vec<Entry>> {
    match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Create a beat ring. The publisher goes to the audio graph, the consumer to
/// [`BeatBroadcaster::attach`].
pub fn beat_channel(capacity: usize) -> (BeatPublisher, Consumer<BeatEvent>) {
    let (producer, consumer) = RingBuffer::new(capacity.max(1));
    (
        BeatPublisher {
            producer,
            dropped: 0,
        },
        consumer,
    )
}

/// Audio-side end of the beat ring.
pub struct BeatPublisher {
    producer: Producer<BeatEvent>,
    dropped: u64,
}

impl BeatPublisher {
    /// Queue a beat. Returns false (and counts a drop) if the ring is full.
    pub fn publish(&mut self, time: f64, velocity: f32) -> bool {
        match self.producer.push(BeatEvent { time, velocity }) {
            Ok(()) => true,
            Err(PushError::Full(_)) => {
                self.dropped += 1;
                false
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Handle returned by [`BeatBroadcaster::register`].
pub struct BeatSubscription {
    token: u64,
    alive: Arc<AtomicBool>,
    registry: Weak<Mutex<Vec<Entry>>>,
}

impl BeatSubscription {
    /// Remove this registration. No events reach the callback afterwards.
    pub fn unregister(self) {
        self.alive.store(false, Ordering::Release);
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).retain(|entry| entry.token != self.token);
        }
    }

    pub fn is_active(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

pub struct BeatBroadcaster {
    energy: AtomicU32,
    registry: Registry,
    next_token: AtomicU64,
    queue: Mutex<Option<Consumer<BeatEvent>>>,
}

impl Default for BeatBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl BeatBroadcaster {
    pub fn new() -> Self {
        Self {
            energy: AtomicU32::new(0.0f32.to_bits()),
            registry: Arc::new(Mutex::new(Vec::new())),
            next_token: AtomicU64::new(0),
            queue: Mutex::new(None),
        }
    }

    /// Start draining explicit beats from `consumer` on every tick. Replaces
    /// any previous ring.
    pub fn attach(&self, consumer: Consumer<BeatEvent>) {
        *self.queue_guard() = Some(consumer);
    }

    /// Stop draining. Beats still in the ring are dropped.
    pub fn detach(&self) {
        *self.queue_guard() = None;
    }

    pub fn register<F>(&self, callback: F) -> BeatSubscription
    where
        F: Fn(f64, f32) + Send + Sync + 'static,
    {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let alive = Arc::new(AtomicBool::new(true));

        lock(&self.registry).push(Entry {
            token,
            alive: Arc::clone(&alive),
            callback: Arc::new(callback),
        });

        BeatSubscription {
            token,
            alive,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn subscribers(&self) -> usize {
        lock(&self.registry).len()
    }

    /// Raise the energy and run every live callback in registration order.
    pub fn publish(&self, time: f64, velocity: f32) {
        if velocity.is_finite() {
            let energy = (self.energy() + velocity.max(0.0) * ENERGY_BOOST).min(1.0);
            self.set_energy(energy);
        }

        let snapshot: Vec<(Arc<AtomicBool>, Callback)> = lock(&self.registry)
            .iter()
            .map(|entry| (Arc::clone(&entry.alive), Arc::clone(&entry.callback)))
            .collect();

        for (alive, callback) in snapshot {
            if !alive.load(Ordering::Acquire) {
                continue;
            }
            if catch_unwind(AssertUnwindSafe(|| callback(time, velocity))).is_err() {
                log::error!("beat callback panicked at t={time:.3}");
            }
        }
    }

    /// Advance the display clock by one frame. `window` is the latest beat
    /// window, `now` the audio-clock time to stamp implicit beats with.
    /// Returns how many beats were published.
    pub fn tick(&self, window: Option<&[f32]>, now: f64) -> usize {
        let drained = self.drain();
        if !drained.is_empty() {
            let count = drained.len();
            for event in drained {
                self.publish(event.time, event.velocity);
            }
            return count;
        }

        self.set_energy(self.energy() * ENERGY_DECAY);

        let Some(window) = window else {
            return 0;
        };
        let average = mean_abs(window);
        if average > BEAT_THRESHOLD && self.energy() < BEAT_THRESHOLD {
            self.publish(now, average);
            return 1;
        }
        0
    }

    pub fn energy(&self) -> f32 {
        f32::from_bits(self.energy.load(Ordering::Acquire))
    }

    fn set_energy(&self, energy: f32) {
        let energy = energy.clamp(0.0, 1.0);
        self.energy.store(energy.to_bits(), Ordering::Release);
    }

    fn drain(&self) -> Vec<BeatEvent> {
        let mut queue = self.queue_guard();
        let Some(consumer) = queue.as_mut() else {
            return Vec::new();
        };

        let mut events = Vec::with_capacity(consumer.slots());
        while let Ok(event) = consumer.pop() {
            events.push(event);
        }
        events
    }

    fn queue_guard(&self) -> MutexGuard<'_, Option<Consumer<BeatEvent>>> {
        match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(f64, f32) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move |_, _| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn unregister_stops_delivery() {
        let broadcaster = BeatBroadcaster::new();
        let (count, callback) = counter();

        let subscription = broadcaster.register(callback);
        subscription.unregister();

        broadcaster.publish(0.0, 1.0);
        broadcaster.publish(0.5, 1.0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(broadcaster.subscribers(), 0);
    }

    #[test]
    fn duplicate_callbacks_are_separate_registrations() {
        let broadcaster = BeatBroadcaster::new();
        let count = Arc::new(AtomicUsize::new(0));
        let make = || {
            let count = Arc::clone(&count);
            move |_: f64, _: f32| {
                count.fetch_add(1, Ordering::SeqCst);
            }
        };

        let first = broadcaster.register(make());
        let _second = broadcaster.register(make());
        first.unregister();

        broadcaster.publish(0.0, 1.0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_callback_does_not_stop_others() {
        let broadcaster = BeatBroadcaster::new();
        let (count, callback) = counter();

        let _bad = broadcaster.register(|_, _| panic!("subscriber failure"));
        let _good = broadcaster.register(callback);

        broadcaster.publish(0.0, 1.0);
        broadcaster.publish(0.1, 1.0);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unregister_during_dispatch_is_safe() {
        let broadcaster = Arc::new(BeatBroadcaster::new());
        let (count, callback) = counter();

        let late = Arc::new(Mutex::new(None::<BeatSubscription>));
        let slot = Arc::clone(&late);
        let _first = broadcaster.register(move |_, _| {
            if let Some(subscription) = slot.lock().unwrap().take() {
                subscription.unregister();
            }
        });
        *late.lock().unwrap() = Some(broadcaster.register(callback));

        broadcaster.publish(0.0, 1.0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(broadcaster.subscribers(), 1);
    }

    #[test]
    fn publish_raises_energy_and_caps_at_one() {
        let broadcaster = BeatBroadcaster::new();
        broadcaster.publish(0.0, 0.5);
        assert_eq!(broadcaster.energy(), 0.25);

        broadcaster.publish(0.0, 1.0);
        broadcaster.publish(0.0, 1.0);
        assert_eq!(broadcaster.energy(), 1.0);
    }

    #[test]
    fn idle_ticks_decay_geometrically() {
        let broadcaster = BeatBroadcaster::new();
        broadcaster.publish(0.0, 1.6);
        let initial = broadcaster.energy();

        for _ in 0..10 {
            broadcaster.tick(None, 0.0);
        }
        let expected = initial * ENERGY_DECAY.powi(10);
        assert!((broadcaster.energy() - expected).abs() < 1e-6);
    }

    #[test]
    fn drained_beats_skip_decay() {
        let broadcaster = BeatBroadcaster::new();
        let (mut publisher, consumer) = beat_channel(8);
        broadcaster.attach(consumer);

        publisher.publish(1.0, 0.5);
        assert_eq!(broadcaster.tick(None, 1.0), 1);
        assert_eq!(broadcaster.energy(), 0.25);
    }

    #[test]
    fn loud_window_is_an_implicit_beat() {
        let broadcaster = BeatBroadcaster::new();
        let (count, callback) = counter();
        let _subscription = broadcaster.register(callback);

        let loud = [0.8f32; 128];
        assert_eq!(broadcaster.tick(Some(&loud), 2.0), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!((broadcaster.energy() - 0.4).abs() < 1e-6);

        // energy is now 0.4 (< 0.5), so the next loud frame fires again,
        // after which the energy is above the threshold and holds off
        assert_eq!(broadcaster.tick(Some(&loud), 2.1), 1);
        assert_eq!(broadcaster.tick(Some(&loud), 2.2), 0);
    }

    #[test]
    fn full_ring_drops() {
        let (mut publisher, _consumer) = beat_channel(1);
        assert!(publisher.publish(0.0, 1.0));
        assert!(!publisher.publish(0.1, 1.0));
        assert_eq!(publisher.dropped(), 1);
    }
}
