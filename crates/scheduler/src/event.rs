use rtrb::{Consumer, Producer, RingBuffer};

const LISTENER_CAPACITY: usize = 16;

/// Lifecycle notifications, emitted on successful start and stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    PlayStarted,
    PlayStopped,
}

/// One ring buffer per subscriber; the host polls its consumer.
#[derive(Default)]
pub(crate) struct EventListeners {
    producers: Vec<Producer<SchedulerEvent>>,
}

impl EventListeners {
    pub fn subscribe(&mut self) -> Consumer<SchedulerEvent> {
        let (producer, consumer) = RingBuffer::new(LISTENER_CAPACITY);
        self.producers.push(producer);
        consumer
    }

    pub fn emit(&mut self, event: SchedulerEvent) {
        self.producers.retain(|producer| !producer.is_abandoned());
        for producer in &mut self.producers {
            if producer.push(event).is_err() {
                log::warn!("event listener queue full, dropping {event:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_subscriber_receives_events() {
        let mut listeners = EventListeners::default();
        let mut first = listeners.subscribe();
        let mut second = listeners.subscribe();

        listeners.emit(SchedulerEvent::PlayStarted);
        listeners.emit(SchedulerEvent::PlayStopped);

        for consumer in [&mut first, &mut second] {
            assert_eq!(consumer.pop().ok(), Some(SchedulerEvent::PlayStarted));
            assert_eq!(consumer.pop().ok(), Some(SchedulerEvent::PlayStopped));
            assert!(consumer.pop().is_err());
        }
    }

    #[test]
    fn test_dropped_subscriber_is_removed() {
        let mut listeners = EventListeners::default();
        let consumer = listeners.subscribe();
        drop(consumer);

        listeners.emit(SchedulerEvent::PlayStarted);
        assert!(listeners.producers.is_empty());
    }

    #[test]
    fn test_full_queue_drops_events() {
        let mut listeners = EventListeners::default();
        let mut consumer = listeners.subscribe();

        for _ in 0..LISTENER_CAPACITY + 4 {
            listeners.emit(SchedulerEvent::PlayStarted);
        }

        let mut received = 0;
        while consumer.pop().is_ok() {
            received += 1;
        }
        assert_eq!(received, LISTENER_CAPACITY);
    }
}
