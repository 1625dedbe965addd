//! Integration tests for room-monitor host-testable logic.

use std::cell::RefCell;
use std::collections::VecDeque;

use room_monitor::advertising::{contains_service_uuid128, ADV_DATA, SERVICE_UUID_LE};
use room_monitor::sensor::EdgeForwarder;
use room_monitor::wire::{ACOUSTIC_LEN, ENVIRONMENT_LEN, GAS_PANEL_LEN};
use room_monitor::{
    CharId, CharacteristicRegistry, Context, DisconnectReason, EdgeListener, EnvironmentReading,
    Event, EventSink, GasSample, LinkPolicy, NotifyError, Orchestrator, PendingSubscriptions,
    ReadError, RegistryError, Step, Transport, TransportError,
};

#[derive(Default)]
struct RecordingTransport {
    notified: Vec<(u16, CharId, Vec<u8>)>,
    attributes: Vec<(CharId, Vec<u8>)>,
    released: Vec<u16>,
}

impl Transport for RecordingTransport {
    type Handle = u16;

    fn notify(&mut self, link: &u16, id: CharId, value: &[u8]) -> Result<(), TransportError> {
        self.notified.push((*link, id, value.to_vec()));
        Ok(())
    }

    fn publish(&mut self, id: CharId, value: &[u8]) -> Result<(), TransportError> {
        self.attributes.push((id, value.to_vec()));
        Ok(())
    }

    fn release(&mut self, link: u16) {
        self.released.push(link);
    }
}

/// Bounded queue shared by producers; the test plays the consumer.
struct Queue {
    events: RefCell<VecDeque<Event<u16>>>,
    depth: usize,
}

impl Queue {
    fn new(depth: usize) -> Self {
        Self {
            events: RefCell::new(VecDeque::new()),
            depth,
        }
    }

    fn drain_into(&self, orch: &mut Orchestrator<RecordingTransport>) -> Vec<Step> {
        let mut steps = Vec::new();
        while let Some(event) = self.events.borrow_mut().pop_front() {
            steps.push(orch.handle(event).expect("registry contract"));
        }
        steps
    }
}

impl EventSink for &Queue {
    type Handle = u16;

    fn try_push(&self, event: Event<u16>) -> Result<(), Event<u16>> {
        let mut events = self.events.borrow_mut();
        if events.len() >= self.depth {
            return Err(event);
        }
        events.push_back(event);
        Ok(())
    }
}

fn orchestrator(policy: LinkPolicy) -> Orchestrator<RecordingTransport> {
    Orchestrator::new(Context::new(RecordingTransport::default(), policy))
}

#[test]
fn registry_wire_layout_sizes() {
    let reg = CharacteristicRegistry::with_wire_layout();
    assert_eq!(reg.read(CharId::GasPanel).unwrap().len(), GAS_PANEL_LEN);
    assert_eq!(reg.read(CharId::Environment).unwrap().len(), ENVIRONMENT_LEN);
    assert_eq!(reg.read(CharId::Acoustic).unwrap().len(), ACOUSTIC_LEN);

    let mut empty = CharacteristicRegistry::new();
    assert_eq!(
        empty.write(CharId::Acoustic, &[1]),
        Err(RegistryError::Undefined(CharId::Acoustic))
    );
}

#[test]
fn full_session_through_the_queue() {
    let queue = Queue::new(16);
    let mut orch = orchestrator(LinkPolicy::RejectNew);
    let sink = &queue;

    sink.try_push(Event::LinkEstablished(0x10)).unwrap();
    sink.try_push(Event::Subscription {
        link: 0x10,
        id: CharId::Environment,
        enabled: true,
    })
    .unwrap();
    sink.try_push(Event::Subscription {
        link: 0x10,
        id: CharId::Acoustic,
        enabled: true,
    })
    .unwrap();
    sink.try_push(Event::Gas(Ok(GasSample {
        channels: [Ok(0.5); 5],
    })))
    .unwrap();
    sink.try_push(Event::Environment(Ok(EnvironmentReading {
        temperature_c: 23.5,
        humidity_pct: 41.0,
    })))
    .unwrap();

    let forwarder = EdgeForwarder::new(sink);
    for _ in 0..3 {
        forwarder.on_edge();
    }
    sink.try_push(Event::LinkLost(0x10, DisconnectReason::RemoteUserTerminated))
        .unwrap();

    let steps = queue.drain_into(&mut orch);
    assert_eq!(steps.len(), 9);
    assert_eq!(
        steps[3],
        Step::Published {
            id: CharId::GasPanel,
            notify: Err(NotifyError::NotSubscribed)
        }
    );

    let transport = orch.context().connection.transport();
    let notified: Vec<(CharId, &[u8])> = transport
        .notified
        .iter()
        .map(|(link, id, bytes)| {
            assert_eq!(*link, 0x10);
            (*id, bytes.as_slice())
        })
        .collect();
    let expected: Vec<(CharId, &[u8])> = vec![
        (CharId::Environment, &[0x00, 0x00, 0xBC, 0x41, 0x00, 0x00, 0x24, 0x42][..]),
        (CharId::Acoustic, &[1, 0, 0, 0][..]),
        (CharId::Acoustic, &[2, 0, 0, 0][..]),
        (CharId::Acoustic, &[3, 0, 0, 0][..]),
    ];
    assert_eq!(notified, expected);
    // Every buffer update is also visible to pull-based reads.
    assert_eq!(transport.attributes.len(), 5);

    assert!(!orch.context().connection.is_connected());
    assert!(!orch.context().registry.is_subscribed(CharId::Environment));
}

#[test]
fn edges_beyond_queue_depth_are_dropped() {
    let queue = Queue::new(4);
    let forwarder = EdgeForwarder::new(&queue);
    for _ in 0..10 {
        forwarder.on_edge();
    }
    assert_eq!(forwarder.dropped(), 6);

    let mut orch = orchestrator(LinkPolicy::RejectNew);
    queue.drain_into(&mut orch);
    assert_eq!(orch.sound_count(), 4);
}

#[test]
fn replace_old_hands_over_to_the_new_central() {
    let mut orch = orchestrator(LinkPolicy::ReplaceOld);
    orch.handle(Event::LinkEstablished(1)).unwrap();
    orch.handle(Event::Subscription {
        link: 1,
        id: CharId::Acoustic,
        enabled: true,
    })
    .unwrap();
    orch.handle(Event::LinkEstablished(2)).unwrap();

    // The new central has not written its own descriptor yet.
    assert_eq!(
        orch.handle(Event::AcousticEdge).unwrap(),
        Step::Published {
            id: CharId::Acoustic,
            notify: Err(NotifyError::NotSubscribed)
        }
    );

    // A late write from the evicted central does not count either.
    assert_eq!(
        orch.handle(Event::Subscription {
            link: 1,
            id: CharId::Acoustic,
            enabled: true,
        })
        .unwrap(),
        Step::Ignored
    );

    orch.handle(Event::Subscription {
        link: 2,
        id: CharId::Acoustic,
        enabled: true,
    })
    .unwrap();
    assert_eq!(
        orch.handle(Event::AcousticEdge).unwrap(),
        Step::Published {
            id: CharId::Acoustic,
            notify: Ok(())
        }
    );

    // The stale link-lost for the replaced link changes nothing.
    assert_eq!(
        orch.handle(Event::LinkLost(1, DisconnectReason::LocalHostTerminated))
            .unwrap(),
        Step::Ignored
    );

    let transport = orch.context().connection.transport();
    assert_eq!(transport.released, vec![1]);
    assert_eq!(transport.notified.len(), 1);
    assert_eq!(transport.notified[0].0, 2);
    assert_eq!(transport.notified[0].2, 2u32.to_le_bytes());
}

#[test]
fn descriptor_writes_survive_a_queue_full_of_edges() {
    let queue = Queue::new(4);
    let mut orch = orchestrator(LinkPolicy::RejectNew);
    orch.handle(Event::LinkEstablished(7)).unwrap();

    let forwarder = EdgeForwarder::new(&queue);
    for _ in 0..4 {
        forwarder.on_edge();
    }

    // The central toggles a descriptor while the queue has no room.
    let pending = PendingSubscriptions::new();
    pending.record(CharId::Acoustic, false);
    pending.record(CharId::Acoustic, true);
    forwarder.on_edge();
    assert_eq!(forwarder.dropped(), 1);

    // Once the orchestrator catches up the recorded state goes through.
    queue.drain_into(&mut orch);
    for (id, enabled) in pending.take() {
        (&queue)
            .try_push(Event::Subscription {
                link: 7,
                id,
                enabled,
            })
            .unwrap();
    }
    forwarder.on_edge();

    let steps = queue.drain_into(&mut orch);
    assert_eq!(
        steps,
        vec![
            Step::Subscription {
                id: CharId::Acoustic,
                enabled: true
            },
            Step::Published {
                id: CharId::Acoustic,
                notify: Ok(())
            },
        ]
    );
    assert!(pending.is_empty());
}

#[test]
fn sensor_failures_do_not_stop_the_pipeline() {
    let mut orch = orchestrator(LinkPolicy::RejectNew);
    orch.handle(Event::LinkEstablished(1)).unwrap();
    orch.handle(Event::Subscription {
        link: 1,
        id: CharId::GasPanel,
        enabled: true,
    })
    .unwrap();

    assert_eq!(
        orch.handle(Event::Environment(Err(ReadError::Checksum {
            expected: 1,
            actual: 2
        })))
        .unwrap(),
        Step::Skipped(ReadError::Checksum {
            expected: 1,
            actual: 2
        })
    );
    orch.handle(Event::Gas(Err(ReadError::Bus))).unwrap();

    let transport = orch.context().connection.transport();
    assert_eq!(transport.notified.len(), 1);
    let expected: Vec<u8> = (0..5).flat_map(|_| (-1.0f32).to_le_bytes()).collect();
    assert_eq!(transport.notified[0].2, expected);
}

#[test]
fn advertising_lists_the_sensor_service() {
    assert!(contains_service_uuid128(&ADV_DATA, &SERVICE_UUID_LE));
}
