//! Integration tests for the signal dispatch system.
//!
//! Tests cover: connect/send, payload filtering, disconnect, dispatch order,
//! re-entrant connect from inside a receiver, and cross-thread dispatch.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use formflow_signals::Signal;

// ═════════════════════════════════════════════════════════════════════
// 1. Signal connect and send: handler receives data
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_signal_connect_and_send_receives_data() {
    let signal: Signal<String> = Signal::new();
    let received = Arc::new(Mutex::new(String::new()));
    let received_clone = received.clone();

    signal.connect(
        "capture",
        Arc::new(move |msg: &String| {
            *received_clone.lock().unwrap() = msg.clone();
        }),
    );

    signal.send(&"hello world".to_string());
    assert_eq!(*received.lock().unwrap(), "hello world");
}

// ═════════════════════════════════════════════════════════════════════
// 2. Receivers filter on the payload themselves
// ═════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct FormEvent {
    form_id: String,
}

#[test]
fn test_signal_payload_filtering() {
    let signal: Signal<FormEvent> = Signal::new();
    let contact_count = Arc::new(AtomicUsize::new(0));
    let async_count = Arc::new(AtomicUsize::new(0));

    let cc = contact_count.clone();
    signal.connect(
        "contact_listener",
        Arc::new(move |event: &FormEvent| {
            if event.form_id == "contact-form" {
                cc.fetch_add(1, Ordering::SeqCst);
            }
        }),
    );

    let ac = async_count.clone();
    signal.connect(
        "async_listener",
        Arc::new(move |event: &FormEvent| {
            if event.form_id == "async-form" {
                ac.fetch_add(1, Ordering::SeqCst);
            }
        }),
    );

    signal.send(&FormEvent {
        form_id: "contact-form".to_string(),
    });
    signal.send(&FormEvent {
        form_id: "contact-form".to_string(),
    });
    signal.send(&FormEvent {
        form_id: "async-form".to_string(),
    });

    assert_eq!(contact_count.load(Ordering::SeqCst), 2);
    assert_eq!(async_count.load(Ordering::SeqCst), 1);
}

// ═════════════════════════════════════════════════════════════════════
// 3. Disconnect stops the handler
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_signal_disconnect_stops_handler() {
    let signal: Signal<()> = Signal::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();

    signal.connect(
        "counter",
        Arc::new(move |(): &()| {
            c.fetch_add(1, Ordering::SeqCst);
        }),
    );

    signal.send(&());
    assert!(signal.disconnect("counter"));
    signal.send(&());

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

// ═════════════════════════════════════════════════════════════════════
// 4. Handlers fire in connection order
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_multiple_handlers_fire_in_order() {
    let signal: Signal<()> = Signal::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second", "third"] {
        let o = order.clone();
        signal.connect(
            name,
            Arc::new(move |(): &()| {
                o.lock().unwrap().push(name);
            }),
        );
    }

    assert_eq!(signal.send(&()), 3);
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

// ═════════════════════════════════════════════════════════════════════
// 5. A receiver may mutate the receiver list during dispatch
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_receiver_can_disconnect_itself() {
    let signal = Arc::new(Signal::<()>::new());
    let fired = Arc::new(AtomicUsize::new(0));

    let s = Arc::downgrade(&signal);
    let f = fired.clone();
    signal.connect(
        "once",
        Arc::new(move |(): &()| {
            f.fetch_add(1, Ordering::SeqCst);
            if let Some(signal) = s.upgrade() {
                signal.disconnect("once");
            }
        }),
    );

    signal.send(&());
    signal.send(&());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(signal.receiver_count(), 0);
}

// ═════════════════════════════════════════════════════════════════════
// 6. Dispatch from another thread
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_send_from_other_thread() {
    let signal = Arc::new(Signal::<u32>::new());
    let seen = Arc::new(AtomicBool::new(false));
    let s = seen.clone();
    signal.connect(
        "flag",
        Arc::new(move |v: &u32| {
            if *v == 7 {
                s.store(true, Ordering::SeqCst);
            }
        }),
    );

    let sig = signal.clone();
    std::thread::spawn(move || {
        sig.send(&7);
    })
    .join()
    .unwrap();

    assert!(seen.load(Ordering::SeqCst));
}
