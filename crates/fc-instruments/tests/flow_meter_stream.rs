//! Integration test: a flow meter log followed by a streaming instrument.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use fc_instruments::{
    FlowMeterParser, Instrument, OperatingRange, StreamingInstrument, StreamingOptions, TailSource,
};

fn wait_until(mut ready: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while !ready() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn appended_records_are_smoothed_and_broadcast() {
    let mut log = tempfile::NamedTempFile::new().expect("temp log");
    writeln!(log, "Time,Status,Channel,Counts").unwrap();
    log.flush().unwrap();

    let source = TailSource::open(log.path(), FlowMeterParser::new(0.01, 0.0)).expect("open log");
    let options = StreamingOptions {
        poll_interval: Duration::from_millis(2),
        smoothing_window: Some(2),
        join_timeout: Duration::from_secs(2),
        range: Some(OperatingRange::new(1.8, 3.2)),
    };
    let meter = StreamingInstrument::spawn("flow A", source, options).expect("spawn reader");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    meter.subscribe(Box::new(move |v| sink.lock().unwrap().push(v)));

    assert_eq!(meter.current_value(), None);
    assert!(!meter.is_within_range());

    writeln!(log, "10:00:00,OK,1,\"200\"").unwrap();
    writeln!(log, "10:00:01,OK,1,\"300\"").unwrap();
    log.flush().unwrap();

    wait_until(|| meter.current_value() == Some(2.5));
    assert!(meter.is_within_range());
    assert_eq!(*seen.lock().unwrap(), vec![2.0, 2.5]);

    meter.close();
    meter.join();
    writeln!(log, "10:00:02,OK,1,\"900\"").unwrap();
    log.flush().unwrap();
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(meter.current_value(), Some(2.5));
}
