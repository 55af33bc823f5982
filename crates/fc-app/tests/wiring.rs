//! Integration test: connecting to a local stand-in for the plant.

use std::io::Write;
use std::net::TcpListener;

use fc_app::{AppError, InstrumentConfig, connect_hardware};
use fc_instruments::InstrumentError;

fn listener() -> (TcpListener, u16) {
    let l = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = l.local_addr().unwrap().port();
    (l, port)
}

fn config_with_logs(dir: &std::path::Path) -> InstrumentConfig {
    let mut cfg = InstrumentConfig::default();
    for (name, meter) in [
        ("a.csv", &mut cfg.flow_a),
        ("b.csv", &mut cfg.flow_b),
        ("solvent.csv", &mut cfg.flow_solvent),
    ] {
        meter.path = dir.join(name);
        std::fs::File::create(&meter.path).unwrap().write_all(b"header\n").unwrap();
    }
    cfg.temperature_log = dir.join("temperature.csv");
    std::fs::File::create(&cfg.temperature_log).unwrap();
    cfg.host = "127.0.0.1".into();
    cfg
}

#[test]
fn connects_every_channel() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_with_logs(dir.path());
    let listeners: Vec<_> = (0..5).map(|_| listener()).collect();
    cfg.valve_port = listeners[0].1;
    cfg.solvent_pump_port = listeners[1].1;
    cfg.pump_b_port = listeners[2].1;
    cfg.pump_a_port = listeners[3].1;
    cfg.balance_port = listeners[4].1;

    let (sensors, actuators) = connect_hardware(&cfg).unwrap();
    assert_eq!(sensors.temperature.name(), "temperature");
    assert!(sensors.pressure.is_none());
    assert_eq!(actuators.pump_a.name(), "pump A");
    assert_eq!(actuators.pump_a.speed_percent(), 0.0);
    assert!(sensors.flow_a.current_value().is_none());
    sensors.close_all();
}

#[test]
fn unreachable_actuator_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_with_logs(dir.path());
    cfg.valve_port = {
        let (_closed, port) = listener();
        port
    };
    let err = connect_hardware(&cfg).err().expect("connection must fail");
    assert!(matches!(err, AppError::Instrument(InstrumentError::Connect { .. })));
}

#[test]
fn missing_instrument_log_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_with_logs(dir.path());
    cfg.temperature_log = dir.path().join("absent.csv");
    assert!(matches!(
        connect_hardware(&cfg),
        Err(AppError::Instrument(InstrumentError::Io(_)))
    ));
}
