//! Resolution against real servers. Run with `cargo test -- --ignored`.

use ferrous_resolv_domain::{AddressFamily, HostEntry, QueryResult, RecordType, ResolveError};
use std::time::Duration;

mod helpers;
use helpers::{drive, recorder, single, ConfigBuilder};

const LIMIT: Duration = Duration::from_secs(15);

fn public_config() -> ConfigBuilder {
    ConfigBuilder::new()
        .server("8.8.8.8:53".parse().unwrap())
        .server("1.1.1.1:53".parse().unwrap())
        .timeout(2.0)
        .tries(3)
}

#[test]
#[ignore]
fn test_google_a_record() {
    let mut channel = public_config().channel();
    let (outcomes, callback) = recorder::<QueryResult>();
    channel.query("google.com", RecordType::A, callback).unwrap();
    drive(&mut channel, LIMIT);

    let result = single(&outcomes).unwrap();
    assert_eq!(result.record_type(), RecordType::A);
    assert!(!result.addresses().is_empty());
}

#[test]
#[ignore]
fn test_nonexistent_domain() {
    let mut channel = public_config().channel();
    let (outcomes, callback) = recorder::<QueryResult>();
    channel
        .query("nonexistent.invalid-tld-ferrous", RecordType::A, callback)
        .unwrap();
    drive(&mut channel, LIMIT);

    assert_eq!(single(&outcomes), Err(ResolveError::NotFound));
}

#[test]
#[ignore]
fn test_unreachable_server_times_out() {
    let mut channel = ConfigBuilder::new()
        .server("1.2.3.4:53".parse().unwrap())
        .timeout(1.0)
        .tries(1)
        .channel();
    let (outcomes, callback) = recorder::<QueryResult>();
    channel.query("google.com", RecordType::A, callback).unwrap();
    drive(&mut channel, LIMIT);

    assert_eq!(single(&outcomes), Err(ResolveError::Timeout));
}

#[test]
#[ignore]
fn test_gethostbyname_public() {
    let mut channel = public_config().channel();
    let (outcomes, callback) = recorder::<HostEntry>();
    channel
        .gethostbyname("cloudflare.com", AddressFamily::Unspec, callback)
        .unwrap();
    drive(&mut channel, LIMIT);

    assert!(!single(&outcomes).unwrap().addresses.is_empty());
}

#[test]
#[ignore]
fn test_destroyed_channel() {
    let mut channel = public_config().channel();
    channel.destroy();
    assert_eq!(
        channel.query("google.com", RecordType::A, |_| {}),
        Err(ResolveError::ChannelDestroyed)
    );
}
