//! End-to-end collector host mode: enable, gather announcements from
//! peers, serve the retained set as one wire stream.

use crate::*;
use anyhow::Result;
use beacon_core::wire;

#[tokio::test]
async fn full_workflow_store_and_retrieve() -> Result<()> {
    let transport = TestTransport::spawn();
    transport.set_collector(true).await?;

    for i in 0..3u8 {
        let r = record(i as u64);
        transport
            .announce(
                peer(i),
                1_703_980_800 + i as u64 * 60,
                wire::encode_sample(&r)?,
                None,
            )
            .await?;
    }

    let stream = transport.request_stream().await?;
    let entries = wire::decode_stream(&stream)?;
    assert_eq!(entries.len(), 3);

    // store order is internal — match entries up by identity
    for i in 0..3u8 {
        let entry = entries
            .iter()
            .find(|e| e.source == peer(i))
            .expect("peer missing from stream");
        assert_eq!(entry.timestamp, 1_703_980_800 + i as u64 * 60);

        let sample = wire::decode_sample(&entry.payload)?;
        assert_eq!(sample, record(i as u64));
    }
    Ok(())
}

#[tokio::test]
async fn newer_announcement_replaces_older() -> Result<()> {
    let transport = TestTransport::spawn();
    transport.set_collector(true).await?;

    let payload = wire::encode_sample(&record(0))?;
    transport.announce(peer(1), 100, payload.clone(), None).await?;
    transport.announce(peer(1), 160, payload, None).await?;

    let entries = wire::decode_stream(&transport.request_stream().await?)?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].timestamp, 160);
    Ok(())
}

#[tokio::test]
async fn disable_clears_retained_telemetry() -> Result<()> {
    let transport = TestTransport::spawn();
    transport.set_collector(true).await?;
    transport
        .announce(peer(1), 100, wire::encode_sample(&record(1))?, None)
        .await?;

    let status = transport.set_collector(false).await?;
    assert!(status.success);
    assert!(!status.enabled);

    // re-enable: nothing came back
    transport.set_collector(true).await?;
    let entries = wire::decode_stream(&transport.request_stream().await?)?;
    assert!(entries.is_empty());
    Ok(())
}

#[tokio::test]
async fn announcements_while_disabled_are_dropped() -> Result<()> {
    let transport = TestTransport::spawn();
    // never enabled
    transport
        .announce(peer(1), 100, wire::encode_sample(&record(1))?, None)
        .await?;

    let stream = transport.request_stream().await?;
    let entries = wire::decode_stream(&stream)?;
    assert!(entries.is_empty(), "disabled collector retained data");
    Ok(())
}

#[tokio::test]
async fn fresh_service_answers_a_valid_empty_stream() -> Result<()> {
    let transport = TestTransport::spawn();
    let stream = transport.request_stream().await?;
    // a real subscriber must see a zero-element container, not garbage
    assert_eq!(&stream[..], &[0x90]);
    assert!(wire::decode_stream(&stream)?.is_empty());
    Ok(())
}

#[tokio::test]
async fn toggle_is_idempotent() -> Result<()> {
    let transport = TestTransport::spawn();

    let first = transport.set_collector(true).await?;
    transport
        .announce(peer(1), 100, wire::encode_sample(&record(1))?, None)
        .await?;
    let second = transport.set_collector(true).await?;
    assert!(first.enabled && second.enabled);

    // double-enable preserved the entry
    let entries = wire::decode_stream(&transport.request_stream().await?)?;
    assert_eq!(entries.len(), 1);

    let off = transport.set_collector(false).await?;
    let off_again = transport.set_collector(false).await?;
    assert!(off.success && off_again.success);
    assert!(!off_again.enabled);
    Ok(())
}

#[tokio::test]
async fn appearance_travels_end_to_end() -> Result<()> {
    let appearance = beacon_core::Appearance {
        icon: "map-marker".into(),
        foreground: bytes::Bytes::from_static(&[0xff, 0x00, 0x00]),
        background: bytes::Bytes::from_static(&[0x00, 0xff, 0x00]),
    };

    let transport = TestTransport::spawn();
    transport.set_collector(true).await?;
    transport
        .announce(
            peer(1),
            100,
            wire::encode_sample(&record(1))?,
            Some(appearance.clone()),
        )
        .await?;

    let entries = wire::decode_stream(&transport.request_stream().await?)?;
    assert_eq!(entries[0].appearance, Some(appearance));
    Ok(())
}
