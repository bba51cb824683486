mod common;

use serde_json::{json, Value};
use std::io::{self, Cursor, Write};
use youtube_downloader_host::config::{DownloadSettings, NotificationSettings};
use youtube_downloader_host::dispatch::Dispatcher;
use youtube_downloader_host::host::{serve, LoopExit, NmError, StopSignal};

use common::{frame, split_frames, FakeDownloader, RecordingNotifier};

/// Writer whose pipe is already closed.
struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn dispatcher<'a>(
    downloader: &'a FakeDownloader,
    notifier: &'a RecordingNotifier,
) -> Dispatcher<&'a FakeDownloader, &'a RecordingNotifier> {
    Dispatcher::new(
        downloader,
        notifier,
        DownloadSettings::default(),
        NotificationSettings::default(),
    )
}

#[test]
fn three_requests_then_close() {
    let mut input = Vec::new();
    input.extend(frame(br#"{"url":"http://a","action":"high_quality"}"#));
    input.extend(frame(br#"{"action":"audio"}"#));
    input.extend(frame(br#"{"url":"http://c","action":"bogus"}"#));

    let downloader = FakeDownloader::succeeding("/videos/My Title.mp4");
    let notifier = RecordingNotifier::default();
    let d = dispatcher(&downloader, &notifier);
    let stop = StopSignal::new();
    let mut output = Vec::new();
    let exit = serve(&mut Cursor::new(input), &mut output, &stop, |req| d.process(&req)).unwrap();

    assert_eq!(exit, LoopExit::Disconnected);
    let replies = split_frames(&output);
    assert_eq!(
        replies,
        vec![
            json!({"status": "success", "action": "high_quality", "url": "http://a"}),
            json!({"status": "error", "message": "No URL provided"}),
            json!({"status": "error", "message": "Unknown action"}),
        ]
    );
    // only the valid request reached the downloader
    assert_eq!(downloader.calls.borrow().len(), 1);
    assert_eq!(notifier.sent.borrow().len(), 1);
}

#[test]
fn empty_input_stops_cleanly_without_output() {
    let stop = StopSignal::new();
    let mut output = Vec::new();
    let exit = serve(&mut Cursor::new(Vec::new()), &mut output, &stop, |v: Value| v).unwrap();
    assert_eq!(exit, LoopExit::Disconnected);
    assert!(output.is_empty());
}

#[test]
fn length_prefix_then_eof_is_clean_disconnect() {
    let stop = StopSignal::new();
    let mut output = Vec::new();
    let mut handled = 0;
    let exit = serve(
        &mut Cursor::new(10u32.to_ne_bytes().to_vec()),
        &mut output,
        &stop,
        |v: Value| {
            handled += 1;
            v
        },
    )
    .unwrap();
    assert_eq!(exit, LoopExit::Disconnected);
    assert_eq!(handled, 0);
    assert!(output.is_empty());
}

#[test]
fn closed_stdout_stops_after_first_reply() {
    let mut input = frame(br#"{"url":"http://a","action":"audio"}"#);
    input.extend(frame(br#"{"url":"http://b","action":"audio"}"#));

    let stop = StopSignal::new();
    let mut handled = 0;
    let err = serve(&mut Cursor::new(input), &mut ClosedPipe, &stop, |v: Value| {
        handled += 1;
        v
    })
    .unwrap_err();

    assert!(matches!(err, NmError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    assert_eq!(handled, 1);
}

#[test]
fn oversized_frame_stops_without_reply() {
    let mut input = frame(br#"{"url":"http://a","action":"audio"}"#);
    input.extend((100 * 1024 * 1024u32).to_ne_bytes());

    let stop = StopSignal::new();
    let mut output = Vec::new();
    let mut handled = 0;
    let err = serve(&mut Cursor::new(input), &mut output, &stop, |v: Value| {
        handled += 1;
        v
    })
    .unwrap_err();

    assert!(matches!(err, NmError::IncomingTooLarge { .. }));
    assert_eq!(handled, 1);
    // only the reply to the first, well-formed frame
    assert_eq!(split_frames(&output).len(), 1);
}

#[test]
fn malformed_json_stops_without_reply() {
    let stop = StopSignal::new();
    let mut output = Vec::new();
    let err = serve(
        &mut Cursor::new(frame(b"{\"url\": ")),
        &mut output,
        &stop,
        |v: Value| v,
    )
    .unwrap_err();
    assert!(matches!(err, NmError::DeserializeJson(_)));
    assert!(output.is_empty());
}

#[test]
fn truncated_frame_is_an_error_not_a_disconnect() {
    let mut input = frame(br#"{"url":"http://a"}"#);
    input.truncate(6);
    let stop = StopSignal::new();
    let mut output = Vec::new();
    let err = serve(&mut Cursor::new(input), &mut output, &stop, |v: Value| v).unwrap_err();
    assert!(matches!(err, NmError::Truncated { .. }));
    assert!(output.is_empty());
}

#[test]
fn oversized_reply_stops_the_loop() {
    let mut input = frame(br#"{"n":1}"#);
    input.extend(frame(br#"{"n":2}"#));
    let stop = StopSignal::new();
    let mut output = Vec::new();
    let err = serve(&mut Cursor::new(input), &mut output, &stop, |_: Value| {
        json!({"blob": "z".repeat(2 * 1024 * 1024)})
    })
    .unwrap_err();
    assert!(matches!(err, NmError::OutgoingTooLarge { .. }));
    assert!(output.is_empty());
}
