//! Integration test: upload, paint, submit, fail, retry, and accept a
//! result through the public session API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::ImageEncoder;
use visionary_mask::{
    ApiError, ApiRequest, DisplaySize, EditFeature, ErrorKind, FormValue, ScreenPoint, Session,
    SessionState, Upload, decode_reply,
};

#[allow(clippy::cast_possible_truncation)]
fn photo(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

fn mask_of(request: &visionary_mask::EditRequest) -> image::GrayImage {
    let Some(FormValue::File { bytes, .. }) = request.part("mask_file") else {
        unreachable!("mask_file is always a file part");
    };
    image::load_from_memory(bytes).unwrap().to_luma8()
}

#[test]
fn fill_round_trip_with_retry() {
    let display = DisplaySize::new(200.0, 150.0);
    let mut session = Session::new(EditFeature::GenerativeFill);

    let ticket = session.begin_load().unwrap();
    session
        .finish_load(ticket, Upload::new(photo(400, 300), "street.png"))
        .unwrap();
    assert_eq!(session.state(), SessionState::Ready);

    let start = session
        .begin_stroke(ScreenPoint::new(100.0, 75.0), display)
        .unwrap();
    assert_eq!((start.point.x, start.point.y), (200.0, 150.0));
    let next = session
        .extend_stroke(ScreenPoint::new(120.0, 75.0), display)
        .unwrap();
    assert_eq!((next.point.x, next.point.y), (240.0, 150.0));
    session.end_stroke().unwrap();

    // No prompt yet: nothing is sent.
    let err = session.begin_submit(None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert!(!session.is_loading());

    session.set_prompt("a parked bicycle");
    let request = session.begin_submit(None).expect("request should build");
    assert!(session.is_loading());

    let mask = mask_of(&request);
    assert_eq!(mask.dimensions(), (400, 300));
    assert!(mask.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    assert_eq!(mask.get_pixel(220, 150).0[0], 255);
    assert_eq!(mask.get_pixel(10, 10).0[0], 0);

    // Gateway timeout: state rolls back, mask is kept.
    let outcome = decode_reply(504, br#"{"detail":"upstream timed out"}"#);
    let err = session.finish_submit(outcome).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.to_string(), "upstream timed out (HTTP 504)");
    assert_eq!(session.state(), SessionState::Drawing);

    let retry = session.begin_submit(None).unwrap();
    assert_eq!(mask_of(&retry), mask);

    let outcome = decode_reply(200, br#"{"result_urls":["https://cdn.example/r.png"]}"#);
    let url = session.finish_submit(outcome).unwrap().to_owned();
    assert_eq!(url, "https://cdn.example/r.png");
    assert_eq!(session.state(), SessionState::Resulted);

    session.edit_again().unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    assert!(session.result().is_none());
}

#[test]
fn network_failure_on_erase_keeps_session_usable() {
    let mut session = Session::new(EditFeature::ObjectEraser);
    let ticket = session.begin_load().unwrap();
    session
        .finish_load(ticket, Upload::new(photo(64, 48), "cat.png"))
        .unwrap();
    session
        .begin_stroke(ScreenPoint::new(10.0, 10.0), DisplaySize::new(32.0, 24.0))
        .unwrap();
    session.end_stroke();

    let request = session.begin_submit(Some("secret")).unwrap();
    assert_eq!(request.endpoint(), "/edit/erase");
    assert_eq!(
        request.part("api_key"),
        Some(&FormValue::Text("secret".into()))
    );
    assert!(request.part("prompt").is_none());

    let err = session
        .finish_submit(Err(ApiError::Transport("connection reset".into())))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(!session.is_loading());

    // The user can keep drawing and submit again.
    session
        .begin_stroke(ScreenPoint::new(20.0, 20.0), DisplaySize::new(32.0, 24.0))
        .unwrap();
    session.end_stroke();
    assert!(session.begin_submit(Some("secret")).is_ok());
}
