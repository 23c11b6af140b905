use crate::{
    ffmpeg::FfMpegError,
    process::{ProcessError, Tool},
    test_tools::{ffprobe_reporting, stub_folder, stub_tool},
};

use super::{parse_geometry, probe, FfProbeOutput, MediaGeometry};

const FFPROBE_MP4: &str = r#"{
    "streams": [
        {
            "index": 0,
            "codec_name": "h264",
            "codec_type": "video",
            "width": 1280,
            "height": 720,
            "coded_width": 1280,
            "coded_height": 720,
            "pix_fmt": "yuv420p",
            "r_frame_rate": "30/1"
        },
        {
            "index": 1,
            "codec_name": "aac",
            "codec_type": "audio",
            "sample_rate": "44100",
            "channels": 2
        }
    ]
}"#;

fn parse(json: &str) -> Result<MediaGeometry, FfMpegError> {
    let output: FfProbeOutput = serde_json::from_str(json).expect("valid json");
    parse_geometry(output)
}

#[test]
fn first_stream_geometry() {
    assert_eq!(
        parse(FFPROBE_MP4).expect("geometry"),
        MediaGeometry {
            width: 1280,
            height: 720
        }
    );
}

#[test]
fn only_first_stream_is_considered() {
    let json = r#"{"streams":[{"width":608,"height":1080},{"width":1920,"height":1080}]}"#;

    assert_eq!(
        parse(json).expect("geometry"),
        MediaGeometry {
            width: 608,
            height: 1080
        }
    );
}

#[test]
fn zero_streams() {
    assert!(matches!(parse(r#"{"streams":[]}"#), Err(FfMpegError::NoStreams)));
    assert!(matches!(parse("{}"), Err(FfMpegError::NoStreams)));
}

#[test]
fn audio_first_has_no_dimensions() {
    let json = r#"{"streams":[{"codec_type":"audio"},{"codec_type":"video","width":1280,"height":720}]}"#;

    assert!(matches!(parse(json), Err(FfMpegError::MissingDimensions)));
}

#[test]
fn zero_dimensions_are_rejected() {
    let json = r#"{"streams":[{"width":0,"height":0}]}"#;

    assert!(matches!(parse(json), Err(FfMpegError::MissingDimensions)));
}

#[cfg(unix)]
#[tokio::test]
async fn probe_reads_stub_output() {
    let (_tmp_dir, folder) = stub_folder().await;
    let ffprobe = stub_tool(&folder, "ffprobe", &ffprobe_reporting(1024, 768));

    let geometry = probe(&ffprobe, &folder.join("input.mp4"), 5)
        .await
        .expect("geometry");

    assert_eq!(
        geometry,
        MediaGeometry {
            width: 1024,
            height: 768
        }
    );
}

#[cfg(unix)]
#[tokio::test]
async fn probe_without_streams() {
    let (_tmp_dir, folder) = stub_folder().await;
    let ffprobe = stub_tool(&folder, "ffprobe", "printf '%s' '{\"streams\":[]}'\n");

    let res = probe(&ffprobe, &folder.join("input.mp4"), 5).await;

    assert!(matches!(res, Err(FfMpegError::NoStreams)));
}

#[cfg(unix)]
#[tokio::test]
async fn probe_with_malformed_output() {
    let (_tmp_dir, folder) = stub_folder().await;
    let ffprobe = stub_tool(&folder, "ffprobe", "echo 'not json'\n");

    let res = probe(&ffprobe, &folder.join("input.mp4"), 5).await;

    assert!(matches!(res, Err(FfMpegError::Json(_))));
}

#[cfg(unix)]
#[tokio::test]
async fn probe_failure_carries_stderr() {
    let (_tmp_dir, folder) = stub_folder().await;
    let ffprobe = stub_tool(
        &folder,
        "ffprobe",
        "echo 'Invalid data found when processing input' >&2\nexit 1\n",
    );

    let res = probe(&ffprobe, &folder.join("input.mp4"), 5).await;

    match res {
        Err(FfMpegError::Process(ProcessError::Status { stderr, .. })) => {
            assert_eq!(stderr, "Invalid data found when processing input\n");
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn probe_without_tool() {
    let ffprobe = Tool::new("/nonexistent/ffprobe");

    let res = probe(&ffprobe, std::path::Path::new("/tmp/input.mp4"), 5).await;

    assert!(matches!(
        res,
        Err(FfMpegError::Process(ProcessError::NotFound(_)))
    ));
}
