//! Shell-script stand-ins for ffprobe and ffmpeg
//!
//! Scripts are run through `sh` rather than executed directly, which keeps them free of
//! executable bits and of ETXTBSY races between parallel tests.

use std::path::Path;

use crate::{
    process::Tool,
    tmp_file::{ArcTmpDir, TmpDir, TmpFolder},
};

/// Copies the `-i` input to the last argument, like a stream-copy remux would
pub(crate) const COPY_FFMPEG: &str = r#"
while [ $# -gt 0 ]; do
    case "$1" in
        -i) input="$2"; shift 2 ;;
        *) output="$1"; shift ;;
    esac
done
cp "$input" "$output"
"#;

/// Reports success but leaves a zero-byte output behind
pub(crate) const TRUNCATING_FFMPEG: &str = r#"
for output; do :; done
: > "$output"
"#;

/// Reports success without writing anything
pub(crate) const SILENT_FFMPEG: &str = "exit 0\n";

pub(crate) const FAILING_FFMPEG: &str = r#"
echo "moov atom not found" >&2
exit 1
"#;

pub(crate) fn ffprobe_reporting(width: u32, height: u32) -> String {
    format!(
        "printf '%s' '{{\"streams\":[{{\"index\":0,\"codec_type\":\"video\",\"width\":{width},\"height\":{height}}},{{\"index\":1,\"codec_type\":\"audio\"}}]}}'\n"
    )
}

pub(crate) async fn stub_folder() -> (ArcTmpDir, TmpFolder) {
    let tmp_dir = TmpDir::init(std::env::temp_dir().join("reelhouse-stubs"))
        .await
        .expect("stub dir");
    let folder = tmp_dir.tmp_folder().await.expect("stub folder");

    (tmp_dir, folder)
}

pub(crate) fn stub_tool(dir: &Path, name: &str, script: &str) -> Tool {
    let path = dir.join(format!("{name}.sh"));
    std::fs::write(&path, script).expect("write stub");

    Tool::with_leading_args("sh", [path.into_os_string()])
}
