use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Resolve `path` against `base` unless it is already absolute
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Find an executable by name in the directories of a PATH-style variable
pub fn find_in_path(command: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(path_var)
        .flat_map(|dir| executable_names(command).into_iter().map(move |name| dir.join(name)))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn executable_names(command: &str) -> Vec<String> {
    vec![format!("{}.exe", command), command.to_string()]
}

#[cfg(not(windows))]
fn executable_names(command: &str) -> Vec<String> {
    vec![command.to_string()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Directory holding both ffmpeg and ffprobe, if both are on PATH.
///
/// The directory is taken from the ffmpeg binary.
pub fn locate_ffmpeg(path_var: Option<&OsStr>) -> Option<PathBuf> {
    let ffmpeg = find_in_path("ffmpeg", path_var)?;
    find_in_path("ffprobe", path_var)?;
    ffmpeg.parent().map(Path::to_path_buf)
}

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp_path: &Path) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp_path.as_os_str(), "--version").await {
        missing.push(format!(
            "{} - required for audio downloads",
            yt_dlp_path.display()
        ));
    }

    // ffmpeg is needed for the transcode step
    if !check_command_available(OsStr::new("ffmpeg"), "-version").await {
        missing.push("ffmpeg - required for audio conversion".to_string());
    }

    missing
}

/// Check if a command is available
async fn check_command_available(command: &OsStr, version_flag: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(version_flag)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
