use std::path::{Path, PathBuf};

pub fn normalize_command_path(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(inner) = trimmed
        .strip_prefix('"')
        .and_then(|candidate| candidate.strip_suffix('"'))
    {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed
        .strip_prefix('\'')
        .and_then(|candidate| candidate.strip_suffix('\''))
    {
        return inner.trim().to_string();
    }
    trimmed.to_string()
}

fn adb_file_name() -> &'static str {
    if cfg!(windows) {
        "adb.exe"
    } else {
        "adb"
    }
}

/// Places a bundled adb may live, relative to the app executable.
pub fn bundled_candidates(exe_dir: &Path) -> Vec<PathBuf> {
    vec![
        exe_dir.join("adb_tools").join(adb_file_name()),
        exe_dir.join(adb_file_name()),
        exe_dir.join("resources").join("adb_tools").join(adb_file_name()),
    ]
}

/// Configured path first, then a bundled copy, then plain `adb` from PATH.
pub fn resolve_adb_program(config_command_path: &str) -> String {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    resolve_adb_program_from(config_command_path, exe_dir.as_deref())
}

pub fn resolve_adb_program_from(config_command_path: &str, exe_dir: Option<&Path>) -> String {
    let normalized = normalize_command_path(config_command_path);
    if !normalized.is_empty() {
        return normalized;
    }
    if let Some(exe_dir) = exe_dir {
        if let Some(found) = bundled_candidates(exe_dir)
            .into_iter()
            .find(|candidate| candidate.is_file())
        {
            return found.to_string_lossy().to_string();
        }
    }
    "adb".to_string()
}

pub fn validate_adb_program(program: &str) -> Result<(), String> {
    if program.trim().is_empty() {
        return Err("ADB command is empty".to_string());
    }
    if program == "adb" {
        return Ok(());
    }
    let path = Path::new(program);
    if path.is_dir() {
        return Err("ADB path must point to an executable file".to_string());
    }
    if !path.exists() {
        return Err("ADB executable not found at the configured path".to_string());
    }
    Ok(())
}
