use serde::{Deserialize, Serialize};
use std::path::Path;

/// Value written for any property the host could not supply.
pub const UNKNOWN: &str = "UNKNOWN";

/// Identity of the host application, shown in critical reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub installed_modules: Vec<String>,
}

impl AppInfo {
    pub fn new(
        name: impl Into<String>,
        vendor: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        AppInfo {
            name: name.into(),
            vendor: vendor.into(),
            version: version.into(),
            installed_modules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemInfo {
    pub os_name: String,
    pub os_version: String,
    pub arch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub name: String,
    pub home: String,
    pub dir: String,
    pub country: String,
    pub language: String,
}

/// Read-only process and environment state dumped into every critical
/// incident file. The host normally builds it once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSnapshot {
    pub app: AppInfo,
    pub system: SystemInfo,
    /// Ordered `(label, value)` runtime properties.
    pub runtime: Vec<(String, String)>,
    pub user: UserInfo,
}

impl EnvironmentSnapshot {
    /// Gather what the current process can tell about itself.
    pub fn capture(app: AppInfo) -> Self {
        let (language, country) = locale_parts(&env_var(&["LC_ALL", "LANG"]));

        EnvironmentSnapshot {
            app,
            system: SystemInfo {
                os_name: std::env::consts::OS.to_string(),
                os_version: os_version(),
                arch: std::env::consts::ARCH.to_string(),
            },
            runtime: runtime_properties(),
            user: UserInfo {
                name: env_var(&["USER", "USERNAME"]),
                home: env_var(&["HOME", "USERPROFILE"]),
                dir: current_dir(),
                country,
                language,
            },
        }
    }
}

fn env_var(keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| std::env::var(k).ok().filter(|v| !v.is_empty()))
        .unwrap_or_default()
}

fn current_dir() -> String {
    std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

fn os_version() -> String {
    let release = Path::new("/proc/sys/kernel/osrelease");
    std::fs::read_to_string(release)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// `en_US.UTF-8` → (`en`, `US`).
fn locale_parts(locale: &str) -> (String, String) {
    let base = locale.split(['.', '@']).next().unwrap_or_default();
    match base.split_once('_') {
        Some((lang, country)) => (lang.to_string(), country.to_string()),
        None => (base.to_string(), String::new()),
    }
}

fn runtime_properties() -> Vec<(String, String)> {
    let exe = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let args: Vec<String> = std::env::args().collect();
    let parallelism = std::thread::available_parallelism()
        .map(|n| n.to_string())
        .unwrap_or_default();
    let endian = if cfg!(target_endian = "little") { "little" } else { "big" };

    vec![
        ("Executable".to_string(), exe),
        ("Process ID".to_string(), std::process::id().to_string()),
        ("Command Line".to_string(), args.join(" ")),
        ("Working Directory".to_string(), current_dir()),
        ("Target OS".to_string(), std::env::consts::OS.to_string()),
        ("Target Family".to_string(), std::env::consts::FAMILY.to_string()),
        ("Target Architecture".to_string(), std::env::consts::ARCH.to_string()),
        (
            "Pointer Width".to_string(),
            (std::mem::size_of::<usize>() * 8).to_string(),
        ),
        ("Endianness".to_string(), endian.to_string()),
        (
            "Debug Assertions".to_string(),
            cfg!(debug_assertions).to_string(),
        ),
        ("Available Parallelism".to_string(), parallelism),
        (
            "Temp Directory".to_string(),
            std::env::temp_dir().display().to_string(),
        ),
        (
            "Library Path".to_string(),
            env_var(&["LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH", "PATH"]),
        ),
        (
            "Logger Version".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        ),
    ]
}
