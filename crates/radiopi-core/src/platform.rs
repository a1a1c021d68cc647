use std::path::PathBuf;

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "RADIOPI_CONFIG";

pub fn data_dir() -> PathBuf {
    // XDG-style ~/.local/share/radiopi/, /tmp when there is no home (system services)
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".local")
        .join("share")
        .join("radiopi")
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("radiopi")
}

/// Resolve a program the way a shell would.  Anything containing a path
/// separator is taken as-is; bare names are looked up in `$PATH`.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) {
        let p = PathBuf::from(program);
        return p.exists().then_some(p);
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}
