//! Host facts behind the dynamic prompt codes.
use chrono::Local;
use nix::unistd::{gethostname, Uid, User};

pub fn hostname() -> String {
    gethostname()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string())
}

pub fn username() -> String {
    match User::from_uid(Uid::current()) {
        Ok(Some(user)) => user.name,
        _ => Uid::current().to_string(),
    }
}

pub fn cwd() -> String {
    std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default()
}

/// Local time in a strftime-style `format`.
pub fn local_time(format: &str) -> String {
    Local::now().format(format).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_has_clock_shape() {
        let time = local_time("%H:%M:%S");
        assert_eq!(time.len(), 8);
        assert_eq!(time.matches(':').count(), 2);
        let date = local_time("%m/%d/%Y");
        assert_eq!(date.len(), 10);
    }

    #[test]
    fn host_and_user_are_known() {
        assert!(!hostname().is_empty());
        assert!(!username().is_empty());
    }
}
