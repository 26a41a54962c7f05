use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::OsString;
use std::path::PathBuf;

/// Launch context shared by every command the interpreter starts.
///
/// The environment contains:
/// - `vars`: environment variables handed to child processes; `PATH` drives
///   executable search.
/// - `current_dir`: the working directory children start in.
/// - `should_exit`: set by the `quit` builtin so the REPL loop knows to stop.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The working directory for command execution.
    pub current_dir: PathBuf,
    /// When set to true, the interactive loop terminates.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// An environment with no variables at all, rooted at `current_dir`.
    pub fn empty(current_dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: current_dir.into(),
            should_exit: false,
        }
    }

    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override an environment variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Directories searched for bare program names; empty when `PATH` is unset.
    pub fn search_paths(&self) -> OsString {
        self.get_var("PATH").map(OsString::from).unwrap_or_default()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment::empty(".");

        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE"));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
        assert!(!env.should_exit);
    }

    #[test]
    fn test_search_paths_empty_without_path() {
        let mut env = Environment::empty(".");
        assert!(env.search_paths().is_empty());

        env.set_var("PATH", "/bin:/usr/bin");
        assert_eq!(env.search_paths(), "/bin:/usr/bin");
    }
}
