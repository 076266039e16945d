//! File-backed quote store
//!
//! Persists the quote document as pretty-printed JSON. On POSIX hosts the file
//! is touched and made world read/writable through the shell capability
//! before every load.

use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{QuoteError, QuoteStore};
use crate::document::QuoteDocument;
use crate::shell::{quote_arg, ShellExecutor, SystemShell};

/// Cache file location used when none is given
pub const DEFAULT_FILE_PATH: &str = "currencies.json";

/// Stores the quote document in a JSON file
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Path of the cache file
    path: PathBuf,
    /// Shell used to prepare file permissions, if any
    shell: Option<Arc<dyn ShellExecutor>>,
}

impl FileStore {
    /// Creates a store for `path`, preparing permissions with the system shell
    /// on POSIX hosts
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let shell: Option<Arc<dyn ShellExecutor>> = if cfg!(unix) {
            Some(Arc::new(SystemShell))
        } else {
            None
        };

        Self {
            path: path.into(),
            shell,
        }
    }

    /// Creates a store in the XDG-compliant user cache directory
    ///
    /// Uses `~/.cache/usdquotes/currencies.json` on Linux.
    /// Returns `None` if the cache directory cannot be determined.
    pub fn in_user_cache() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "usdquotes")?;
        Some(Self::new(project_dirs.cache_dir().join(DEFAULT_FILE_PATH)))
    }

    /// Replaces the shell capability; `None` skips permission setup entirely
    pub fn with_shell(mut self, shell: Option<Arc<dyn ShellExecutor>>) -> Self {
        self.shell = shell;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensures the parent directory exists
    fn ensure_dir(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }

    /// Touches the file and opens its permissions to everyone
    ///
    /// Failures are logged; the subsequent read or write reports the real
    /// problem if the file is unusable.
    fn prepare_permissions(&self) {
        let Some(shell) = &self.shell else {
            return;
        };

        let path = quote_arg(&self.path.to_string_lossy());
        for command in [format!("touch {}", path), format!("chmod 666 {}", path)] {
            if let Err(e) = shell.exec(&command) {
                warn!(command = %command, error = %e, "Cache file preparation failed");
            }
        }
    }

    /// Reads the file, `None` if it is missing or blank
    fn read_existing(&self) -> Result<Option<String>, QuoteError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_PATH)
    }
}

impl QuoteStore for FileStore {
    fn load(&mut self) -> Result<QuoteDocument, QuoteError> {
        self.ensure_dir()?;
        self.prepare_permissions();

        match self.read_existing()? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => {
                debug!(path = %self.path.display(), "Writing default quote document");
                let document = QuoteDocument::fallback();
                self.save(&document)?;
                Ok(document)
            }
        }
    }

    fn save(&mut self, document: &QuoteDocument) -> Result<(), QuoteError> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records commands instead of running them
    #[derive(Debug, Default)]
    struct RecordingShell {
        commands: Mutex<Vec<String>>,
    }

    impl ShellExecutor for RecordingShell {
        fn exec(&self, command: &str) -> io::Result<String> {
            self.commands.lock().unwrap().push(command.to_string());
            Ok(String::new())
        }
    }

    #[derive(Debug)]
    struct FailingShell;

    impl ShellExecutor for FailingShell {
        fn exec(&self, _command: &str) -> io::Result<String> {
            Err(io::Error::other("no shell here"))
        }
    }

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::new(temp_dir.path().join(DEFAULT_FILE_PATH)).with_shell(None);
        (store, temp_dir)
    }

    #[test]
    fn test_load_creates_default_file_when_missing() {
        let (mut store, temp_dir) = create_test_store();

        let document = store.load().expect("Load should succeed");

        assert_eq!(document, QuoteDocument::fallback());
        assert!(temp_dir.path().join(DEFAULT_FILE_PATH).exists());
    }

    #[test]
    fn test_default_document_survives_write_and_read() {
        let (mut store, _temp_dir) = create_test_store();
        store.save(&QuoteDocument::fallback()).unwrap();

        let document = store.load().unwrap();

        assert_eq!(document.quotes.unwrap()["USDCHF"], 0.989304);
    }

    #[test]
    fn test_load_replaces_empty_file_with_default() {
        let (mut store, temp_dir) = create_test_store();
        fs::write(temp_dir.path().join(DEFAULT_FILE_PATH), "").unwrap();

        let document = store.load().unwrap();

        assert_eq!(document, QuoteDocument::fallback());
        let content = fs::read_to_string(temp_dir.path().join(DEFAULT_FILE_PATH)).unwrap();
        assert!(content.contains("USDCHF"));
    }

    #[test]
    fn test_save_writes_pretty_json() {
        let (mut store, temp_dir) = create_test_store();
        let mut document = QuoteDocument::fallback();
        document.stamp(Utc::now());

        store.save(&document).unwrap();

        let content = fs::read_to_string(temp_dir.path().join(DEFAULT_FILE_PATH)).unwrap();
        assert!(content.contains('\n'), "Cache file should be pretty-printed");
        assert!(content.contains("\"source\": \"USD\""));
        assert_eq!(store.load().unwrap(), document);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let (mut store, temp_dir) = create_test_store();
        fs::write(temp_dir.path().join(DEFAULT_FILE_PATH), "{not json").unwrap();

        let result = store.load();

        assert!(matches!(result, Err(QuoteError::MalformedDocument(_))));
    }

    #[test]
    fn test_save_creates_directory_if_missing() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("dir").join("quotes.json");
        let mut store = FileStore::new(nested.clone()).with_shell(None);

        store.save(&QuoteDocument::fallback()).unwrap();

        assert!(nested.exists());
    }

    #[test]
    fn test_load_runs_touch_and_chmod_through_shell() {
        let (store, temp_dir) = create_test_store();
        let shell = Arc::new(RecordingShell::default());
        let mut store = store.with_shell(Some(shell.clone() as Arc<dyn ShellExecutor>));

        store.load().unwrap();

        let path = quote_arg(&temp_dir.path().join(DEFAULT_FILE_PATH).to_string_lossy());
        let commands = shell.commands.lock().unwrap();
        assert_eq!(
            *commands,
            vec![format!("touch {}", path), format!("chmod 666 {}", path)]
        );
    }

    #[test]
    fn test_shell_failure_does_not_prevent_load() {
        let (store, _temp_dir) = create_test_store();
        let mut store = store.with_shell(Some(Arc::new(FailingShell) as Arc<dyn ShellExecutor>));

        assert!(store.load().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_shell_makes_file_world_writable() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_FILE_PATH);
        let mut store = FileStore::new(path.clone());

        store.load().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o666);
    }

    #[test]
    fn test_in_user_cache_path() {
        if let Some(store) = FileStore::in_user_cache() {
            let path_str = store.path().to_string_lossy();
            assert!(path_str.contains("usdquotes"));
            assert!(path_str.ends_with(DEFAULT_FILE_PATH));
        }
        // Test passes if no home directory is available (e.g. in CI)
    }
}
