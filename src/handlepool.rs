use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{IoResultExt, Result};

/// a process-lifetime cache of opened read handles to the sharded hash
/// files. a miss opens the file under a single mutex gate; the handle then
/// lives until the pool itself is dropped — it is never closed early.
///
/// each handle is wrapped in its own `Mutex` because a single `seek` + `read`
/// pair is not atomic on a shared file descriptor; callers lock the
/// per-file mutex only for the duration of one seek-then-read, not for the
/// whole pool.
#[derive(Default)]
pub struct HandlePool {
    handles: Mutex<HashMap<PathBuf, Arc<Mutex<File>>>>,
}

impl HandlePool {
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// number of distinct paths currently open; exposed for tests and
    /// diagnostics, not part of the read path
    pub fn open_count(&self) -> usize {
        self.handles.lock().expect("handle pool mutex poisoned").len()
    }

    /// get the open handle for `path`, opening it on first use
    pub fn get(&self, path: &Path) -> Result<Arc<Mutex<File>>> {
        let mut handles = self.handles.lock().expect("handle pool mutex poisoned");
        if let Some(handle) = handles.get(path) {
            return Ok(Arc::clone(handle));
        }
        let file = File::open(path).with_path(path)?;
        let handle = Arc::new(Mutex::new(file));
        handles.insert(path.to_path_buf(), Arc::clone(&handle));
        Ok(handle)
    }
}
