// src/task/target.rs

//! Output artifacts.
//!
//! The executor only ever asks a target whether it exists. How a target is
//! produced is up to the task body.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use crate::fs::{FileSystem, RealFileSystem};

/// An artifact handle answering an existence probe.
pub trait Target: Send + Sync + Debug {
    fn exists(&self) -> bool;

    /// Human-readable location, used in logs and summaries.
    fn describe(&self) -> String;
}

/// A file on a [`FileSystem`].
#[derive(Debug, Clone)]
pub struct LocalTarget {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl LocalTarget {
    /// A file on the real filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_fs(path, Arc::new(RealFileSystem))
    }

    pub fn with_fs(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, contents: impl AsRef<[u8]>) -> Result<()> {
        self.fs.write(&self.path, contents.as_ref())
    }

    pub fn read_to_string(&self) -> Result<String> {
        self.fs.read_to_string(&self.path)
    }
}

impl Target for LocalTarget {
    fn exists(&self) -> bool {
        self.fs.exists(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory completion marker.
#[derive(Debug, Default)]
pub struct FlagTarget {
    name: String,
    done: AtomicBool,
}

impl FlagTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: AtomicBool::new(false),
        }
    }

    /// A marker that already exists.
    pub fn done(name: impl Into<String>) -> Self {
        let flag = Self::new(name);
        flag.mark();
        flag
    }

    pub fn mark(&self) {
        self.done.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.done.store(false, Ordering::SeqCst);
    }
}

impl Target for FlagTarget {
    fn exists(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    fn describe(&self) -> String {
        format!("flag:{}", self.name)
    }
}
