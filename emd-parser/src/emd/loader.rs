//! Scene loading
//!
//! [`SceneLoader`] is the boundary where parse failures stop being errors: it
//! logs them, remembers the message, and returns `None`.
//!
//! ```rust,ignore
//! let mut loader = SceneLoader::new(&registry);
//! match loader.load_file("scenes/workshop.emd") {
//!     Some(scene) => install(scene),
//!     None => show_status(loader.last_error().unwrap_or_default()),
//! }
//! ```

use super::object::{Object, ObjectPtr};
use super::parsing::{Dependency, Parser, ParserOptions};
use super::registry::Registry;
use std::path::{Path, PathBuf};

pub struct SceneLoader<'r> {
    registry: &'r Registry,
    options: ParserOptions,
    last_error: Option<String>,
    dependencies: Vec<Dependency>,
}

impl<'r> SceneLoader<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_options(registry, ParserOptions::default())
    }

    pub fn with_options(registry: &'r Registry, options: ParserOptions) -> Self {
        SceneLoader {
            registry,
            options,
            last_error: None,
            dependencies: Vec::new(),
        }
    }

    /// The message of the most recent failed load, cleared by a successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Files included by the most recent load.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Every file the most recent load read: `main` and its includes.
    pub fn all_paths(&self, main: &Path) -> Vec<PathBuf> {
        let mut paths = vec![main.to_path_buf()];
        for dep in &self.dependencies {
            if !paths.contains(&dep.included) {
                paths.push(dep.included.clone());
            }
        }
        paths
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Option<ObjectPtr> {
        let path = path.as_ref();
        let mut parser = Parser::with_options(self.registry, self.options);
        let result = parser.parse_file(path);
        self.dependencies = parser.dependencies().to_vec();
        self.finish(result, &path.display().to_string())
    }

    pub fn load_string(&mut self, input: &str) -> Option<ObjectPtr> {
        let mut parser = Parser::with_options(self.registry, self.options);
        let result = parser.parse_from_string(input);
        self.dependencies = parser.dependencies().to_vec();
        self.finish(result, "string input")
    }

    /// Like [`load_file`](Self::load_file), but also fails unless the root
    /// object is a `T`.
    pub fn load_file_as<T: Object>(&mut self, path: impl AsRef<Path>) -> Option<ObjectPtr> {
        let path = path.as_ref();
        let root = self.load_file(path)?;
        if root.is::<T>() {
            return Some(root);
        }
        let message = format!(
            "Root object of {} has type '{}', expected '{}'",
            path.display(),
            root.type_name(),
            std::any::type_name::<T>().rsplit("::").next().unwrap_or_default()
        );
        log::error!("{}", message);
        self.last_error = Some(message);
        None
    }

    fn finish(
        &mut self,
        result: super::error::Result<ObjectPtr>,
        source: &str,
    ) -> Option<ObjectPtr> {
        match result {
            Ok(root) => {
                log::debug!("loaded {:?} from {}", root, source);
                self.last_error = None;
                Some(root)
            }
            Err(err) => {
                log::error!("failed to load {}: {}", source, err);
                self.last_error = Some(err.to_string());
                None
            }
        }
    }
}
