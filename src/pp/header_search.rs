use hashbrown::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Supplies the content of included files.
pub trait IncludeFileContentProvider {
    fn exists(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> Option<Arc<str>>;
}

/// Drop `.` components so `./a.h` and `a.h` name the same entry
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    path.components().filter(|c| !matches!(c, Component::CurDir)).collect()
}

/// Files held in memory, keyed by normalized path
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileContentProvider {
    files: HashMap<PathBuf, Arc<str>>,
}

impl InMemoryFileContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl AsRef<Path>, content: &str) -> &mut Self {
        self.files.insert(normalize_path(path.as_ref()), Arc::from(content));
        self
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, content: &str) -> Self {
        self.add_file(path, content);
        self
    }
}

impl IncludeFileContentProvider for InMemoryFileContentProvider {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    fn read(&self, path: &Path) -> Option<Arc<str>> {
        self.files.get(&normalize_path(path)).cloned()
    }
}

/// Reads from disk and caches contents (and misses) per path until invalidated
#[derive(Debug, Default)]
pub struct CachingFileContentProvider {
    cache: Mutex<HashMap<PathBuf, Option<Arc<str>>>>,
}

impl CachingFileContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, path: &Path) -> Option<Arc<str>> {
        let key = normalize_path(path);
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = cache.get(&key) {
            return entry.clone();
        }
        let content = std::fs::read(&key)
            .ok()
            .map(|bytes| Arc::from(String::from_utf8_lossy(&bytes).as_ref()));
        log::trace!("include cache fill {} (found: {})", key.display(), content.is_some());
        cache.insert(key, content.clone());
        content
    }

    /// Forget the cached content of one file, e.g. after it was edited
    pub fn invalidate(&self, path: &Path) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.remove(&normalize_path(path));
    }

    pub fn clear(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn cached_count(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl IncludeFileContentProvider for CachingFileContentProvider {
    fn exists(&self, path: &Path) -> bool {
        self.lookup(path).is_some()
    }

    fn read(&self, path: &Path) -> Option<Arc<str>> {
        self.lookup(path)
    }
}

/// Manages header search paths and include resolution
#[derive(Debug, Clone, Default)]
pub struct HeaderSearch {
    /// Searched for `"..."` includes after the includer's directory
    pub(crate) quoted_paths: Vec<PathBuf>,
    /// Searched for `<...>` includes, and for `"..."` after the quoted paths
    pub(crate) angled_paths: Vec<PathBuf>,
}

impl HeaderSearch {
    pub fn new(quoted_paths: Vec<PathBuf>, angled_paths: Vec<PathBuf>) -> Self {
        HeaderSearch {
            quoted_paths,
            angled_paths,
        }
    }

    /// Resolve an include name to the first existing candidate
    pub fn resolve_path(
        &self,
        include_path: &str,
        is_angled: bool,
        current_dir: &Path,
        provider: &dyn IncludeFileContentProvider,
    ) -> Option<PathBuf> {
        let direct = Path::new(include_path);
        if direct.is_absolute() {
            return provider.exists(direct).then(|| direct.to_path_buf());
        }
        if !is_angled {
            let candidate = normalize_path(&current_dir.join(include_path));
            if provider.exists(&candidate) {
                return Some(candidate);
            }
            if let Some(found) = Self::check_paths(&self.quoted_paths, include_path, provider) {
                return Some(found);
            }
        }
        Self::check_paths(&self.angled_paths, include_path, provider)
    }

    /// `#include_next`: continue after the search directory that holds the current file
    pub fn resolve_next_path(
        &self,
        include_path: &str,
        is_angled: bool,
        current_dir: &Path,
        provider: &dyn IncludeFileContentProvider,
    ) -> Option<PathBuf> {
        let mut dirs: Vec<&PathBuf> = Vec::new();
        if !is_angled {
            dirs.extend(self.quoted_paths.iter());
        }
        dirs.extend(self.angled_paths.iter());

        let current = normalize_path(current_dir);
        let position = dirs.iter().position(|d| normalize_path(d) == current);
        let Some(position) = position else {
            // not found via a search path: behaves like #include
            return self.resolve_path(include_path, is_angled, current_dir, provider);
        };
        dirs[position + 1..]
            .iter()
            .map(|d| normalize_path(&d.join(include_path)))
            .find(|candidate| provider.exists(candidate))
    }

    fn check_paths(
        paths: &[PathBuf],
        include_path: &str,
        provider: &dyn IncludeFileContentProvider,
    ) -> Option<PathBuf> {
        paths
            .iter()
            .map(|p| normalize_path(&p.join(include_path)))
            .find(|candidate| provider.exists(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_include_prefers_includer_directory() {
        let provider = InMemoryFileContentProvider::new()
            .with_file("src/a.h", "local")
            .with_file("inc/a.h", "system");
        let search = HeaderSearch::new(vec![], vec![PathBuf::from("inc")]);
        let found = search.resolve_path("a.h", false, Path::new("src"), &provider);
        assert_eq!(found, Some(PathBuf::from("src/a.h")));
        let found = search.resolve_path("a.h", true, Path::new("src"), &provider);
        assert_eq!(found, Some(PathBuf::from("inc/a.h")));
    }

    #[test]
    fn include_next_skips_current_directory() {
        let provider = InMemoryFileContentProvider::new()
            .with_file("one/x.h", "1")
            .with_file("two/x.h", "2");
        let search = HeaderSearch::new(vec![], vec![PathBuf::from("one"), PathBuf::from("two")]);
        let found = search.resolve_next_path("x.h", true, Path::new("one"), &provider);
        assert_eq!(found, Some(PathBuf::from("two/x.h")));
    }

    #[test]
    fn caching_provider_invalidation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.h");
        std::fs::write(&path, "int a;").unwrap();
        let provider = CachingFileContentProvider::new();
        assert_eq!(provider.read(&path).as_deref(), Some("int a;"));
        std::fs::write(&path, "int b;").unwrap();
        assert_eq!(provider.read(&path).as_deref(), Some("int a;"));
        provider.invalidate(&path);
        assert_eq!(provider.read(&path).as_deref(), Some("int b;"));
        provider.clear();
        assert_eq!(provider.cached_count(), 0);
    }
}
