use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Interned identity for engine resources: sounds, loop channels, banks,
/// and event instances. Cloning is a reference-count bump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(Arc<str>);

impl ResourceKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ResourceKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

impl From<&Path> for ResourceKey {
    fn from(path: &Path) -> Self {
        Self::new(path.to_string_lossy())
    }
}

impl Borrow<str> for ResourceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Keyed resource cache: insert-if-absent, lookup, explicit release.
/// Wraps the map so eviction can be added without reworking call sites.
#[derive(Debug)]
pub struct ResourceCache<V> {
    entries: HashMap<ResourceKey, V>,
}

impl<V> ResourceCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert unless the key is already present. Returns false (dropping
    /// `value`) on a duplicate.
    pub fn insert_if_absent(&mut self, key: ResourceKey, value: V) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, value);
        true
    }

    pub fn get(&self, key: &ResourceKey) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &ResourceKey) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Release an entry, returning it to the caller for teardown.
    pub fn remove(&mut self, key: &ResourceKey) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKey, &V)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut()
    }

    /// Drain all entries for teardown.
    pub fn drain(&mut self) -> impl Iterator<Item = (ResourceKey, V)> + '_ {
        self.entries.drain()
    }
}

impl<V> Default for ResourceCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_by_content() {
        let a = ResourceKey::new("sounds/door.wav");
        let b = ResourceKey::from("sounds/door.wav");
        assert_eq!(a, b);
        assert_eq!(a.clone(), b);
        assert_ne!(a, ResourceKey::new("sounds/window.wav"));
    }

    #[test]
    fn key_from_path() {
        let key = ResourceKey::from(Path::new("sounds/door.wav"));
        assert_eq!(key.as_str(), "sounds/door.wav");
    }

    #[test]
    fn insert_if_absent_rejects_duplicates() {
        let mut cache = ResourceCache::new();
        let key = ResourceKey::new("a");
        assert!(cache.insert_if_absent(key.clone(), 1));
        assert!(!cache.insert_if_absent(key.clone(), 2));
        assert_eq!(cache.get(&key), Some(&1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn remove_releases_entry() {
        let mut cache = ResourceCache::new();
        let key = ResourceKey::new("a");
        cache.insert_if_absent(key.clone(), 7);
        assert_eq!(cache.remove(&key), Some(7));
        assert_eq!(cache.remove(&key), None);
        assert!(cache.is_empty());
    }
}
