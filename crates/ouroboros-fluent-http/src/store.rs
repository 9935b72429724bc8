//! Dotted-path option store
//!
//! Options live in a nested [`OptionMap`]. Paths such as `headers.Accept`
//! address nested entries one `.`-separated segment at a time.
//!
//! Two merge flavours exist:
//! - [`OptionStore::merged_with`] produces the effective options for a
//!   single request and leaves the store untouched
//! - [`OptionStore::merge`] folds options into the store permanently

use crate::value::{OptionMap, OptionValue};

/// Deep-merge `overrides` into `base`.
///
/// Maps merge key by key; any other value in `overrides` replaces the
/// value in `base` wholesale.
pub fn deep_merge(base: &mut OptionMap, overrides: OptionMap) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(OptionValue::Map(existing)), OptionValue::Map(incoming)) => {
                deep_merge(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Look up a dotted path
pub fn get_path<'a>(map: &'a OptionMap, path: &str) -> Option<&'a OptionValue> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = map.get(first)?;

    for segment in segments {
        current = current.as_map()?.get(segment)?;
    }

    Some(current)
}

/// Mutable lookup of a dotted path
pub fn get_path_mut<'a>(map: &'a mut OptionMap, path: &str) -> Option<&'a mut OptionValue> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = map.get_mut(first)?;

    for segment in segments {
        current = current.as_map_mut()?.get_mut(segment)?;
    }

    Some(current)
}

/// Set a dotted path, creating or overwriting intermediate maps
pub fn set_path(map: &mut OptionMap, path: &str, value: OptionValue) {
    let segments: Vec<&str> = path.split('.').collect();
    set_segments(map, &segments, value);
}

fn set_segments(map: &mut OptionMap, segments: &[&str], value: OptionValue) {
    match segments {
        [] => {}
        [last] => {
            map.insert(last.to_string(), value);
        }
        [first, rest @ ..] => {
            let mut child = match map.remove(*first) {
                Some(OptionValue::Map(child)) => child,
                _ => OptionMap::new(),
            };
            set_segments(&mut child, rest, value);
            map.insert(first.to_string(), OptionValue::Map(child));
        }
    }
}

/// Remove a dotted path. Returns the removed value, if any.
pub fn remove_path(map: &mut OptionMap, path: &str) -> Option<OptionValue> {
    match path.rsplit_once('.') {
        None => map.remove(path),
        Some((parent, last)) => {
            let mut current = map;
            for segment in parent.split('.') {
                current = current.get_mut(segment)?.as_map_mut()?;
            }
            current.remove(last)
        }
    }
}

/// Nested options owned by a single client
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionStore {
    options: OptionMap,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `defaults` deep-merged with `options`
    /// (`options` wins)
    pub fn with_defaults(defaults: OptionMap, options: OptionMap) -> Self {
        let mut store = Self { options: defaults };
        store.merge(options);
        store
    }

    pub fn get(&self, path: &str) -> Option<&OptionValue> {
        get_path(&self.options, path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut OptionValue> {
        get_path_mut(&mut self.options, path)
    }

    /// Value at `path`, or `default` when the path is absent
    pub fn get_or(&self, path: &str, default: OptionValue) -> OptionValue {
        self.get(path).cloned().unwrap_or(default)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn set(&mut self, path: &str, value: impl Into<OptionValue>) {
        set_path(&mut self.options, path, value.into());
    }

    /// Apply [`set`](Self::set) for every dotted key in `entries`
    pub fn set_many(&mut self, entries: OptionMap) {
        for (path, value) in entries {
            set_path(&mut self.options, &path, value);
        }
    }

    /// Remove one path; absent paths are ignored
    pub fn remove(&mut self, path: &str) -> Option<OptionValue> {
        remove_path(&mut self.options, path)
    }

    pub fn remove_many<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            remove_path(&mut self.options, path.as_ref());
        }
    }

    /// Deep-merge `overrides` into the store permanently
    pub fn merge(&mut self, overrides: OptionMap) {
        deep_merge(&mut self.options, overrides);
    }

    /// Effective options for one request: the store deep-merged with
    /// `overrides`. The store itself is not modified.
    pub fn merged_with(&self, overrides: OptionMap) -> OptionMap {
        let mut merged = self.options.clone();
        deep_merge(&mut merged, overrides);
        merged
    }

    /// Replace every stored option
    pub fn replace(&mut self, options: OptionMap) {
        self.options = options;
    }

    pub fn clear(&mut self) {
        self.options.clear();
    }

    pub fn as_map(&self) -> &OptionMap {
        &self.options
    }

    pub fn into_map(self) -> OptionMap {
        self.options
    }
}

impl From<OptionMap> for OptionStore {
    fn from(options: OptionMap) -> Self {
        Self { options }
    }
}
