use serde::{Deserialize, Serialize};

use crate::MAX_BUFFER_SIZE;

/// Tuning knobs for a [`Builder`](crate::builder::Builder).
///
/// The struct is serializable so that services can carry builder settings in
/// their own configuration files; missing fields take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Number of bytes reserved up front in the builder's arena.
    pub initial_capacity: usize,
    /// Write scalar fields even when they equal their declared default.
    pub force_defaults: bool,
    /// Share identical vtables between objects of the same message.
    pub dedup_vtables: bool,
    /// Upper bound on the size of the produced buffer. Values above
    /// [`MAX_BUFFER_SIZE`] are clamped.
    pub max_buffer_size: usize,
}

impl BuilderOptions {
    pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_force_defaults(mut self, force_defaults: bool) -> Self {
        self.force_defaults = force_defaults;
        self
    }

    pub fn with_dedup_vtables(mut self, dedup_vtables: bool) -> Self {
        self.dedup_vtables = dedup_vtables;
        self
    }

    pub fn with_max_buffer_size(mut self, max_buffer_size: usize) -> Self {
        self.max_buffer_size = max_buffer_size.min(MAX_BUFFER_SIZE);
        self
    }

    /// The effective buffer size limit.
    pub fn buffer_limit(&self) -> usize {
        self.max_buffer_size.min(MAX_BUFFER_SIZE)
    }
}

impl Default for BuilderOptions {
    fn default() -> Self {
        BuilderOptions {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            force_defaults: false,
            dedup_vtables: true,
            max_buffer_size: MAX_BUFFER_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BuilderOptions;
    use crate::MAX_BUFFER_SIZE;

    #[test]
    fn test_options_defaults() {
        let options = BuilderOptions::default();
        assert!(!options.force_defaults);
        assert!(options.dedup_vtables);
        assert_eq!(options.buffer_limit(), MAX_BUFFER_SIZE);
    }

    #[test]
    fn test_options_partial_json() {
        let options: BuilderOptions =
            serde_json::from_str(r#"{ "force_defaults": true, "max_buffer_size": 4096 }"#)
                .unwrap();
        assert!(options.force_defaults);
        assert_eq!(options.max_buffer_size, 4096);
        assert_eq!(
            options.initial_capacity,
            BuilderOptions::DEFAULT_INITIAL_CAPACITY
        );

        let json = serde_json::to_string(&options).unwrap();
        let back: BuilderOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn test_options_limit_is_clamped() {
        let options = BuilderOptions::default().with_max_buffer_size(usize::MAX);
        assert_eq!(options.buffer_limit(), MAX_BUFFER_SIZE);

        let options = BuilderOptions {
            max_buffer_size: usize::MAX,
            ..Default::default()
        };
        assert_eq!(options.buffer_limit(), MAX_BUFFER_SIZE);
    }
}
