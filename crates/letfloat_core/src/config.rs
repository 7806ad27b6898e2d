//! Tunables for the float pass.

/// Naming configuration shared by the name allocator, the runtime helper, and
/// the recognizer for artifacts left by an earlier run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatConfig {
    /// Suffix appended to every generated name (`add_y` + `__fb`).
    pub suffix: String,
    /// Base name used when a call offers no usable callee or argument names.
    pub fallback_base: String,
    /// Base name of the injected memoize-once helper.
    pub helper_base: String,
}

impl Default for FloatConfig {
    fn default() -> Self {
        Self {
            suffix: "__fb".to_owned(),
            fallback_base: "fb".to_owned(),
            helper_base: "memo".to_owned(),
        }
    }
}

impl FloatConfig {
    /// The `n`-th candidate spelling for `base`: `base__fb`, `base__fb_1`, …
    pub fn candidate_name(&self, base: &str, n: usize) -> String {
        if n == 0 {
            format!("{base}{}", self.suffix)
        } else {
            format!("{base}{}_{n}", self.suffix)
        }
    }

    /// If `name` has the shape of a generated name, return its base.
    ///
    /// `add_y__fb` and `add_y__fb_3` both yield `Some("add_y")`.
    pub fn generated_base<'a>(&self, name: &'a str) -> Option<&'a str> {
        if let Some(base) = name.strip_suffix(self.suffix.as_str()) {
            return (!base.is_empty()).then_some(base);
        }
        let (head, digits) = name.rsplit_once('_')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let base = head.strip_suffix(self.suffix.as_str())?;
        (!base.is_empty()).then_some(base)
    }

    /// `true` when `name` is a spelling of the runtime helper's name.
    pub fn is_helper_name(&self, name: &str) -> bool {
        self.generated_base(name) == Some(self.helper_base.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_name_sequence() {
        let cfg = FloatConfig::default();
        assert_eq!(cfg.candidate_name("add_y", 0), "add_y__fb");
        assert_eq!(cfg.candidate_name("add_y", 1), "add_y__fb_1");
        assert_eq!(cfg.candidate_name("add_y", 12), "add_y__fb_12");
    }

    #[test]
    fn test_generated_base_recognizes_both_shapes() {
        let cfg = FloatConfig::default();
        assert_eq!(cfg.generated_base("xy__fb"), Some("xy"));
        assert_eq!(cfg.generated_base("xy__fb_7"), Some("xy"));
        assert_eq!(cfg.generated_base("xy"), None);
        assert_eq!(cfg.generated_base("xy_7"), None);
        assert_eq!(cfg.generated_base("__fb"), None);
        assert_eq!(cfg.generated_base("xy__fb_"), None);
    }

    #[test]
    fn test_is_helper_name() {
        let cfg = FloatConfig::default();
        assert!(cfg.is_helper_name("memo__fb"));
        assert!(cfg.is_helper_name("memo__fb_2"));
        assert!(!cfg.is_helper_name("memo"));
        assert!(!cfg.is_helper_name("add__fb"));
    }
}
