//! Viewing rules: filter views by color space or encoding.

/// A named viewing rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewingRule {
    name: String,
    colorspaces: Vec<String>,
    encodings: Vec<String>,
    custom_keys: Vec<(String, String)>,
}

impl ViewingRule {
    /// Creates an empty rule.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds a color space token.
    pub fn with_colorspace(mut self, cs: impl Into<String>) -> Self {
        self.colorspaces.push(cs.into());
        self
    }

    /// Adds an encoding token.
    pub fn with_encoding(mut self, enc: impl Into<String>) -> Self {
        self.encodings.push(enc.into());
        self
    }

    /// Adds or replaces a custom key.
    pub fn with_custom_key(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.custom_keys.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.custom_keys.push((key, value)),
        }
        self
    }

    /// Rule name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color space tokens.
    #[inline]
    pub fn colorspaces(&self) -> &[String] {
        &self.colorspaces
    }

    /// Encoding tokens.
    #[inline]
    pub fn encodings(&self) -> &[String] {
        &self.encodings
    }

    /// Custom keys.
    #[inline]
    pub fn custom_keys(&self) -> &[(String, String)] {
        &self.custom_keys
    }

    /// Same color space set, encoding set and custom keys. Names are not
    /// compared.
    pub fn is_equivalent(&self, other: &ViewingRule) -> bool {
        fn same_set(a: &[String], b: &[String]) -> bool {
            a.len() == b.len() && b.iter().all(|t| a.iter().any(|s| s.eq_ignore_ascii_case(t)))
        }
        same_set(&self.colorspaces, &other.colorspaces)
            && same_set(&self.encodings, &other.encodings)
            && self.custom_keys.len() == other.custom_keys.len()
            && other.custom_keys.iter().all(|(k, v)| {
                self.custom_keys
                    .iter()
                    .any(|(sk, sv)| sk == k && sv.eq_ignore_ascii_case(v))
            })
    }
}

/// Ordered viewing rules with unique names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewingRules {
    rules: Vec<ViewingRule>,
}

impl ViewingRules {
    /// Empty rule list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules in order.
    #[inline]
    pub fn rules(&self) -> &[ViewingRule] {
        &self.rules
    }

    /// Number of rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when there are no rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule by name.
    pub fn get(&self, name: &str) -> Option<&ViewingRule> {
        self.rules.iter().find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Appends a rule, replacing one with the same name in place.
    pub fn add(&mut self, rule: ViewingRule) {
        match self.rules.iter_mut().find(|r| r.name.eq_ignore_ascii_case(&rule.name)) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Removes a rule by name.
    pub fn remove(&mut self, name: &str) -> Option<ViewingRule> {
        let idx = self.rules.iter().position(|r| r.name.eq_ignore_ascii_case(name))?;
        Some(self.rules.remove(idx))
    }

    /// Removes all rules.
    pub fn clear(&mut self) {
        self.rules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_is_order_insensitive() {
        let a = ViewingRule::new("r").with_colorspace("A").with_colorspace("B").with_encoding("log");
        let b = ViewingRule::new("r").with_colorspace("b").with_colorspace("a").with_encoding("LOG");
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&b.clone().with_custom_key("k", "v")));
    }

    #[test]
    fn add_replaces_by_name() {
        let mut rules = ViewingRules::new();
        rules.add(ViewingRule::new("one").with_encoding("sdr-video"));
        rules.add(ViewingRule::new("two"));
        rules.add(ViewingRule::new("ONE"));
        assert_eq!(rules.len(), 2);
        assert!(rules.get("one").unwrap().encodings().is_empty());
    }
}
