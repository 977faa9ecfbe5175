use std::collections::HashMap;

/// Case-insensitive, multi valued header overrides.
///
/// Entries keep the case of the name they were first written with and iterate in insertion
/// order. An entry without values hides the header of the same name in the underlying request.
#[derive(Debug, Clone, Default)]
pub struct HeaderOverlay {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl HeaderOverlay {
    pub fn new() -> Self {
        HeaderOverlay::default()
    }

    fn entry(&mut self, name: &str) -> &mut Vec<String> {
        let key = name.to_ascii_lowercase();
        let position = match self.index.get(&key).copied() {
            Some(position) => position,
            None => {
                self.entries.push((name.to_owned(), Vec::new()));
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[position].1
    }

    /// Replace all values of `name` with `value`.
    ///
    /// ```rust
    /// # use x_forwarded::HeaderOverlay;
    /// let mut overlay = HeaderOverlay::new();
    /// overlay.set("myheader", "lower Case");
    /// overlay.set("MYHEADER", "UPPER CASE");
    /// overlay.set("MyHeader", "Camel Case");
    /// assert_eq!(1, overlay.len());
    /// assert_eq!(Some(&["Camel Case".to_string()][..]), overlay.get("myheader"));
    /// ```
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let values = self.entry(name);
        values.clear();
        values.push(value.into());
    }

    /// Add a value to `name`, after the values already set.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.entry(name).push(value.into());
    }

    /// Hide `name`, regardless of what the underlying request holds.
    pub fn remove(&mut self, name: &str) {
        self.entry(name).clear();
    }

    /// The values of `name` if the overlay has an entry for it.
    ///
    /// An empty slice means the header is removed.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&position| self.entries[position].1.as_slice())
    }

    /// `true` if the overlay decides the values of `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_ascii_lowercase())
    }

    /// All entries, removed headers included, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of distinct header names, removed headers included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
