use std::collections::HashMap;

/// Interns strings into dense indexes.
///
/// Indexes of removed strings are handed out again before the table grows.
#[derive(Default, Debug)]
pub struct StringTable {
    by_values: HashMap<String, usize>,
    by_ids: Vec<Option<String>>,
    vacant: Vec<usize>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, value: &str) -> Option<usize> {
        self.by_values.get(value).cloned()
    }

    pub fn get_or_update(&mut self, value: &str) -> usize {
        if let Some(index) = self.by_values.get(value) {
            return *index;
        }

        let index = match self.vacant.pop() {
            Some(index) => {
                self.by_ids[index] = Some(value.to_string());
                index
            }
            None => {
                self.by_ids.push(Some(value.to_string()));
                self.by_ids.len() - 1
            }
        };
        self.by_values.insert(value.to_string(), index);
        index
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        let value = self.by_ids.get_mut(index)?.take()?;
        self.by_values.remove(&value);
        self.vacant.push(index);
        Some(value)
    }

    pub fn by_id(&self, index: usize) -> Option<&str> {
        self.by_ids.get(index)?.as_deref()
    }

    /// Number of strings currently interned.
    pub fn len(&self) -> usize {
        self.by_values.len()
    }

    /// One past the highest index handed out so far.
    pub fn capacity(&self) -> usize {
        self.by_ids.len()
    }
}
