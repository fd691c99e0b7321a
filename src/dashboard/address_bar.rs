use std::sync::{Mutex, PoisonError};

/// Where the dashboard mirrors its filters. `replace` rewrites the current
/// entry and never adds to history.
pub trait AddressBar: Send + Sync {
    fn query(&self) -> String;
    fn replace(&self, query: &str);
}

/// In-process address bar: a history stack whose top is the current query.
#[derive(Debug)]
pub struct MemoryAddressBar {
    history: Mutex<Vec<String>>,
}

impl MemoryAddressBar {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![initial.into()]),
        }
    }

    /// Navigates to a new entry, as following a link would.
    pub fn push(&self, query: impl Into<String>) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.into());
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl AddressBar for MemoryAddressBar {
    fn query(&self) -> String {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_default()
    }

    fn replace(&self, query: &str) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        match history.last_mut() {
            Some(current) => *current = query.to_string(),
            None => history.push(query.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_keeps_history_length() {
        let bar = MemoryAddressBar::new("");
        bar.replace("period=week");
        bar.replace("period=year");
        assert_eq!(bar.history_len(), 1);
        assert_eq!(bar.query(), "period=year");

        bar.push("scope=team");
        assert_eq!(bar.history_len(), 2);
    }
}
