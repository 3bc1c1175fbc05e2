//! Style change notifications.

use crate::dom::NodeId;

/// Fired after recomputation when an element's computed values changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleChangeEvent {
    pub node: NodeId,
    /// Registry indices whose computed value changed, ascending.
    pub properties: Vec<usize>,
}

/// Handle returned by listener registration, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

pub(crate) type ListenerFn = Box<dyn Fn(&StyleChangeEvent)>;

/// Listener registry. Dispatch is synchronous, in registration order,
/// on the thread performing the mutation.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, ListenerFn)>,
}

impl Listeners {
    pub fn add(&mut self, listener: ListenerFn) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn dispatch(&self, event: &StyleChangeEvent) {
        for (_, listener) in &self.entries {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_dispatch_order_and_removal() {
        let mut doc = Document::new();
        let node = doc.create_element("svg");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::default();

        let first = {
            let seen = Rc::clone(&seen);
            listeners.add(Box::new(move |_| seen.borrow_mut().push("first")))
        };
        {
            let seen = Rc::clone(&seen);
            listeners.add(Box::new(move |_| seen.borrow_mut().push("second")));
        }

        let event = StyleChangeEvent {
            node,
            properties: vec![0],
        };
        listeners.dispatch(&event);
        assert_eq!(*seen.borrow(), vec!["first", "second"]);

        assert!(listeners.remove(first));
        assert!(!listeners.remove(first));
        listeners.dispatch(&event);
        assert_eq!(*seen.borrow(), vec!["first", "second", "second"]);
    }
}
