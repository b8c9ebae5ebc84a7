//! Observable cells.
//!
//! A cell owns a value and notifies its subscribers synchronously, in
//! subscription order, every time the value is replaced or mutated.
//! Subscribing also delivers the current value once, so a persistence
//! subscriber writes the initial state straight away.

type Subscriber<T> = Box<dyn FnMut(&T) + Send>;

pub struct Observable<T> {
    value: T,
    subscribers: Vec<Subscriber<T>>,
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            subscribers: Vec::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn subscribe(&mut self, mut subscriber: impl FnMut(&T) + Send + 'static) {
        subscriber(&self.value);
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.notify();
    }

    /// Mutate in place, then notify. Returns whatever the closure returns.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let out = f(&mut self.value);
        self.notify();
        out
    }

    fn notify(&mut self) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&self.value);
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_subscribe_delivers_current_value() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut cell = Observable::new(1);

        let sink = seen.clone();
        cell.subscribe(move |v| sink.lock().unwrap().push(*v));

        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_set_and_update_notify_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut cell = Observable::new(0);

        let first = seen.clone();
        cell.subscribe(move |v| first.lock().unwrap().push(("a", *v)));
        let second = seen.clone();
        cell.subscribe(move |v| second.lock().unwrap().push(("b", *v)));

        cell.set(5);
        let doubled = cell.update(|v| {
            *v *= 2;
            *v
        });

        assert_eq!(doubled, 10);
        assert_eq!(*cell.get(), 10);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("a", 0), ("b", 0), ("a", 5), ("b", 5), ("a", 10), ("b", 10)]
        );
    }
}
