//! Topic-injecting handler proxies.
//!
//! [`event_proxy`] turns a function `fn(owner, topic, args)` into a [`Handler`]
//! bound to one owner. Every call produces a fresh allocation, so two proxies
//! for the same topic and function never unregister each other.

use std::rc::{Rc, Weak};

use tracing::trace;

use super::handler::{EventError, Handler, HandlerResult, Value};

/// Build a handler that calls `handler(owner, topic, args)`.
///
/// The owner is held weakly and upgraded only for the duration of a call;
/// once it is dropped the proxy fails with [`EventError::Detached`]. The proxy
/// takes no borrow of the owner, so the handler is free to hand it to code
/// that borrows it, including teardown of the owner itself.
pub fn event_proxy<O, H>(topic: impl Into<Rc<str>>, owner: Weak<O>, handler: H) -> Handler
where
    O: 'static,
    H: Fn(Rc<O>, &str, &[Value]) -> HandlerResult + 'static,
{
    let topic: Rc<str> = topic.into();
    Rc::new(move |args: &[Value]| -> HandlerResult {
        let strong = owner.upgrade().ok_or(EventError::Detached)?;
        trace!(topic = &*topic, args = args.len(), "proxied handler");
        handler(strong, &topic, args)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::handler::same_handler;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Counter {
        calls: Vec<(String, Vec<Value>)>,
    }

    type Owner = Rc<RefCell<Counter>>;

    fn record(owner: Owner, topic: &str, args: &[Value]) -> HandlerResult {
        let mut counter = owner.try_borrow_mut().map_err(|_| EventError::Busy)?;
        counter.calls.push((topic.to_owned(), args.to_vec()));
        Ok(json!(counter.calls.len()))
    }

    #[test]
    fn prepends_topic() {
        let owner = Owner::default();
        let proxy = event_proxy("click", Rc::downgrade(&owner), record);

        let result = proxy(&[json!("a"), json!("b")]).unwrap();
        assert_eq!(result, json!(1));
        assert_eq!(
            owner.borrow().calls,
            vec![("click".to_owned(), vec![json!("a"), json!("b")])]
        );
    }

    #[test]
    fn topic_is_injected_on_every_call() {
        let owner = Owner::default();
        let proxy = event_proxy("focus", Rc::downgrade(&owner), record);
        proxy(&[]).unwrap();
        proxy(&[json!(1)]).unwrap();
        let topics: Vec<_> = owner.borrow().calls.iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(topics, vec!["focus", "focus"]);
    }

    #[test]
    fn each_proxy_is_distinct() {
        let owner = Owner::default();
        let a = event_proxy("click", Rc::downgrade(&owner), record);
        let b = event_proxy("click", Rc::downgrade(&owner), record);
        assert!(!same_handler(&a, &b));
        assert!(same_handler(&a, &a.clone()));
    }

    #[test]
    fn dropped_owner_detaches() {
        let owner = Owner::default();
        let proxy = event_proxy("click", Rc::downgrade(&owner), record);
        drop(owner);
        assert_eq!(proxy(&[]), Err(EventError::Detached));
    }

    #[test]
    fn owner_is_not_borrowed_during_the_call() {
        let owner = Owner::default();
        let proxy = event_proxy(
            "click",
            Rc::downgrade(&owner),
            |owner: Owner, _topic: &str, _args: &[Value]| -> HandlerResult {
                Ok(Value::Bool(owner.try_borrow_mut().is_ok()))
            },
        );
        assert_eq!(proxy(&[]), Ok(Value::Bool(true)));
    }

    #[test]
    fn owner_outlives_its_last_strong_reference_during_the_call() {
        let owner = Owner::default();
        let keeper = Rc::new(RefCell::new(Some(Rc::clone(&owner))));
        let slot = Rc::clone(&keeper);
        let proxy = event_proxy(
            "close",
            Rc::downgrade(&owner),
            move |owner: Owner, topic: &str, args: &[Value]| -> HandlerResult {
                slot.borrow_mut().take();
                record(owner, topic, args)
            },
        );
        drop(owner);
        assert_eq!(proxy(&[]), Ok(json!(1)));
        assert!(keeper.borrow().is_none());
        assert_eq!(proxy(&[]), Err(EventError::Detached));
    }
}
