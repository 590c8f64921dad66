//! Synchronous dispatch with bubbling and delegated selectors.
//!
//! [`dispatch`] delivers an event at its target node first, then at each
//! ancestor in turn ([`bubble_path`]). Listener lists are snapshotted per node
//! and the document borrow is released before any handler runs.

use std::rc::Rc;

use tracing::trace;

use super::handler::{EventError, Handler, Value};
use crate::dom::element::Document;
use crate::dom::node::NodeId;
use crate::dom::tree::Dom;

/// Compute the bubble path from `start` up to the root (inclusive).
///
/// Returns `[start, parent, grandparent, ..., root]`.
/// If `start` does not exist in the DOM, returns an empty vec.
pub fn bubble_path(dom: &Dom, start: NodeId) -> Vec<NodeId> {
    if !dom.contains(start) {
        return Vec::new();
    }
    let mut path = vec![start];
    path.extend(dom.ancestors(start));
    path
}

/// Dispatch `event_type` at `target` and bubble it to the root.
///
/// At each node on the path, a listener registered with `features` fires once
/// for every node between the listener's node (exclusive) and the target
/// (inclusive) that matches them, innermost first. Delegated listeners run
/// before the node's direct listeners. A handler returning `false` finishes
/// the current match (or the direct listeners) and then stops dispatch. The
/// first handler error aborts dispatch.
pub fn dispatch(
    document: &Document,
    target: NodeId,
    event_type: &str,
    args: &[Value],
) -> Result<Vec<Value>, EventError> {
    let path = bubble_path(&document.borrow(), target);
    let mut results = Vec::new();

    for (depth, &node) in path.iter().enumerate() {
        let queue = handler_queue(document, node, &path[..depth], event_type);
        trace!(?node, event_type, groups = queue.len(), "dispatch");

        for group in queue {
            let mut stop = false;
            for handler in group {
                let value = handler(args)?;
                stop |= value == Value::Bool(false);
                results.push(value);
            }
            if stop {
                return Ok(results);
            }
        }
    }

    Ok(results)
}

/// Handlers to run at `node`, grouped per matched origin.
///
/// `below` is the part of the path under `node`, innermost first. Each
/// matching origin gets one group of delegated handlers; the direct handlers
/// come last.
fn handler_queue(document: &Document, node: NodeId, below: &[NodeId], event_type: &str) -> Vec<Vec<Handler>> {
    let dom = document.borrow();
    let listeners = dom.events.listeners(node, event_type);

    let mut queue = Vec::new();
    if listeners.iter().any(|l| l.features.is_some()) {
        for &origin in below {
            let matched: Vec<Handler> = listeners
                .iter()
                .filter(|l| l.features.as_ref().is_some_and(|s| dom.matches(origin, s)))
                .map(|l| Rc::clone(&l.handler))
                .collect();
            if !matched.is_empty() {
                queue.push(matched);
            }
        }
    }

    let direct: Vec<Handler> = listeners
        .into_iter()
        .filter(|l| l.features.is_none())
        .map(|l| l.handler)
        .collect();
    if !direct.is_empty() {
        queue.push(direct);
    }
    queue
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::dom::element::{document, Element};
    use crate::dom::node::NodeData;
    use crate::dom::query::Selector;
    use crate::dom::tree::Dom;
    use crate::event::handler::{EventError, Handler, HandlerResult, Value};

    use super::*;

    /// ```text
    ///       root
    ///      /    \
    ///    ul       b
    ///   /  \
    ///  li   li.sel
    /// ```
    fn build() -> (Document, Vec<NodeId>) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        let ul = dom.insert_child(root, NodeData::new("ul")).unwrap();
        let b = dom.insert_child(root, NodeData::new("b")).unwrap();
        let li = dom.insert_child(ul, NodeData::new("li")).unwrap();
        let sel = dom
            .insert_child(ul, NodeData::new("li").with_class("sel"))
            .unwrap();
        (document(dom), vec![root, ul, b, li, sel])
    }

    fn recorder(log: &Rc<RefCell<Vec<String>>>, name: &'static str, ret: Value) -> Handler {
        let log = Rc::clone(log);
        Rc::new(move |args: &[Value]| -> HandlerResult {
            log.borrow_mut().push(format!("{name}:{}", args.len()));
            Ok(ret.clone())
        })
    }

    #[test]
    fn bubble_path_from_leaf() {
        let (doc, ids) = build();
        let path = bubble_path(&doc.borrow(), ids[3]);
        assert_eq!(path, vec![ids[3], ids[1], ids[0]]);
    }

    #[test]
    fn bubble_path_nonexistent_node() {
        let (doc, ids) = build();
        doc.borrow_mut().remove(ids[1]);
        assert!(bubble_path(&doc.borrow(), ids[3]).is_empty());
    }

    #[test]
    fn dispatch_bubbles_to_ancestors() {
        let (doc, ids) = build();
        let log = Rc::new(RefCell::new(Vec::new()));
        Element::new(&doc, ids[0])
            .on("click", None, recorder(&log, "root", Value::Null))
            .unwrap();
        Element::new(&doc, ids[3])
            .on("click", None, recorder(&log, "li", Value::Null))
            .unwrap();

        let results = Element::new(&doc, ids[3])
            .trigger("click", &[json!(1), json!(2)])
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(*log.borrow(), vec!["li:2", "root:2"]);
    }

    #[test]
    fn delegated_listener_filters_by_origin() {
        let (doc, ids) = build();
        let log = Rc::new(RefCell::new(Vec::new()));
        Element::new(&doc, ids[1])
            .on(
                "click",
                Some(Selector::Class("sel".into())),
                recorder(&log, "delegated", Value::Null),
            )
            .unwrap();

        Element::new(&doc, ids[3]).trigger("click", &[]).unwrap();
        assert!(log.borrow().is_empty());

        Element::new(&doc, ids[4]).trigger("click", &[]).unwrap();
        assert_eq!(*log.borrow(), vec!["delegated:0"]);

        // Not for events on the delegating node itself.
        Element::new(&doc, ids[1]).trigger("click", &[]).unwrap();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn delegated_listener_fires_once_per_matching_node() {
        let (doc, ids) = build();
        let log = Rc::new(RefCell::new(Vec::new()));
        Element::new(&doc, ids[0])
            .on("click", Some(Selector::Any), recorder(&log, "any", Value::Null))
            .unwrap();

        let results = Element::new(&doc, ids[3]).trigger("click", &[]).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(*log.borrow(), vec!["any:0", "any:0"]);
    }

    #[test]
    fn delegated_listeners_run_before_direct_ones() {
        let (doc, ids) = build();
        let log = Rc::new(RefCell::new(Vec::new()));
        let ul = Element::new(&doc, ids[1]);
        ul.on("click", None, recorder(&log, "direct", Value::Null)).unwrap();
        ul.on(
            "click",
            Some(Selector::Tag("li".into())),
            recorder(&log, "delegated", Value::Null),
        )
        .unwrap();

        Element::new(&doc, ids[3]).trigger("click", &[]).unwrap();
        assert_eq!(*log.borrow(), vec!["delegated:0", "direct:0"]);
    }

    #[test]
    fn false_from_delegated_skips_the_rest_of_the_node() {
        let (doc, ids) = build();
        let log = Rc::new(RefCell::new(Vec::new()));
        let ul = Element::new(&doc, ids[1]);
        ul.on("click", None, recorder(&log, "direct", Value::Null)).unwrap();
        ul.on(
            "click",
            Some(Selector::Tag("li".into())),
            recorder(&log, "delegated", Value::Bool(false)),
        )
        .unwrap();
        Element::new(&doc, ids[0])
            .on("click", None, recorder(&log, "root", Value::Null))
            .unwrap();

        Element::new(&doc, ids[3]).trigger("click", &[]).unwrap();
        assert_eq!(*log.borrow(), vec!["delegated:0"]);
    }

    #[test]
    fn returning_false_stops_bubbling() {
        let (doc, ids) = build();
        let log = Rc::new(RefCell::new(Vec::new()));
        Element::new(&doc, ids[1])
            .on("click", None, recorder(&log, "ul-1", Value::Bool(false)))
            .unwrap();
        Element::new(&doc, ids[1])
            .on("click", None, recorder(&log, "ul-2", Value::Null))
            .unwrap();
        Element::new(&doc, ids[0])
            .on("click", None, recorder(&log, "root", Value::Null))
            .unwrap();

        Element::new(&doc, ids[3]).trigger("click", &[]).unwrap();
        assert_eq!(*log.borrow(), vec!["ul-1:0", "ul-2:0"]);
    }

    #[test]
    fn other_event_types_do_not_fire() {
        let (doc, ids) = build();
        let log = Rc::new(RefCell::new(Vec::new()));
        Element::new(&doc, ids[2])
            .on("focus", None, recorder(&log, "focus", Value::Null))
            .unwrap();
        Element::new(&doc, ids[2]).trigger("click", &[]).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn handler_error_aborts() {
        let (doc, ids) = build();
        let log = Rc::new(RefCell::new(Vec::new()));
        let failing: Handler =
            Rc::new(|_args: &[Value]| -> HandlerResult { Err(EventError::failed("click", "nope")) });
        Element::new(&doc, ids[3]).on("click", None, failing).unwrap();
        Element::new(&doc, ids[0])
            .on("click", None, recorder(&log, "root", Value::Null))
            .unwrap();

        let err = Element::new(&doc, ids[3]).trigger("click", &[]).unwrap_err();
        assert_eq!(err, EventError::failed("click", "nope"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn handlers_may_mutate_the_document() {
        let (doc, ids) = build();
        let target = Element::new(&doc, ids[2]);
        let inner = target.clone();
        let mutating: Handler = Rc::new(move |_args: &[Value]| -> HandlerResult {
            inner.append("clicked".into()).map_err(|e| EventError::failed("click", e.to_string()))?;
            Ok(Value::Null)
        });
        target.on("click", None, mutating).unwrap();
        target.trigger("click", &[]).unwrap();
        assert_eq!(target.text_content(), "clicked");
    }
}
