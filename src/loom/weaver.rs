//! The default loom: a name → factory table and the widgets woven per element.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::completion::{Completion, LoomError, Woven};
use super::config::LoomConfig;
use super::entry::WeaveEntry;
use super::Loom;
use crate::dom::element::{Element, ElementSet};
use crate::event::handler::Value;
use crate::widget::base::{Widget, WidgetError};
use crate::widget::component::Component;
use crate::widget::handle::WidgetHandle;
use crate::widget::lifecycle::{Lifecycle, LifecycleEvent, LifecycleTracker};

type Factory = dyn Fn(Element, &[Value], Rc<dyn Loom>) -> Result<Rc<dyn Lifecycle>, WidgetError>;

/// A widget woven onto an element.
#[derive(Clone)]
pub struct WovenWidget {
    /// Registered name.
    pub name: String,
    /// The weave entry it was built from, restored on unweave.
    pub source: String,
    /// The live instance.
    pub widget: Rc<dyn Lifecycle>,
}

impl fmt::Debug for WovenWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WovenWidget")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Default [`Loom`]: builds registered widgets from the weave attribute.
///
/// Every element is processed synchronously when `weave`/`unweave` is called;
/// the returned completion is already settled. A failure on one element does
/// not undo work done on the others.
pub struct Weaver {
    me: Weak<Weaver>,
    config: LoomConfig,
    factories: RefCell<HashMap<String, Rc<Factory>>>,
    warp: RefCell<HashMap<Element, Vec<WovenWidget>>>,
    tracker: RefCell<LifecycleTracker>,
}

impl Weaver {
    /// A weaver with the default attribute names.
    pub fn new() -> Rc<Self> {
        Self::with_config(LoomConfig::default())
    }

    /// A weaver with custom attribute names.
    pub fn with_config(config: LoomConfig) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            config,
            factories: RefCell::new(HashMap::new()),
            warp: RefCell::new(HashMap::new()),
            tracker: RefCell::new(LifecycleTracker::new()),
        })
    }

    /// Register a widget factory under `name`, replacing any previous one.
    ///
    /// The factory receives a [`Widget`] already attached to the element and
    /// named `name`, plus the arguments from the weave entry followed by the
    /// forwarded ones.
    pub fn register<C, F>(&self, name: impl Into<String>, factory: F)
    where
        C: Component,
        F: Fn(Widget, &[Value]) -> Result<C, WidgetError> + 'static,
    {
        let name = name.into();
        let display_name = name.clone();
        let build = move |element: Element,
                          args: &[Value],
                          loom: Rc<dyn Loom>|
              -> Result<Rc<dyn Lifecycle>, WidgetError> {
            let widget = Widget::new(Some(element), loom)?.with_display_name(display_name.as_str());
            let component = factory(widget, args)?;
            Ok(Rc::new(WidgetHandle::new(component)) as Rc<dyn Lifecycle>)
        };
        self.factories.borrow_mut().insert(name, Rc::new(build));
    }

    /// Whether a factory is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.borrow().contains_key(name)
    }

    /// Widgets currently woven onto `element`, in weave order.
    pub fn woven(&self, element: &Element) -> Vec<WovenWidget> {
        self.warp.borrow().get(element).cloned().unwrap_or_default()
    }

    /// Drain the lifecycle events recorded so far.
    pub fn take_events(&self) -> Vec<LifecycleEvent> {
        self.tracker.borrow_mut().pending_events()
    }

    /// Number of elements carrying at least one woven widget.
    pub fn woven_elements(&self) -> usize {
        self.tracker.borrow().woven_nodes()
    }

    /// Finalize and forget widgets whose element has left its document.
    ///
    /// Runs at the start of every weave and unweave; call it directly after
    /// removing nodes outside a content helper. Returns the names dropped.
    pub fn prune(&self) -> Woven {
        self.prune_detached(&ElementSet::new())
    }

    /// Prune detached elements, leaving those in `keep` for an explicit unweave.
    fn prune_detached(&self, keep: &ElementSet) -> Woven {
        let detached: Vec<(Element, Vec<WovenWidget>)> = {
            let mut warp = self.warp.borrow_mut();
            let gone: Vec<Element> = warp
                .keys()
                .filter(|element| !element.exists() && !keep.contains(element))
                .cloned()
                .collect();
            gone.into_iter()
                .filter_map(|element| warp.remove(&element).map(|list| (element, list)))
                .collect()
        };

        let mut pruned = Vec::new();
        for (element, list) in detached {
            for woven in list {
                if let Err(err) = woven.widget.finalize() {
                    warn!(node = ?element.node(), widget = %woven.name, %err, "finalize of detached widget failed");
                }
                self.tracker.borrow_mut().on_unweave(&element, woven.name.as_str());
                debug!(node = ?element.node(), widget = %woven.name, "pruned");
                pruned.push(woven.name);
            }
        }
        pruned
    }

    fn weave_element(&self, element: &Element, args: &[Value]) -> Result<Woven, LoomError> {
        let Some(attr) = element.attr(&self.config.weave) else {
            return Ok(Vec::new());
        };
        let entries = WeaveEntry::parse_all(&attr)?;
        element.remove_attr(&self.config.weave)?;

        let mut woven = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if let Err(err) = self.weave_one(element, entry, args) {
                let rest: Vec<&str> = entries[index..].iter().map(|s| s.source.as_str()).collect();
                self.restore_pending(element, &rest)?;
                return Err(err);
            }
            woven.push(entry.name.clone());
        }
        Ok(woven)
    }

    fn weave_one(&self, element: &Element, entry: &WeaveEntry, args: &[Value]) -> Result<(), LoomError> {
        let factory = self
            .factories
            .borrow()
            .get(&entry.name)
            .cloned()
            .ok_or_else(|| LoomError::UnknownWidget(entry.name.clone()))?;
        let loom: Rc<dyn Loom> = self.me.upgrade().ok_or(WidgetError::LoomGone)?;

        let mut widget_args = entry.args.clone();
        widget_args.extend_from_slice(args);
        let widget = factory(element.clone(), &widget_args, loom)?;
        widget.initialize()?;

        self.warp
            .borrow_mut()
            .entry(element.clone())
            .or_default()
            .push(WovenWidget {
                name: entry.name.clone(),
                source: entry.source.clone(),
                widget,
            });
        self.tracker.borrow_mut().on_weave(element, entry.name.as_str());

        let mut names = element.attr(&self.config.woven).unwrap_or_default();
        if !names.is_empty() {
            names.push(' ');
        }
        names.push_str(&entry.name);
        element.set_attr(&self.config.woven, names)?;

        debug!(node = ?element.node(), widget = %entry.name, "woven");
        Ok(())
    }

    fn unweave_element(&self, element: &Element, args: &[Value]) -> Result<Woven, LoomError> {
        let only: Option<Vec<String>> = element
            .attr(&self.config.unweave)
            .map(|names| names.split_whitespace().map(str::to_owned).collect());
        if only.is_some() {
            element.remove_attr(&self.config.unweave)?;
        }

        // Positions in the warp list are kept so a failed teardown can put
        // the untouched widgets back where they were.
        let (targets, kept) = {
            let mut warp = self.warp.borrow_mut();
            let Some(list) = warp.get_mut(element) else {
                return Ok(Vec::new());
            };
            let mut targets = Vec::new();
            let mut kept = Vec::new();
            let mut keep = Vec::new();
            for (index, woven) in std::mem::take(list).into_iter().enumerate() {
                if only.as_ref().map_or(true, |names| names.contains(&woven.name)) {
                    targets.push((index, woven));
                } else {
                    kept.push(index);
                    keep.push(woven);
                }
            }
            *list = keep;
            if list.is_empty() {
                warp.remove(element);
            }
            (targets, kept)
        };

        let mut unwoven = Vec::with_capacity(targets.len());
        let mut sources = Vec::with_capacity(targets.len());
        let mut failure = None;
        let mut targets = targets.into_iter();
        while let Some((index, target)) = targets.next() {
            if let Err(err) = target.widget.finalize() {
                failure = Some(err);
                let remaining = std::iter::once((index, target)).chain(targets).collect();
                self.reinstate(element, &kept, remaining);
                break;
            }
            self.tracker.borrow_mut().on_unweave(element, target.name.as_str());
            debug!(node = ?element.node(), widget = %target.name, args = args.len(), "unwoven");
            sources.push(target.source);
            unwoven.push(target.name);
        }

        if element.exists() {
            self.sync_woven(element)?;
            let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
            self.restore_pending(element, &sources)?;
        }

        match failure {
            Some(err) => Err(err.into()),
            None => Ok(unwoven),
        }
    }

    /// Merge widgets that failed to unweave back into the warp list at their
    /// original positions. `kept` holds the positions of the list's current
    /// leading entries; anything woven since stays at the end.
    fn reinstate(&self, element: &Element, kept: &[usize], remaining: Vec<(usize, WovenWidget)>) {
        let mut warp = self.warp.borrow_mut();
        let mut current = warp.remove(element).unwrap_or_default();
        let added = current.split_off(kept.len().min(current.len()));

        let mut merged: Vec<(usize, WovenWidget)> =
            kept.iter().copied().zip(current).chain(remaining).collect();
        merged.sort_by_key(|(index, _)| *index);

        let mut list: Vec<WovenWidget> = merged.into_iter().map(|(_, woven)| woven).collect();
        list.extend(added);
        warp.insert(element.clone(), list);
    }

    /// Rewrite the woven attribute from the warp.
    fn sync_woven(&self, element: &Element) -> Result<(), LoomError> {
        let names: Vec<String> = self.woven(element).into_iter().map(|w| w.name).collect();
        if names.is_empty() {
            element.remove_attr(&self.config.woven)?;
        } else {
            element.set_attr(&self.config.woven, names.join(" "))?;
        }
        Ok(())
    }

    /// Put weave entries back so the element can be woven again.
    fn restore_pending(&self, element: &Element, sources: &[&str]) -> Result<(), LoomError> {
        if sources.is_empty() {
            return Ok(());
        }
        let mut pending = element.attr(&self.config.weave).unwrap_or_default();
        for source in sources {
            if !pending.is_empty() {
                pending.push(' ');
            }
            pending.push_str(source);
        }
        element.set_attr(&self.config.weave, pending)?;
        Ok(())
    }
}

impl Loom for Weaver {
    fn config(&self) -> &LoomConfig {
        &self.config
    }

    fn weave(&self, elements: ElementSet, args: &[Value]) -> Completion {
        debug!(elements = elements.len(), args = args.len(), "weave");
        self.prune_detached(&ElementSet::new());
        let parts: Vec<Completion> = elements
            .iter()
            .map(|element| Completion::from_result(self.weave_element(element, args)))
            .collect();
        Completion::all(parts)
    }

    fn unweave(&self, elements: ElementSet, args: &[Value]) -> Completion {
        debug!(elements = elements.len(), args = args.len(), "unweave");
        self.prune_detached(&elements);
        let parts: Vec<Completion> = elements
            .iter()
            .map(|element| Completion::from_result(self.unweave_element(element, args)))
            .collect();
        Completion::all(parts)
    }
}

impl fmt::Debug for Weaver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Weaver")
            .field("config", &self.config)
            .field("factories", &self.factories.borrow().keys().collect::<Vec<_>>())
            .field("woven_elements", &self.warp.borrow().len())
            .finish()
    }
}
