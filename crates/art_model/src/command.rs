//! Command objects - one reversible mutation each
//!
//! Every mutation of the document goes through a command: attach/detach,
//! style changes, raw attribute changes, caller-supplied custom pairs, and
//! ordered composites. A command is either executed or not; `execute` and
//! `undo` are idempotent no-ops when already in the target state, and both
//! return a descriptor of the change so the caller (usually the command
//! manager) can raise notifications. Commands themselves notify nobody.

use crate::{
    ArtModelError, AttrValue, Element, ElementId, ElementTag, NamespacedAttr, PathData, Result,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Receives commands generated by shape property mutation.
/// Implemented by the command manager; shapes hold an optional reference and
/// route generated commands here instead of applying mutations untracked.
pub trait CommandSink {
    fn append_command(&mut self, command: ArtCommand);
}

/// Shared sink handle for the single UI thread
pub type SinkRef = Rc<RefCell<dyn CommandSink>>;

/// One property transition in a style descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct StyleChange {
    pub prop: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// One attribute transition in an attr descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct AttrChange {
    pub name: String,
    pub old: Option<AttrValue>,
    pub new: Option<AttrValue>,
}

/// Descriptor returned by command execution and undo, consumed by callers to
/// raise change notifications
#[derive(Debug, Clone, PartialEq)]
pub enum CommandEvent {
    Append {
        element: ElementId,
        layer: ElementId,
    },
    Remove {
        element: ElementId,
        layer: ElementId,
    },
    Style {
        element: ElementId,
        changes: Vec<StyleChange>,
    },
    Attr {
        element: ElementId,
        changes: Vec<AttrChange>,
    },
    Text {
        element: ElementId,
        old: Option<String>,
        new: Option<String>,
    },
    Custom {
        element: Option<ElementId>,
        description: String,
    },
    Sequence(Vec<CommandEvent>),
}

// ===========================================================================
// Command variants
// ===========================================================================

/// Attach a shape element under a layer
#[derive(Debug, Clone)]
pub struct AppendCommand {
    element: Element,
    layer: Element,
}

impl AppendCommand {
    fn apply(&mut self) -> Result<CommandEvent> {
        self.layer.append_child(&self.element)?;
        Ok(CommandEvent::Append {
            element: self.element.id(),
            layer: self.layer.id(),
        })
    }

    fn revert(&mut self) -> Result<CommandEvent> {
        self.layer.remove_child(&self.element);
        Ok(CommandEvent::Remove {
            element: self.element.id(),
            layer: self.layer.id(),
        })
    }
}

/// Detach a shape element from its current layer.
/// Executing against a detached element is a programming error and fails.
#[derive(Debug, Clone)]
pub struct RemoveCommand {
    element: Element,
    /// Parent recorded at execute time so undo re-attaches to the same layer
    layer: Option<Element>,
}

impl RemoveCommand {
    fn apply(&mut self) -> Result<CommandEvent> {
        let layer = self.element.parent().ok_or(ArtModelError::NotAttached)?;
        layer.remove_child(&self.element);
        let event = CommandEvent::Remove {
            element: self.element.id(),
            layer: layer.id(),
        };
        self.layer = Some(layer);
        Ok(event)
    }

    fn revert(&mut self) -> Result<CommandEvent> {
        let layer = self.layer.clone().ok_or(ArtModelError::MissingSnapshot)?;
        layer.append_child(&self.element)?;
        Ok(CommandEvent::Append {
            element: self.element.id(),
            layer: layer.id(),
        })
    }
}

/// Snapshot taken on a style command's first execution.
/// `after` holds the values the element actually stores (its normalized
/// form), so redo reapplies the exact computed state instead of re-deriving
/// it from the request.
#[derive(Debug, Clone)]
struct StyleSnapshot {
    before: Vec<(String, Option<String>)>,
    after: Vec<(String, String)>,
}

/// Apply a CSS-like property map
#[derive(Debug, Clone)]
pub struct StyleCommand {
    element: Element,
    requested: BTreeMap<String, String>,
    snapshot: Option<StyleSnapshot>,
}

impl StyleCommand {
    fn apply(&mut self) -> Result<CommandEvent> {
        match &self.snapshot {
            None => {
                let mut before = Vec::new();
                for (prop, value) in &self.requested {
                    before.push((prop.clone(), self.element.style(prop)));
                    self.element.set_style(prop.clone(), value);
                }
                let after: Vec<(String, String)> = self
                    .requested
                    .keys()
                    .map(|prop| (prop.clone(), self.element.style(prop).unwrap_or_default()))
                    .collect();
                self.snapshot = Some(StyleSnapshot { before, after });
            }
            Some(snapshot) => {
                for (prop, value) in &snapshot.after {
                    self.element.set_style(prop.clone(), value);
                }
            }
        }

        let snapshot = self.snapshot.as_ref().ok_or(ArtModelError::MissingSnapshot)?;
        let changes = snapshot
            .before
            .iter()
            .zip(&snapshot.after)
            .map(|((prop, old), (_, new))| StyleChange {
                prop: prop.clone(),
                old: old.clone(),
                new: Some(new.clone()),
            })
            .collect();
        Ok(CommandEvent::Style {
            element: self.element.id(),
            changes,
        })
    }

    fn revert(&mut self) -> Result<CommandEvent> {
        let snapshot = self.snapshot.as_ref().ok_or(ArtModelError::MissingSnapshot)?;
        for (prop, old) in &snapshot.before {
            match old {
                Some(value) => self.element.set_style(prop.clone(), value),
                None => {
                    self.element.remove_style(prop);
                }
            }
        }
        let changes = snapshot
            .before
            .iter()
            .zip(&snapshot.after)
            .map(|((prop, old), (_, new))| StyleChange {
                prop: prop.clone(),
                old: Some(new.clone()),
                new: old.clone(),
            })
            .collect();
        Ok(CommandEvent::Style {
            element: self.element.id(),
            changes,
        })
    }
}

#[derive(Debug, Clone)]
struct AttrSnapshot {
    attrs_before: Vec<(String, Option<AttrValue>)>,
    ns_before: Vec<(String, String, Option<String>)>,
}

/// Apply raw attribute (and namespaced-attribute) key/value pairs
#[derive(Debug, Clone)]
pub struct AttrCommand {
    element: Element,
    attrs: Vec<(String, AttrValue)>,
    attrs_ns: Vec<NamespacedAttr>,
    snapshot: Option<AttrSnapshot>,
}

impl AttrCommand {
    fn apply(&mut self) -> Result<CommandEvent> {
        if self.snapshot.is_none() {
            let attrs_before = self
                .attrs
                .iter()
                .map(|(name, _)| (name.clone(), self.element.attr(name)))
                .collect();
            let ns_before = self
                .attrs_ns
                .iter()
                .map(|a| (a.ns.clone(), a.name.clone(), self.element.attr_ns(&a.ns, &a.name)))
                .collect();
            self.snapshot = Some(AttrSnapshot {
                attrs_before,
                ns_before,
            });
        }

        for (name, value) in &self.attrs {
            write_attr(&self.element, name, Some(value.clone()));
        }
        for attr in &self.attrs_ns {
            self.element.set_attr_ns(&attr.ns, &attr.name, attr.value.clone());
        }

        self.event(false)
    }

    fn revert(&mut self) -> Result<CommandEvent> {
        let snapshot = self.snapshot.clone().ok_or(ArtModelError::MissingSnapshot)?;
        for (name, old) in &snapshot.attrs_before {
            write_attr(&self.element, name, old.clone());
        }
        for (ns, name, old) in &snapshot.ns_before {
            match old {
                Some(value) => self.element.set_attr_ns(ns, name, value.clone()),
                None => {
                    self.element.remove_attr_ns(ns, name);
                }
            }
        }
        self.event(true)
    }

    /// Build the attr descriptor; `reverted` swaps the old/new direction
    fn event(&self, reverted: bool) -> Result<CommandEvent> {
        let snapshot = self.snapshot.as_ref().ok_or(ArtModelError::MissingSnapshot)?;
        let mut changes: Vec<AttrChange> = snapshot
            .attrs_before
            .iter()
            .zip(&self.attrs)
            .map(|((name, old), (_, new))| AttrChange {
                name: name.clone(),
                old: old.clone(),
                new: Some(new.clone()),
            })
            .collect();
        changes.extend(snapshot.ns_before.iter().zip(&self.attrs_ns).map(
            |((ns, name, old), new)| AttrChange {
                name: format!("{}:{}", ns, name),
                old: old.clone().map(AttrValue::Text),
                new: Some(AttrValue::Text(new.value.clone())),
            },
        ));
        if reverted {
            for change in &mut changes {
                std::mem::swap(&mut change.old, &mut change.new);
            }
        }
        Ok(CommandEvent::Attr {
            element: self.element.id(),
            changes,
        })
    }
}

/// Write an attribute, keeping the memoized path bounds usable.
///
/// A write to a path's `d` normally invalidates the cached bounds. When the
/// new data is the old data translated (same tail, shifted leading moveto),
/// the cache is re-seeded with the shifted box instead of being thrown away,
/// so repeated move commands never force a reparse.
fn write_attr(element: &Element, name: &str, value: Option<AttrValue>) {
    if element.tag() == ElementTag::Path && name == "d" {
        let cached = element.cached_path_bounds();
        let old_path = element
            .attr("d")
            .and_then(|v| v.as_text().and_then(|d| PathData::parse(d).ok()));
        let new_path = value
            .as_ref()
            .and_then(|v| v.as_text().and_then(|d| PathData::parse(d).ok()));

        match value {
            Some(value) => element.set_attr(name, value),
            None => {
                element.remove_attr(name);
            }
        }

        if let (Some(bounds), Some(old_path), Some(new_path)) = (cached, old_path, new_path) {
            let pure_translation = old_path.segments()[1..] == new_path.segments()[1..];
            if let (true, Some(old_start), Some(new_start)) =
                (pure_translation, old_path.start(), new_path.start())
            {
                element.set_cached_path_bounds(Some(
                    bounds.translated(old_start.offset_to(new_start)),
                ));
            }
        }
    } else {
        match value {
            Some(value) => element.set_attr(name, value),
            None => {
                element.remove_attr(name);
            }
        }
    }
}

/// Caller-supplied execute/undo closure pair, run verbatim.
/// Used for mutations not expressible as attribute or style changes, e.g.
/// replacing a text shape's full text run.
#[derive(Clone)]
pub struct CustomCommand {
    execute: Rc<dyn Fn() -> CommandEvent>,
    undo: Rc<dyn Fn() -> CommandEvent>,
}

impl CustomCommand {
    fn apply(&mut self) -> Result<CommandEvent> {
        Ok((self.execute)())
    }

    fn revert(&mut self) -> Result<CommandEvent> {
        Ok((self.undo)())
    }
}

impl std::fmt::Debug for CustomCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomCommand").finish_non_exhaustive()
    }
}

/// Ordered composite: children execute in forward order, undo in reverse
#[derive(Debug, Clone)]
pub struct SequenceCommand {
    commands: Vec<ArtCommand>,
}

impl SequenceCommand {
    fn apply(&mut self) -> Result<CommandEvent> {
        let mut events = Vec::new();
        for command in &mut self.commands {
            if let Some(event) = command.execute()? {
                events.push(event);
            }
        }
        Ok(CommandEvent::Sequence(events))
    }

    fn revert(&mut self) -> Result<CommandEvent> {
        let mut events = Vec::new();
        for command in self.commands.iter_mut().rev() {
            if let Some(event) = command.undo()? {
                events.push(event);
            }
        }
        Ok(CommandEvent::Sequence(events))
    }

    pub fn commands(&self) -> &[ArtCommand] {
        &self.commands
    }
}

// ===========================================================================
// The command wrapper
// ===========================================================================

#[derive(Debug, Clone)]
enum CommandKind {
    Append(AppendCommand),
    Remove(RemoveCommand),
    Style(StyleCommand),
    Attr(AttrCommand),
    Custom(CustomCommand),
    Sequence(SequenceCommand),
}

impl CommandKind {
    fn apply(&mut self) -> Result<CommandEvent> {
        match self {
            CommandKind::Append(c) => c.apply(),
            CommandKind::Remove(c) => c.apply(),
            CommandKind::Style(c) => c.apply(),
            CommandKind::Attr(c) => c.apply(),
            CommandKind::Custom(c) => c.apply(),
            CommandKind::Sequence(c) => c.apply(),
        }
    }

    fn revert(&mut self) -> Result<CommandEvent> {
        match self {
            CommandKind::Append(c) => c.revert(),
            CommandKind::Remove(c) => c.revert(),
            CommandKind::Style(c) => c.revert(),
            CommandKind::Attr(c) => c.revert(),
            CommandKind::Custom(c) => c.revert(),
            CommandKind::Sequence(c) => c.revert(),
        }
    }
}

/// One undoable unit of change.
///
/// The wrapper owns the executed/not-executed flag: `execute` on an executed
/// command and `undo` on an unexecuted one are silent no-ops returning
/// `None`, so the variant bodies never see a redundant call. Cloning shares
/// the underlying element handles, so a copy handed to a command sink and a
/// copy kept for batching mutate the same document state.
#[derive(Debug, Clone)]
pub struct ArtCommand {
    kind: CommandKind,
    executed: bool,
}

impl ArtCommand {
    fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            executed: false,
        }
    }

    /// Attach `element` under `layer`
    pub fn append(element: Element, layer: Element) -> Self {
        Self::new(CommandKind::Append(AppendCommand { element, layer }))
    }

    /// Detach `element` from its current layer
    pub fn remove(element: Element) -> Self {
        Self::new(CommandKind::Remove(RemoveCommand {
            element,
            layer: None,
        }))
    }

    /// Apply a CSS-like property map to `element`
    pub fn style(element: Element, props: BTreeMap<String, String>) -> Self {
        Self::new(CommandKind::Style(StyleCommand {
            element,
            requested: props,
            snapshot: None,
        }))
    }

    /// Apply a single style property to `element`
    pub fn style_prop(element: Element, prop: impl Into<String>, value: impl Into<String>) -> Self {
        let mut props = BTreeMap::new();
        props.insert(prop.into(), value.into());
        Self::style(element, props)
    }

    /// Apply raw attribute pairs to `element`
    pub fn attr(element: Element, attrs: Vec<(String, AttrValue)>) -> Self {
        Self::attr_with_ns(element, attrs, Vec::new())
    }

    /// Apply raw and namespaced attribute pairs to `element`
    pub fn attr_with_ns(
        element: Element,
        attrs: Vec<(String, AttrValue)>,
        attrs_ns: Vec<NamespacedAttr>,
    ) -> Self {
        Self::new(CommandKind::Attr(AttrCommand {
            element,
            attrs,
            attrs_ns,
            snapshot: None,
        }))
    }

    /// Wrap a caller-supplied execute/undo pair
    pub fn custom(
        execute: impl Fn() -> CommandEvent + 'static,
        undo: impl Fn() -> CommandEvent + 'static,
    ) -> Self {
        Self::new(CommandKind::Custom(CustomCommand {
            execute: Rc::new(execute),
            undo: Rc::new(undo),
        }))
    }

    /// Compose commands into one undoable unit
    pub fn sequence(commands: Vec<ArtCommand>) -> Self {
        Self::new(CommandKind::Sequence(SequenceCommand { commands }))
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Short name for logging
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            CommandKind::Append(_) => "append",
            CommandKind::Remove(_) => "remove",
            CommandKind::Style(_) => "style",
            CommandKind::Attr(_) => "attr",
            CommandKind::Custom(_) => "custom",
            CommandKind::Sequence(_) => "sequence",
        }
    }

    /// Execute the command. No-op if already executed.
    pub fn execute(&mut self) -> Result<Option<CommandEvent>> {
        if self.executed {
            return Ok(None);
        }
        let event = self.kind.apply()?;
        self.executed = true;
        Ok(Some(event))
    }

    /// Undo the command. No-op if not currently executed.
    pub fn undo(&mut self) -> Result<Option<CommandEvent>> {
        if !self.executed {
            return Ok(None);
        }
        let event = self.kind.revert()?;
        self.executed = false;
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bounds, ElementTag};

    fn rect_element() -> Element {
        let rect = Element::new(ElementTag::Rect);
        rect.set_attr("x", 0.0);
        rect.set_attr("y", 0.0);
        rect.set_attr("width", 50.0);
        rect.set_attr("height", 50.0);
        rect
    }

    #[test]
    fn append_then_undo_detaches() {
        let layer = Element::new_layer();
        let rect = rect_element();
        let mut command = ArtCommand::append(rect.clone(), layer.clone());

        let event = command.execute().unwrap().unwrap();
        assert!(matches!(event, CommandEvent::Append { .. }));
        assert!(layer.has_child(&rect));

        let event = command.undo().unwrap().unwrap();
        assert!(matches!(event, CommandEvent::Remove { .. }));
        assert!(!rect.is_attached());
    }

    #[test]
    fn execute_is_idempotent() {
        let layer = Element::new_layer();
        let rect = rect_element();
        let mut command = ArtCommand::append(rect.clone(), layer.clone());

        assert!(command.execute().unwrap().is_some());
        assert!(command.execute().unwrap().is_none());
        assert_eq!(layer.child_count(), 1);

        // Undo on a never-executed command is equally silent.
        let mut other = ArtCommand::remove(rect);
        assert!(other.undo().unwrap().is_none());
    }

    #[test]
    fn remove_fails_on_detached_element() {
        let rect = rect_element();
        let mut command = ArtCommand::remove(rect);
        assert!(matches!(
            command.execute(),
            Err(ArtModelError::NotAttached)
        ));
    }

    #[test]
    fn remove_undo_restores_recorded_layer() {
        let layer = Element::new_layer();
        let rect = rect_element();
        layer.append_child(&rect).unwrap();

        let mut command = ArtCommand::remove(rect.clone());
        command.execute().unwrap();
        assert!(!rect.is_attached());

        command.undo().unwrap();
        assert!(rect.parent().unwrap().same_element(&layer));
    }

    #[test]
    fn style_undo_restores_prior_value() {
        let rect = rect_element();
        rect.set_style("fill", "#000000");

        let mut command = ArtCommand::style_prop(rect.clone(), "fill", "#ff0000");
        command.execute().unwrap();
        assert_eq!(rect.style("fill").as_deref(), Some("#ff0000"));

        command.undo().unwrap();
        assert_eq!(rect.style("fill").as_deref(), Some("#000000"));
    }

    #[test]
    fn style_undo_removes_previously_unset_property() {
        let rect = rect_element();
        let mut command = ArtCommand::style_prop(rect.clone(), "fill-opacity", "0.5");
        command.execute().unwrap();
        command.undo().unwrap();
        assert!(rect.style("fill-opacity").is_none());
    }

    #[test]
    fn style_redo_reapplies_cached_computed_state() {
        let rect = rect_element();
        // The element normalizes on write; the snapshot must hold the
        // normalized value so redo does not depend on the raw request.
        let mut command = ArtCommand::style_prop(rect.clone(), "fill", "  #ff0000  ");
        command.execute().unwrap();
        command.undo().unwrap();
        command.execute().unwrap();
        assert_eq!(rect.style("fill").as_deref(), Some("#ff0000"));
    }

    #[test]
    fn attr_undo_restores_and_removes() {
        let rect = rect_element();
        let mut command = ArtCommand::attr(
            rect.clone(),
            vec![
                ("x".to_string(), AttrValue::Number(10.0)),
                ("rx".to_string(), AttrValue::Number(4.0)),
            ],
        );
        command.execute().unwrap();
        assert_eq!(rect.number_attr("x"), Some(10.0));
        assert_eq!(rect.number_attr("rx"), Some(4.0));

        command.undo().unwrap();
        assert_eq!(rect.number_attr("x"), Some(0.0));
        assert!(rect.attr("rx").is_none());
    }

    #[test]
    fn attr_command_shifts_cached_path_bounds() {
        let path = Element::new(ElementTag::Path);
        path.set_attr("d", "M 10 10 l 5 5");
        path.set_cached_path_bounds(Some(Bounds::new(10.0, 10.0, 5.0, 5.0)));

        let mut command = ArtCommand::attr(
            path.clone(),
            vec![("d".to_string(), AttrValue::from("M 13 8 l 5 5"))],
        );
        command.execute().unwrap();
        assert_eq!(
            path.cached_path_bounds(),
            Some(Bounds::new(13.0, 8.0, 5.0, 5.0))
        );

        command.undo().unwrap();
        assert_eq!(
            path.cached_path_bounds(),
            Some(Bounds::new(10.0, 10.0, 5.0, 5.0))
        );
    }

    #[test]
    fn attr_command_drops_cache_when_tail_changes() {
        let path = Element::new(ElementTag::Path);
        path.set_attr("d", "M 10 10 l 5 5");
        path.set_cached_path_bounds(Some(Bounds::new(10.0, 10.0, 5.0, 5.0)));

        let mut command = ArtCommand::attr(
            path.clone(),
            vec![("d".to_string(), AttrValue::from("M 10 10 l 9 9"))],
        );
        command.execute().unwrap();
        assert!(path.cached_path_bounds().is_none());
    }

    #[test]
    fn custom_command_runs_closures() {
        let text = Element::new(ElementTag::Text);
        text.set_text(Some("before".to_string()));

        let id = text.id();
        let for_execute = text.clone();
        let for_undo = text.clone();
        let mut command = ArtCommand::custom(
            move || {
                let old = for_execute.text();
                for_execute.set_text(Some("after".to_string()));
                CommandEvent::Text {
                    element: id,
                    old,
                    new: Some("after".to_string()),
                }
            },
            move || {
                let old = for_undo.text();
                for_undo.set_text(Some("before".to_string()));
                CommandEvent::Text {
                    element: id,
                    old,
                    new: Some("before".to_string()),
                }
            },
        );

        command.execute().unwrap();
        assert_eq!(text.text().as_deref(), Some("after"));
        command.undo().unwrap();
        assert_eq!(text.text().as_deref(), Some("before"));
    }

    #[test]
    fn sequence_undoes_in_reverse_order() {
        let layer = Element::new_layer();
        let rect = rect_element();

        // Append, then move: undo must revert the move before the append.
        let append = ArtCommand::append(rect.clone(), layer.clone());
        let shift = ArtCommand::attr(rect.clone(), vec![("x".to_string(), AttrValue::Number(25.0))]);
        let mut sequence = ArtCommand::sequence(vec![append, shift]);

        sequence.execute().unwrap();
        assert!(rect.is_attached());
        assert_eq!(rect.number_attr("x"), Some(25.0));

        sequence.undo().unwrap();
        assert!(!rect.is_attached());
        assert_eq!(rect.number_attr("x"), Some(0.0));

        // Redo replays the same effect.
        sequence.execute().unwrap();
        assert!(rect.is_attached());
        assert_eq!(rect.number_attr("x"), Some(25.0));
    }
}
