//! Linear undo/redo history with edge-triggered availability notifications

use crate::{EditError, Result};
use art_model::{ArtCommand, CommandEvent, CommandSink};
use tracing::{debug, trace};

/// Notification raised by the command manager.
///
/// The enable/disable events fire only on availability transitions (empty to
/// non-empty and back), never repeatedly: UI consumers bind toolbar state
/// directly to them instead of polling.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    UndoEnabled,
    UndoDisabled,
    RedoEnabled,
    RedoDisabled,
    UndoPerformed(CommandEvent),
    RedoPerformed(CommandEvent),
}

type Listener = Box<dyn FnMut(&HistoryEvent)>;

/// Owns the linear undo/redo history for one editing session.
///
/// The history is a single vector plus a position index; everything at or
/// past the index is the redo branch. Appending while a redo branch exists
/// discards the branch. Commands arrive already executed - the manager never
/// calls `execute` on append.
pub struct CommandManager {
    history: Vec<ArtCommand>,
    index: usize,
    listeners: Vec<Listener>,
    update_depth: usize,
    pending: Vec<ArtCommand>,
}

impl CommandManager {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            index: 0,
            listeners: Vec::new(),
            update_depth: 0,
            pending: Vec::new(),
        }
    }

    /// Register a notification listener
    pub fn subscribe(&mut self, listener: impl FnMut(&HistoryEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.history.len()
    }

    /// Number of commands currently held (both sides of the index)
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Current position in the history: commands before it are undoable
    pub fn index(&self) -> usize {
        self.index
    }

    /// Record an already-executed command.
    /// Any redo branch past the current index is discarded first.
    pub fn append(&mut self, command: ArtCommand) {
        if self.index < self.history.len() {
            self.history.truncate(self.index);
            debug!(index = self.index, "discarded redo branch");
            self.emit(&HistoryEvent::RedoDisabled);
        }

        let undo_was_unavailable = self.index == 0;
        debug!(kind = command.kind_name(), index = self.index, "append command");
        self.history.push(command);
        self.index += 1;

        if undo_was_unavailable {
            self.emit(&HistoryEvent::UndoEnabled);
        }
    }

    /// Undo the command before the index. Silent no-op when nothing is
    /// undoable.
    pub fn undo(&mut self) -> Result<Option<CommandEvent>> {
        if self.index == 0 {
            return Ok(None);
        }

        let redo_was_unavailable = self.index == self.history.len();
        let event = self.history[self.index - 1].undo()?;
        debug!(index = self.index - 1, "undo");
        if let Some(event) = &event {
            self.emit(&HistoryEvent::UndoPerformed(event.clone()));
        }
        self.index -= 1;

        if redo_was_unavailable {
            self.emit(&HistoryEvent::RedoEnabled);
        }
        if self.index == 0 {
            self.emit(&HistoryEvent::UndoDisabled);
        }
        Ok(event)
    }

    /// Re-execute the command at the index. Silent no-op when nothing is
    /// redoable.
    pub fn redo(&mut self) -> Result<Option<CommandEvent>> {
        if self.index == self.history.len() {
            return Ok(None);
        }

        let undo_was_unavailable = self.index == 0;
        let event = self.history[self.index].execute()?;
        debug!(index = self.index, "redo");
        if let Some(event) = &event {
            self.emit(&HistoryEvent::RedoPerformed(event.clone()));
        }
        self.index += 1;

        if undo_was_unavailable {
            self.emit(&HistoryEvent::UndoEnabled);
        }
        if self.index == self.history.len() {
            self.emit(&HistoryEvent::RedoDisabled);
        }
        Ok(event)
    }

    /// Drop the whole history without disposing the manager.
    /// Disable notifications fire only for sides that were available.
    pub fn clear_all(&mut self) {
        let undo_was_available = self.can_undo();
        let redo_was_available = self.can_redo();

        debug!(entries = self.history.len(), "clear history");
        self.history.clear();
        self.index = 0;

        if undo_was_available {
            self.emit(&HistoryEvent::UndoDisabled);
        }
        if redo_was_available {
            self.emit(&HistoryEvent::RedoDisabled);
        }
    }

    // -------------------------------------------------------------------
    // Update transactions
    // -------------------------------------------------------------------

    /// Open an update: commands arriving through the sink accumulate instead
    /// of landing in history one by one. Updates nest; only the outermost
    /// `end_update` commits.
    pub fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    /// Close the innermost update. Closing the outermost folds everything
    /// accumulated into a single sequence command appended as one undoable
    /// unit.
    pub fn end_update(&mut self) -> Result<()> {
        if self.update_depth == 0 {
            return Err(EditError::NoOpenUpdate);
        }
        self.update_depth -= 1;
        if self.update_depth > 0 || self.pending.is_empty() {
            return Ok(());
        }

        let commands = std::mem::take(&mut self.pending);
        debug!(commands = commands.len(), "commit update transaction");
        let mut sequence = ArtCommand::sequence(commands);
        // Children are already executed; this only marks the wrapper so a
        // later undo walks into it.
        sequence.execute()?;
        self.append(sequence);
        Ok(())
    }

    pub fn in_update(&self) -> bool {
        self.update_depth > 0
    }

    fn emit(&mut self, event: &HistoryEvent) {
        trace!(?event, "notify");
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl CommandSink for CommandManager {
    /// Sink entry used by shapes: transaction-aware append
    fn append_command(&mut self, command: ArtCommand) {
        if self.update_depth > 0 {
            self.pending.push(command);
        } else {
            self.append(command);
        }
    }
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandManager")
            .field("history", &self.history.len())
            .field("index", &self.index)
            .field("update_depth", &self.update_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use art_model::{ArtCommand, AttrValue, Element, ElementTag};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn executed_shift(rect: &Element, x: f64) -> ArtCommand {
        let mut command =
            ArtCommand::attr(rect.clone(), vec![("x".to_string(), AttrValue::Number(x))]);
        command.execute().unwrap();
        command
    }

    fn rect() -> Element {
        let rect = Element::new(ElementTag::Rect);
        rect.set_attr("x", 0.0);
        rect
    }

    fn recording_manager() -> (CommandManager, Rc<RefCell<Vec<HistoryEvent>>>) {
        let mut manager = CommandManager::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let captured = events.clone();
        manager.subscribe(move |event| captured.borrow_mut().push(event.clone()));
        (manager, events)
    }

    fn availability_events(events: &[HistoryEvent]) -> Vec<&HistoryEvent> {
        events
            .iter()
            .filter(|e| {
                !matches!(
                    e,
                    HistoryEvent::UndoPerformed(_) | HistoryEvent::RedoPerformed(_)
                )
            })
            .collect()
    }

    #[test]
    fn undo_redo_walk_the_index() {
        let rect = rect();
        let mut manager = CommandManager::new();

        manager.append(executed_shift(&rect, 10.0));
        manager.append(executed_shift(&rect, 20.0));
        assert_eq!(rect.number_attr("x"), Some(20.0));

        manager.undo().unwrap();
        assert_eq!(rect.number_attr("x"), Some(10.0));
        manager.undo().unwrap();
        assert_eq!(rect.number_attr("x"), Some(0.0));
        assert!(!manager.can_undo());

        manager.redo().unwrap();
        assert_eq!(rect.number_attr("x"), Some(10.0));
        manager.redo().unwrap();
        assert_eq!(rect.number_attr("x"), Some(20.0));
        assert!(!manager.can_redo());
    }

    #[test]
    fn undo_redo_when_unavailable_are_silent() {
        let mut manager = CommandManager::new();
        assert!(manager.undo().unwrap().is_none());
        assert!(manager.redo().unwrap().is_none());
    }

    #[test]
    fn append_discards_redo_branch() {
        let rect = rect();
        let mut manager = CommandManager::new();

        // History [A, B, C] at index 3.
        manager.append(executed_shift(&rect, 1.0));
        manager.append(executed_shift(&rect, 2.0));
        manager.append(executed_shift(&rect, 3.0));

        manager.undo().unwrap();
        manager.undo().unwrap();
        assert_eq!(manager.index(), 1);

        // Appending D discards B and C.
        manager.append(executed_shift(&rect, 9.0));
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.index(), 2);
        assert!(!manager.can_redo());
    }

    #[test]
    fn first_append_enables_undo_exactly_once() {
        let rect = rect();
        let (mut manager, events) = recording_manager();

        manager.append(executed_shift(&rect, 1.0));
        assert_eq!(
            events.borrow().as_slice(),
            &[HistoryEvent::UndoEnabled]
        );

        // Already enabled: a second append is silent.
        manager.append(executed_shift(&rect, 2.0));
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn availability_transitions_are_edge_triggered() {
        let rect = rect();
        let (mut manager, events) = recording_manager();

        manager.append(executed_shift(&rect, 1.0));
        manager.undo().unwrap();
        manager.redo().unwrap();
        manager.undo().unwrap();

        let observed = events.borrow();
        let availability = availability_events(&observed);
        assert_eq!(
            availability,
            vec![
                &HistoryEvent::UndoEnabled,  // append
                &HistoryEvent::RedoEnabled,  // first undo
                &HistoryEvent::UndoDisabled, // first undo reached index 0
                &HistoryEvent::UndoEnabled,  // redo
                &HistoryEvent::RedoDisabled, // redo reached the end
                &HistoryEvent::RedoEnabled,  // second undo
                &HistoryEvent::UndoDisabled, // second undo reached index 0
            ]
        );
    }

    #[test]
    fn truncation_disables_redo_before_enabling_undo() {
        let rect = rect();
        let (mut manager, events) = recording_manager();

        manager.append(executed_shift(&rect, 1.0));
        manager.undo().unwrap();
        events.borrow_mut().clear();

        // Index 0 with a redo branch: append truncates, disabling redo, and
        // re-enables undo.
        manager.append(executed_shift(&rect, 2.0));
        let observed = events.borrow();
        assert_eq!(
            observed.as_slice(),
            &[HistoryEvent::RedoDisabled, HistoryEvent::UndoEnabled]
        );
    }

    #[test]
    fn clear_all_notifies_only_available_sides() {
        let rect = rect();
        let (mut manager, events) = recording_manager();

        manager.clear_all();
        assert!(events.borrow().is_empty());

        manager.append(executed_shift(&rect, 1.0));
        events.borrow_mut().clear();
        manager.clear_all();
        assert_eq!(
            events.borrow().as_slice(),
            &[HistoryEvent::UndoDisabled]
        );
        assert!(manager.is_empty());
    }

    #[test]
    fn update_transaction_folds_into_one_entry() {
        let rect = rect();
        let mut manager = CommandManager::new();

        manager.begin_update();
        manager.append_command(executed_shift(&rect, 1.0));
        manager.append_command(executed_shift(&rect, 2.0));
        manager.append_command(executed_shift(&rect, 3.0));
        manager.end_update().unwrap();

        assert_eq!(manager.len(), 1);
        manager.undo().unwrap();
        assert_eq!(rect.number_attr("x"), Some(0.0));
        manager.redo().unwrap();
        assert_eq!(rect.number_attr("x"), Some(3.0));
    }

    #[test]
    fn empty_update_appends_nothing() {
        let mut manager = CommandManager::new();
        manager.begin_update();
        manager.end_update().unwrap();
        assert!(manager.is_empty());
    }

    #[test]
    fn nested_updates_commit_at_outermost_end() {
        let rect = rect();
        let mut manager = CommandManager::new();

        manager.begin_update();
        manager.append_command(executed_shift(&rect, 1.0));
        manager.begin_update();
        manager.append_command(executed_shift(&rect, 2.0));
        manager.end_update().unwrap();
        assert!(manager.is_empty());
        manager.end_update().unwrap();
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn end_update_without_begin_fails() {
        let mut manager = CommandManager::new();
        assert!(matches!(
            manager.end_update(),
            Err(EditError::NoOpenUpdate)
        ));
    }
}
