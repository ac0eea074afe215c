//! Interactive drag sessions
//!
//! A drag is one continuous visual move of a shape. Intermediate moves
//! bypass the command history; only the final committed delta (on `end`)
//! becomes a command. Each shape allows at most one active session: the
//! element carries a generation-counted lock, and starting a new session
//! cancels the old one (its visual position reverts to the drag origin).

use crate::shape::{move_command, position_of, translate_direct};
use crate::{ArtCommand, ArtModelError, DragLock, Element, Offset, Point, Result, SinkRef};

pub struct DragSession {
    element: Element,
    sink: Option<SinkRef>,
    origin: Point,
    generation: u64,
}

impl DragSession {
    pub(crate) fn begin(element: Element, sink: Option<SinkRef>) -> Result<DragSession> {
        // Cancel a session already holding this shape before taking over.
        if let Some(lock) = element.drag_lock() {
            let current = position_of(&element)?;
            translate_direct(&element, current.offset_to(lock.origin))?;
        }

        let origin = position_of(&element)?;
        let generation = element
            .drag_lock()
            .map(|lock| lock.generation + 1)
            .unwrap_or(1);
        element.set_drag_lock(DragLock { generation, origin });

        Ok(DragSession {
            element,
            sink,
            origin,
            generation,
        })
    }

    /// The position the shape reverts to on cancel
    pub fn origin(&self) -> Point {
        self.origin
    }

    fn ensure_active(&self) -> Result<()> {
        match self.element.drag_lock() {
            Some(lock) if lock.generation == self.generation => Ok(()),
            _ => Err(ArtModelError::SessionDisabled),
        }
    }

    /// Current position of the dragged shape
    pub fn position(&self) -> Result<Point> {
        self.ensure_active()?;
        position_of(&self.element)
    }

    /// Shift the shape visually, outside the command history
    pub fn move_by(&mut self, offset: Offset) -> Result<()> {
        self.ensure_active()?;
        translate_direct(&self.element, offset)
    }

    /// Move the shape visually to an absolute position
    pub fn move_to(&mut self, point: Point) -> Result<()> {
        self.ensure_active()?;
        let current = position_of(&self.element)?;
        translate_direct(&self.element, current.offset_to(point))
    }

    /// Commit the drag: the accumulated delta becomes a single move command
    /// routed to the shape's sink. Returns the command, or `None` when the
    /// shape never left its origin. Consumes the session.
    pub fn end(self) -> Result<Option<ArtCommand>> {
        self.ensure_active()?;
        let current = position_of(&self.element)?;
        let delta = self.origin.offset_to(current);

        // Revert the visual move first so the committed command's undo
        // snapshot starts from the drag origin.
        translate_direct(&self.element, delta.reversed())?;
        self.element.clear_drag_lock();

        if delta.is_zero() {
            return Ok(None);
        }

        let mut command = move_command(&self.element, delta)?;
        command.execute()?;
        if let Some(sink) = &self.sink {
            sink.borrow_mut().append_command(command.clone());
        }
        Ok(Some(command))
    }

    /// Abandon the drag: the visual position reverts, no command is
    /// produced. Consumes the session.
    pub fn cancel(self) -> Result<()> {
        self.ensure_active()?;
        let current = position_of(&self.element)?;
        translate_direct(&self.element, current.offset_to(self.origin))?;
        self.element.clear_drag_lock();
        Ok(())
    }
}

impl std::fmt::Debug for DragSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragSession")
            .field("element", &self.element)
            .field("origin", &self.origin)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bounds, RectShape, Shape};

    fn dragged_rect() -> RectShape {
        RectShape::new(0.0, 0.0, 50.0, 50.0)
    }

    #[test]
    fn end_commits_one_move() {
        let mut rect = dragged_rect();
        let mut session = rect.begin_drag().unwrap();
        session.move_by(Offset::new(10.0, 0.0)).unwrap();
        session.move_by(Offset::new(5.0, 5.0)).unwrap();

        let command = session.end().unwrap().expect("shape moved");
        assert!(command.is_executed());
        assert_eq!(rect.bounds(), Bounds::new(15.0, 5.0, 50.0, 50.0));

        // The one command undoes the whole drag.
        let mut command = command;
        command.undo().unwrap();
        assert_eq!(rect.bounds(), Bounds::new(0.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn end_without_movement_commits_nothing() {
        let mut rect = dragged_rect();
        let session = rect.begin_drag().unwrap();
        assert!(session.end().unwrap().is_none());
    }

    #[test]
    fn cancel_reverts_position() {
        let mut rect = dragged_rect();
        let mut session = rect.begin_drag().unwrap();
        session.move_to(Point::new(40.0, 40.0)).unwrap();
        session.cancel().unwrap();
        assert_eq!(rect.bounds(), Bounds::new(0.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn second_begin_disables_first_session() {
        let mut rect = dragged_rect();
        let mut first = rect.begin_drag().unwrap();
        first.move_by(Offset::new(20.0, 20.0)).unwrap();

        // Starting a new drag cancels the first, reverting its move.
        let second = rect.begin_drag().unwrap();
        assert_eq!(rect.bounds(), Bounds::new(0.0, 0.0, 50.0, 50.0));

        assert!(matches!(
            first.move_by(Offset::new(1.0, 1.0)),
            Err(ArtModelError::SessionDisabled)
        ));
        assert!(matches!(first.end(), Err(ArtModelError::SessionDisabled)));

        drop(second);
    }
}
