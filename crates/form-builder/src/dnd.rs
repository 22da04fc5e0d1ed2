//! Pointer-gesture state for reordering fields, dropping palette tools and
//! resizing column spans.

use tracing::debug;

use crate::error::TreeError;
use crate::field::Field;
use crate::session::EditorSession;

/// Where a dragged item would land if released now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropIndicator {
    pub index: Option<usize>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ResizeGesture {
    start_x: f64,
    last_delta: i32,
}

#[derive(Debug, Clone, Default)]
pub struct DragReorderController {
    source: Option<usize>,
    indicator: DropIndicator,
    resize: Option<ResizeGesture>,
}

impl DragReorderController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<usize> {
        self.source
    }

    pub fn indicator(&self) -> &DropIndicator {
        &self.indicator
    }

    pub fn is_resizing(&self) -> bool {
        self.resize.is_some()
    }

    pub fn start_drag(&mut self, index: usize) {
        self.source = Some(index);
    }

    /// The pointer entered the drop area of the field at `index`. The
    /// indicator keeps its label while the pointer stays over the same slot.
    pub fn drag_enter(&mut self, index: usize, name: Option<&str>) {
        let same_slot = self.indicator.index == Some(index);
        self.indicator.index = Some(index);
        if !same_slot || self.indicator.name.is_none() {
            self.indicator.name = name.map(str::to_string);
        }
    }

    /// Releases a dragged field. Moves it when the drop slot differs from
    /// where the drag started; returns whether the layout changed.
    pub fn end_drag(&mut self, session: &mut EditorSession) -> bool {
        let moved = match (self.source, self.indicator.index) {
            (Some(source), Some(destination)) if source != destination => {
                match session.tree().scope().get(source).map(|field| field.name.clone()) {
                    Some(name) => session.update_field_index(&name, source, destination),
                    None => false,
                }
            }
            _ => false,
        };
        self.reset();
        moved
    }

    /// Drops a palette tool at the indicated slot, or at the end when no slot
    /// is indicated.
    pub fn drop_tool(&mut self, session: &mut EditorSession, template: Field) -> Result<String, TreeError> {
        let pos = self
            .indicator
            .index
            .map(|index| isize::try_from(index).unwrap_or(isize::MAX));
        let result = session.add_field(template, pos);
        self.reset();
        result
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.source = None;
        self.indicator = DropIndicator::default();
    }

    /// Starts a resize gesture on `name`, selecting it.
    pub fn start_resize(&mut self, session: &mut EditorSession, name: &str, x: f64) -> bool {
        if !session.set_active_field(Some(name)) {
            return false;
        }
        self.resize = Some(ResizeGesture {
            start_x: x,
            last_delta: 0,
        });
        true
    }

    /// Pointer moved to `x` while resizing inside a container `width` pixels
    /// wide.
    ///
    /// The horizontal distance is turned into whole columns. Each time that
    /// count changes, the active field grows or shrinks by one column in the
    /// direction of travel, clamped to the grid. Returns the new span when one
    /// was committed.
    pub fn resize(&mut self, session: &mut EditorSession, x: f64, width: f64) -> Result<Option<u8>, TreeError> {
        let Some(gesture) = self.resize.as_mut() else {
            return Ok(None);
        };
        let grid = session.tree().grid_columns();
        let width = if width > 0.0 {
            width
        } else {
            session.config().preview_width.max(0.0)
        };
        let column_width = width / f64::from(grid);
        if column_width <= 0.0 {
            return Ok(None);
        }

        let delta = ((x - gesture.start_x) / column_width).round() as i32;
        if delta == gesture.last_delta {
            return Ok(None);
        }
        let direction = if delta > gesture.last_delta { 1 } else { -1 };
        let current = session.active_field_columns();
        let next = (i32::from(current) + direction).clamp(1, i32::from(grid));
        if next == i32::from(current) {
            return Ok(None);
        }

        gesture.last_delta = delta;
        let span = u8::try_from(next).unwrap_or(grid);
        debug!(delta, span, "resize step");
        session.update_active_field_columns(span).map(Some)
    }

    pub fn stop_resize(&mut self) {
        self.resize = None;
    }
}
