use crate::error::CaptureError;
use crate::models::CaptureRect;

pub const INSTRUCTIONS: &str = "Click and drag to select an area, or press ESC to cancel";
pub const CAPTURING: &str = "Capturing screenshot...";

/// Drawing surface for the selection overlay
pub trait OverlaySurface: Send {
    /// Puts the overlay over the page with an instruction line
    fn show(&mut self, instructions: &str);

    fn draw_selection(&mut self, rect: CaptureRect);

    /// Live size readout, e.g. `320 × 200px`
    fn show_dimensions(&mut self, text: &str);

    /// Transient message; shown after teardown as well
    fn show_message(&mut self, text: &str, is_error: bool);

    /// Removes everything the overlay put on the page
    fn teardown(&mut self);
}

impl OverlaySurface for Box<dyn OverlaySurface> {
    fn show(&mut self, instructions: &str) {
        (**self).show(instructions)
    }

    fn draw_selection(&mut self, rect: CaptureRect) {
        (**self).draw_selection(rect)
    }

    fn show_dimensions(&mut self, text: &str) {
        (**self).show_dimensions(text)
    }

    fn show_message(&mut self, text: &str, is_error: bool) {
        (**self).show_message(text, is_error)
    }

    fn teardown(&mut self) {
        (**self).teardown()
    }
}

/// Overlay that only reports through the log
#[derive(Debug, Default)]
pub struct LogOverlay;

impl OverlaySurface for LogOverlay {
    fn show(&mut self, instructions: &str) {
        ::log::info!("{}", instructions);
    }

    fn draw_selection(&mut self, rect: CaptureRect) {
        ::log::trace!("Selection at {},{}", rect.x, rect.y);
    }

    fn show_dimensions(&mut self, text: &str) {
        ::log::debug!("Selection {}", text);
    }

    fn show_message(&mut self, text: &str, is_error: bool) {
        if is_error {
            ::log::error!("{}", text);
        } else {
            ::log::info!("{}", text);
        }
    }

    fn teardown(&mut self) {
        ::log::debug!("Overlay removed");
    }
}

/// Input the selector reacts to, in CSS pixels relative to the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    /// The cancel key
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Selecting { start_x: f64, start_y: f64 },
    Capturing,
    Closed,
}

/// What the selector did with an event
#[derive(Debug)]
pub enum SelectorStep {
    /// Still waiting for a complete selection
    Pending,
    /// A large enough rectangle was selected; the capture may start
    Selected(CaptureRect),
    /// The selection was too small; the overlay is gone
    Rejected(CaptureError),
    Cancelled,
}

/// Drag-to-select state machine driving an [`OverlaySurface`]
///
/// The surface is torn down exactly once: on cancel, on rejection, when the
/// capture finishes, or when the selector is dropped.
pub struct RegionSelector<S: OverlaySurface> {
    surface: S,
    min_px: u32,
    state: State,
}

fn rect_between(x0: f64, y0: f64, x1: f64, y1: f64) -> CaptureRect {
    CaptureRect {
        x: x0.min(x1).max(0.0).round() as u32,
        y: y0.min(y1).max(0.0).round() as u32,
        width: (x1 - x0).abs().round() as u32,
        height: (y1 - y0).abs().round() as u32,
    }
}

impl<S: OverlaySurface> RegionSelector<S> {
    /// Shows the overlay and waits for a drag
    pub fn start(mut surface: S, min_px: u32) -> Self {
        surface.show(INSTRUCTIONS);
        Self {
            surface,
            min_px,
            state: State::Idle,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    pub fn handle(&mut self, event: PointerEvent) -> SelectorStep {
        match (self.state, event) {
            (State::Closed, _) | (State::Capturing, _) => SelectorStep::Pending,
            (_, PointerEvent::Escape) => {
                self.close();
                ::log::info!("Region selection cancelled");
                SelectorStep::Cancelled
            }
            (State::Idle, PointerEvent::Down { x, y }) => {
                self.state = State::Selecting {
                    start_x: x,
                    start_y: y,
                };
                self.surface.draw_selection(rect_between(x, y, x, y));
                SelectorStep::Pending
            }
            (State::Selecting { start_x, start_y }, PointerEvent::Move { x, y }) => {
                let rect = rect_between(start_x, start_y, x, y);
                self.surface.draw_selection(rect);
                self.surface
                    .show_dimensions(&format!("{} × {}px", rect.width, rect.height));
                SelectorStep::Pending
            }
            (State::Selecting { start_x, start_y }, PointerEvent::Up { x, y }) => {
                let rect = rect_between(start_x, start_y, x, y);
                if rect.width < self.min_px || rect.height < self.min_px {
                    self.close();
                    self.surface.show_message(
                        &format!(
                            "Selection too small (minimum {}×{}px). Please select a larger area.",
                            self.min_px, self.min_px
                        ),
                        true,
                    );
                    return SelectorStep::Rejected(CaptureError::TooSmall {
                        width: rect.width,
                        height: rect.height,
                        min: self.min_px,
                    });
                }
                self.state = State::Capturing;
                self.surface.show(CAPTURING);
                SelectorStep::Selected(rect)
            }
            _ => SelectorStep::Pending,
        }
    }

    /// Closes the overlay and reports how the capture went
    pub fn finish<T>(&mut self, result: &Result<T, CaptureError>) {
        self.close();
        match result {
            Ok(_) => self.surface.show_message(
                "Screenshot captured! Open the prompt view to continue",
                false,
            ),
            Err(CaptureError::Timeout(_)) => self.surface.show_message(
                "Screenshot capture timed out. The page may be loading slowly. Please try again.",
                true,
            ),
            Err(e) => self
                .surface
                .show_message(&format!("Failed to capture screenshot: {}", e), true),
        }
    }

    fn close(&mut self) {
        if self.state != State::Closed {
            self.surface.teardown();
            self.state = State::Closed;
        }
    }
}

impl<S: OverlaySurface> Drop for RegionSelector<S> {
    fn drop(&mut self) {
        self.close();
    }
}
