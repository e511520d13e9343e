//! Decides whether a target uses gesture or prompt input.

/// Widest viewport, in columns, that still qualifies for continuous mode.
///
/// Pointer capability alone is not enough: the drag gesture is tuned for a
/// small surface, so a pointer-capable wide viewport still prompts.
pub const DEFAULT_GESTURE_BREAKPOINT: u16 = 100;

/// How a target's value gets edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Modal adjuster surface driven by taps and drags.
    Continuous,
    /// Synchronous textual prompt for a number.
    Discrete,
}

/// Observed device capabilities at one point in time.
#[derive(Debug, Clone, Copy)]
pub struct PointerCaps {
    /// Whether the host delivers pointer press/drag/release events.
    pub pointer: bool,
    /// Current viewport width in columns.
    pub columns: u16,
}

/// Resolve the mode for a set of capabilities. Pure; both the day cells and
/// the weekly-goal control consume the same answer.
pub fn resolve(caps: PointerCaps, breakpoint: u16) -> InputMode {
    if caps.pointer && caps.columns <= breakpoint {
        InputMode::Continuous
    } else {
        InputMode::Discrete
    }
}

/// Tracks the live mode across viewport changes.
///
/// A session already open when the mode flips finishes under the mode it
/// opened with; the resolver only affects the next activation.
#[derive(Debug, Clone)]
pub struct ModalityResolver {
    pointer: bool,
    breakpoint: u16,
    mode: InputMode,
}

impl ModalityResolver {
    /// Build a resolver from the initial capability probe.
    pub fn new(pointer: bool, columns: u16, breakpoint: u16) -> Self {
        let caps = PointerCaps { pointer, columns };
        ModalityResolver {
            pointer,
            breakpoint,
            mode: resolve(caps, breakpoint),
        }
    }

    /// The mode the next activation should use.
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Re-evaluate after a resize; returns the new mode if it changed.
    pub fn observe_resize(&mut self, columns: u16) -> Option<InputMode> {
        let next = resolve(
            PointerCaps {
                pointer: self.pointer,
                columns,
            },
            self.breakpoint,
        );
        if next == self.mode {
            None
        } else {
            self.mode = next;
            Some(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_and_narrow_viewport_is_continuous() {
        let caps = PointerCaps {
            pointer: true,
            columns: 80,
        };
        assert_eq!(
            resolve(caps, DEFAULT_GESTURE_BREAKPOINT),
            InputMode::Continuous
        );
    }

    #[test]
    fn pointer_on_wide_viewport_still_prompts() {
        let caps = PointerCaps {
            pointer: true,
            columns: 200,
        };
        assert_eq!(
            resolve(caps, DEFAULT_GESTURE_BREAKPOINT),
            InputMode::Discrete
        );
    }

    #[test]
    fn no_pointer_always_prompts() {
        let caps = PointerCaps {
            pointer: false,
            columns: 40,
        };
        assert_eq!(
            resolve(caps, DEFAULT_GESTURE_BREAKPOINT),
            InputMode::Discrete
        );
    }

    #[test]
    fn breakpoint_is_inclusive() {
        let caps = PointerCaps {
            pointer: true,
            columns: DEFAULT_GESTURE_BREAKPOINT,
        };
        assert_eq!(
            resolve(caps, DEFAULT_GESTURE_BREAKPOINT),
            InputMode::Continuous
        );
    }

    #[test]
    fn resize_reports_only_transitions() {
        let mut resolver = ModalityResolver::new(true, 80, 100);
        assert_eq!(resolver.mode(), InputMode::Continuous);
        assert_eq!(resolver.observe_resize(90), None);
        assert_eq!(resolver.observe_resize(140), Some(InputMode::Discrete));
        assert_eq!(resolver.observe_resize(150), None);
        assert_eq!(resolver.observe_resize(60), Some(InputMode::Continuous));
    }
}
