use super::state::{CoordinatorState, ModeRequest};
use std::fmt;

/// Why a mode request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefuseReason {
    /// Camera, game and presentation modes are all refused while the AI
    /// assistant is enabled.
    AiActive,
    /// The RPS game and the presentation exclude each other.
    GameRunning,
    PresentationRunning,
}

impl fmt::Display for RefuseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefuseReason::AiActive => {
                write!(f, "AI assistant is enabled; disable it first")
            }
            RefuseReason::GameRunning => write!(f, "RPS game is running"),
            RefuseReason::PresentationRunning => write!(f, "presentation is running"),
        }
    }
}

/// Admission verdict for a mode request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Stop the current mode, then start the target.
    Accept,
    /// Already in this exact mode with these parameters; do nothing.
    Noop,
    Refuse(RefuseReason),
}

/// Pure admission check. Rules, in order:
/// 1. Nothing starts while AI is enabled.
/// 2. RPS and presentation are mutually exclusive.
/// 3. Re-requesting the active mode with identical parameters is a no-op.
pub fn decide(
    state: &CoordinatorState,
    request: &ModeRequest,
    rps_running: bool,
    presentation_running: bool,
) -> Decision {
    if state.ai_enabled {
        return Decision::Refuse(RefuseReason::AiActive);
    }

    match request {
        ModeRequest::Rps if presentation_running => {
            return Decision::Refuse(RefuseReason::PresentationRunning);
        }
        ModeRequest::Presentation if rps_running => {
            return Decision::Refuse(RefuseReason::GameRunning);
        }
        // Camera modes are also blocked while the presentation holds the
        // robot's attention.
        ModeRequest::Color(_)
        | ModeRequest::Face
        | ModeRequest::Gesture { .. }
        | ModeRequest::Object
        | ModeRequest::Plate
            if presentation_running =>
        {
            return Decision::Refuse(RefuseReason::PresentationRunning);
        }
        _ => {}
    }

    if state.active == request.target() {
        return Decision::Noop;
    }

    Decision::Accept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::TrackColor;
    use crate::coordinator::state::Mode;

    fn idle() -> CoordinatorState {
        CoordinatorState::new()
    }

    #[test]
    fn idle_accepts_any_mode() {
        let state = idle();
        for request in [
            ModeRequest::Color(TrackColor::Red),
            ModeRequest::Face,
            ModeRequest::Gesture { actions: true },
            ModeRequest::Object,
            ModeRequest::Plate,
            ModeRequest::Rps,
            ModeRequest::Presentation,
        ] {
            assert_eq!(decide(&state, &request, false, false), Decision::Accept);
        }
    }

    #[test]
    fn ai_enabled_refuses_everything() {
        let mut state = idle();
        state.ai_enabled = true;
        for request in [
            ModeRequest::Color(TrackColor::Blue),
            ModeRequest::Face,
            ModeRequest::Rps,
            ModeRequest::Presentation,
        ] {
            assert_eq!(
                decide(&state, &request, false, false),
                Decision::Refuse(RefuseReason::AiActive)
            );
        }
    }

    #[test]
    fn rps_and_presentation_exclude_each_other() {
        let mut state = idle();
        state.active = Mode::Presentation;
        assert_eq!(
            decide(&state, &ModeRequest::Rps, false, true),
            Decision::Refuse(RefuseReason::PresentationRunning)
        );

        let mut state = idle();
        state.active = Mode::Rps;
        assert_eq!(
            decide(&state, &ModeRequest::Presentation, true, false),
            Decision::Refuse(RefuseReason::GameRunning)
        );
    }

    #[test]
    fn same_color_is_noop_different_color_accepted() {
        let mut state = idle();
        state.active = Mode::Color(TrackColor::Red);

        assert_eq!(
            decide(&state, &ModeRequest::Color(TrackColor::Red), false, false),
            Decision::Noop
        );
        assert_eq!(
            decide(&state, &ModeRequest::Color(TrackColor::Blue), false, false),
            Decision::Accept
        );
    }

    #[test]
    fn same_mode_is_noop() {
        let mut state = idle();
        state.active = Mode::Face;
        assert_eq!(decide(&state, &ModeRequest::Face, false, false), Decision::Noop);
    }

    #[test]
    fn gesture_parameter_change_is_accepted() {
        let mut state = idle();
        state.active = Mode::Gesture { actions: false };
        assert_eq!(
            decide(&state, &ModeRequest::Gesture { actions: true }, false, false),
            Decision::Accept
        );
        assert_eq!(
            decide(&state, &ModeRequest::Gesture { actions: false }, false, false),
            Decision::Noop
        );
    }
}
