use crate::api::CurtainState;
use crate::api::CurtainState::*;

/// Outcome of one tick of the transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Step {
    pub state: CurtainState,
    pub position: i32,
}

/// Advances `current` one unit toward `target`.
pub(crate) fn step(current: i32, target: i32) -> Step {
    let state = direction(current, target);
    let position = match state {
        Closing => current + 1,
        Opening => current - 1,
        Stopped => current,
    };
    Step { state, position }
}

/// Positions grow toward closed, so a higher target means closing.
pub(crate) fn direction(current: i32, target: i32) -> CurtainState {
    if target > current {
        Closing
    } else if target < current {
        Opening
    } else {
        Stopped
    }
}

pub(crate) fn steps_needed(current: i32, target: i32) -> u32 {
    current.abs_diff(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closes_toward_higher_target() {
        assert_eq!(
            step(10, 40),
            Step {
                state: Closing,
                position: 11
            }
        );
    }

    #[test]
    fn opens_toward_lower_target() {
        assert_eq!(
            step(10, 0),
            Step {
                state: Opening,
                position: 9
            }
        );
    }

    #[test]
    fn rests_at_target() {
        assert_eq!(
            step(55, 55),
            Step {
                state: Stopped,
                position: 55
            }
        );
    }

    #[test]
    fn converges_in_exact_number_of_steps() {
        let (mut current, target) = (80, 3);
        let mut ticks = 0;
        while direction(current, target) != Stopped {
            let next = step(current, target);
            assert_eq!(steps_needed(current, next.position), 1);
            current = next.position;
            ticks += 1;
        }
        assert_eq!(current, target);
        assert_eq!(ticks, steps_needed(80, 3));
    }
}
