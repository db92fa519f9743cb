//! Reference-tag state machine.

/// Availability of the reference tag after a frame's aging pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReferenceState {
    /// Reference tag never observed; no origin exists yet.
    #[default]
    Unseen,
    /// Reference tag live (`ttl >= 0`); positions are measured against its latest pose.
    Live,
    /// Smoothing budget exhausted; positions fall back to the last known origin.
    Lost {
        /// Frames elapsed since the budget ran out (1 on the transition frame).
        stale_frames: u32,
    },
}

impl ReferenceState {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Relative positions are approximate (held origin).
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Lost { .. })
    }
}

/// Edge-triggered reference transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceEvent {
    /// Live -> lost. Raised once per contiguous loss interval.
    Lost,
    /// Lost -> live again.
    Reacquired,
}

/// Turns the per-frame reference liveness into edge events.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLatch {
    state: ReferenceState,
}

impl ReferenceLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReferenceState {
        self.state
    }

    /// Advance with this frame's observation of the reference tag.
    ///
    /// `ttl` is `None` when the reference has no table entry.
    pub fn update(&mut self, ttl: Option<i32>) -> Option<ReferenceEvent> {
        let (next, event) = match (self.state, ttl) {
            (ReferenceState::Unseen, None) => (ReferenceState::Unseen, None),
            (_, Some(t)) if t >= 0 => {
                let event = self.state.is_stale().then_some(ReferenceEvent::Reacquired);
                (ReferenceState::Live, event)
            }
            (ReferenceState::Live, _) => (
                ReferenceState::Lost { stale_frames: 1 },
                Some(ReferenceEvent::Lost),
            ),
            (ReferenceState::Lost { stale_frames }, _) => (
                ReferenceState::Lost {
                    stale_frames: stale_frames.saturating_add(1),
                },
                None,
            ),
            // A first sighting always arrives with a fresh budget, so an
            // unseen reference cannot be observed as exhausted.
            (ReferenceState::Unseen, Some(_)) => (ReferenceState::Unseen, None),
        };
        self.state = next;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_latch_starts_unseen() {
        assert_eq!(ReferenceState::default(), ReferenceState::Unseen);
        assert_eq!(ReferenceLatch::new().state(), ReferenceState::Unseen);
        assert!(!ReferenceState::default().is_live());
        assert!(!ReferenceState::default().is_stale());
    }

    #[test]
    fn test_unseen_stays_unseen_without_entry() {
        let mut latch = ReferenceLatch::new();
        for _ in 0..5 {
            assert_eq!(latch.update(None), None);
        }
        assert_eq!(latch.state(), ReferenceState::Unseen);
    }

    #[test]
    fn test_first_sighting_is_not_a_reacquisition() {
        let mut latch = ReferenceLatch::new();
        assert_eq!(latch.update(Some(20)), None);
        assert_eq!(latch.state(), ReferenceState::Live);
    }

    #[test]
    fn test_lost_fires_once_per_interval() {
        let mut latch = ReferenceLatch::new();
        latch.update(Some(0));

        assert_eq!(latch.update(Some(-1)), Some(ReferenceEvent::Lost));
        for _ in 0..50 {
            assert_eq!(latch.update(Some(-5)), None);
        }
        assert_eq!(latch.state(), ReferenceState::Lost { stale_frames: 51 });
    }

    #[test]
    fn test_reacquire_rearms_lost_signal() {
        let mut latch = ReferenceLatch::new();
        latch.update(Some(3));
        assert_eq!(latch.update(Some(-1)), Some(ReferenceEvent::Lost));
        assert_eq!(latch.update(Some(20)), Some(ReferenceEvent::Reacquired));
        assert_eq!(latch.update(Some(19)), None);
        assert_eq!(latch.update(Some(-1)), Some(ReferenceEvent::Lost));
    }
}
