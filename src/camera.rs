//! Map viewport intent.
//!
//! The camera machine says what the map should be showing, not how to
//! animate there. Each following state has an idle companion: the active
//! variant means a viewport transition is pending, the idle one that the
//! renderer has settled. The renderer reports completion through
//! [`CameraStateMachine::viewport_transition_completed`].

use log::debug;

use crate::state_machine::{MachineState, StateMachine, Subscription};
use crate::trip::{DirectionsPreview, TripState};

#[derive(Debug, Clone, PartialEq)]
pub enum CameraState {
    /// Static overview; no position tracking.
    ShowFixedLocation,
    FollowUserPosition,
    FollowUserPositionIdle,
    FollowUserHeading,
    FollowUserHeadingIdle,
    /// Fit the previewed routes.
    ShowRoute(DirectionsPreview),
    ShowRouteIdle(DirectionsPreview),
    ActiveRouting,
    ActiveRoutingIdle,
}

impl MachineState for CameraState {
    fn name(&self) -> &'static str {
        match self {
            CameraState::ShowFixedLocation => "ShowFixedLocation",
            CameraState::FollowUserPosition => "FollowUserPosition",
            CameraState::FollowUserPositionIdle => "FollowUserPositionIdle",
            CameraState::FollowUserHeading => "FollowUserHeading",
            CameraState::FollowUserHeadingIdle => "FollowUserHeadingIdle",
            CameraState::ShowRoute(_) => "ShowRoute",
            CameraState::ShowRouteIdle(_) => "ShowRouteIdle",
            CameraState::ActiveRouting => "ActiveRouting",
            CameraState::ActiveRoutingIdle => "ActiveRoutingIdle",
        }
    }
}

impl CameraState {
    /// The idle companion. States without one map to themselves.
    pub fn to_idle(&self) -> CameraState {
        match self {
            CameraState::FollowUserPosition => CameraState::FollowUserPositionIdle,
            CameraState::FollowUserHeading => CameraState::FollowUserHeadingIdle,
            CameraState::ShowRoute(preview) => CameraState::ShowRouteIdle(preview.clone()),
            CameraState::ActiveRouting => CameraState::ActiveRoutingIdle,
            other => other.clone(),
        }
    }

    /// The active companion. States without one map to themselves.
    pub fn from_idle(&self) -> CameraState {
        match self {
            CameraState::FollowUserPositionIdle => CameraState::FollowUserPosition,
            CameraState::FollowUserHeadingIdle => CameraState::FollowUserHeading,
            CameraState::ShowRouteIdle(preview) => CameraState::ShowRoute(preview.clone()),
            CameraState::ActiveRoutingIdle => CameraState::ActiveRouting,
            other => other.clone(),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(
            self,
            CameraState::FollowUserPositionIdle
                | CameraState::FollowUserHeadingIdle
                | CameraState::ShowRouteIdle(_)
                | CameraState::ActiveRoutingIdle
        )
    }

    /// Whether this state already shows what `target` asks for.
    ///
    /// Idleness is ignored, and following the heading also counts as
    /// following the position.
    fn satisfies(&self, target: &CameraState) -> bool {
        let active = self.from_idle();
        if active == *target {
            return true;
        }
        matches!(
            (&active, target),
            (CameraState::FollowUserHeading, CameraState::FollowUserPosition)
        )
    }
}

/// Camera intent for a trip phase, or None when the phase leaves the camera alone.
pub fn camera_state_for_trip(trip: &TripState) -> Option<CameraState> {
    match trip {
        TripState::InitialTerms | TripState::RequestingLocationPermissions => None,
        TripState::InsufficientLocationPermissions | TripState::RoutingFeedback(_) => {
            Some(CameraState::ShowFixedLocation)
        }
        TripState::Initial | TripState::SearchDestination => Some(CameraState::FollowUserPosition),
        // Keep showing whatever was on screen while the request is in flight
        TripState::RequestingRoutes(_) => None,
        TripState::PreviewDirections(preview)
        | TripState::UpdateOrigin(preview)
        | TripState::UpdateDestination(preview) => Some(CameraState::ShowRoute(preview.clone())),
        TripState::Routing(_) => Some(CameraState::ActiveRouting),
    }
}

pub type CameraStateMachine = StateMachine<CameraState>;

impl StateMachine<CameraState> {
    /// The renderer finished animating; settle into the idle companion.
    pub fn viewport_transition_completed(&self) {
        let idle = self.with_state(|s| Some(s.to_idle()).filter(|idle| idle != s));
        if let Some(idle) = idle {
            self.transition(idle);
        }
    }

    /// Leave idle and start following again, e.g. after the rider panned away.
    pub fn resume(&self) {
        let (idle, active) = self.with_state(|s| (s.is_idle(), s.from_idle()));
        if idle {
            self.transition(active);
        }
    }

    /// Switch between following the position and following the heading.
    /// Other states are left unchanged.
    pub fn toggle_heading(&self) {
        let next = self.with_state(|s| match s.from_idle() {
            CameraState::FollowUserPosition => Some(CameraState::FollowUserHeading),
            CameraState::FollowUserHeading => Some(CameraState::FollowUserPosition),
            _ => None,
        });
        if let Some(next) = next {
            self.transition(next);
        }
    }
}

/// Drive `camera` from `trip` transitions.
///
/// The camera only moves when the new trip phase asks for something it
/// isn't already showing. Dropping the returned subscription stops it.
pub fn follow_trip(
    trip: &StateMachine<TripState>,
    camera: &CameraStateMachine,
) -> Subscription<TripState> {
    let camera = camera.clone();
    trip.subscribe(move |_, new| {
        let Some(target) = camera_state_for_trip(new) else {
            return;
        };
        if camera.with_state(|current| current.satisfies(&target)) {
            return;
        }
        debug!("camera follows trip phase {}", new.name());
        camera.transition(target);
    })
}
