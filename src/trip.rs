//! The rider's journey as a state machine.
//!
//! [`TripState`] is the single source of truth for which phase the app is
//! in: terms, permissions, search, route preview, active routing and the
//! post-ride feedback. [`TripState::apply`] is the transition table for
//! UI and network events; [`TripStateMachine::dispatch`] runs it against
//! the live machine.

use log::warn;
use thiserror::Error;

use crate::route::{Location, Route, RouteRequest, RouteResponseSet};
use crate::state_machine::{MachineState, StateMachine};

/// Candidate routes the rider may choose among.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsPreview {
    request: RouteRequest,
    response: RouteResponseSet,
    selected_route_index: usize,
}

impl DirectionsPreview {
    /// # Panics
    /// If `response` is empty or `selected_route_index` is out of range.
    pub fn new(
        request: RouteRequest,
        response: RouteResponseSet,
        selected_route_index: usize,
    ) -> Self {
        assert!(
            selected_route_index < response.len(),
            "preview needs a selected route: index {selected_route_index} of {} route(s)",
            response.len()
        );
        Self {
            request,
            response,
            selected_route_index,
        }
    }

    pub fn request(&self) -> &RouteRequest {
        &self.request
    }

    pub fn response(&self) -> &RouteResponseSet {
        &self.response
    }

    pub fn selected_route_index(&self) -> usize {
        self.selected_route_index
    }

    pub fn selected_route(&self) -> &Route {
        &self.response.routes[self.selected_route_index]
    }

    /// The same preview with another route selected.
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn with_selected_route(&self, index: usize) -> Self {
        Self::new(self.request.clone(), self.response.clone(), index)
    }
}

/// Snapshot taken when the rider commits to a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Routing {
    request: RouteRequest,
    response: RouteResponseSet,
    selected_route: Route,
    selected_route_index: usize,
}

impl Routing {
    /// # Panics
    /// If `selected_route_index` does not name a route in `response`.
    pub fn new(
        request: RouteRequest,
        response: RouteResponseSet,
        selected_route_index: usize,
    ) -> Self {
        let selected_route = response
            .get(selected_route_index)
            .cloned()
            .unwrap_or_else(|| {
                panic!(
                    "routing needs a selected route: index {selected_route_index} of {} route(s)",
                    response.len()
                )
            });
        Self {
            request,
            response,
            selected_route,
            selected_route_index,
        }
    }

    pub fn from_preview(preview: &DirectionsPreview) -> Self {
        Self::new(
            preview.request.clone(),
            preview.response.clone(),
            preview.selected_route_index,
        )
    }

    /// Replace the committed route with the best route of a reroute response.
    ///
    /// # Panics
    /// If `response` is empty.
    pub fn rerouted(&self, request: RouteRequest, response: RouteResponseSet) -> Self {
        Self::new(request, response, 0)
    }

    pub fn request(&self) -> &RouteRequest {
        &self.request
    }

    pub fn response(&self) -> &RouteResponseSet {
        &self.response
    }

    pub fn selected_route(&self) -> &Route {
        &self.selected_route
    }

    pub fn selected_route_index(&self) -> usize {
        self.selected_route_index
    }

    pub fn destination(&self) -> &Location {
        &self.request.destination
    }
}

/// A finished ride awaiting the rider's feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingFeedback {
    pub routing: Routing,
    /// Whether the rider reached the destination or ended early.
    pub arrived: bool,
}

/// Phase of the rider's journey. Exactly one holds at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum TripState {
    InitialTerms,
    RequestingLocationPermissions,
    InsufficientLocationPermissions,
    Initial,
    SearchDestination,
    RequestingRoutes(RouteRequest),
    PreviewDirections(DirectionsPreview),
    UpdateOrigin(DirectionsPreview),
    UpdateDestination(DirectionsPreview),
    Routing(Routing),
    RoutingFeedback(RoutingFeedback),
}

/// Things that happen to a trip.
#[derive(Debug, Clone, PartialEq)]
pub enum TripEvent {
    TermsAccepted,
    LocationPermissionGranted,
    LocationPermissionDenied,
    SearchStarted,
    RoutesRequested(RouteRequest),
    RoutesLoaded(RouteResponseSet),
    RouteRequestFailed,
    RouteSelected(usize),
    EditOrigin,
    EditDestination,
    OriginChosen(Location),
    DestinationChosen(Location),
    StartRouting,
    Rerouted(RouteRequest, RouteResponseSet),
    EndRouting { arrived: bool },
    FeedbackFinished,
    Cancel,
}

impl TripEvent {
    fn name(&self) -> &'static str {
        match self {
            TripEvent::TermsAccepted => "TermsAccepted",
            TripEvent::LocationPermissionGranted => "LocationPermissionGranted",
            TripEvent::LocationPermissionDenied => "LocationPermissionDenied",
            TripEvent::SearchStarted => "SearchStarted",
            TripEvent::RoutesRequested(_) => "RoutesRequested",
            TripEvent::RoutesLoaded(_) => "RoutesLoaded",
            TripEvent::RouteRequestFailed => "RouteRequestFailed",
            TripEvent::RouteSelected(_) => "RouteSelected",
            TripEvent::EditOrigin => "EditOrigin",
            TripEvent::EditDestination => "EditDestination",
            TripEvent::OriginChosen(_) => "OriginChosen",
            TripEvent::DestinationChosen(_) => "DestinationChosen",
            TripEvent::StartRouting => "StartRouting",
            TripEvent::Rerouted(..) => "Rerouted",
            TripEvent::EndRouting { .. } => "EndRouting",
            TripEvent::FeedbackFinished => "FeedbackFinished",
            TripEvent::Cancel => "Cancel",
        }
    }
}

/// Why an event was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("event {event} is not valid in state {state}")]
    UnexpectedEvent {
        state: &'static str,
        event: &'static str,
    },

    #[error("route index {index} out of range for {count} route(s)")]
    RouteIndexOutOfRange { index: usize, count: usize },

    #[error("reroute response contained no routes")]
    NoRoutes,
}

impl MachineState for TripState {
    fn name(&self) -> &'static str {
        match self {
            TripState::InitialTerms => "InitialTerms",
            TripState::RequestingLocationPermissions => "RequestingLocationPermissions",
            TripState::InsufficientLocationPermissions => "InsufficientLocationPermissions",
            TripState::Initial => "Initial",
            TripState::SearchDestination => "SearchDestination",
            TripState::RequestingRoutes(_) => "RequestingRoutes",
            TripState::PreviewDirections(_) => "PreviewDirections",
            TripState::UpdateOrigin(_) => "UpdateOrigin",
            TripState::UpdateDestination(_) => "UpdateDestination",
            TripState::Routing(_) => "Routing",
            TripState::RoutingFeedback(_) => "RoutingFeedback",
        }
    }
}

impl TripState {
    /// State at app launch.
    pub fn launch(terms_accepted: bool) -> Self {
        if terms_accepted {
            TripState::Initial
        } else {
            TripState::InitialTerms
        }
    }

    /// The preview shown in this state, if any.
    pub fn preview(&self) -> Option<&DirectionsPreview> {
        match self {
            TripState::PreviewDirections(preview)
            | TripState::UpdateOrigin(preview)
            | TripState::UpdateDestination(preview) => Some(preview),
            _ => None,
        }
    }

    /// Next state for `event`.
    ///
    /// Returns `Ok(None)` when the event leaves the state as it is, which
    /// only happens for re-selecting the already-selected route.
    pub fn apply(self, event: TripEvent) -> Result<Option<TripState>, TransitionError> {
        let next = match (self, event) {
            (TripState::InitialTerms, TripEvent::TermsAccepted) => {
                TripState::RequestingLocationPermissions
            }

            (
                TripState::RequestingLocationPermissions
                | TripState::InsufficientLocationPermissions,
                TripEvent::LocationPermissionGranted,
            ) => TripState::Initial,

            (TripState::RequestingLocationPermissions, TripEvent::LocationPermissionDenied) => {
                TripState::InsufficientLocationPermissions
            }

            (TripState::Initial, TripEvent::SearchStarted) => TripState::SearchDestination,

            (
                TripState::Initial | TripState::SearchDestination,
                TripEvent::RoutesRequested(request),
            ) => TripState::RequestingRoutes(request),

            (TripState::RequestingRoutes(request), TripEvent::RoutesLoaded(response)) => {
                if response.is_empty() {
                    warn!("no routes found; returning to search start");
                    TripState::Initial
                } else {
                    TripState::PreviewDirections(DirectionsPreview::new(request, response, 0))
                }
            }

            (TripState::RequestingRoutes(_), TripEvent::RouteRequestFailed) => TripState::Initial,

            (TripState::PreviewDirections(preview), TripEvent::RouteSelected(index)) => {
                if index == preview.selected_route_index {
                    return Ok(None);
                }
                if index >= preview.response.len() {
                    return Err(TransitionError::RouteIndexOutOfRange {
                        index,
                        count: preview.response.len(),
                    });
                }
                TripState::PreviewDirections(preview.with_selected_route(index))
            }

            (TripState::PreviewDirections(preview), TripEvent::EditOrigin) => {
                TripState::UpdateOrigin(preview)
            }

            (TripState::PreviewDirections(preview), TripEvent::EditDestination) => {
                TripState::UpdateDestination(preview)
            }

            (TripState::UpdateOrigin(preview), TripEvent::OriginChosen(origin)) => {
                TripState::RequestingRoutes(RouteRequest::new(
                    origin,
                    preview.request.destination.clone(),
                ))
            }

            (TripState::UpdateDestination(preview), TripEvent::DestinationChosen(destination)) => {
                TripState::RequestingRoutes(RouteRequest::new(
                    preview.request.origin.clone(),
                    destination,
                ))
            }

            (
                TripState::UpdateOrigin(preview) | TripState::UpdateDestination(preview),
                TripEvent::Cancel,
            ) => TripState::PreviewDirections(preview),

            (TripState::PreviewDirections(preview), TripEvent::StartRouting) => {
                TripState::Routing(Routing::from_preview(&preview))
            }

            (TripState::Routing(routing), TripEvent::Rerouted(request, response)) => {
                if response.is_empty() {
                    return Err(TransitionError::NoRoutes);
                }
                TripState::Routing(routing.rerouted(request, response))
            }

            (TripState::Routing(routing), TripEvent::EndRouting { arrived }) => {
                TripState::RoutingFeedback(RoutingFeedback { routing, arrived })
            }

            (TripState::RoutingFeedback(_), TripEvent::FeedbackFinished) => TripState::Initial,

            (
                TripState::SearchDestination
                | TripState::RequestingRoutes(_)
                | TripState::PreviewDirections(_),
                TripEvent::Cancel,
            ) => TripState::Initial,

            (state, event) => {
                return Err(TransitionError::UnexpectedEvent {
                    state: state.name(),
                    event: event.name(),
                })
            }
        };

        Ok(Some(next))
    }
}

/// The app's trip state container.
pub type TripStateMachine = StateMachine<TripState>;

impl StateMachine<TripState> {
    /// Apply `event` to the current state and transition to the result.
    pub fn dispatch(&self, event: TripEvent) -> Result<(), TransitionError> {
        let event_name = event.name();
        match self.state().apply(event) {
            Ok(Some(next)) => {
                self.transition(next);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                warn!("rejected trip event {event_name}: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::nav::Coordinate;
    use std::cell::RefCell;
    use std::rc::Rc;

    pub(crate) fn route(distance: f64) -> Route {
        Route {
            legs: Vec::new(),
            distance,
            expected_travel_time: distance / 4.0,
            geometry: Vec::new(),
        }
    }

    pub(crate) fn request() -> RouteRequest {
        RouteRequest::new(
            Location::CurrentLocation {
                coordinate: Coordinate::new(37.768, -122.421),
            },
            Location::NamedPlace {
                coordinate: Coordinate::new(37.76, -122.41),
                name: "Dolores Park".into(),
            },
        )
    }

    pub(crate) fn two_routes() -> RouteResponseSet {
        RouteResponseSet::new(vec![route(1200.0), route(1500.0)])
    }

    pub(crate) fn preview() -> DirectionsPreview {
        DirectionsPreview::new(request(), two_routes(), 0)
    }

    #[test]
    fn happy_path_from_terms_to_feedback() {
        let machine = TripStateMachine::new(TripState::launch(false));
        assert_eq!(machine.state(), TripState::InitialTerms);

        machine.dispatch(TripEvent::TermsAccepted).unwrap();
        machine.dispatch(TripEvent::LocationPermissionGranted).unwrap();
        machine.dispatch(TripEvent::SearchStarted).unwrap();
        machine.dispatch(TripEvent::RoutesRequested(request())).unwrap();
        assert!(matches!(machine.state(), TripState::RequestingRoutes(_)));

        machine.dispatch(TripEvent::RoutesLoaded(two_routes())).unwrap();
        machine.dispatch(TripEvent::RouteSelected(1)).unwrap();
        let state = machine.state();
        assert_eq!(state.preview().unwrap().selected_route_index(), 1);
        assert_eq!(state.preview().unwrap().selected_route().distance, 1500.0);

        machine.dispatch(TripEvent::StartRouting).unwrap();
        match machine.state() {
            TripState::Routing(routing) => {
                assert_eq!(routing.selected_route_index(), 1);
                assert_eq!(routing.selected_route().distance, 1500.0);
            }
            other => panic!("expected routing, got {}", other.name()),
        }

        machine.dispatch(TripEvent::EndRouting { arrived: true }).unwrap();
        assert!(matches!(
            machine.state(),
            TripState::RoutingFeedback(RoutingFeedback { arrived: true, .. })
        ));

        machine.dispatch(TripEvent::FeedbackFinished).unwrap();
        assert_eq!(machine.state(), TripState::Initial);
    }

    #[test]
    fn denied_permission_then_granted() {
        let state = TripState::RequestingLocationPermissions
            .apply(TripEvent::LocationPermissionDenied)
            .unwrap()
            .unwrap();
        assert_eq!(state, TripState::InsufficientLocationPermissions);

        let state = state.apply(TripEvent::LocationPermissionGranted).unwrap().unwrap();
        assert_eq!(state, TripState::Initial);
    }

    #[test]
    fn zero_results_return_to_initial() {
        let state = TripState::RequestingRoutes(request())
            .apply(TripEvent::RoutesLoaded(RouteResponseSet::default()))
            .unwrap()
            .unwrap();
        assert_eq!(state, TripState::Initial);
    }

    #[test]
    fn failed_request_returns_to_initial() {
        let state = TripState::RequestingRoutes(request())
            .apply(TripEvent::RouteRequestFailed)
            .unwrap()
            .unwrap();
        assert_eq!(state, TripState::Initial);
    }

    #[test]
    fn reselecting_route_is_idempotent_and_silent() {
        let machine = TripStateMachine::new(TripState::PreviewDirections(preview()));
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let _sub = machine.subscribe(move |_, _| *counter.borrow_mut() += 1);

        machine.dispatch(TripEvent::RouteSelected(0)).unwrap();
        assert_eq!(*calls.borrow(), 0);

        machine.dispatch(TripEvent::RouteSelected(1)).unwrap();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let err = TripState::PreviewDirections(preview())
            .apply(TripEvent::RouteSelected(5))
            .unwrap_err();
        assert_eq!(err, TransitionError::RouteIndexOutOfRange { index: 5, count: 2 });
    }

    #[test]
    fn unexpected_event_names_state_and_event() {
        let machine = TripStateMachine::new(TripState::Initial);
        let err = machine.dispatch(TripEvent::StartRouting).unwrap_err();
        assert_eq!(
            err,
            TransitionError::UnexpectedEvent {
                state: "Initial",
                event: "StartRouting"
            }
        );
        assert_eq!(machine.state(), TripState::Initial);
    }

    #[test]
    fn editing_endpoints_requests_new_routes() {
        let destination = preview().request().destination.clone();
        let park = Location::NamedPlace {
            coordinate: Coordinate::new(37.77, -122.45),
            name: "Golden Gate Park".into(),
        };

        let editing = TripState::PreviewDirections(preview())
            .apply(TripEvent::EditOrigin)
            .unwrap()
            .unwrap();
        assert!(matches!(editing, TripState::UpdateOrigin(_)));

        match editing.apply(TripEvent::OriginChosen(park.clone())).unwrap().unwrap() {
            TripState::RequestingRoutes(request) => {
                assert_eq!(request.origin, park);
                assert_eq!(request.destination, destination);
            }
            other => panic!("expected requesting routes, got {}", other.name()),
        }

        let editing = TripState::PreviewDirections(preview())
            .apply(TripEvent::EditDestination)
            .unwrap()
            .unwrap();
        let back = editing.apply(TripEvent::Cancel).unwrap().unwrap();
        assert_eq!(back, TripState::PreviewDirections(preview()));
    }

    #[test]
    fn reroute_replaces_committed_route() {
        let routing = Routing::from_preview(&preview());
        let reroute = RouteRequest::reroute_from(
            Coordinate::new(37.765, -122.418),
            180.0,
            routing.destination().clone(),
        );

        let state = TripState::Routing(routing.clone())
            .apply(TripEvent::Rerouted(reroute.clone(), RouteResponseSet::new(vec![route(800.0)])))
            .unwrap()
            .unwrap();

        match state {
            TripState::Routing(updated) => {
                assert_eq!(updated.selected_route().distance, 800.0);
                assert_eq!(updated.request(), &reroute);
            }
            other => panic!("expected routing, got {}", other.name()),
        }

        let err = TripState::Routing(routing)
            .apply(TripEvent::Rerouted(reroute, RouteResponseSet::default()))
            .unwrap_err();
        assert_eq!(err, TransitionError::NoRoutes);
    }

    #[test]
    #[should_panic(expected = "routing needs a selected route")]
    fn routing_without_selected_route_panics() {
        Routing::new(request(), RouteResponseSet::default(), 0);
    }

    #[test]
    #[should_panic(expected = "preview needs a selected route")]
    fn preview_with_bad_index_panics() {
        DirectionsPreview::new(request(), two_routes(), 2);
    }
}
