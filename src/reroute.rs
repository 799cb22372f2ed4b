//! Live-navigation rerouting.
//!
//! Tracks whether a reroute is in flight and throttles how often a new one
//! may start. The policy only records state; the caller issues the request
//! and reports back through [`ReroutePolicy::accept_result`] or
//! [`ReroutePolicy::abandon`].

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::config::RerouteConfig;
use crate::nav::{project_on_path, Coordinate};
use crate::route::{Location, RouteRequest, RouteResponseSet};

/// Minimum movement between fixes for a heading to be derived from them.
const MIN_HEADING_DISTANCE_M: f64 = 3.0;
/// Off-route distance used when none is configured.
pub const DEFAULT_OFF_ROUTE_THRESHOLD_M: f64 = 50.0;

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerouteState {
    Idle,
    Rerouting,
}

/// Gate for reroute requests during active routing.
///
/// Created when routing begins and dropped when it ends.
#[derive(Debug)]
pub struct ReroutePolicy<C: Clock = SystemClock> {
    state: RerouteState,
    last_location: Option<Coordinate>,
    heading: Option<f64>,
    last_idle_at: Instant,
    cooldown: Duration,
    off_route_threshold_m: f64,
    clock: C,
}

impl ReroutePolicy<SystemClock> {
    pub fn from_config(config: &RerouteConfig) -> Self {
        Self::new(config.cooldown(), SystemClock)
            .with_off_route_threshold(config.off_route_threshold_m)
    }
}

impl<C: Clock> ReroutePolicy<C> {
    pub fn new(cooldown: Duration, clock: C) -> Self {
        Self {
            state: RerouteState::Idle,
            last_location: None,
            heading: None,
            last_idle_at: clock.now(),
            cooldown,
            off_route_threshold_m: DEFAULT_OFF_ROUTE_THRESHOLD_M,
            clock,
        }
    }

    pub fn with_off_route_threshold(mut self, threshold_m: f64) -> Self {
        self.off_route_threshold_m = threshold_m;
        self
    }

    pub fn off_route_threshold_m(&self) -> f64 {
        self.off_route_threshold_m
    }

    /// Whether `position` has strayed past the configured threshold from `geometry`.
    pub fn is_off_route(&self, position: &Coordinate, geometry: &[Coordinate]) -> bool {
        is_off_route(position, geometry, self.off_route_threshold_m)
    }

    pub fn state(&self) -> RerouteState {
        self.state
    }

    pub fn last_location(&self) -> Option<Coordinate> {
        self.last_location
    }

    /// Direction of travel derived from the last two fixes that were far
    /// enough apart.
    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    pub fn update_location(&mut self, location: Coordinate) {
        if let Some(previous) = self.last_location {
            if previous.distance_to(&location) < MIN_HEADING_DISTANCE_M {
                // Too close to tell direction; keep the old fix as the anchor
                return;
            }
            self.heading = Some(previous.bearing_to(&location));
        }
        self.last_location = Some(location);
    }

    /// True when idle and the cooldown since the last return to idle has elapsed.
    pub fn can_request_reroute(&self) -> bool {
        self.state == RerouteState::Idle
            && self.clock.now().saturating_duration_since(self.last_idle_at) >= self.cooldown
    }

    /// Enter `Rerouting` if allowed.
    pub fn begin_reroute(&mut self) -> bool {
        if !self.can_request_reroute() {
            return false;
        }
        debug!("reroute started");
        self.state = RerouteState::Rerouting;
        true
    }

    /// Start a reroute and build the request for it.
    ///
    /// The request starts at the last known location and is constrained to
    /// the rider's heading when one is known. None when no location is known
    /// or the policy does not allow a reroute yet.
    pub fn reroute_request(&mut self, destination: &Location) -> Option<RouteRequest> {
        let position = self.last_location?;
        if !self.begin_reroute() {
            return None;
        }
        let request = match self.heading {
            Some(heading) => RouteRequest::reroute_from(position, heading, destination.clone()),
            None => RouteRequest::new(
                Location::CurrentLocation {
                    coordinate: position,
                },
                destination.clone(),
            ),
        };
        Some(request)
    }

    /// Return to idle without applying a route.
    pub fn abandon(&mut self) {
        if self.state == RerouteState::Rerouting {
            debug!("reroute abandoned");
        }
        self.set_idle();
    }

    /// Take the response of a reroute request.
    ///
    /// Returns the routes to apply, or None when the attempt was already
    /// abandoned or the backend found nothing. Always leaves the policy idle.
    pub fn accept_result(&mut self, routes: RouteResponseSet) -> Option<RouteResponseSet> {
        if self.state != RerouteState::Rerouting {
            warn!("dropping reroute result for an abandoned attempt");
            return None;
        }
        self.set_idle();

        if routes.is_empty() {
            warn!("reroute returned no routes");
            return None;
        }
        Some(routes)
    }

    fn set_idle(&mut self) {
        self.state = RerouteState::Idle;
        self.last_idle_at = self.clock.now();
    }
}

/// Whether `position` is farther than `threshold_m` from the route geometry.
///
/// A geometry too short to project onto never counts as off route.
pub fn is_off_route(position: &Coordinate, geometry: &[Coordinate], threshold_m: f64) -> bool {
    project_on_path(position, geometry)
        .map(|projection| projection.offset_m > threshold_m)
        .unwrap_or(false)
}
