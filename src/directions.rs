//! Route requests against the routing backend.
//!
//! Builds the backend query for a [`RouteRequest`], fetches it through a
//! [`DirectionsTransport`], and hands the body to the instruction
//! synthesizer. The result is returned to the caller; nothing here touches
//! trip state.

use std::future::Future;
use std::time::Duration;

use log::{debug, info};
use reqwest::{Client, Url};
use thiserror::Error;

use crate::config::{ConfigError, NavConfig};
use crate::instructions::InstructionSynthesizer;
use crate::nav::Coordinate;
use crate::route::{RouteRequest, RouteResponseSet};

/// Failures below the HTTP layer or non-success responses.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("routing backend returned status {status}")]
    Status { status: u16 },
}

/// Why a route request produced no routes.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("routing backend returned an empty body")]
    EmptyResponseBody,

    #[error("failed to decode route response: {0}")]
    DecodeFailure(#[from] serde_json::Error),

    #[error("route request failed: {0}")]
    Transport(#[from] TransportError),
}

/// Fetches a URL and returns the response body.
pub trait DirectionsTransport: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// [`DirectionsTransport`] over HTTPS.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl DirectionsTransport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Default match radius for canned routes.
pub const DEFAULT_FIXTURE_TOLERANCE_M: f64 = 30.0;

/// A stored response for one origin/destination pair.
#[derive(Debug, Clone)]
pub struct CannedRoute {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub body: String,
}

/// Local responses served instead of the network for known endpoints.
#[derive(Debug, Clone)]
pub struct CannedRoutes {
    routes: Vec<CannedRoute>,
    tolerance_m: f64,
}

impl Default for CannedRoutes {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_TOLERANCE_M)
    }
}

impl CannedRoutes {
    pub fn new(tolerance_m: f64) -> Self {
        Self {
            routes: Vec::new(),
            tolerance_m,
        }
    }

    pub fn with_route(
        mut self,
        origin: Coordinate,
        destination: Coordinate,
        body: impl Into<String>,
    ) -> Self {
        self.routes.push(CannedRoute {
            origin,
            destination,
            body: body.into(),
        });
        self
    }

    /// First stored response whose endpoints both lie within tolerance.
    pub fn lookup(&self, request: &RouteRequest) -> Option<&str> {
        let origin = request.origin.coordinate();
        let destination = request.destination.coordinate();

        self.routes
            .iter()
            .find(|canned| {
                canned.origin.distance_to(&origin) <= self.tolerance_m
                    && canned.destination.distance_to(&destination) <= self.tolerance_m
            })
            .map(|canned| canned.body.as_str())
    }
}

/// Backend query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsSettings {
    pub base_url: String,
    pub profile: String,
    /// Ask for alternatives on fresh (non-bearing) requests.
    pub alternatives: bool,
    /// Snapping radius for the origin of a bearing request.
    pub search_radius_m: f64,
    /// Allowed deviation around the requested bearing.
    pub bearing_range_deg: u16,
}

impl From<&NavConfig> for DirectionsSettings {
    fn from(config: &NavConfig) -> Self {
        Self {
            base_url: config.backend.base_url.clone(),
            profile: config.backend.profile.clone(),
            alternatives: config.backend.alternatives,
            search_radius_m: config.reroute.search_radius_m,
            bearing_range_deg: config.reroute.bearing_range_deg,
        }
    }
}

/// Issues route requests and returns annotated routes.
pub struct DirectionsClient<T: DirectionsTransport = HttpTransport> {
    base_url: Url,
    settings: DirectionsSettings,
    transport: T,
    synthesizer: InstructionSynthesizer,
    fixtures: Option<CannedRoutes>,
}

impl DirectionsClient<HttpTransport> {
    /// Client over HTTPS using the configured timeout.
    pub fn from_config(config: &NavConfig) -> Result<Self, ConfigError> {
        let timeout = Duration::from_secs(config.backend.timeout_seconds);
        let transport = HttpTransport::new(timeout).map_err(|e| ConfigError::ValidationError {
            message: format!("cannot build HTTP client: {e}"),
        })?;
        Self::new(DirectionsSettings::from(config), transport)
    }
}

impl<T: DirectionsTransport> DirectionsClient<T> {
    pub fn new(settings: DirectionsSettings, transport: T) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| ConfigError::ValidationError {
            message: format!("invalid backend URL '{}': {e}", settings.base_url),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::ValidationError {
                message: format!("backend URL '{}' cannot carry a path", settings.base_url),
            });
        }

        Ok(Self {
            base_url,
            settings,
            transport,
            synthesizer: InstructionSynthesizer::default(),
            fixtures: None,
        })
    }

    pub fn with_synthesizer(mut self, synthesizer: InstructionSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Serve matching requests from `fixtures` instead of the backend.
    pub fn with_fixtures(mut self, fixtures: CannedRoutes) -> Self {
        self.fixtures = Some(fixtures);
        self
    }

    pub fn without_fixtures(mut self) -> Self {
        self.fixtures = None;
        self
    }

    /// Request routes for `request`.
    ///
    /// An `Ok` with no routes means the backend found nothing; callers treat
    /// that as its own outcome rather than a failure.
    pub async fn request_route(
        &self,
        request: &RouteRequest,
    ) -> Result<RouteResponseSet, RequestError> {
        let body = match self.fixtures.as_ref().and_then(|f| f.lookup(request)) {
            Some(canned) => {
                debug!("serving canned route response");
                canned.as_bytes().to_vec()
            }
            None => {
                let url = self.route_url(request);
                debug!("requesting route: {url}");
                self.transport.get(&url).await?
            }
        };

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(RequestError::EmptyResponseBody);
        }

        let routes = self.synthesizer.decode(&body)?;
        info!(
            "received {} route(s){}",
            routes.len(),
            if request.is_reroute() { " for reroute" } else { "" }
        );
        Ok(routes)
    }

    /// Backend URL for a request.
    pub fn route_url(&self, request: &RouteRequest) -> Url {
        let origin = request.origin.coordinate();
        let destination = request.destination.coordinate();

        let mut url = self.base_url.clone();
        let path = format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}",
            url.path().trim_end_matches('/'),
            self.settings.profile,
            origin.lon,
            origin.lat,
            destination.lon,
            destination.lat,
        );
        url.set_path(&path);

        let mut query =
            String::from("overview=full&geometries=polyline&steps=true&annotations=true");
        match request.bearing {
            Some(bearing) => {
                query.push_str(&format!(
                    "&radiuses={};unlimited&bearings={},{};",
                    self.settings.search_radius_m.round() as i64,
                    bearing.rem_euclid(360.0).round() as i64 % 360,
                    self.settings.bearing_range_deg,
                ));
            }
            None if self.settings.alternatives => query.push_str("&alternatives=true"),
            None => {}
        }
        url.set_query(Some(&query));

        url
    }
}
