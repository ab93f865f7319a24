// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{CandidateFacility, Coordinate, DistanceResult, FacilityFields, NearbyResult, RankedCandidate};
pub use requests::NearbyRequest;
pub use responses::{ErrorResponse, HealthResponse, ResponseModel};
