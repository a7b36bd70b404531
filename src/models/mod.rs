// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ActivityRecord, ActorType, BoundingBox, Business, BusinessResult, CatalogFilter, Coordinates,
    FavoriteOutcome, LocatedUser, NewBusiness, NewNotification, NewUser, Notification,
    NotificationView, Service, User,
};
pub use requests::{
    LocationRequest, NearbyRequest, RegisterBusinessRequest, RegisterUserRequest, SearchQuery,
    ServiceRequest, TrackActivityRequest,
};
pub use responses::{
    CountResponse, ErrorResponse, HealthResponse, MessageResponse, RegistrationResponse,
};
