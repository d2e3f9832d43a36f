pub mod rate_service;
pub mod visit_service;
