/// Application layer - Use cases, DTOs and the index service
///
/// This layer contains the application logic that orchestrates
/// domain services and coordinates with infrastructure through ports.
pub mod dto;
pub mod index_service;
pub mod use_cases;
