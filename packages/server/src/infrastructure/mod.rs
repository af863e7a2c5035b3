//! Infrastructure layer: Room Store, connections, wire DTOs and serializers.

pub mod connection;
pub mod dto;
pub mod repository;
pub mod serializer;
