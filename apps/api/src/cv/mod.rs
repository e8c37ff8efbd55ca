// CV data: loading, input normalization, and the document generation endpoints.

pub mod handlers;
pub mod normalize;
pub mod repository;
