// Profile photo uploads to object storage.

pub mod handlers;
pub mod store;
