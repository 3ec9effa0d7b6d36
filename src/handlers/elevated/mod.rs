// handlers/elevated/mod.rs - Elevated handlers (admin JWT required)
//
// Route Prefix: /api/admin/*
pub mod admin;
