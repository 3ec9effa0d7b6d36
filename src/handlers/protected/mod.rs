// handlers/protected/mod.rs - Protected handlers (student / instructor JWT required)
//
// Route Prefix: /api/registration/*, /api/students/*, /api/instructors/*
// Middleware: JWT validation + role gate (admin passes every gate)
pub mod instructor;
pub mod registration;
pub mod student;
