//! Database query functions organized by domain.

pub mod accounts;
pub mod rows;
