//! LuxAcademy enrollment — course signup wizard core.

pub mod config;
pub mod enrollment;
pub mod error;
pub mod llm;
