//! Back-end do portal da clínica
//!
//! Serviço HTTP com o porteiro de sessão por perfil, os painéis de cada
//! perfil, CRUD de usuários/agendamentos/convites e os endpoints de repasse
//! ao upstream de IA generativa.

pub mod ai;
pub mod auth;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod mock;
pub mod ratelimit;
pub mod routes;
pub mod state;
pub mod store;

pub use routes::router;
pub use state::AppState;
