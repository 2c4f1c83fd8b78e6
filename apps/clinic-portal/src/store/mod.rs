//! Acesso ao banco: consultas CRUD sobre o pool compartilhado
//!
//! Última escrita vence; não há detecção de conflito entre sessões
//! concorrentes.

pub mod appointments;
pub mod invitations;
pub mod keys;
pub mod users;
