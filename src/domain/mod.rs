// ==========================================
// Aupus Operações - Camada de domínio
// ==========================================
// Entidades e tipos; sem acesso a dados
// ==========================================

pub mod controle;
pub mod filtros;
pub mod prospec;
pub mod types;
pub mod ug;
pub mod usuario;

pub use controle::ControleRecord;
pub use filtros::Filtros;
pub use prospec::{ChaveUc, ProspecPatch, ProspecRecord};
pub use types::{Entidade, StatusProposta};
pub use ug::{Ug, UgPatch};
pub use usuario::{LoginResponse, SessionStatus, Usuario, UsuarioInput};
