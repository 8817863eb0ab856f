// ==========================================
// Aupus Operações - Cliente remoto
// ==========================================
// API REST com token bearer; 401 classificado em três casos
// ==========================================

pub mod api_client;
pub mod auth;
pub mod documentos;
pub mod error;
pub mod session_monitor;
pub mod transport;
pub mod usuarios;

pub use api_client::{classify_unauthorized, ApiClient, LogoutEvent};
pub use auth::AuthService;
pub use documentos::{DocumentoInfo, DocumentosApi};
pub use error::{ClientError, ClientResult, UnauthorizedKind};
pub use session_monitor::{MonitorOutcome, SessionMonitor};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use usuarios::UsuariosApi;
