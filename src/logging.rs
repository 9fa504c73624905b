//! Inicialização do tracing-subscriber para o pipeline
//!
//! Equivalente ao helper de logging das fases de extração/transformação:
//! nível controlável via `RUST_LOG`, default `info`.

use tracing_subscriber::EnvFilter;

/// Inicializa o subscriber global; entra em pânico se já houver um instalado
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Variante tolerante para testes e binários embutidos
pub fn try_init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_is_idempotent() {
        // A primeira chamada pode ou não instalar o subscriber (outros testes
        // correm em paralelo); a segunda nunca deve entrar em pânico.
        let _ = try_init();
        let _ = try_init();
    }
}
