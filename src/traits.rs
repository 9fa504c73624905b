use async_trait::async_trait;
use crate::error::Result;
use crate::types::{PipelineResult, Table};

/// Trait para componentes que extraem dados de uma fonte
///
/// Cada extrator devolve registros tipados da sua entidade; a validação de
/// campos críticos acontece dentro de `extract` e falhas são fatais.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Tipo de registro produzido pela fonte
    type Record;

    /// Extrai e valida os dados da fonte
    async fn extract(&self) -> Result<Vec<Self::Record>>;

    /// Nome da entidade de origem (para logging)
    fn entity(&self) -> &'static str;
}

/// Trait para componentes que carregam tabelas do warehouse em um destino
#[async_trait]
pub trait Loader: Send + Sync {
    /// Carrega uma tabela no destino
    async fn load(&self, table: &Table) -> Result<PipelineResult>;

    /// Finaliza o carregamento (flush, commit, etc.)
    async fn finalize(&self) -> Result<()> {
        Ok(())
    }

    /// Verifica se o destino está disponível
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
