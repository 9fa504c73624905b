use thiserror::Error;

/// Tipo Result principal da biblioteca
pub type Result<T> = std::result::Result<T, EtlError>;

/// Erro principal do pipeline de data warehouse
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Erro de extração: {0}")]
    Extract(#[from] ExtractError),

    #[error("Erro de transformação: {0}")]
    Transform(#[from] TransformError),

    #[error("Erro de carga: {0}")]
    Load(#[from] LoadError),

    #[error("Erro de configuração: {0}")]
    Config(#[from] ConfigError),

    #[error("Erro de pipeline: {0}")]
    Pipeline(String),

    #[error("Erro de I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro genérico: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Erros relacionados à extração de dados
///
/// Campos críticos nulos são fatais por contrato: nenhuma tabela parcial
/// passa adiante de uma extração inválida.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Arquivo não encontrado: {0}")]
    FileNotFound(String),

    #[error("Campo crítico nulo em {table}.{column}: {count} ocorrências")]
    CriticalFieldNull {
        table: String,
        column: String,
        count: usize,
    },

    #[error("Formato inválido: {0}")]
    InvalidFormat(String),

    #[error("Erro de parsing: {0}")]
    ParseError(String),
}

/// Erros relacionados à transformação de dados
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Dimensão necessária ausente: {0}")]
    MissingDependency(String),

    #[error("Intervalo de datas inválido: {0}")]
    InvalidDateRange(String),

    #[error("Erro de processamento: {0}")]
    ProcessingError(String),
}

/// Erros relacionados ao carregamento de dados
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Erro de conexão de destino: {0}")]
    DestinationConnection(String),

    #[error("Erro de escrita: {0}")]
    WriteError(String),

    #[error("Erro de schema: {0}")]
    SchemaError(String),
}

/// Erros relacionados à configuração
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuração inválida: {0}")]
    InvalidConfig(String),

    #[error("Parâmetro obrigatório ausente: {0}")]
    MissingRequiredParameter(String),

    #[error("Valor inválido para {param}: {value}")]
    InvalidValue { param: String, value: String },

    #[error("Erro de parsing de configuração: {0}")]
    ParseError(String),
}

impl EtlError {
    /// Retorna o código de erro
    pub fn error_code(&self) -> &'static str {
        match self {
            EtlError::Extract(_) => "EXTRACT_ERROR",
            EtlError::Transform(_) => "TRANSFORM_ERROR",
            EtlError::Load(_) => "LOAD_ERROR",
            EtlError::Config(_) => "CONFIG_ERROR",
            EtlError::Pipeline(_) => "PIPELINE_ERROR",
            EtlError::Io(_) => "IO_ERROR",
            EtlError::Generic(_) => "GENERIC_ERROR",
        }
    }
}

impl From<config::ConfigError> for EtlError {
    fn from(err: config::ConfigError) -> Self {
        EtlError::Config(ConfigError::ParseError(err.to_string()))
    }
}

impl From<csv::Error> for EtlError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(io_err) => {
                EtlError::Io(std::io::Error::new(io_err.kind(), io_err.to_string()))
            }
            csv::ErrorKind::Utf8 { .. } => {
                EtlError::Extract(ExtractError::InvalidFormat("UTF-8 inválido".to_string()))
            }
            _ => EtlError::Extract(ExtractError::ParseError(err.to_string())),
        }
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for EtlError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                EtlError::Load(LoadError::DestinationConnection(db_err.to_string()))
            }
            sqlx::Error::Io(io_err) => EtlError::Io(io_err),
            _ => EtlError::Generic(anyhow::anyhow!(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = EtlError::Extract(ExtractError::CriticalFieldNull {
            table: "orders".to_string(),
            column: "order_id".to_string(),
            count: 3,
        });
        assert_eq!(err.error_code(), "EXTRACT_ERROR");
        assert!(err.to_string().contains("orders.order_id"));

        let err = EtlError::Pipeline("falha".to_string());
        assert_eq!(err.error_code(), "PIPELINE_ERROR");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            param: "estimated_lifespan_days".to_string(),
            value: "0".to_string(),
        };
        assert!(err.to_string().contains("estimated_lifespan_days"));
    }
}
