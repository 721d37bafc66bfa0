use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown edge style `{0}`")]
    UnknownEdgeStyle(String),
    #[error("unknown perimeter `{0}`")]
    UnknownPerimeter(String),
    #[error("edge `{edge}` references unknown terminal `{id}`")]
    UnknownTerminal { edge: String, id: String },
    #[error("edge style function is not registered under any name")]
    UnregisteredRouter,
    #[error("invalid style value `{value}` for `{key}`")]
    InvalidStyle { key: String, value: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Json5(#[from] json5::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
