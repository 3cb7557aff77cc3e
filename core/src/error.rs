/// Errors raised when lab inputs fail validation at the boundary.
///
/// The algorithms themselves are total over their documented domains; these
/// variants only come out of constructors and parsers.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LabError {
    #[error("empty query")]
    EmptyQuery,
    #[error("malformed boolean query: {0}")]
    MalformedQuery(String),
    #[error("unknown boolean operator: {0}")]
    UnknownOperator(String),
    #[error("unknown ranking model: {0}")]
    UnknownRankingModel(String),
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("unknown analyzer: {0}")]
    UnknownAnalyzer(String),
    #[error("unknown coding scheme: {0}")]
    UnknownScheme(String),
    #[error("adjacency matrix must be square: row {row} has {len} entries, expected {expected}")]
    NonSquareMatrix { row: usize, len: usize, expected: usize },
    #[error("adjacency entry ({row}, {col}) must be 0 or 1, got {value}")]
    InvalidAdjacencyEntry { row: usize, col: usize, value: u8 },
    #[error("edge {from} -> {to} is outside a graph of {pages} pages")]
    EdgeOutOfRange { from: usize, to: usize, pages: usize },
    #[error("rank vector has {got} entries but the graph has {expected} pages")]
    RankLengthMismatch { got: usize, expected: usize },
    #[error("{name} = {value} is outside {range}")]
    InvalidParameter { name: &'static str, value: f64, range: &'static str },
    #[error("character {0:?} has no code in this table")]
    UnencodableChar(char),
    #[error("invalid bit string: {0}")]
    InvalidBitstring(String),
    #[error("invalid code table: {0}")]
    InvalidCodeTable(String),
}

pub type Result<T, E = LabError> = std::result::Result<T, E>;
