use snafu::Snafu;

use crate::{Backend, DType};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The backend's type table has no storage type for this kind.
    #[snafu(display("unsupported numeric kind {dtype} on backend {backend}"))]
    UnsupportedKind { dtype: DType, backend: Backend },
}
